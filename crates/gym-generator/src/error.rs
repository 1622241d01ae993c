//! Error types for the generator

use gym_domain::DocumentCategory;
use thiserror::Error;

/// Errors that abort a whole batch before any document is processed
///
/// Per-document problems are reported as
/// [`DocumentFailure`](crate::DocumentFailure) values instead.
#[derive(Error, Debug)]
pub enum GeneratorError {
    /// The session does not exist
    #[error("Session not found: {0}")]
    SessionNotFound(String),

    /// The session has no documents of the needed category
    #[error("No {category} documents found for session {session_id}")]
    NoDocuments {
        /// Session that was asked for
        session_id: String,
        /// Category the operation needs
        category: DocumentCategory,
    },

    /// Store error while loading the session
    #[error("Store error: {0}")]
    Store(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),
}
