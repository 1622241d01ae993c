//! Error types for the CLI application.

use thiserror::Error;

/// Result type alias for CLI operations.
pub type Result<T> = std::result::Result<T, CliError>;

/// CLI-specific errors.
#[derive(Debug, Error)]
pub enum CliError {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Storage error
    #[error("Storage error: {0}")]
    Store(#[from] gym_store::StoreError),

    /// Question generation error
    #[error("{0}")]
    Generator(#[from] gym_generator::GeneratorError),

    /// Language-model provider error
    #[error("LLM error: {0}")]
    Llm(#[from] gym_llm::LlmError),

    /// Document text could not be extracted
    #[error("Extraction failed: {0}")]
    Extraction(String),

    /// Shared store lock was poisoned by a panicking thread
    #[error("Store lock poisoned")]
    LockPoisoned,

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// TOML parsing error
    #[error("TOML parsing error: {0}")]
    Toml(#[from] toml::de::Error),

    /// Invalid input
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// A referenced record does not exist
    #[error("{kind} not found: {id}")]
    NotFound {
        /// Record kind
        kind: &'static str,
        /// Requested ID
        id: String,
    },
}

impl CliError {
    pub(crate) fn not_found(kind: &'static str, id: &str) -> Self {
        CliError::NotFound {
            kind,
            id: id.to_string(),
        }
    }
}
