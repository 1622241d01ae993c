//! Learning Gym Domain Layer
//!
//! Core model for tracking personal learning projects: projects with
//! milestones, learning sessions, uploaded documents and the quiz questions
//! generated from (or extracted out of) those documents.
//!
//! The only external dependency is `uuid`. Persistence and language-model
//! access are expressed as traits in [`traits`]; their implementations live
//! in `gym-store` and `gym-llm`.
//!
//! ## Key Concepts
//!
//! - **Document**: an uploaded file, either a RESOURCE (source material) or a
//!   TEST (pre-existing exam questions)
//! - **Question**: a question/answer pair with provenance back to the
//!   document(s) it came from
//! - **Score**: every human-entered metric and evaluation lies in [0, 100]

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod document;
pub mod project;
pub mod question;
pub mod session;
pub mod traits;
pub mod validation;

// Re-exports for convenience
pub use document::{Document, DocumentCategory};
pub use project::{Milestone, Project};
pub use question::{
    DocumentReference, Locator, ParseMode, Question, QuestionReview, QuestionSource,
};
pub use session::{LearningSession, SessionMetrics};
pub use validation::{validate_score, ValidationError};

use std::time::{SystemTime, UNIX_EPOCH};

/// Generate a new opaque record identifier (UUIDv4 text)
///
/// # Examples
///
/// ```
/// let id = gym_domain::new_id();
/// assert_eq!(id.len(), 36);
/// ```
pub fn new_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

/// Current time as seconds since the Unix epoch
pub fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}
