//! Learning Gym Question Generator
//!
//! Turns the documents attached to a learning session into stored quiz
//! questions using a language model.
//!
//! # Architecture
//!
//! ```text
//! Document → gym-text → Prompt → LlmProvider → Parser → Question → LearningStore
//! ```
//!
//! Each document moves through its own small state machine
//! (`PENDING → EXTRACTING → PROMPTING → PARSING → DONE`, with a failure
//! state after each step). A failing document is reported in the
//! [`BatchReport`] and never stops the rest of the batch.
//!
//! # Two operations
//!
//! - [`Generator::generate_from_resources`]: one new question per RESOURCE
//!   document, with a randomly chosen question type, difficulty and seed
//! - [`Generator::extract_from_tests`]: every question already present in
//!   the TEST documents, copied verbatim
//!
//! # Example Usage
//!
//! ```no_run
//! use gym_generator::{Generator, GeneratorConfig};
//! use gym_llm::MockProvider;
//! use gym_store::SqliteStore;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let llm = MockProvider::new(r#"{"question": "Q?", "answer": "A."}"#);
//! let store = SqliteStore::new(":memory:")?;
//! let generator = Generator::new(llm, store, GeneratorConfig::default())?;
//!
//! let report = generator.generate_from_resources("session-id").await?;
//! println!("Created: {} questions", report.created_count);
//! for failure in &report.failures {
//!     println!("Failed: {}", failure);
//! }
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]

mod config;
mod error;
mod generator;
mod parser;
mod prompt;
mod types;

#[cfg(test)]
mod tests;

pub use config::{GeneratorConfig, DEFAULT_DIFFICULTY_LEVELS, DEFAULT_QUESTION_TYPES};
pub use error::GeneratorError;
pub use generator::{locate, Generator};
pub use parser::{parse_extract_response, parse_generate_response, select_payload};
pub use prompt::{
    compose_extract_prompt, compose_generate_prompt, render_generate_prompt, truncate_text,
    PromptChoices,
};
pub use types::{
    BatchReport, DocumentFailure, FailureStage, GenerateParse, ParseError, PipelineState, QaPair,
};
