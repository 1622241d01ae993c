//! Learning Gym LLM Provider Layer
//!
//! Implementations of the `LlmProvider` trait from `gym-domain`: a prompt goes
//! in, raw model text comes out. Providers are replaceable; the question
//! pipeline never depends on a concrete one.
//!
//! # Providers
//!
//! - `MockProvider`: scripted replies for testing
//! - `GeminiProvider`: Google Gemini `generateContent` API
//!
//! # Examples
//!
//! ```
//! use gym_llm::MockProvider;
//! use gym_domain::traits::LlmProvider;
//!
//! let provider = MockProvider::new(r#"{"question":"Q?","answer":"A."}"#);
//! let reply = provider.generate("any prompt").unwrap();
//! assert!(reply.contains("question"));
//! ```

#![warn(missing_docs)]

pub mod gemini;

use gym_domain::traits::LlmProvider as LlmProviderTrait;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard};
use thiserror::Error;

pub use gemini::{GeminiConfig, GeminiProvider};

/// Errors that can occur during LLM operations
#[derive(Error, Debug, Clone, PartialEq)]
pub enum LlmError {
    /// Network or API communication error
    #[error("Communication error: {0}")]
    Communication(String),

    /// Credentials missing or rejected
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Request rejected as malformed
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Invalid response from LLM
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// Rate limit or quota exceeded
    #[error("Rate limit exceeded")]
    RateLimitExceeded,

    /// Model not available
    #[error("Model not available: {0}")]
    ModelNotAvailable(String),

    /// Provider misconfigured
    #[error("Configuration error: {0}")]
    Config(String),

    /// Generic error
    #[error("LLM error: {0}")]
    Other(String),
}

#[derive(Debug, Clone)]
enum Reply {
    Text(String),
    Fail(LlmError),
}

#[derive(Debug, Default)]
struct Script {
    queue: VecDeque<Reply>,
    by_fragment: Vec<(String, Reply)>,
    prompts: Vec<String>,
}

/// Mock LLM provider for deterministic testing
///
/// Reply selection, first match wins:
/// 1. a reply registered for a fragment the prompt contains
/// 2. the next queued reply
/// 3. the default reply
///
/// Clones share the same script and prompt log.
///
/// # Examples
///
/// ```
/// use gym_llm::MockProvider;
/// use gym_domain::traits::LlmProvider;
///
/// let mut provider = MockProvider::default();
/// provider.add_response("photosynthesis", "plants");
/// provider.add_error("broken");
/// assert_eq!(provider.generate("text about photosynthesis").unwrap(), "plants");
/// assert!(provider.generate("a broken document").is_err());
/// ```
#[derive(Debug, Clone)]
pub struct MockProvider {
    default_response: String,
    script: Arc<Mutex<Script>>,
}

impl MockProvider {
    /// Create a new MockProvider with a fixed response for all prompts
    pub fn new(response: impl Into<String>) -> Self {
        Self {
            default_response: response.into(),
            script: Arc::new(Mutex::new(Script::default())),
        }
    }

    fn script(&self) -> MutexGuard<'_, Script> {
        self.script.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Reply with `response` to any prompt containing `fragment`
    pub fn add_response(&mut self, fragment: impl Into<String>, response: impl Into<String>) {
        self.script()
            .by_fragment
            .push((fragment.into(), Reply::Text(response.into())));
    }

    /// Fail any prompt containing `fragment`
    pub fn add_error(&mut self, fragment: impl Into<String>) {
        self.script().by_fragment.push((
            fragment.into(),
            Reply::Fail(LlmError::Communication("Mock error".to_string())),
        ));
    }

    /// Queue a reply for the next unmatched prompt
    pub fn push_response(&mut self, response: impl Into<String>) {
        self.script().queue.push_back(Reply::Text(response.into()));
    }

    /// Queue a failure for the next unmatched prompt
    pub fn push_error(&mut self, error: LlmError) {
        self.script().queue.push_back(Reply::Fail(error));
    }

    /// Get the number of times generate was called
    pub fn call_count(&self) -> usize {
        self.script().prompts.len()
    }

    /// Every prompt received so far, in order
    pub fn prompts(&self) -> Vec<String> {
        self.script().prompts.clone()
    }
}

impl Default for MockProvider {
    fn default() -> Self {
        Self::new("Default mock response")
    }
}

impl LlmProviderTrait for MockProvider {
    type Error = LlmError;

    fn generate(&self, prompt: &str) -> Result<String, Self::Error> {
        let mut script = self.script();
        script.prompts.push(prompt.to_string());

        let matched = script
            .by_fragment
            .iter()
            .find(|(fragment, _)| prompt.contains(fragment.as_str()))
            .map(|(_, reply)| reply.clone());

        let reply = match matched {
            Some(reply) => reply,
            None => script
                .queue
                .pop_front()
                .unwrap_or_else(|| Reply::Text(self.default_response.clone())),
        };

        match reply {
            Reply::Text(text) => Ok(text),
            Reply::Fail(error) => Err(error),
        }
    }

    fn model_name(&self) -> &str {
        "mock"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const REPLY: &str = r#"{"question":"What is a closure?","answer":"A function value."}"#;

    #[test]
    fn test_fixed_reply_for_every_prompt() {
        let provider = MockProvider::new(REPLY);
        assert_eq!(provider.generate("CONTENT:\nClosures capture.").unwrap(), REPLY);
        assert_eq!(provider.generate("CONTENT:\nTraits.").unwrap(), REPLY);
    }

    #[test]
    fn test_reply_chosen_by_document_content() {
        let mut provider = MockProvider::new("[]");
        provider.add_response("mitochondria", REPLY);
        provider.add_response("Midterm", r#"[{"question":"Q1?"}]"#);

        assert_eq!(provider.generate("about mitochondria").unwrap(), REPLY);
        assert_eq!(provider.generate("Midterm exam").unwrap(), r#"[{"question":"Q1?"}]"#);
        assert_eq!(provider.generate("an unrelated text").unwrap(), "[]");
    }

    #[test]
    fn test_queued_replies_in_order() {
        let mut provider = MockProvider::new("fallback");
        provider.push_response("first");
        provider.push_error(LlmError::RateLimitExceeded);
        provider.push_response("third");

        assert_eq!(provider.generate("a").unwrap(), "first");
        assert_eq!(provider.generate("b"), Err(LlmError::RateLimitExceeded));
        assert_eq!(provider.generate("c").unwrap(), "third");
        assert_eq!(provider.generate("d").unwrap(), "fallback");
    }

    #[test]
    fn test_prompts_are_recorded() {
        let provider = MockProvider::new(REPLY);
        assert_eq!(provider.call_count(), 0);

        provider.generate("notes.txt prompt").unwrap();
        provider.generate("slides.pdf prompt").unwrap();
        assert_eq!(provider.prompts(), vec!["notes.txt prompt", "slides.pdf prompt"]);
    }

    #[test]
    fn test_scripted_failure_for_one_document() {
        let mut provider = MockProvider::new(REPLY);
        provider.add_error("corrupted");

        assert!(matches!(
            provider.generate("a corrupted chapter"),
            Err(LlmError::Communication(_))
        ));
        assert!(provider.generate("a clean chapter").is_ok());
    }

    #[test]
    fn test_clones_share_the_script() {
        let provider = MockProvider::new(REPLY);
        let mut handle = provider.clone();
        handle.push_response("queued");

        assert_eq!(provider.generate("x").unwrap(), "queued");
        assert_eq!(handle.call_count(), 1);
    }
}
