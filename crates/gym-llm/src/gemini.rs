//! Gemini Provider Implementation
//!
//! Sends prompts to Google's Gemini `generateContent` API and returns the
//! concatenated text parts of the first candidate.
//!
//! # Features
//!
//! - Configurable endpoint, model and request timeout
//! - Retry with exponential backoff on network errors, 5xx and 429
//! - Status codes mapped onto [`LlmError`] variants
//!
//! # Examples
//!
//! ```no_run
//! use gym_llm::{GeminiConfig, GeminiProvider};
//! use gym_domain::traits::LlmProvider;
//!
//! let provider = GeminiProvider::from_config(&GeminiConfig::default()).unwrap();
//! // Blocking call: run it on a blocking thread inside async code
//! let reply = provider.generate("Say hello").unwrap();
//! ```

use crate::LlmError;
use gym_domain::traits::LlmProvider as LlmProviderTrait;
use reqwest::blocking::Client;
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};
use tracing::{debug, warn};

/// Default Gemini API endpoint
pub const DEFAULT_ENDPOINT: &str = "https://generativelanguage.googleapis.com";

/// Default model
pub const DEFAULT_MODEL: &str = "gemini-2.0-flash";

/// Environment variable consulted when no API key is configured
pub const API_KEY_ENV: &str = "GEMINI_API_KEY";

/// Default timeout for one LLM request (35 seconds)
pub const DEFAULT_TIMEOUT_SECS: u64 = 35;

/// First backoff delay between attempts
const DEFAULT_BACKOFF: Duration = Duration::from_secs(1);

/// Default number of attempts per prompt
pub const DEFAULT_MAX_RETRIES: u32 = 3;

/// Connection settings for [`GeminiProvider`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeminiConfig {
    /// API base URL
    #[serde(default = "default_endpoint")]
    pub endpoint: String,

    /// Model name
    #[serde(default = "default_model")]
    pub model: String,

    /// API key; falls back to `GEMINI_API_KEY`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    /// Per-request timeout in seconds
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,

    /// Attempts per prompt before giving up
    #[serde(default = "default_retries")]
    pub max_retries: u32,
}

impl Default for GeminiConfig {
    fn default() -> Self {
        Self {
            endpoint: default_endpoint(),
            model: default_model(),
            api_key: None,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            max_retries: DEFAULT_MAX_RETRIES,
        }
    }
}

impl GeminiConfig {
    /// Longest a provider built from this config can spend on one prompt:
    /// every attempt timing out, plus the backoff sleeps between attempts
    pub fn worst_case(&self) -> Duration {
        let attempts = self.max_retries.max(1);
        let requests = Duration::from_secs(self.timeout_secs).saturating_mul(attempts);
        (1..attempts).fold(requests, |total, attempt| {
            total.saturating_add(backoff_delay(DEFAULT_BACKOFF, attempt))
        })
    }
}

/// Sleep before retry number `attempt` (1-based): base, 2*base, 4*base, ...
///
/// Saturates instead of overflowing for large attempt counts.
pub fn backoff_delay(base: Duration, attempt: u32) -> Duration {
    match 2u32.checked_pow(attempt.saturating_sub(1)) {
        Some(factor) => base.saturating_mul(factor),
        None if base.is_zero() => Duration::ZERO,
        None => Duration::MAX,
    }
}

fn default_endpoint() -> String {
    DEFAULT_ENDPOINT.to_string()
}

fn default_model() -> String {
    DEFAULT_MODEL.to_string()
}

fn default_timeout() -> u64 {
    DEFAULT_TIMEOUT_SECS
}

fn default_retries() -> u32 {
    DEFAULT_MAX_RETRIES
}

/// Gemini API provider
pub struct GeminiProvider {
    endpoint: String,
    model: String,
    api_key: String,
    client: Client,
    timeout: Duration,
    max_retries: u32,
    backoff_base: Duration,
}

#[derive(Serialize)]
struct GenerateRequest<'a> {
    contents: Vec<Content<'a>>,
}

#[derive(Serialize)]
struct Content<'a> {
    role: &'static str,
    parts: Vec<Part<'a>>,
}

#[derive(Serialize)]
struct Part<'a> {
    text: &'a str,
}

#[derive(Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    error: Option<ApiError>,
}

#[derive(Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Deserialize)]
struct CandidatePart {
    text: Option<String>,
}

#[derive(Deserialize)]
struct ApiError {
    message: String,
}

impl GeminiProvider {
    /// Create a new Gemini provider
    ///
    /// # Errors
    ///
    /// Returns [`LlmError::Config`] if the API key is empty or the HTTP client
    /// cannot be built.
    pub fn new(
        endpoint: impl Into<String>,
        model: impl Into<String>,
        api_key: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, LlmError> {
        let api_key = api_key.into();
        if api_key.trim().is_empty() {
            return Err(LlmError::Config(format!(
                "Gemini API key missing (set {} or llm.api_key)",
                API_KEY_ENV
            )));
        }

        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| LlmError::Config(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            endpoint: endpoint.into().trim_end_matches('/').to_string(),
            model: model.into(),
            api_key,
            client,
            timeout,
            max_retries: DEFAULT_MAX_RETRIES,
            backoff_base: DEFAULT_BACKOFF,
        })
    }

    /// Build a provider from configuration, reading the key from the
    /// environment when the configuration has none
    pub fn from_config(config: &GeminiConfig) -> Result<Self, LlmError> {
        let api_key = match &config.api_key {
            Some(key) => key.clone(),
            None => std::env::var(API_KEY_ENV).unwrap_or_default(),
        };
        Ok(Self::new(
            config.endpoint.clone(),
            config.model.clone(),
            api_key,
            Duration::from_secs(config.timeout_secs),
        )?
        .with_max_retries(config.max_retries))
    }

    /// Set the maximum number of attempts (at least one)
    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries.max(1);
        self
    }

    /// Set the first backoff delay; later delays double
    pub fn with_backoff(mut self, base: Duration) -> Self {
        self.backoff_base = base;
        self
    }

    fn url(&self) -> String {
        format!("{}/v1beta/models/{}:generateContent", self.endpoint, self.model)
    }

    /// One HTTP round trip; the flag on failure marks the error as retryable
    fn attempt(
        &self,
        body: &GenerateRequest<'_>,
        timeout: Duration,
    ) -> Result<String, (LlmError, bool)> {
        let response = self
            .client
            .post(self.url())
            .header("x-goog-api-key", &self.api_key)
            .timeout(timeout)
            .json(body)
            .send()
            .map_err(|e| (LlmError::Communication(format!("Request failed: {}", e)), true))?;

        let status = response.status();
        if status.is_success() {
            let parsed: GenerateResponse = response.json().map_err(|e| {
                (
                    LlmError::InvalidResponse(format!("Failed to parse response: {}", e)),
                    false,
                )
            })?;
            return extract_text(parsed).map_err(|e| (e, false));
        }

        let detail = response
            .text()
            .ok()
            .and_then(|body| serde_json::from_str::<GenerateResponse>(&body).ok())
            .and_then(|r| r.error.map(|e| e.message))
            .unwrap_or_else(|| status.to_string());

        Err(match status {
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                (LlmError::Unauthorized(detail), false)
            }
            StatusCode::NOT_FOUND => (LlmError::ModelNotAvailable(self.model.clone()), false),
            StatusCode::TOO_MANY_REQUESTS => (LlmError::RateLimitExceeded, true),
            s if s.is_server_error() => {
                (LlmError::Communication(format!("HTTP {}: {}", s, detail)), true)
            }
            _ => (LlmError::InvalidRequest(format!("HTTP {}: {}", status, detail)), false),
        })
    }

    /// Send `prompt`, retrying transient failures with exponential backoff
    pub fn generate(&self, prompt: &str) -> Result<String, LlmError> {
        self.send(prompt, None)
    }

    /// Like [`generate`](Self::generate), but every request timeout and
    /// backoff sleep is cut to fit inside `budget`
    pub fn generate_within(&self, prompt: &str, budget: Duration) -> Result<String, LlmError> {
        self.send(prompt, Instant::now().checked_add(budget))
    }

    fn send(&self, prompt: &str, deadline: Option<Instant>) -> Result<String, LlmError> {
        let body = GenerateRequest {
            contents: vec![Content {
                role: "user",
                parts: vec![Part { text: prompt }],
            }],
        };
        let remaining = || deadline.map(|d| d.saturating_duration_since(Instant::now()));

        let mut attempts = 0;
        loop {
            attempts += 1;
            let timeout = match remaining() {
                Some(left) if left.is_zero() => {
                    return Err(LlmError::Communication(
                        "deadline reached before the request was sent".to_string(),
                    ))
                }
                Some(left) => left.min(self.timeout),
                None => self.timeout,
            };
            debug!("Gemini request attempt {}/{}", attempts, self.max_retries);

            match self.attempt(&body, timeout) {
                Ok(text) => return Ok(text),
                Err((error, retryable)) => {
                    if !retryable || attempts >= self.max_retries {
                        return Err(error);
                    }
                    let delay = backoff_delay(self.backoff_base, attempts);
                    if remaining().is_some_and(|left| delay >= left) {
                        debug!("No time left for another attempt");
                        return Err(error);
                    }
                    warn!("Gemini request failed ({}), retrying in {:?}", error, delay);
                    std::thread::sleep(delay);
                }
            }
        }
    }
}

fn extract_text(response: GenerateResponse) -> Result<String, LlmError> {
    if let Some(error) = response.error {
        return Err(LlmError::InvalidResponse(error.message));
    }

    let text: String = response
        .candidates
        .into_iter()
        .next()
        .and_then(|c| c.content)
        .map(|content| content.parts.into_iter().filter_map(|p| p.text).collect())
        .unwrap_or_default();

    if text.is_empty() {
        return Err(LlmError::InvalidResponse("Response contained no text".to_string()));
    }
    Ok(text)
}

impl LlmProviderTrait for GeminiProvider {
    type Error = LlmError;

    fn generate(&self, prompt: &str) -> Result<String, Self::Error> {
        GeminiProvider::generate(self, prompt)
    }

    fn generate_within(&self, prompt: &str, budget: Duration) -> Result<String, Self::Error> {
        GeminiProvider::generate_within(self, prompt, budget)
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}
