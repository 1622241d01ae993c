//! Configuration for the question generator

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Question-type labels offered to the model
pub const DEFAULT_QUESTION_TYPES: [&str; 8] = [
    "factual",
    "conceptual",
    "analytical",
    "application",
    "comparative",
    "evaluative",
    "multiple-choice",
    "open-question",
];

/// Difficulty labels offered to the model
pub const DEFAULT_DIFFICULTY_LEVELS: [&str; 2] = ["introductory", "intermediate"];

/// Configuration for the [`Generator`](crate::Generator)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneratorConfig {
    /// Document text longer than this (in characters) is truncated
    pub max_text_length: usize,

    /// Appended after truncated text
    pub truncation_marker: String,

    /// Question types; one is picked uniformly per prompt
    pub question_types: Vec<String>,

    /// Difficulty levels; one is picked uniformly per prompt
    pub difficulty_levels: Vec<String>,

    /// Lowest prompt seed (inclusive)
    pub seed_min: u32,

    /// Highest prompt seed (inclusive)
    pub seed_max: u32,

    /// Maximum time for a single gateway call (seconds)
    pub gateway_timeout_secs: u64,

    /// Store extracted text on the document after the first extraction
    pub cache_extracted_text: bool,
}

impl GeneratorConfig {
    /// Get the gateway timeout as a Duration
    pub fn gateway_timeout(&self) -> Duration {
        Duration::from_secs(self.gateway_timeout_secs)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.max_text_length == 0 {
            return Err("max_text_length must be greater than 0".to_string());
        }
        if self.question_types.iter().all(|t| t.trim().is_empty()) {
            return Err("question_types must contain at least one label".to_string());
        }
        if self.difficulty_levels.iter().all(|d| d.trim().is_empty()) {
            return Err("difficulty_levels must contain at least one label".to_string());
        }
        if self.seed_min > self.seed_max {
            return Err(format!(
                "seed_min {} exceeds seed_max {}",
                self.seed_min, self.seed_max
            ));
        }
        if self.gateway_timeout_secs == 0 {
            return Err("gateway_timeout_secs must be greater than 0".to_string());
        }
        Ok(())
    }

    /// Load configuration from TOML string
    pub fn from_toml(toml_str: &str) -> Result<Self, String> {
        toml::from_str(toml_str).map_err(|e| format!("Failed to parse TOML: {}", e))
    }

    /// Serialize configuration to TOML string
    pub fn to_toml(&self) -> Result<String, String> {
        toml::to_string_pretty(self).map_err(|e| format!("Failed to serialize to TOML: {}", e))
    }
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            max_text_length: 10_000,
            truncation_marker: "...".to_string(),
            question_types: DEFAULT_QUESTION_TYPES.iter().map(|s| s.to_string()).collect(),
            difficulty_levels: DEFAULT_DIFFICULTY_LEVELS
                .iter()
                .map(|s| s.to_string())
                .collect(),
            seed_min: 1,
            seed_max: 10_000,
            gateway_timeout_secs: 120,
            cache_extracted_text: true,
        }
    }
}
