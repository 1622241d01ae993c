//! Timed learning sessions

use crate::validation::{validate_optional_score, ValidationError};

/// Self-reported metrics for a session, each in [0, 100] when present
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SessionMetrics {
    /// How aware the learner felt of the material
    pub awareness_level: Option<f64>,
    /// Confidence after the session
    pub confidence_level: Option<f64>,
    /// Energy during the session
    pub energy_level: Option<f64>,
    /// Self-assessed performance
    pub performance_level: Option<f64>,
    /// Overall satisfaction
    pub satisfaction_level: Option<f64>,
}

impl SessionMetrics {
    /// Validate every present metric
    pub fn validate(&self) -> Result<(), ValidationError> {
        validate_optional_score("awareness_level", self.awareness_level)?;
        validate_optional_score("confidence_level", self.confidence_level)?;
        validate_optional_score("energy_level", self.energy_level)?;
        validate_optional_score("performance_level", self.performance_level)?;
        validate_optional_score("satisfaction_level", self.satisfaction_level)?;
        Ok(())
    }
}

/// A learning session within a project
///
/// Sessions link to the RESOURCE documents used for question generation and
/// to the TEST documents whose questions are extracted.
#[derive(Debug, Clone, PartialEq)]
pub struct LearningSession {
    /// Unique identifier
    pub id: String,

    /// Owning project
    pub project_id: String,

    /// Planned or actual duration in minutes
    pub duration_minutes: u32,

    /// Why the learner sat down for this session
    pub motivation: Option<String>,

    /// What the session is meant to achieve
    pub learning_objective: Option<String>,

    /// Self-reported metrics
    pub metrics: SessionMetrics,

    /// Linked RESOURCE documents (filled by the store)
    pub resource_document_ids: Vec<String>,

    /// Linked TEST documents (filled by the store)
    pub test_document_ids: Vec<String>,

    /// Creation time (seconds since epoch)
    pub created_at: u64,
}

impl LearningSession {
    /// Create a session with no linked documents
    pub fn new(project_id: impl Into<String>, duration_minutes: u32) -> Self {
        Self {
            id: crate::new_id(),
            project_id: project_id.into(),
            duration_minutes,
            motivation: None,
            learning_objective: None,
            metrics: SessionMetrics::default(),
            resource_document_ids: Vec::new(),
            test_document_ids: Vec::new(),
            created_at: crate::unix_now(),
        }
    }

    /// Validate duration and metrics
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.duration_minutes == 0 {
            return Err(ValidationError::new(
                "duration_minutes",
                "duration in minutes is required",
            ));
        }
        self.metrics.validate()
    }
}
