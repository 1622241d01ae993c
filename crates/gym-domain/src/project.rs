//! Learning projects and their milestones

use crate::validation::{validate_score, ValidationError};

/// A personal learning project
#[derive(Debug, Clone, PartialEq)]
pub struct Project {
    /// Unique identifier
    pub id: String,

    /// Display title
    pub title: String,

    /// Overall performance score (0-100)
    pub overall_performance: f64,

    /// Perceived difficulty (0-100)
    pub difficulty: f64,

    /// Interest level (0-100)
    pub interest: f64,

    /// Free-form reasons for pursuing the project
    pub motivations: Vec<String>,
}

impl Project {
    /// Create a project with zeroed metrics
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            id: crate::new_id(),
            title: title.into(),
            overall_performance: 0.0,
            difficulty: 0.0,
            interest: 0.0,
            motivations: Vec::new(),
        }
    }

    /// Validate title and metric ranges
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.title.trim().is_empty() {
            return Err(ValidationError::new("title", "title is required"));
        }
        validate_score("overall_performance", self.overall_performance)?;
        validate_score("difficulty", self.difficulty)?;
        validate_score("interest", self.interest)?;
        Ok(())
    }
}

/// A dated checkpoint within a project
///
/// At most one milestone per project is the deadline; the store demotes the
/// previous deadline when a new one is created.
#[derive(Debug, Clone, PartialEq)]
pub struct Milestone {
    /// Unique identifier
    pub id: String,

    /// Owning project
    pub project_id: String,

    /// Display title
    pub title: String,

    /// Due date (seconds since epoch)
    pub due_date: u64,

    /// Whether this is the project deadline
    pub is_deadline: bool,
}

impl Milestone {
    /// Create a regular (non-deadline) milestone
    pub fn new(project_id: impl Into<String>, title: impl Into<String>, due_date: u64) -> Self {
        Self {
            id: crate::new_id(),
            project_id: project_id.into(),
            title: title.into(),
            due_date,
            is_deadline: false,
        }
    }

    /// Mark this milestone as the project deadline
    pub fn as_deadline(mut self) -> Self {
        self.is_deadline = true;
        self
    }

    /// Validate required fields
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.title.trim().is_empty() {
            return Err(ValidationError::new("title", "title is required"));
        }
        Ok(())
    }
}
