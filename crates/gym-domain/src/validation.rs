//! Validation rules applied before anything reaches the store

use std::fmt;

/// Lowest accepted score
pub const SCORE_MIN: f64 = 0.0;

/// Highest accepted score
pub const SCORE_MAX: f64 = 100.0;

/// A record was rejected before persistence
///
/// Carries the name of the offending field so callers can point the user at it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    /// Field at fault (e.g. "evaluation", "test_document_id")
    pub field: String,

    /// Human-readable description of the problem
    pub reason: String,
}

impl ValidationError {
    /// Create a new validation error for `field`
    pub fn new(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            reason: reason.into(),
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid {}: {}", self.field, self.reason)
    }
}

impl std::error::Error for ValidationError {}

/// Check that a score lies in [0, 100]
///
/// # Examples
///
/// ```
/// use gym_domain::validate_score;
///
/// assert!(validate_score("evaluation", 42.0).is_ok());
/// assert!(validate_score("evaluation", 100.5).is_err());
/// ```
pub fn validate_score(field: &str, value: f64) -> Result<(), ValidationError> {
    if value.is_nan() || !(SCORE_MIN..=SCORE_MAX).contains(&value) {
        return Err(ValidationError::new(
            field,
            format!("{} must be between {} and {}", value, SCORE_MIN, SCORE_MAX),
        ));
    }
    Ok(())
}

/// Check an optional score; `None` is always valid
pub fn validate_optional_score(field: &str, value: Option<f64>) -> Result<(), ValidationError> {
    match value {
        Some(v) => validate_score(field, v),
        None => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bounds_are_inclusive() {
        assert!(validate_score("x", 0.0).is_ok());
        assert!(validate_score("x", 100.0).is_ok());
    }

    #[test]
    fn test_out_of_range_names_field() {
        let err = validate_score("difficulty", -1.0).unwrap_err();
        assert_eq!(err.field, "difficulty");
        assert!(err.to_string().contains("difficulty"));
    }

    #[test]
    fn test_nan_rejected() {
        assert!(validate_score("x", f64::NAN).is_err());
    }

    #[test]
    fn test_optional_none_is_valid() {
        assert!(validate_optional_score("x", None).is_ok());
        assert!(validate_optional_score("x", Some(101.0)).is_err());
    }
}
