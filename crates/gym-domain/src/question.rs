//! Quiz questions and their provenance

use crate::validation::{validate_optional_score, ValidationError};

/// Where a question came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum QuestionSource {
    /// Generated by the language model from a RESOURCE document
    Resource,

    /// Extracted verbatim from a TEST document
    Test,
}

impl QuestionSource {
    /// Get the source name as stored
    pub fn as_str(&self) -> &'static str {
        match self {
            QuestionSource::Resource => "RESOURCE",
            QuestionSource::Test => "TEST",
        }
    }

    /// Parse a source name (case-insensitive)
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_uppercase().as_str() {
            "RESOURCE" => Some(QuestionSource::Resource),
            "TEST" => Some(QuestionSource::Test),
            _ => None,
        }
    }
}

/// How confidently the model reply was parsed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ParseMode {
    /// Clean structured (JSON) parse
    Structured,

    /// Best-effort label split of an unstructured reply
    Heuristic,
}

impl ParseMode {
    /// Get the mode name as stored
    pub fn as_str(&self) -> &'static str {
        match self {
            ParseMode::Structured => "structured",
            ParseMode::Heuristic => "heuristic",
        }
    }

    /// Parse a mode name
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "structured" => Some(ParseMode::Structured),
            "heuristic" => Some(ParseMode::Heuristic),
            _ => None,
        }
    }

    /// Whether the parse was a low-confidence fallback
    pub fn is_low_confidence(&self) -> bool {
        matches!(self, ParseMode::Heuristic)
    }
}

/// Position of a question inside its source document
///
/// Every field is optional: generated questions usually carry an empty
/// locator, extracted ones carry whatever could be recovered.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Locator {
    /// 1-based line number
    pub line: Option<u32>,
    /// 1-based page number
    pub page: Option<u32>,
    /// Character offset from the start of the extracted text
    pub offset: Option<u32>,
    /// Surrounding text
    pub context: Option<String>,
}

impl Locator {
    /// Whether nothing is known about the position
    pub fn is_empty(&self) -> bool {
        self.line.is_none() && self.page.is_none() && self.offset.is_none() && self.context.is_none()
    }
}

/// A link from a question to a position in a document
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentReference {
    /// Referenced document
    pub document_id: String,

    /// Where in the document
    pub locator: Locator,
}

impl DocumentReference {
    /// Reference a whole document without a position
    pub fn whole(document_id: impl Into<String>) -> Self {
        Self {
            document_id: document_id.into(),
            locator: Locator::default(),
        }
    }
}

/// A quiz question attached to a learning session
///
/// Immutable after creation except for `correction` and `evaluation`, which
/// a human reviewer fills through [`QuestionReview`].
#[derive(Debug, Clone, PartialEq)]
pub struct Question {
    /// Unique identifier
    pub id: String,

    /// Owning session
    pub session_id: String,

    /// Question text
    pub question: String,

    /// Answer text
    pub answer: String,

    /// Reviewer correction of the answer
    pub correction: Option<String>,

    /// Reviewer evaluation (0-100)
    pub evaluation: Option<f64>,

    /// RESOURCE-generated or TEST-extracted
    pub source: QuestionSource,

    /// How the model reply was parsed
    pub parse_mode: ParseMode,

    /// Source TEST document (TEST questions only)
    pub test_document_id: Option<String>,

    /// Generating RESOURCE documents (RESOURCE questions only)
    pub resource_document_ids: Vec<String>,

    /// Positional references into documents
    pub references: Vec<DocumentReference>,

    /// Creation time (seconds since epoch)
    pub created_at: u64,
}

impl Question {
    /// Question generated from a RESOURCE document
    pub fn from_resource(
        session_id: impl Into<String>,
        question: impl Into<String>,
        answer: impl Into<String>,
        document_id: impl Into<String>,
        parse_mode: ParseMode,
    ) -> Self {
        let document_id = document_id.into();
        Self {
            id: crate::new_id(),
            session_id: session_id.into(),
            question: question.into(),
            answer: answer.into(),
            correction: None,
            evaluation: None,
            source: QuestionSource::Resource,
            parse_mode,
            test_document_id: None,
            references: vec![DocumentReference::whole(document_id.clone())],
            resource_document_ids: vec![document_id],
            created_at: crate::unix_now(),
        }
    }

    /// Question extracted verbatim from a TEST document
    pub fn from_test(
        session_id: impl Into<String>,
        question: impl Into<String>,
        answer: impl Into<String>,
        document_id: impl Into<String>,
        locator: Locator,
    ) -> Self {
        let document_id = document_id.into();
        Self {
            id: crate::new_id(),
            session_id: session_id.into(),
            question: question.into(),
            answer: answer.into(),
            correction: None,
            evaluation: None,
            source: QuestionSource::Test,
            parse_mode: ParseMode::Structured,
            test_document_id: Some(document_id.clone()),
            resource_document_ids: Vec::new(),
            references: vec![DocumentReference {
                document_id,
                locator,
            }],
            created_at: crate::unix_now(),
        }
    }

    /// The document this question was derived from
    pub fn source_document_id(&self) -> Option<&str> {
        match self.source {
            QuestionSource::Test => self.test_document_id.as_deref(),
            QuestionSource::Resource => self.resource_document_ids.first().map(String::as_str),
        }
    }

    /// Validate text, evaluation range and provenance linkage
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.session_id.is_empty() {
            return Err(ValidationError::new("session_id", "session is required"));
        }
        if self.question.trim().is_empty() {
            return Err(ValidationError::new("question", "question text is empty"));
        }
        validate_optional_score("evaluation", self.evaluation)?;

        match self.source {
            QuestionSource::Test => {
                let doc_id = self.test_document_id.as_deref().ok_or_else(|| {
                    ValidationError::new("test_document_id", "TEST question has no source document")
                })?;
                if !self.references.iter().any(|r| r.document_id == doc_id) {
                    return Err(ValidationError::new(
                        "references",
                        format!("TEST question does not reference document {}", doc_id),
                    ));
                }
            }
            QuestionSource::Resource => {
                if self.resource_document_ids.is_empty() {
                    return Err(ValidationError::new(
                        "resource_document_ids",
                        "RESOURCE question has no generating document",
                    ));
                }
            }
        }
        Ok(())
    }
}

/// Reviewer edits to a stored question
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QuestionReview {
    /// Corrected answer
    pub correction: Option<String>,

    /// Evaluation score (0-100)
    pub evaluation: Option<f64>,
}

impl QuestionReview {
    /// Validate the evaluation range
    pub fn validate(&self) -> Result<(), ValidationError> {
        validate_optional_score("evaluation", self.evaluation)
    }
}
