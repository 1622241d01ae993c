//! Uploaded documents

use std::fmt;

/// What a document is used for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DocumentCategory {
    /// Source material for generating new questions
    Resource,

    /// Exam-style document whose questions are extracted verbatim
    Test,
}

impl DocumentCategory {
    /// Get the category name as stored
    pub fn as_str(&self) -> &'static str {
        match self {
            DocumentCategory::Resource => "RESOURCE",
            DocumentCategory::Test => "TEST",
        }
    }

    /// Parse a category (case-insensitive)
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_uppercase().as_str() {
            "RESOURCE" => Some(DocumentCategory::Resource),
            "TEST" => Some(DocumentCategory::Test),
            _ => None,
        }
    }
}

impl fmt::Display for DocumentCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for DocumentCategory {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s).ok_or_else(|| format!("Invalid document category: {}", s))
    }
}

/// A file uploaded to a project
///
/// Immutable after creation except for the cached text content, which the
/// generation pipeline fills on first successful extraction.
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    /// Unique identifier
    pub id: String,

    /// Owning project
    pub project_id: String,

    /// Original (sanitized) file name
    pub filename: String,

    /// Location of the stored file
    pub file_path: String,

    /// RESOURCE or TEST
    pub category: DocumentCategory,

    /// Cached extracted text, if any
    pub content: Option<String>,

    /// Upload time (seconds since epoch)
    pub uploaded_at: u64,
}

impl Document {
    /// Create a new document record with a fresh identifier
    pub fn new(
        project_id: impl Into<String>,
        filename: impl Into<String>,
        file_path: impl Into<String>,
        category: DocumentCategory,
    ) -> Self {
        Self {
            id: crate::new_id(),
            project_id: project_id.into(),
            filename: filename.into(),
            file_path: file_path.into(),
            category,
            content: None,
            uploaded_at: crate::unix_now(),
        }
    }

    /// Use a caller-provided identifier instead of the generated one
    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = id.into();
        self
    }
}
