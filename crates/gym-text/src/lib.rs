//! Learning Gym Text Extraction
//!
//! Turns an uploaded document into plain text for the question pipeline.
//!
//! # Supported formats
//!
//! Detected by file extension, case-insensitively:
//!
//! - `.txt`: raw bytes decoded as UTF-8
//! - `.pdf`: per-page text, each page followed by a newline
//! - `.docx`: paragraph text joined with newlines
//! - `.odt`: paragraph text joined with newlines
//!
//! Text is returned as-is, without whitespace normalization, so questions
//! extracted verbatim can be located again in the source.
//!
//! # Examples
//!
//! ```no_run
//! use gym_text::{extract, ExtractionResult};
//!
//! match extract("uploads/p1/notes.txt") {
//!     ExtractionResult::Text(text) => println!("{} chars", text.len()),
//!     ExtractionResult::Failure(reason) => eprintln!("{}", reason),
//! }
//! ```

#![warn(missing_docs)]

mod error;
mod office;
mod pdf;

pub use error::TextError;

use std::fmt;
use std::path::Path;
use tracing::debug;

/// File formats the extractor understands
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentFormat {
    /// Plain UTF-8 text
    Txt,
    /// Portable Document Format
    Pdf,
    /// Office Open XML word-processing document
    Docx,
    /// OpenDocument text
    Odt,
}

impl DocumentFormat {
    /// Detect the format from a lower-cased extension without the dot
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext {
            "txt" => Some(DocumentFormat::Txt),
            "pdf" => Some(DocumentFormat::Pdf),
            "docx" => Some(DocumentFormat::Docx),
            "odt" => Some(DocumentFormat::Odt),
            _ => None,
        }
    }
}

/// Why extraction produced no text
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExtractionFailure {
    /// Extension not handled; carries the extension with its dot (may be empty)
    UnsupportedFormat(String),

    /// Reading or decoding the file failed
    Error(String),
}

impl fmt::Display for ExtractionFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExtractionFailure::UnsupportedFormat(ext) => write!(f, "unsupported format: {}", ext),
            ExtractionFailure::Error(detail) => write!(f, "extraction error: {}", detail),
        }
    }
}

/// Outcome of extracting a document: text or a failure, never both
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExtractionResult {
    /// Extracted plain text
    Text(String),

    /// Extraction failed
    Failure(ExtractionFailure),
}

impl ExtractionResult {
    /// Whether text was extracted
    pub fn is_text(&self) -> bool {
        matches!(self, ExtractionResult::Text(_))
    }

    /// Borrow the text, if any
    pub fn text(&self) -> Option<&str> {
        match self {
            ExtractionResult::Text(text) => Some(text),
            ExtractionResult::Failure(_) => None,
        }
    }

    /// Convert into a standard `Result`
    pub fn into_result(self) -> Result<String, ExtractionFailure> {
        match self {
            ExtractionResult::Text(text) => Ok(text),
            ExtractionResult::Failure(failure) => Err(failure),
        }
    }
}

/// Extract the plain text of the file at `path`
///
/// Never panics and never returns an error type: every I/O or parse problem
/// becomes [`ExtractionResult::Failure`].
pub fn extract(path: impl AsRef<Path>) -> ExtractionResult {
    let path = path.as_ref();
    let ext = path
        .extension()
        .and_then(|s| s.to_str())
        .unwrap_or("")
        .to_lowercase();

    let Some(format) = DocumentFormat::from_extension(&ext) else {
        let shown = if ext.is_empty() { String::new() } else { format!(".{}", ext) };
        return ExtractionResult::Failure(ExtractionFailure::UnsupportedFormat(shown));
    };

    debug!("Extracting {:?} text from {}", format, path.display());

    match extract_format(path, format) {
        Ok(text) => ExtractionResult::Text(text),
        Err(e) => ExtractionResult::Failure(ExtractionFailure::Error(format!(
            "{}: {}",
            path.display(),
            e
        ))),
    }
}

fn extract_format(path: &Path, format: DocumentFormat) -> Result<String, TextError> {
    match format {
        DocumentFormat::Txt => {
            let bytes = std::fs::read(path)?;
            Ok(String::from_utf8(bytes)?)
        }
        DocumentFormat::Pdf => pdf::extract_pdf(path),
        DocumentFormat::Docx => office::extract_docx(path),
        DocumentFormat::Odt => office::extract_odt(path),
    }
}
