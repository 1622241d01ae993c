//! Error types for text extraction

use thiserror::Error;

/// Errors raised while reading a document
///
/// These never leave the crate's public [`extract`](crate::extract) function;
/// they are rendered into an extraction failure reason.
#[derive(Error, Debug)]
pub enum TextError {
    /// File could not be read
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Plain text file is not valid UTF-8
    #[error("invalid UTF-8: {0}")]
    Utf8(#[from] std::string::FromUtf8Error),

    /// PDF structure could not be parsed
    #[error("PDF error: {0}")]
    Pdf(#[from] lopdf::Error),

    /// PDF is password protected
    #[error("PDF is password protected")]
    Encrypted,

    /// Office container is not a readable ZIP archive
    #[error("archive error: {0}")]
    Zip(#[from] zip::result::ZipError),

    /// Office XML could not be parsed
    #[error("XML error: {0}")]
    Xml(String),

    /// Required part missing from the container
    #[error("missing part: {0}")]
    MissingPart(String),
}
