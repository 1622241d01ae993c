//! PDF text extraction

use crate::error::TextError;
use std::path::Path;

/// Extract text page by page; every page's text is followed by a newline
pub(crate) fn extract_pdf(path: &Path) -> Result<String, TextError> {
    let doc = lopdf::Document::load(path)?;
    if doc.is_encrypted() {
        return Err(TextError::Encrypted);
    }

    let mut text = String::new();
    for page_number in doc.get_pages().keys() {
        let page_text = doc.extract_text(&[*page_number])?;
        text.push_str(&page_text);
        text.push('\n');
    }
    Ok(text)
}
