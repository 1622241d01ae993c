//! DOCX and ODT text extraction
//!
//! Both formats are ZIP containers holding an XML body. Paragraph text is
//! collected as written and paragraphs are joined with `\n`.

use crate::error::TextError;
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use std::fs::File;
use std::io::Read;
use std::path::Path;
use zip::ZipArchive;

/// Extract paragraph text from `word/document.xml`
pub(crate) fn extract_docx(path: &Path) -> Result<String, TextError> {
    let xml = read_part(path, "word/document.xml")?;
    let mut reader = Reader::from_str(&xml);

    let mut paragraphs = Vec::new();
    let mut open: Vec<String> = Vec::new();
    let mut in_run = false;
    let mut in_text = false;

    loop {
        match reader.read_event().map_err(xml_error)? {
            Event::Start(e) => match e.name().as_ref() {
                b"w:p" => open.push(String::new()),
                b"w:r" => in_run = true,
                b"w:t" => in_text = true,
                _ => {}
            },
            Event::Empty(e) => match e.name().as_ref() {
                b"w:p" => paragraphs.push(String::new()),
                b"w:tab" if in_run => push_str(&mut open, "\t"),
                b"w:br" | b"w:cr" if in_run => push_str(&mut open, "\n"),
                _ => {}
            },
            Event::Text(t) if in_text => {
                let text = t.unescape().map_err(xml_error)?;
                push_str(&mut open, &text);
            }
            Event::End(e) => match e.name().as_ref() {
                b"w:t" => in_text = false,
                b"w:r" => in_run = false,
                b"w:p" => {
                    if let Some(paragraph) = open.pop() {
                        paragraphs.push(paragraph);
                    }
                }
                _ => {}
            },
            Event::Eof => break,
            _ => {}
        }
    }

    Ok(paragraphs.join("\n"))
}

/// Extract paragraph and heading text from `content.xml`
pub(crate) fn extract_odt(path: &Path) -> Result<String, TextError> {
    let xml = read_part(path, "content.xml")?;
    let mut reader = Reader::from_str(&xml);

    let mut paragraphs = Vec::new();
    let mut open: Vec<String> = Vec::new();

    loop {
        match reader.read_event().map_err(xml_error)? {
            Event::Start(e) => {
                if is_odt_paragraph(e.name().as_ref()) {
                    open.push(String::new());
                }
            }
            Event::Empty(e) => match e.name().as_ref() {
                b"text:p" | b"text:h" => paragraphs.push(String::new()),
                b"text:s" => push_str(&mut open, &" ".repeat(space_count(&e, xml.len())?)),
                b"text:tab" => push_str(&mut open, "\t"),
                b"text:line-break" => push_str(&mut open, "\n"),
                _ => {}
            },
            Event::Text(t) if !open.is_empty() => {
                let text = t.unescape().map_err(xml_error)?;
                push_str(&mut open, &text);
            }
            Event::End(e) => {
                if is_odt_paragraph(e.name().as_ref()) {
                    if let Some(paragraph) = open.pop() {
                        paragraphs.push(paragraph);
                    }
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }

    Ok(paragraphs.join("\n"))
}

fn is_odt_paragraph(name: &[u8]) -> bool {
    name == b"text:p" || name == b"text:h"
}

/// `<text:s text:c="N"/>` stands for N spaces (default 1)
///
/// A count larger than the whole XML part cannot come from a real document
/// and is rejected.
fn space_count(e: &BytesStart<'_>, limit: usize) -> Result<usize, TextError> {
    let count = e
        .try_get_attribute("text:c")
        .ok()
        .flatten()
        .and_then(|attr| std::str::from_utf8(&attr.value).ok()?.trim().parse::<u64>().ok())
        .unwrap_or(1);
    match usize::try_from(count) {
        Ok(n) if n <= limit => Ok(n),
        _ => Err(TextError::Xml(format!(
            "text:c space count {} exceeds content size",
            count
        ))),
    }
}

fn push_str(open: &mut [String], text: &str) {
    if let Some(current) = open.last_mut() {
        current.push_str(text);
    }
}

fn read_part(path: &Path, part: &str) -> Result<String, TextError> {
    let file = File::open(path)?;
    let mut archive = ZipArchive::new(file)?;
    let mut entry = archive
        .by_name(part)
        .map_err(|_| TextError::MissingPart(part.to_string()))?;
    let mut xml = String::new();
    entry.read_to_string(&mut xml)?;
    Ok(xml)
}

fn xml_error(e: impl std::fmt::Display) -> TextError {
    TextError::Xml(e.to_string())
}
