//! Parse model replies into question/answer pairs

use crate::types::{GenerateParse, ParseError, QaPair};
use serde_json::Value;
use tracing::warn;

const FENCE: &str = "```";
const JSON_FENCE: &str = "```json";

/// Select the part of a reply that should hold the JSON payload
///
/// A block opened with "```json" wins; otherwise the content of the first
/// fenced block; otherwise the whole reply. An unclosed fence runs to the
/// end of the reply.
pub fn select_payload(response: &str) -> &str {
    if let Some(start) = response.find(JSON_FENCE) {
        let body = &response[start + JSON_FENCE.len()..];
        return until_fence(body).trim();
    }
    if let Some(start) = response.find(FENCE) {
        let body = &response[start + FENCE.len()..];
        return until_fence(body).trim();
    }
    response
}

fn until_fence(body: &str) -> &str {
    match body.find(FENCE) {
        Some(end) => &body[..end],
        None => body,
    }
}

/// Parse a reply to a generate prompt
///
/// Falls back to a heuristic split only when the payload is not JSON at all
/// and the reply mentions both "question" and "answer". Well-formed JSON of
/// the wrong shape is rejected as is.
pub fn parse_generate_response(response: &str) -> Result<GenerateParse, ParseError> {
    let payload = select_payload(response);

    let structured_error = match parse_json(payload).and_then(|v| pair_from_object(&v, 0, true)) {
        Ok(pair) => return Ok(GenerateParse::Structured(pair)),
        Err(e @ ParseError::Malformed(_)) => e,
        // Well-formed JSON is final
        Err(e) => return Err(e),
    };

    if response.contains("question") && response.contains("answer") {
        let source = if payload.contains("answer") { payload } else { response };
        let pair = heuristic_split(source)?;
        warn!(
            "Reply was not valid JSON ({}); using heuristic question/answer split",
            structured_error
        );
        return Ok(GenerateParse::Heuristic(pair));
    }

    Err(structured_error)
}

/// Parse a reply to an extract prompt
///
/// Accepts a JSON array of objects, or a single object treated as a
/// one-element array. Order is preserved. A missing answer becomes "".
pub fn parse_extract_response(response: &str) -> Result<Vec<QaPair>, ParseError> {
    let json = parse_json(select_payload(response))?;

    match json {
        Value::Array(items) => items
            .iter()
            .enumerate()
            .map(|(index, item)| pair_from_object(item, index, false))
            .collect(),
        object @ Value::Object(_) => Ok(vec![pair_from_object(&object, 0, false)?]),
        other => Err(ParseError::Shape(format!(
            "expected a JSON array or object, got {}",
            json_kind(&other)
        ))),
    }
}

fn parse_json(payload: &str) -> Result<Value, ParseError> {
    serde_json::from_str(payload).map_err(|e| ParseError::Malformed(e.to_string()))
}

fn pair_from_object(value: &Value, index: usize, answer_required: bool) -> Result<QaPair, ParseError> {
    let obj = value.as_object().ok_or_else(|| {
        ParseError::Shape(format!("item {} is {}, not an object", index, json_kind(value)))
    })?;

    let question = obj
        .get("question")
        .and_then(Value::as_str)
        .ok_or_else(|| ParseError::Shape(format!("item {}: missing or invalid 'question'", index)))?
        .trim();
    if question.is_empty() {
        return Err(ParseError::EmptyQuestion { index });
    }

    let answer = match obj.get("answer") {
        Some(Value::String(s)) => s.trim().to_string(),
        Some(Value::Number(n)) => n.to_string(),
        Some(Value::Bool(b)) => b.to_string(),
        None | Some(Value::Null) if !answer_required => String::new(),
        _ => {
            return Err(ParseError::Shape(format!(
                "item {}: missing or invalid 'answer'",
                index
            )))
        }
    };

    Ok(QaPair::new(question, answer))
}

/// Split free text once on "answer" and strip the labels around each half
fn heuristic_split(text: &str) -> Result<QaPair, ParseError> {
    let (before, after) = text
        .split_once("answer")
        .ok_or_else(|| ParseError::Shape("no 'answer' label to split on".to_string()))?;

    let question = strip_label(before, "question");
    if question.is_empty() {
        return Err(ParseError::EmptyQuestion { index: 0 });
    }
    Ok(QaPair::new(question, strip_label(after, "")))
}

fn strip_label(part: &str, label: &str) -> String {
    let is_noise = |c: char| c.is_whitespace() || matches!(c, ':' | '"' | '\'' | '{' | '}' | ',');
    let trimmed = part.trim_matches(is_noise);
    let trimmed = if label.is_empty() {
        trimmed
    } else {
        trimmed
            .strip_prefix(label)
            .or_else(|| trimmed.strip_prefix(&capitalize(label)))
            .unwrap_or(trimmed)
    };
    trimmed.trim_matches(is_noise).to_string()
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
