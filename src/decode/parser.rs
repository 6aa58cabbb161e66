//! JSON envelope parsing

use crate::error::{Error, Result};
use serde_json::Value;
use tracing::warn;

/// Rows extracted from one response
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParsedPage {
    /// Raw result rows, in upstream order
    pub rows: Vec<Value>,
    /// Number of rows in the page
    pub batch_size: usize,
}

impl ParsedPage {
    /// Build a page from rows
    pub fn new(rows: Vec<Value>) -> Self {
        let batch_size = rows.len();
        Self { rows, batch_size }
    }

    /// Whether the page carried no rows
    pub fn is_empty(&self) -> bool {
        self.batch_size == 0
    }
}

/// Extracts the result array at a fixed path
#[derive(Debug, Clone)]
pub struct ResponseParser {
    records_path: String,
}

impl ResponseParser {
    /// Create a parser for the given dot-separated path (e.g. `data.orders`)
    pub fn new(records_path: impl Into<String>) -> Self {
        Self {
            records_path: records_path.into(),
        }
    }

    /// The configured records path
    pub fn records_path(&self) -> &str {
        &self.records_path
    }

    /// Parse a response body into rows
    pub fn parse(&self, body: &str) -> Result<ParsedPage> {
        let value: Value = serde_json::from_str(body).map_err(|e| {
            warn!(path = %self.records_path, body = %body, "Problem with response: not JSON");
            Error::malformed(&self.records_path, format!("Failed to parse JSON: {e}"))
        })?;
        self.parse_value(&value)
    }

    /// Parse an already decoded response
    pub fn parse_value(&self, value: &Value) -> Result<ParsedPage> {
        match extract_path(value, &self.records_path) {
            Some(Value::Array(rows)) => Ok(ParsedPage::new(rows.clone())),
            Some(other) => {
                warn!(path = %self.records_path, body = %value, "Problem with response");
                Err(Error::malformed(
                    &self.records_path,
                    format!("expected an array, found {}", type_name(other)),
                ))
            }
            None => {
                warn!(path = %self.records_path, body = %value, "Problem with response");
                Err(Error::malformed(&self.records_path, missing_message(value)))
            }
        }
    }
}

/// Follow a dot-separated path through nested objects
pub fn extract_path<'a>(value: &'a Value, path: &str) -> Option<&'a Value> {
    let path = path.strip_prefix("$.").unwrap_or(path);
    if path.is_empty() {
        return Some(value);
    }

    let mut current = value;
    for part in path.split('.') {
        match current {
            Value::Object(map) => current = map.get(part)?,
            _ => return None,
        }
    }
    Some(current)
}

/// Explain a missing path, surfacing GraphQL errors when present
fn missing_message(value: &Value) -> String {
    match value.get("errors") {
        Some(Value::Array(errors)) if !errors.is_empty() => {
            let messages: Vec<&str> = errors
                .iter()
                .filter_map(|e| e.get("message").and_then(Value::as_str))
                .collect();
            format!("path not found; upstream errors: {}", messages.join("; "))
        }
        _ => "path not found in response".to_string(),
    }
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
