//! Common types used throughout the tap
//!
//! Shared type aliases plus the replication value type that pagination,
//! checkpointing, and the stream driver all agree on.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::cmp::Ordering;
use std::fmt;

// ============================================================================
// Type Aliases
// ============================================================================

/// JSON value type (re-exported from serde_json)
pub type JsonValue = serde_json::Value;

/// JSON object type
pub type JsonObject = serde_json::Map<String, JsonValue>;

/// Whether a JSON number is a whole integer, however wide
pub fn is_integer_number(n: &serde_json::Number) -> bool {
    if n.is_i64() || n.is_u64() {
        return true;
    }
    let text = n.to_string();
    let digits = text.strip_prefix('-').unwrap_or(&text);
    !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit())
}

// ============================================================================
// HTTP Types
// ============================================================================

/// HTTP method used by a stream request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Method {
    #[default]
    GET,
    POST,
}

impl From<Method> for reqwest::Method {
    fn from(method: Method) -> Self {
        match method {
            Method::GET => reqwest::Method::GET,
            Method::POST => reqwest::Method::POST,
        }
    }
}

// ============================================================================
// Replication Values
// ============================================================================

/// How a stream's replication key is represented upstream
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReplicationKeyKind {
    /// Unix seconds, usually sent by subgraphs as a big-integer string
    #[default]
    Integer,
    /// ISO-8601 / RFC 3339 timestamp string
    DateTime,
}

/// A value of a replication key, ordered within one kind
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ReplicationValue {
    /// Integer key (e.g. `updatedAt`)
    Integer(i64),
    /// Timestamp key
    DateTime(DateTime<Utc>),
}

impl ReplicationValue {
    /// Parse a replication value from a JSON value of the given kind
    pub fn from_json(value: &Value, kind: ReplicationKeyKind) -> Option<Self> {
        match (kind, value) {
            (ReplicationKeyKind::Integer, Value::Number(n)) => n.as_i64().map(Self::Integer),
            (ReplicationKeyKind::Integer, Value::String(s)) => {
                s.trim().parse::<i64>().ok().map(Self::Integer)
            }
            (ReplicationKeyKind::DateTime, Value::String(s)) => DateTime::parse_from_rfc3339(s)
                .ok()
                .map(|dt| Self::DateTime(dt.with_timezone(&Utc))),
            _ => None,
        }
    }

    /// JSON representation used as a request variable and in bookmarks
    pub fn to_json(&self) -> Value {
        match self {
            Self::Integer(i) => Value::from(*i),
            Self::DateTime(dt) => Value::String(dt.to_rfc3339()),
        }
    }
}

impl PartialOrd for ReplicationValue {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for ReplicationValue {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (Self::Integer(a), Self::Integer(b)) => a.cmp(b),
            (Self::DateTime(a), Self::DateTime(b)) => a.cmp(b),
            (Self::Integer(a), Self::DateTime(b)) => a.cmp(&b.timestamp()),
            (Self::DateTime(a), Self::Integer(b)) => a.timestamp().cmp(b),
        }
    }
}

impl fmt::Display for ReplicationValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Integer(i) => write!(f, "{i}"),
            Self::DateTime(dt) => write!(f, "{}", dt.to_rfc3339()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_method_conversion() {
        let get: reqwest::Method = Method::GET.into();
        assert_eq!(reqwest::Method::GET, get);
        let post: reqwest::Method = Method::POST.into();
        assert_eq!(reqwest::Method::POST, post);
    }

    #[test]
    fn test_integer_value_from_string_and_number() {
        let kind = ReplicationKeyKind::Integer;
        assert_eq!(
            ReplicationValue::from_json(&json!("1650000000"), kind),
            Some(ReplicationValue::Integer(1_650_000_000))
        );
        assert_eq!(
            ReplicationValue::from_json(&json!(42), kind),
            Some(ReplicationValue::Integer(42))
        );
        assert_eq!(ReplicationValue::from_json(&json!("abc"), kind), None);
        assert_eq!(ReplicationValue::from_json(&json!(null), kind), None);
    }

    #[test]
    fn test_datetime_value_ordering() {
        let kind = ReplicationKeyKind::DateTime;
        let a = ReplicationValue::from_json(&json!("2023-01-01T00:00:00Z"), kind).unwrap();
        let b = ReplicationValue::from_json(&json!("2023-01-01T00:00:01+00:00"), kind).unwrap();
        assert!(a < b);
        assert_eq!(a.to_json(), json!("2023-01-01T00:00:00+00:00"));
    }

    #[test]
    fn test_integer_ordering_is_numeric() {
        // "9" < "10" numerically even though it sorts after as text
        let nine = ReplicationValue::from_json(&json!("9"), ReplicationKeyKind::Integer).unwrap();
        let ten = ReplicationValue::from_json(&json!("10"), ReplicationKeyKind::Integer).unwrap();
        assert!(nine < ten);
        assert_eq!(ten.to_string(), "10");
    }
}
