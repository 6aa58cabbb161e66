//! Parent-supplied context for child streams

use crate::types::{JsonObject, JsonValue};
use std::fmt;

/// Values a parent record hands to its child stream run
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StreamContext {
    values: JsonObject,
}

impl StreamContext {
    /// An empty context, used by top-level streams
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_pairs<I, K>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, JsonValue)>,
        K: Into<String>,
    {
        Self {
            values: pairs.into_iter().map(|(k, v)| (k.into(), v)).collect(),
        }
    }

    pub fn get(&self, key: &str) -> Option<&JsonValue> {
        self.values.get(key)
    }

    /// String value for `key`, if present and a string
    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.values.get(key).and_then(JsonValue::as_str)
    }

    pub fn insert(&mut self, key: impl Into<String>, value: JsonValue) {
        self.values.insert(key.into(), value);
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Context as a JSON object, for logging and templates
    pub fn to_value(&self) -> JsonValue {
        JsonValue::Object(self.values.clone())
    }
}

impl fmt::Display for StreamContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", JsonValue::Object(self.values.clone()))
    }
}
