//! Boundary duplicate filtering
//!
//! Subgraph pagination is not transactional: an inclusive `_gte` timestamp
//! filter re-returns every row that shares the boundary value of the previous
//! page. The filter remembers primary-key composites for one stream run and
//! drops rows already emitted.

use crate::error::{Error, Result};
use crate::types::JsonObject;
use serde_json::Value;
use std::collections::HashSet;

/// Separator between primary-key values in a composite
pub const KEY_SEPARATOR: &str = "|";

/// Build the primary-key composite of a record, in declaration order
pub fn composite_key(record: &JsonObject, primary_keys: &[&str]) -> Result<String> {
    let mut parts = Vec::with_capacity(primary_keys.len());
    for key in primary_keys {
        let part = match record.get(*key) {
            Some(Value::String(s)) => s.clone(),
            Some(Value::Number(n)) => n.to_string(),
            Some(Value::Bool(b)) => b.to_string(),
            Some(other) => {
                return Err(Error::post_processing(format!(
                    "primary key '{key}' is not a scalar: {other}"
                )))
            }
            None => {
                return Err(Error::post_processing(format!(
                    "primary key '{key}' missing from record"
                )))
            }
        };
        parts.push(part);
    }
    Ok(parts.join(KEY_SEPARATOR))
}

/// Set of composites seen during one stream run
#[derive(Debug, Clone, Default)]
pub struct DuplicateFilter {
    enabled: bool,
    seen: HashSet<String>,
    skipped: u64,
}

impl DuplicateFilter {
    /// A filter that drops re-seen composites
    pub fn enabled() -> Self {
        Self {
            enabled: true,
            ..Default::default()
        }
    }

    /// A no-op filter, for streams where overlap cannot happen
    pub fn disabled() -> Self {
        Self::default()
    }

    /// Build a filter from a stream's dedupe flag
    pub fn for_stream(dedupe: bool) -> Self {
        if dedupe {
            Self::enabled()
        } else {
            Self::disabled()
        }
    }

    /// Whether this filter does anything
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Whether the composite was already remembered
    pub fn is_duplicate(&self, composite: &str) -> bool {
        self.enabled && self.seen.contains(composite)
    }

    /// Remember an emitted composite
    pub fn remember(&mut self, composite: String) {
        if self.enabled {
            self.seen.insert(composite);
        }
    }

    /// Returns true if the composite is new (and remembers it), false if it
    /// should be skipped
    pub fn check_and_remember(&mut self, composite: &str) -> bool {
        if !self.enabled {
            return true;
        }
        if self.seen.insert(composite.to_string()) {
            true
        } else {
            self.skipped += 1;
            false
        }
    }

    /// Number of rows rejected so far
    pub fn skipped(&self) -> u64 {
        self.skipped
    }

    /// Number of distinct composites remembered
    pub fn len(&self) -> usize {
        self.seen.len()
    }

    /// Whether nothing has been remembered
    pub fn is_empty(&self) -> bool {
        self.seen.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn obj(value: Value) -> JsonObject {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn test_composite_key_declaration_order() {
        let record = obj(json!({"updatedAt": "123", "id": "0xabc"}));
        assert_eq!(composite_key(&record, &["id"]).unwrap(), "0xabc");
        assert_eq!(
            composite_key(&record, &["id", "updatedAt"]).unwrap(),
            "0xabc|123"
        );
        assert_eq!(
            composite_key(&record, &["updatedAt", "id"]).unwrap(),
            "123|0xabc"
        );
    }

    #[test]
    fn test_composite_key_numbers() {
        let record = obj(json!({"id": "x", "block": 42}));
        assert_eq!(composite_key(&record, &["id", "block"]).unwrap(), "x|42");
    }

    #[test]
    fn test_composite_key_missing_field() {
        let record = obj(json!({"id": "x"}));
        let err = composite_key(&record, &["rowId"]).unwrap_err();
        assert!(err.to_string().contains("rowId"));
    }

    #[test]
    fn test_enabled_filter_drops_reseen_rows() {
        let mut filter = DuplicateFilter::enabled();
        assert!(filter.check_and_remember("a"));
        assert!(filter.check_and_remember("b"));
        assert!(!filter.check_and_remember("a"));
        assert!(!filter.check_and_remember("a"));

        assert!(filter.is_duplicate("b"));
        assert!(!filter.is_duplicate("c"));
        assert_eq!(filter.skipped(), 2);
        assert_eq!(filter.len(), 2);
    }

    #[test]
    fn test_is_duplicate_then_remember() {
        let mut filter = DuplicateFilter::enabled();
        assert!(!filter.is_duplicate("k"));
        filter.remember("k".to_string());
        assert!(filter.is_duplicate("k"));
    }

    #[test]
    fn test_disabled_filter_is_noop() {
        let mut filter = DuplicateFilter::for_stream(false);
        assert!(!filter.is_enabled());
        assert!(filter.check_and_remember("a"));
        assert!(filter.check_and_remember("a"));
        filter.remember("a".to_string());
        assert!(!filter.is_duplicate("a"));
        assert!(filter.is_empty());
        assert_eq!(filter.skipped(), 0);
    }

    #[test]
    fn test_new_run_starts_empty() {
        let mut first = DuplicateFilter::enabled();
        assert!(first.check_and_remember("a"));

        // A resumed run may re-emit: filters are never shared across runs
        let mut second = DuplicateFilter::enabled();
        assert!(second.check_and_remember("a"));
    }
}
