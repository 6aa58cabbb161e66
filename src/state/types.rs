//! Checkpoint types
//!
//! Serialized in the bookmark shape downstream loaders persist:
//! `{"bookmarks": {"<stream>": {"replication_key": ..., "replication_key_value": ...}}}`

use crate::types::{JsonValue, ReplicationKeyKind, ReplicationValue};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Checkpoint state across all streams
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct State {
    /// Per-stream bookmarks
    #[serde(default)]
    pub bookmarks: BTreeMap<String, StreamBookmark>,
}

impl State {
    /// Create a new empty state
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the bookmark for a stream
    pub fn bookmark(&self, stream: &str) -> Option<&StreamBookmark> {
        self.bookmarks.get(stream)
    }

    /// Whether any stream has a bookmark
    pub fn is_empty(&self) -> bool {
        self.bookmarks.is_empty()
    }
}

/// Checkpoint for one stream
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StreamBookmark {
    /// Field the value was read from
    pub replication_key: String,
    /// Highest value emitted so far, as loaded or written
    pub replication_key_value: JsonValue,
}

impl StreamBookmark {
    pub fn new(replication_key: impl Into<String>, value: &ReplicationValue) -> Self {
        Self {
            replication_key: replication_key.into(),
            replication_key_value: value.to_json(),
        }
    }

    /// Parse the stored value as the given kind
    pub fn value(&self, kind: ReplicationKeyKind) -> Option<ReplicationValue> {
        ReplicationValue::from_json(&self.replication_key_value, kind)
    }
}
