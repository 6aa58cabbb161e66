//! State manager implementation
//!
//! Holds checkpoints for one invocation. Input comes from a state file or
//! inline JSON; output leaves the process as STATE messages, so nothing is
//! written back to disk here.

use super::types::{State, StreamBookmark};
use crate::error::{Error, Result};
use crate::types::{JsonValue, ReplicationKeyKind, ReplicationValue};
use std::path::Path;
use tracing::{debug, info};

/// In-memory checkpoint store with monotonic updates
#[derive(Debug, Clone, Default)]
pub struct StateManager {
    state: State,
}

impl StateManager {
    /// Create an empty state manager
    pub fn new() -> Self {
        Self::default()
    }

    /// Wrap an existing state
    pub fn with_state(state: State) -> Self {
        Self { state }
    }

    /// Load state from a file; a missing file starts from empty state
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            info!(path = %path.display(), "State file not found, starting fresh");
            return Ok(Self::new());
        }

        let contents = std::fs::read_to_string(path)
            .map_err(|e| Error::state(format!("Failed to read state file: {e}")))?;
        Self::parse(&contents, "state file")
    }

    /// Load state from an inline JSON string
    pub fn from_json(json: &str) -> Result<Self> {
        Self::parse(json, "state JSON")
    }

    fn parse(json: &str, source: &str) -> Result<Self> {
        if json.trim().is_empty() {
            return Ok(Self::new());
        }
        let state: State = serde_json::from_str(json)
            .map_err(|e| Error::state(format!("Failed to parse {source}: {e}")))?;
        debug!(streams = state.bookmarks.len(), "Loaded checkpoints");
        Ok(Self { state })
    }

    /// Current state
    pub fn state(&self) -> &State {
        &self.state
    }

    /// Checkpoint for a stream, parsed as the stream's key kind.
    ///
    /// A bookmark whose value cannot be parsed is an error rather than a
    /// silent restart from the beginning.
    pub fn get_checkpoint(
        &self,
        stream: &str,
        kind: ReplicationKeyKind,
    ) -> Result<Option<ReplicationValue>> {
        let Some(bookmark) = self.state.bookmark(stream) else {
            return Ok(None);
        };
        bookmark.value(kind).map(Some).ok_or_else(|| {
            Error::state(format!(
                "Bookmark for '{stream}' has unusable value {}",
                bookmark.replication_key_value
            ))
        })
    }

    /// Move a stream's checkpoint forward.
    ///
    /// Returns false, leaving the checkpoint untouched, when `value` is not
    /// greater than the stored one.
    pub fn advance(&mut self, stream: &str, replication_key: &str, value: &ReplicationValue) -> bool {
        if let Some(existing) = self.state.bookmarks.get(stream) {
            let current = ReplicationValue::from_json(
                &existing.replication_key_value,
                kind_of(value),
            );
            if current.is_some_and(|c| c >= *value) {
                return false;
            }
        }

        self.state.bookmarks.insert(
            stream.to_string(),
            StreamBookmark::new(replication_key, value),
        );
        true
    }

    /// State as a JSON value, for STATE messages
    pub fn to_value(&self) -> JsonValue {
        serde_json::to_value(&self.state).unwrap_or_default()
    }
}

fn kind_of(value: &ReplicationValue) -> ReplicationKeyKind {
    match value {
        ReplicationValue::Integer(_) => ReplicationKeyKind::Integer,
        ReplicationValue::DateTime(_) => ReplicationKeyKind::DateTime,
    }
}
