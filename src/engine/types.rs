//! Engine types
//!
//! Output messages, the sink they are written to, and run statistics.

use crate::error::Result;
use crate::pagination::StopReason;
use crate::streams::StreamDefinition;
use crate::types::{JsonObject, JsonValue};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::io::Write;

/// A message emitted during sync, in the Singer wire shape
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "UPPERCASE")]
pub enum Message {
    /// Stream schema, sent before the stream's first record
    Schema {
        stream: String,
        schema: JsonValue,
        key_properties: Vec<String>,
        #[serde(skip_serializing_if = "Vec::is_empty")]
        bookmark_properties: Vec<String>,
    },
    /// One post-processed, validated record
    Record {
        stream: String,
        record: JsonObject,
        time_extracted: DateTime<Utc>,
    },
    /// Checkpoint state for the harness to persist
    State { value: JsonValue },
}

impl Message {
    /// Schema message for a stream definition
    pub fn schema(def: &StreamDefinition) -> Self {
        Self::Schema {
            stream: def.name.to_string(),
            schema: (def.schema)().to_json_schema().to_json(),
            key_properties: def.primary_keys.iter().map(|k| (*k).to_string()).collect(),
            bookmark_properties: def
                .replication_key()
                .map(|k| vec![k.to_string()])
                .unwrap_or_default(),
        }
    }

    /// Create a record message stamped with the current time
    pub fn record(stream: impl Into<String>, record: JsonObject) -> Self {
        Self::Record {
            stream: stream.into(),
            record,
            time_extracted: Utc::now(),
        }
    }

    /// Create a state message
    pub fn state(value: JsonValue) -> Self {
        Self::State { value }
    }

    /// Stream the message belongs to; state messages cover all streams
    pub fn stream(&self) -> Option<&str> {
        match self {
            Self::Schema { stream, .. } | Self::Record { stream, .. } => Some(stream),
            Self::State { .. } => None,
        }
    }

    pub fn is_schema(&self) -> bool {
        matches!(self, Self::Schema { .. })
    }

    pub fn is_record(&self) -> bool {
        matches!(self, Self::Record { .. })
    }

    pub fn is_state(&self) -> bool {
        matches!(self, Self::State { .. })
    }
}

// ============================================================================
// Sinks
// ============================================================================

/// Destination for emitted messages
pub trait MessageSink {
    fn emit(&mut self, message: Message) -> Result<()>;
}

/// Collects messages in memory
impl MessageSink for Vec<Message> {
    fn emit(&mut self, message: Message) -> Result<()> {
        self.push(message);
        Ok(())
    }
}

/// Writes one JSON document per line
pub struct JsonLinesSink<W: Write> {
    writer: W,
}

impl<W: Write> JsonLinesSink<W> {
    pub fn new(writer: W) -> Self {
        Self { writer }
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write> MessageSink for JsonLinesSink<W> {
    fn emit(&mut self, message: Message) -> Result<()> {
        serde_json::to_writer(&mut self.writer, &message)?;
        self.writer.write_all(b"\n")?;
        // State must reach the harness before the next page is requested
        if message.is_state() {
            self.writer.flush()?;
        }
        Ok(())
    }
}

// ============================================================================
// Outcomes and Statistics
// ============================================================================

/// Result of one stream run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreamOutcome {
    pub stream: String,
    pub records_emitted: u64,
    pub duplicates_skipped: u64,
    pub pages: u32,
    /// Child runs driven by this stream's records
    pub child_runs: u32,
    /// Records those child runs emitted
    pub child_records: u64,
    pub stop_reason: Option<StopReason>,
}

impl StreamOutcome {
    pub fn new(stream: impl Into<String>) -> Self {
        Self {
            stream: stream.into(),
            records_emitted: 0,
            duplicates_skipped: 0,
            pages: 0,
            child_runs: 0,
            child_records: 0,
            stop_reason: None,
        }
    }

    /// Whether the run stopped with data left upstream
    pub fn is_truncated(&self) -> bool {
        self.stop_reason.is_some_and(|r| r.is_truncating())
    }
}

/// Statistics across every stream of a run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncStats {
    pub records_emitted: u64,
    pub pages_fetched: u64,
    pub streams_synced: u64,
    pub duplicates_skipped: u64,
    pub child_runs: u64,
    pub duration_ms: u64,
}

impl SyncStats {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold a top-level stream's outcome into the totals
    pub fn add_outcome(&mut self, outcome: &StreamOutcome) {
        self.records_emitted += outcome.records_emitted + outcome.child_records;
        self.pages_fetched += u64::from(outcome.pages);
        self.duplicates_skipped += outcome.duplicates_skipped;
        self.child_runs += u64::from(outcome.child_runs);
        self.streams_synced += 1;
    }

    pub fn set_duration(&mut self, ms: u64) {
        self.duration_ms = ms;
    }
}
