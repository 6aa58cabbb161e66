//! Per-run record budget
//!
//! Caps how many rows one stream run may pull. Subgraph backfills can run for
//! hours; the budget lets a run finish cleanly and resume from its checkpoint
//! on the next invocation.

use tracing::warn;

/// Tracks rows ingested by one stream run against a ceiling
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunBudget {
    ceiling: u64,
    ingested: u64,
}

impl RunBudget {
    /// Create a budget; a ceiling of 0 means unlimited
    pub fn new(ceiling: u64) -> Self {
        Self {
            ceiling,
            ingested: 0,
        }
    }

    /// A budget that never stops pagination
    pub fn unlimited() -> Self {
        Self::new(0)
    }

    /// Add the size of a fetched page
    pub fn record_ingested_count(&mut self, count: usize) {
        self.ingested = self.ingested.saturating_add(count as u64);
    }

    /// Whether the ceiling has been reached
    pub fn should_stop(&self) -> bool {
        self.ceiling > 0 && self.ingested >= self.ceiling
    }

    /// Rows ingested so far
    pub fn total(&self) -> u64 {
        self.ingested
    }

    /// The configured ceiling (0 = unlimited)
    pub fn ceiling(&self) -> u64 {
        self.ceiling
    }

    /// Log the operator-facing warning for a budget stop
    pub fn warn_exhausted(&self, stream: &str) {
        warn!(
            stream,
            ingested = self.ingested,
            ceiling = self.ceiling,
            "Limit for this run reached; re-run the tap to continue from the last checkpoint"
        );
    }
}

impl Default for RunBudget {
    fn default() -> Self {
        Self::unlimited()
    }
}
