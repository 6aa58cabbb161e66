//! Pagination strategy implementations
//!
//! Each strategy handles a specific upstream paging pattern.

use super::types::{NextPage, PageToken, PaginationState, Paginator, StopReason};
use crate::budget::RunBudget;
use crate::error::{Error, Result};
use crate::types::{ReplicationKeyKind, ReplicationValue};
use serde_json::Value;
use tracing::debug;

/// Rows requested per page
pub const DEFAULT_PAGE_SIZE: u64 = 1000;

/// Largest `skip` subgraph deployments accept
pub const DEFAULT_OFFSET_CEILING: u64 = 5000;

// ============================================================================
// Offset Pagination
// ============================================================================

/// Offset-based pagination with an upstream skip ceiling
///
/// Rows past the ceiling are unreachable through this strategy; the run
/// stops cleanly when the next offset would reach it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OffsetPaginator {
    /// Rows per page
    pub page_size: u64,
    /// Exclusive upper bound for the offset token
    pub ceiling: u64,
}

impl OffsetPaginator {
    pub const fn new(page_size: u64, ceiling: u64) -> Self {
        Self { page_size, ceiling }
    }
}

impl Default for OffsetPaginator {
    fn default() -> Self {
        Self::new(DEFAULT_PAGE_SIZE, DEFAULT_OFFSET_CEILING)
    }
}

impl Paginator for OffsetPaginator {
    fn first_token(&self, _start: Option<ReplicationValue>) -> PageToken {
        PageToken::Offset(0)
    }

    fn process_page(
        &self,
        rows: &[Value],
        state: &mut PaginationState,
        budget: &mut RunBudget,
    ) -> Result<NextPage> {
        state.record_page(rows.len());
        budget.record_ingested_count(rows.len());

        let offset = state.token.as_offset().unwrap_or(0);
        let next = if rows.is_empty() {
            NextPage::Done(StopReason::EmptyPage)
        } else if (rows.len() as u64) < self.page_size {
            NextPage::Done(StopReason::ShortPage)
        } else if budget.should_stop() {
            NextPage::Done(StopReason::BudgetExhausted)
        } else {
            let next_offset = offset + self.page_size;
            if next_offset >= self.ceiling {
                NextPage::Done(StopReason::OffsetCeiling)
            } else {
                NextPage::Continue(PageToken::Offset(next_offset))
            }
        };

        debug!(offset, batch = rows.len(), next = ?next, "Offset page processed");
        Ok(state.apply(next))
    }
}

// ============================================================================
// Timestamp Pagination
// ============================================================================

/// Inclusive cursor over a monotone replication key
///
/// Requests carry `key_gte: token`. Rows arrive sorted ascending, so the
/// boundary value is re-served on the next page and dropped by the
/// duplicate filter downstream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimestampPaginator {
    /// Field holding the replication value in each row
    pub replication_key: &'static str,
    /// How that field is encoded
    pub kind: ReplicationKeyKind,
}

impl TimestampPaginator {
    pub const fn new(replication_key: &'static str, kind: ReplicationKeyKind) -> Self {
        Self {
            replication_key,
            kind,
        }
    }

    /// Integer-keyed cursor, the common subgraph case
    pub const fn integer(replication_key: &'static str) -> Self {
        Self::new(replication_key, ReplicationKeyKind::Integer)
    }

    fn value_of(&self, row: &Value) -> Result<ReplicationValue> {
        let raw = row.get(self.replication_key).ok_or_else(|| {
            Error::malformed(
                self.replication_key,
                format!("row missing replication key '{}'", self.replication_key),
            )
        })?;
        ReplicationValue::from_json(raw, self.kind).ok_or_else(|| {
            Error::malformed(
                self.replication_key,
                format!("unparseable replication value {raw}"),
            )
        })
    }

    fn zero(&self) -> ReplicationValue {
        match self.kind {
            ReplicationKeyKind::Integer => ReplicationValue::Integer(0),
            ReplicationKeyKind::DateTime => {
                ReplicationValue::DateTime(chrono::DateTime::<chrono::Utc>::default())
            }
        }
    }
}

impl Paginator for TimestampPaginator {
    fn first_token(&self, start: Option<ReplicationValue>) -> PageToken {
        PageToken::Timestamp(start.unwrap_or_else(|| self.zero()))
    }

    fn process_page(
        &self,
        rows: &[Value],
        state: &mut PaginationState,
        budget: &mut RunBudget,
    ) -> Result<NextPage> {
        state.record_page(rows.len());
        budget.record_ingested_count(rows.len());

        for row in rows {
            let value = self.value_of(row)?;
            state.observe(value);
        }

        let previous = state.token.as_timestamp().cloned();
        let next = if rows.is_empty() {
            NextPage::Done(StopReason::EmptyPage)
        } else {
            match (&state.latest_seen, &previous) {
                (Some(latest), Some(prev)) if latest <= prev => {
                    NextPage::Done(StopReason::NoProgress)
                }
                _ if budget.should_stop() => NextPage::Done(StopReason::BudgetExhausted),
                (Some(latest), _) => NextPage::Continue(PageToken::Timestamp(latest.clone())),
                (None, _) => NextPage::Done(StopReason::EmptyPage),
            }
        };

        debug!(
            key = self.replication_key,
            batch = rows.len(),
            latest = ?state.latest_seen,
            next = ?next,
            "Timestamp page processed"
        );
        Ok(state.apply(next))
    }
}

// ============================================================================
// Single-Row Lookups
// ============================================================================

/// Point-in-time lookup: exactly one page, whatever it holds
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SingleRowPaginator;

impl Paginator for SingleRowPaginator {
    fn first_token(&self, _start: Option<ReplicationValue>) -> PageToken {
        PageToken::Single
    }

    fn process_page(
        &self,
        rows: &[Value],
        state: &mut PaginationState,
        budget: &mut RunBudget,
    ) -> Result<NextPage> {
        state.record_page(rows.len());
        budget.record_ingested_count(rows.len());
        Ok(state.apply(NextPage::Done(StopReason::SingleRow)))
    }
}

// ============================================================================
// Strategy Dispatch
// ============================================================================

/// The pagination strategy a stream is declared with
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PaginationStrategy {
    Offset(OffsetPaginator),
    Timestamp(TimestampPaginator),
    SingleRow(SingleRowPaginator),
}

impl PaginationStrategy {
    /// Offset paging with the default page size and ceiling
    pub const fn offset() -> Self {
        Self::Offset(OffsetPaginator::new(DEFAULT_PAGE_SIZE, DEFAULT_OFFSET_CEILING))
    }

    /// Integer-keyed timestamp paging
    pub const fn timestamp(replication_key: &'static str) -> Self {
        Self::Timestamp(TimestampPaginator::integer(replication_key))
    }

    /// Single-row lookup
    pub const fn single_row() -> Self {
        Self::SingleRow(SingleRowPaginator)
    }

    /// Replication key, for timestamp streams
    pub fn replication_key(&self) -> Option<&'static str> {
        match self {
            Self::Timestamp(t) => Some(t.replication_key),
            _ => None,
        }
    }

    /// Replication key encoding, for timestamp streams
    pub fn replication_kind(&self) -> Option<ReplicationKeyKind> {
        match self {
            Self::Timestamp(t) => Some(t.kind),
            _ => None,
        }
    }

    /// Rows requested per page, where the strategy sends a page size
    pub fn page_size(&self) -> u64 {
        match self {
            Self::Offset(o) => o.page_size,
            Self::Timestamp(_) => DEFAULT_PAGE_SIZE,
            Self::SingleRow(_) => 1,
        }
    }

    /// Short name used in logs and discovery output
    pub fn name(&self) -> &'static str {
        match self {
            Self::Offset(_) => "offset",
            Self::Timestamp(_) => "timestamp",
            Self::SingleRow(_) => "single_row",
        }
    }
}

impl Paginator for PaginationStrategy {
    fn first_token(&self, start: Option<ReplicationValue>) -> PageToken {
        match self {
            Self::Offset(p) => p.first_token(start),
            Self::Timestamp(p) => p.first_token(start),
            Self::SingleRow(p) => p.first_token(start),
        }
    }

    fn process_page(
        &self,
        rows: &[Value],
        state: &mut PaginationState,
        budget: &mut RunBudget,
    ) -> Result<NextPage> {
        match self {
            Self::Offset(p) => p.process_page(rows, state, budget),
            Self::Timestamp(p) => p.process_page(rows, state, budget),
            Self::SingleRow(p) => p.process_page(rows, state, budget),
        }
    }
}
