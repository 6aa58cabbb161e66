//! Pagination types and traits
//!
//! Defines the core pagination abstractions used by all strategies.

use crate::budget::RunBudget;
use crate::error::Result;
use crate::types::ReplicationValue;
use serde_json::Value;
use std::fmt;

/// Where the next request resumes
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PageToken {
    /// Row offset for `skip`-style paging
    Offset(u64),
    /// Inclusive lower bound on the replication key
    Timestamp(ReplicationValue),
    /// Point-in-time lookups carry no token
    Single,
}

impl PageToken {
    /// Offset value, if this is an offset token
    pub fn as_offset(&self) -> Option<u64> {
        match self {
            Self::Offset(offset) => Some(*offset),
            _ => None,
        }
    }

    /// Replication value, if this is a timestamp token
    pub fn as_timestamp(&self) -> Option<&ReplicationValue> {
        match self {
            Self::Timestamp(value) => Some(value),
            _ => None,
        }
    }
}

impl fmt::Display for PageToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Offset(offset) => write!(f, "offset {offset}"),
            Self::Timestamp(value) => write!(f, "from {value}"),
            Self::Single => write!(f, "single"),
        }
    }
}

/// Why pagination finished
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    /// The last page had no rows
    EmptyPage,
    /// The last page was shorter than the page size
    ShortPage,
    /// The next offset would pass the upstream skip ceiling
    OffsetCeiling,
    /// The replication key did not advance past the previous token
    NoProgress,
    /// The run budget was exhausted
    BudgetExhausted,
    /// Single-row lookups fetch exactly one page
    SingleRow,
}

impl StopReason {
    /// Whether the stop leaves data unread upstream
    pub fn is_truncating(&self) -> bool {
        matches!(self, Self::OffsetCeiling | Self::BudgetExhausted)
    }
}

/// Result of the next page computation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NextPage {
    /// Fetch another page with this token
    Continue(PageToken),
    /// No more pages
    Done(StopReason),
}

impl NextPage {
    /// Check if this is a done result
    pub fn is_done(&self) -> bool {
        matches!(self, Self::Done(_))
    }

    /// Check if this is a continue result
    pub fn is_continue(&self) -> bool {
        matches!(self, Self::Continue(_))
    }
}

/// Lifecycle of one paginated run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PagerPhase {
    /// Nothing fetched yet
    AwaitingFirstPage,
    /// At least one page processed, more to come
    Fetching,
    /// Terminal
    Done(StopReason),
}

/// Tracks pagination state during one stream run
#[derive(Debug, Clone)]
pub struct PaginationState {
    /// Token for the request about to be sent
    pub token: PageToken,
    /// Current phase
    pub phase: PagerPhase,
    /// Pages processed
    pub pages: u32,
    /// Rows in the most recent page
    pub last_batch_size: usize,
    /// Rows across all pages of this run
    pub total_fetched: u64,
    /// Highest replication value seen in this run
    pub latest_seen: Option<ReplicationValue>,
}

impl PaginationState {
    /// Create state positioned at the first token
    pub fn new(first_token: PageToken) -> Self {
        Self {
            token: first_token,
            phase: PagerPhase::AwaitingFirstPage,
            pages: 0,
            last_batch_size: 0,
            total_fetched: 0,
            latest_seen: None,
        }
    }

    /// Whether pagination reached its terminal state
    pub fn is_done(&self) -> bool {
        matches!(self.phase, PagerPhase::Done(_))
    }

    /// Record a parsed page before the strategy decides
    pub fn record_page(&mut self, batch_size: usize) {
        self.pages += 1;
        self.last_batch_size = batch_size;
        self.total_fetched += batch_size as u64;
    }

    /// Apply a decision, returning it for convenience
    pub fn apply(&mut self, next: NextPage) -> NextPage {
        match &next {
            NextPage::Continue(token) => {
                self.token = token.clone();
                self.phase = PagerPhase::Fetching;
            }
            NextPage::Done(reason) => self.phase = PagerPhase::Done(*reason),
        }
        next
    }

    /// Raise the latest seen value
    pub fn observe(&mut self, value: ReplicationValue) {
        match &self.latest_seen {
            Some(current) if *current >= value => {}
            _ => self.latest_seen = Some(value),
        }
    }
}

/// Core trait for pagination strategies
pub trait Paginator {
    /// Token for the first request, given a checkpoint or configured start
    fn first_token(&self, start: Option<ReplicationValue>) -> PageToken;

    /// Process a parsed page and decide whether to continue.
    ///
    /// Records the batch in `state` and `budget`. The rows of the page are
    /// always emitted by the caller, even when the decision is `Done`.
    fn process_page(
        &self,
        rows: &[Value],
        state: &mut PaginationState,
        budget: &mut RunBudget,
    ) -> Result<NextPage>;
}
