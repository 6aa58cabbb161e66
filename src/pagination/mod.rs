//! Pagination module
//!
//! Supports: Offset (capped skip), Timestamp (inclusive replication-key
//! cursor), Single-row (point-in-time lookups)
//!
//! # Overview
//!
//! Each strategy decides, from the previous token and the page just parsed,
//! whether another page is fetched and which token it carries. All mutable
//! bookkeeping lives in a [`PaginationState`] owned by the stream run, so no
//! counters leak between runs or streams.
//!
//! ```text
//! AwaitingFirstPage ──fetch──▶ Fetching ──process_page──▶ Continue(token) ─┐
//!                                  ▲                                        │
//!                                  └────────────────────────────────────────┘
//!                                             └──▶ Done(reason)
//! ```

mod strategies;
mod types;

pub use strategies::{
    OffsetPaginator, PaginationStrategy, SingleRowPaginator, TimestampPaginator,
    DEFAULT_OFFSET_CEILING, DEFAULT_PAGE_SIZE,
};
pub use types::{NextPage, PageToken, PagerPhase, PaginationState, Paginator, StopReason};

#[cfg(test)]
mod tests;
