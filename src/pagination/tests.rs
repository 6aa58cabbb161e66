//! Tests for pagination module

use super::*;
use crate::budget::RunBudget;
use crate::error::Error;
use crate::types::{ReplicationKeyKind, ReplicationValue};
use serde_json::{json, Value};

fn rows(n: usize) -> Vec<Value> {
    (0..n).map(|i| json!({"id": i.to_string()})).collect()
}

fn stamped(values: &[i64]) -> Vec<Value> {
    values
        .iter()
        .enumerate()
        .map(|(i, v)| json!({"id": i.to_string(), "updatedAt": v.to_string()}))
        .collect()
}

/// Drive a paginator over pre-baked pages, returning the tokens requested
fn drive(
    paginator: &impl Paginator,
    start: Option<ReplicationValue>,
    pages: &[Vec<Value>],
    budget: &mut RunBudget,
) -> (Vec<PageToken>, StopReason) {
    let mut state = PaginationState::new(paginator.first_token(start));
    let mut tokens = Vec::new();
    for page in pages {
        tokens.push(state.token.clone());
        match paginator.process_page(page, &mut state, budget).unwrap() {
            NextPage::Continue(_) => continue,
            NextPage::Done(reason) => return (tokens, reason),
        }
    }
    panic!("paginator requested more pages than provided: {tokens:?}");
}

// ============================================================================
// NextPage / State Tests
// ============================================================================

#[test]
fn test_next_page_predicates() {
    let next = NextPage::Continue(PageToken::Offset(1000));
    assert!(next.is_continue());
    assert!(!next.is_done());

    let done = NextPage::Done(StopReason::EmptyPage);
    assert!(done.is_done());
    assert!(!done.is_continue());
}

#[test]
fn test_pagination_state_lifecycle() {
    let mut state = PaginationState::new(PageToken::Offset(0));
    assert_eq!(state.phase, PagerPhase::AwaitingFirstPage);
    assert!(!state.is_done());

    state.record_page(1000);
    state.apply(NextPage::Continue(PageToken::Offset(1000)));
    assert_eq!(state.phase, PagerPhase::Fetching);
    assert_eq!(state.token, PageToken::Offset(1000));

    state.record_page(10);
    state.apply(NextPage::Done(StopReason::ShortPage));
    assert!(state.is_done());
    assert_eq!(state.pages, 2);
    assert_eq!(state.total_fetched, 1010);
    assert_eq!(state.last_batch_size, 10);
}

#[test]
fn test_state_observe_keeps_maximum() {
    let mut state = PaginationState::new(PageToken::Single);
    state.observe(ReplicationValue::Integer(5));
    state.observe(ReplicationValue::Integer(3));
    assert_eq!(state.latest_seen, Some(ReplicationValue::Integer(5)));
    state.observe(ReplicationValue::Integer(9));
    assert_eq!(state.latest_seen, Some(ReplicationValue::Integer(9)));
}

#[test]
fn test_truncating_reasons() {
    assert!(StopReason::OffsetCeiling.is_truncating());
    assert!(StopReason::BudgetExhausted.is_truncating());
    assert!(!StopReason::ShortPage.is_truncating());
    assert!(!StopReason::NoProgress.is_truncating());
}

// ============================================================================
// Offset Paginator Tests
// ============================================================================

#[test]
fn test_offset_stops_on_short_page() {
    let pages = vec![rows(1000), rows(1000), rows(1000), rows(750)];
    let (tokens, reason) = drive(
        &OffsetPaginator::default(),
        None,
        &pages,
        &mut RunBudget::unlimited(),
    );

    assert_eq!(
        tokens,
        vec![
            PageToken::Offset(0),
            PageToken::Offset(1000),
            PageToken::Offset(2000),
            PageToken::Offset(3000),
        ]
    );
    assert_eq!(reason, StopReason::ShortPage);
}

#[test]
fn test_offset_stops_at_ceiling() {
    let pages = vec![rows(1000); 6];
    let (tokens, reason) = drive(
        &OffsetPaginator::default(),
        None,
        &pages,
        &mut RunBudget::unlimited(),
    );

    assert_eq!(tokens.len(), 5);
    assert_eq!(tokens.last(), Some(&PageToken::Offset(4000)));
    assert_eq!(reason, StopReason::OffsetCeiling);
}

#[test]
fn test_offset_stops_on_empty_page() {
    let pages = vec![rows(1000), rows(0)];
    let (tokens, reason) = drive(
        &OffsetPaginator::default(),
        None,
        &pages,
        &mut RunBudget::unlimited(),
    );
    assert_eq!(tokens.len(), 2);
    assert_eq!(reason, StopReason::EmptyPage);
}

#[test]
fn test_offset_stops_on_budget() {
    let mut budget = RunBudget::new(2000);
    let pages = vec![rows(1000); 4];
    let (tokens, reason) = drive(&OffsetPaginator::default(), None, &pages, &mut budget);

    assert_eq!(tokens.len(), 2);
    assert_eq!(reason, StopReason::BudgetExhausted);
    assert_eq!(budget.total(), 2000);
}

#[test]
fn test_offset_custom_page_size() {
    let paginator = OffsetPaginator::new(2, 100);
    let pages = vec![rows(2), rows(2), rows(1)];
    let (tokens, reason) = drive(&paginator, None, &pages, &mut RunBudget::unlimited());
    assert_eq!(tokens[2], PageToken::Offset(4));
    assert_eq!(reason, StopReason::ShortPage);
}

// ============================================================================
// Timestamp Paginator Tests
// ============================================================================

#[test]
fn test_timestamp_first_token_uses_start() {
    let paginator = TimestampPaginator::integer("updatedAt");
    assert_eq!(
        paginator.first_token(Some(ReplicationValue::Integer(42))),
        PageToken::Timestamp(ReplicationValue::Integer(42))
    );
    assert_eq!(
        paginator.first_token(None),
        PageToken::Timestamp(ReplicationValue::Integer(0))
    );
}

#[test]
fn test_timestamp_advances_to_latest_seen() {
    let paginator = TimestampPaginator::integer("updatedAt");
    let pages = vec![stamped(&[10, 20, 30]), stamped(&[30, 40]), stamped(&[])];
    let (tokens, reason) = drive(
        &paginator,
        Some(ReplicationValue::Integer(1)),
        &pages,
        &mut RunBudget::unlimited(),
    );

    assert_eq!(
        tokens,
        vec![
            PageToken::Timestamp(ReplicationValue::Integer(1)),
            PageToken::Timestamp(ReplicationValue::Integer(30)),
            PageToken::Timestamp(ReplicationValue::Integer(40)),
        ]
    );
    assert_eq!(reason, StopReason::EmptyPage);
}

#[test]
fn test_timestamp_unsorted_page_uses_maximum() {
    let paginator = TimestampPaginator::integer("updatedAt");
    let mut state = PaginationState::new(paginator.first_token(None));
    let next = paginator
        .process_page(&stamped(&[50, 20, 35]), &mut state, &mut RunBudget::unlimited())
        .unwrap();
    assert_eq!(
        next,
        NextPage::Continue(PageToken::Timestamp(ReplicationValue::Integer(50)))
    );
}

#[test]
fn test_timestamp_no_progress_stops() {
    // Every row shares the boundary value re-served by `_gte`
    let paginator = TimestampPaginator::integer("updatedAt");
    let pages = vec![stamped(&[5, 7, 7]), stamped(&[7, 7])];
    let (tokens, reason) = drive(&paginator, None, &pages, &mut RunBudget::unlimited());

    assert_eq!(tokens.len(), 2);
    assert_eq!(reason, StopReason::NoProgress);
}

#[test]
fn test_timestamp_stops_on_budget() {
    let paginator = TimestampPaginator::integer("updatedAt");
    let mut budget = RunBudget::new(4);
    let pages = vec![stamped(&[1, 2]), stamped(&[2, 3]), stamped(&[3, 4])];
    let (tokens, reason) = drive(&paginator, None, &pages, &mut budget);

    assert_eq!(tokens.len(), 2);
    assert_eq!(reason, StopReason::BudgetExhausted);
}

#[test]
fn test_timestamp_missing_key_is_malformed() {
    let paginator = TimestampPaginator::integer("updatedAt");
    let mut state = PaginationState::new(paginator.first_token(None));
    let err = paginator
        .process_page(&[json!({"id": "1"})], &mut state, &mut RunBudget::unlimited())
        .unwrap_err();
    assert!(matches!(err, Error::MalformedResponse { .. }));
    assert!(err.to_string().contains("updatedAt"));
}

#[test]
fn test_timestamp_datetime_key() {
    let paginator = TimestampPaginator::new("date", ReplicationKeyKind::DateTime);
    let mut state = PaginationState::new(paginator.first_token(None));
    let page = vec![
        json!({"date": "2022-01-01T00:00:00Z"}),
        json!({"date": "2022-03-01T00:00:00Z"}),
    ];
    let next = paginator
        .process_page(&page, &mut state, &mut RunBudget::unlimited())
        .unwrap();

    let token = match next {
        NextPage::Continue(token) => token,
        other => panic!("expected continue, got {other:?}"),
    };
    assert_eq!(
        token.as_timestamp().map(|v| v.to_string()),
        Some("2022-03-01T00:00:00+00:00".to_string())
    );
}

// ============================================================================
// Single-Row / Dispatch Tests
// ============================================================================

#[test]
fn test_single_row_always_done() {
    let paginator = SingleRowPaginator;
    for size in [0, 1, 1000] {
        let mut state = PaginationState::new(paginator.first_token(None));
        let next = paginator
            .process_page(&rows(size), &mut state, &mut RunBudget::unlimited())
            .unwrap();
        assert_eq!(next, NextPage::Done(StopReason::SingleRow));
        assert!(state.is_done());
    }
}

#[test]
fn test_strategy_dispatch() {
    let strategy = PaginationStrategy::timestamp("updatedAt");
    assert_eq!(strategy.name(), "timestamp");
    assert_eq!(strategy.replication_key(), Some("updatedAt"));
    assert_eq!(strategy.replication_kind(), Some(ReplicationKeyKind::Integer));

    let offset = PaginationStrategy::offset();
    assert_eq!(offset.replication_key(), None);
    assert_eq!(offset.page_size(), DEFAULT_PAGE_SIZE);
    assert_eq!(offset.first_token(None), PageToken::Offset(0));

    let single = PaginationStrategy::single_row();
    assert_eq!(single.first_token(None), PageToken::Single);
}
