//! Tests for engine module

use super::*;
use crate::streams;
use crate::types::JsonObject;
use pretty_assertions::assert_eq;
use serde_json::{json, Value};
use wiremock::matchers::{body_partial_json, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn test_config(server: &MockServer) -> TapConfig {
    TapConfig {
        api_url: server.uri(),
        polygon_api_url: server.uri(),
        eth_mana_holder_url: Some(server.uri()),
        metadata_api_url: server.uri(),
        backoff_initial_ms: 1,
        ..TapConfig::default()
    }
}

fn driver(config: TapConfig, state: StateManager) -> StreamDriver {
    StreamDriver::from_config(config, state).unwrap()
}

fn graphql_page(entity: &str, rows: Value) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(json!({ "data": { entity: rows } }))
}

async fn mock_variables(server: &MockServer, variables: Value, response: ResponseTemplate) {
    Mock::given(method("POST"))
        .and(path("/"))
        .and(body_partial_json(json!({ "variables": variables })))
        .respond_with(response)
        .expect(1)
        .mount(server)
        .await;
}

fn records<'a>(messages: &'a [Message], stream: &str) -> Vec<&'a JsonObject> {
    messages
        .iter()
        .filter_map(|m| match m {
            Message::Record {
                stream: s, record, ..
            } if s == stream => Some(record),
            _ => None,
        })
        .collect()
}

fn ids(records: &[&JsonObject]) -> Vec<String> {
    records
        .iter()
        .map(|r| r["id"].as_str().unwrap().to_string())
        .collect()
}

// ============================================================================
// Message Tests
// ============================================================================

#[test]
fn test_message_kinds() {
    let record = Message::record("rentals", JsonObject::new());
    assert!(record.is_record());
    assert_eq!(record.stream(), Some("rentals"));

    let state = Message::state(json!({"bookmarks": {}}));
    assert!(state.is_state());
    assert_eq!(state.stream(), None);

    let schema = Message::schema(streams::find("dao_earnings").unwrap());
    assert!(schema.is_schema());
}

#[test]
fn test_schema_message_shape() {
    let msg = Message::schema(streams::find("nfts_mints_polygon").unwrap());
    let value = serde_json::to_value(&msg).unwrap();

    assert_eq!(value["type"], "SCHEMA");
    assert_eq!(value["stream"], "nfts_mints_polygon");
    assert_eq!(value["key_properties"], json!(["rowId"]));
    assert_eq!(value["bookmark_properties"], json!(["timestamp"]));
    assert_eq!(value["schema"]["type"], "object");
}

#[test]
fn test_offset_schema_has_no_bookmark() {
    let msg = Message::schema(streams::find("accounts_eth").unwrap());
    let value = serde_json::to_value(&msg).unwrap();
    assert!(value.get("bookmark_properties").is_none());
}

#[test]
fn test_json_lines_sink() {
    let mut sink = JsonLinesSink::new(Vec::new());
    let mut record = JsonObject::new();
    record.insert("id".into(), json!("1"));
    sink.emit(Message::record("rentals", record)).unwrap();
    sink.emit(Message::state(json!({"bookmarks": {}}))).unwrap();

    let output = String::from_utf8(sink.into_inner()).unwrap();
    let lines: Vec<Value> = output
        .lines()
        .map(|l| serde_json::from_str(l).unwrap())
        .collect();
    assert_eq!(lines.len(), 2);
    assert_eq!(lines[0]["type"], "RECORD");
    assert_eq!(lines[0]["record"], json!({"id": "1"}));
    assert!(lines[0]["time_extracted"].is_string());
    assert_eq!(lines[1], json!({"type": "STATE", "value": {"bookmarks": {}}}));
}

#[test]
fn test_sync_stats_add_outcome() {
    let mut stats = SyncStats::new();
    let outcome = StreamOutcome {
        records_emitted: 3,
        duplicates_skipped: 1,
        pages: 2,
        child_runs: 3,
        child_records: 3,
        stop_reason: Some(StopReason::NoProgress),
        ..StreamOutcome::new("orders_estates")
    };
    stats.add_outcome(&outcome);

    assert_eq!(stats.records_emitted, 6);
    assert_eq!(stats.pages_fetched, 2);
    assert_eq!(stats.duplicates_skipped, 1);
    assert_eq!(stats.child_runs, 3);
    assert_eq!(stats.streams_synced, 1);
    assert!(!outcome.is_truncated());
}

// ============================================================================
// Timestamp Stream Tests
// ============================================================================

#[tokio::test]
async fn test_timestamp_stream_dedupes_boundary_rows() {
    let server = MockServer::start().await;
    mock_variables(
        &server,
        json!({"updatedAt": 1}),
        graphql_page(
            "orders",
            json!([
                {"id": "a", "updatedAt": "100"},
                {"id": "b", "updatedAt": "200"},
                {"id": "c", "updatedAt": "200"}
            ]),
        ),
    )
    .await;
    mock_variables(
        &server,
        json!({"updatedAt": 200}),
        graphql_page(
            "orders",
            json!([
                {"id": "c", "updatedAt": "200"},
                {"id": "d", "updatedAt": "300"}
            ]),
        ),
    )
    .await;
    mock_variables(
        &server,
        json!({"updatedAt": 300}),
        graphql_page("orders", json!([{"id": "d", "updatedAt": "300"}])),
    )
    .await;

    let mut driver = driver(test_config(&server), StateManager::new());
    let mut messages = Vec::new();
    let def = streams::find("orders_names").unwrap();
    let outcome = driver.sync_stream(def, &mut messages).await.unwrap();

    assert_eq!(ids(&records(&messages, "orders_names")), vec!["a", "b", "c", "d"]);
    assert_eq!(outcome.records_emitted, 4);
    assert_eq!(outcome.duplicates_skipped, 2);
    assert_eq!(outcome.pages, 3);
    assert_eq!(outcome.stop_reason, Some(StopReason::NoProgress));

    assert!(messages[0].is_schema());
    let states: Vec<_> = messages.iter().filter(|m| m.is_state()).collect();
    assert_eq!(states.len(), 2);
    assert_eq!(
        driver.state().to_value()["bookmarks"]["orders_names"],
        json!({"replication_key": "updatedAt", "replication_key_value": 300})
    );
}

#[tokio::test]
async fn test_resumes_from_checkpoint() {
    let server = MockServer::start().await;
    mock_variables(&server, json!({"updatedAt": 500}), graphql_page("rentals", json!([]))).await;

    let state = StateManager::from_json(
        r#"{"bookmarks": {"rentals": {"replication_key": "updatedAt", "replication_key_value": "500"}}}"#,
    )
    .unwrap();
    let config = TapConfig {
        rentals_url: Some(server.uri()),
        ..test_config(&server)
    };
    let mut driver = driver(config, state);
    let mut messages = Vec::new();
    let outcome = driver
        .sync_stream(streams::find("rentals").unwrap(), &mut messages)
        .await
        .unwrap();

    assert_eq!(outcome.records_emitted, 0);
    assert_eq!(outcome.stop_reason, Some(StopReason::EmptyPage));
    assert!(!messages.iter().any(Message::is_state));
}

#[tokio::test]
async fn test_budget_stop_keeps_whole_page() {
    let server = MockServer::start().await;
    mock_variables(
        &server,
        json!({"updatedAt": 1}),
        graphql_page(
            "orders",
            json!([
                {"id": "a", "updatedAt": "10"},
                {"id": "b", "updatedAt": "11"},
                {"id": "c", "updatedAt": "12"}
            ]),
        ),
    )
    .await;

    let config = TapConfig {
        incremental_limit: 2,
        ..test_config(&server)
    };
    let mut driver = driver(config, StateManager::new());
    let mut messages = Vec::new();
    let outcome = driver
        .sync_stream(streams::find("orders_names").unwrap(), &mut messages)
        .await
        .unwrap();

    assert_eq!(outcome.records_emitted, 3);
    assert_eq!(outcome.stop_reason, Some(StopReason::BudgetExhausted));
    assert!(outcome.is_truncated());
    // Checkpoint still reflects the emitted page
    assert_eq!(
        driver.state().to_value()["bookmarks"]["orders_names"]["replication_key_value"],
        json!(12)
    );
}

// ============================================================================
// Offset and REST Stream Tests
// ============================================================================

#[tokio::test]
async fn test_offset_stream_stops_on_short_page() {
    let server = MockServer::start().await;
    let full: Vec<Value> = (0..1000)
        .map(|i| json!({"id": format!("0x{i:04x}"), "mana": "1"}))
        .collect();
    let short: Vec<Value> = (0..10)
        .map(|i| json!({"id": format!("0xf{i:03x}"), "mana": "1"}))
        .collect();
    mock_variables(&server, json!({"offset": 0}), graphql_page("accounts", json!(full))).await;
    mock_variables(&server, json!({"offset": 1000}), graphql_page("accounts", json!(short))).await;

    let mut driver = driver(test_config(&server), StateManager::new());
    let mut messages = Vec::new();
    let outcome = driver
        .sync_stream(streams::find("mana_holders_eth").unwrap(), &mut messages)
        .await
        .unwrap();

    assert_eq!(outcome.records_emitted, 1010);
    assert_eq!(outcome.pages, 2);
    assert_eq!(outcome.stop_reason, Some(StopReason::ShortPage));
    assert!(!messages.iter().any(Message::is_state));
}

#[tokio::test]
async fn test_rest_stream_renders_query_params() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/items"))
        .and(query_param("first", "1000"))
        .and(query_param("skip", "0"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": [{"id": "0xa-0", "name": "Hat"}, {"id": "0xa-1", "name": "Cape"}],
            "total": 2
        })))
        .expect(1)
        .mount(&server)
        .await;

    let mut driver = driver(test_config(&server), StateManager::new());
    let mut messages = Vec::new();
    let outcome = driver
        .sync_stream(streams::find("items_metadata").unwrap(), &mut messages)
        .await
        .unwrap();

    assert_eq!(ids(&records(&messages, "items_metadata")), vec!["0xa-0", "0xa-1"]);
    assert_eq!(outcome.stop_reason, Some(StopReason::ShortPage));
}

// ============================================================================
// Parent / Child Tests
// ============================================================================

#[tokio::test]
async fn test_parent_records_drive_child_snapshots() {
    let server = MockServer::start().await;
    let orders = json!([
        {"id": "o1", "blockNumber": "100", "updatedAt": "10", "nft": {"id": "estate-1"}},
        {"id": "o2", "blockNumber": "101", "updatedAt": "10", "nft": {"id": "estate-2"}}
    ]);
    mock_variables(&server, json!({"updatedAt": 1}), graphql_page("orders", orders.clone())).await;
    mock_variables(&server, json!({"updatedAt": 10}), graphql_page("orders", orders)).await;
    mock_variables(
        &server,
        json!({"estateId": "estate-1", "blockNumber": 100}),
        graphql_page(
            "estates",
            json!([{"id": "estate-1", "tokenId": "1", "size": 1, "parcels": [{"x": "0", "y": "0"}]}]),
        ),
    )
    .await;
    mock_variables(
        &server,
        json!({"estateId": "estate-2", "blockNumber": 101}),
        graphql_page("estates", json!([])),
    )
    .await;

    let mut driver = driver(test_config(&server), StateManager::new());
    let mut messages = Vec::new();
    let outcome = driver
        .sync_stream(streams::find("orders_estates").unwrap(), &mut messages)
        .await
        .unwrap();

    assert_eq!(outcome.records_emitted, 2);
    assert_eq!(outcome.duplicates_skipped, 2);
    assert_eq!(outcome.child_runs, 2);
    assert_eq!(outcome.child_records, 1);

    let snapshots = records(&messages, "historical_snapshot_estates");
    assert_eq!(snapshots.len(), 1);
    assert_eq!(snapshots[0]["rowId"], json!("estate-1|100"));
    assert_eq!(snapshots[0]["parcels"], json!("0,0"));

    let order: Vec<_> = messages
        .iter()
        .map(|m| (m.is_schema(), m.stream().map(str::to_string)))
        .take(4)
        .collect();
    assert_eq!(
        order,
        vec![
            (true, Some("orders_estates".to_string())),
            (true, Some("historical_snapshot_estates".to_string())),
            (false, Some("orders_estates".to_string())),
            (false, Some("historical_snapshot_estates".to_string())),
        ]
    );
}

// ============================================================================
// Failure Tests
// ============================================================================

#[tokio::test]
async fn test_missing_endpoint_names_stream() {
    let mut driver = driver(TapConfig::default(), StateManager::new());
    let mut messages = Vec::new();
    let err = driver
        .sync_stream(streams::find("poaps_xdai").unwrap(), &mut messages)
        .await
        .unwrap_err();

    match err {
        Error::Stream { stream, source } => {
            assert_eq!(stream, "poaps_xdai");
            assert!(matches!(*source, Error::MissingConfigField { ref field } if field == "poaps_xdai_url"));
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[tokio::test]
async fn test_graphql_errors_are_malformed() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "errors": [{"message": "indexing_error"}]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let mut driver = driver(test_config(&server), StateManager::new());
    let err = driver
        .sync_stream(streams::find("dao_earnings").unwrap(), &mut Vec::<Message>::new())
        .await
        .unwrap_err();

    assert!(matches!(err, Error::Stream { ref source, .. } if matches!(**source, Error::MalformedResponse { .. })));
}

#[tokio::test]
async fn test_post_processing_failure_aborts_stream() {
    let server = MockServer::start().await;
    mock_variables(
        &server,
        json!({"updatedAt": 1}),
        graphql_page("orders", json!([{"id": "a", "updatedAt": "5", "nft": {"id": "x"}}])),
    )
    .await;

    let mut driver = driver(test_config(&server), StateManager::new());
    let mut messages = Vec::new();
    let err = driver
        .sync_stream(streams::find("orders_wearables").unwrap(), &mut messages)
        .await
        .unwrap_err();

    assert!(matches!(err, Error::Stream { ref source, .. } if matches!(**source, Error::PostProcessing { .. })));
    assert!(!messages.iter().any(Message::is_record));
}

#[tokio::test]
async fn test_upstream_error_is_not_retried() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
        .expect(1)
        .mount(&server)
        .await;

    let mut driver = driver(test_config(&server), StateManager::new());
    let err = driver
        .sync_stream(streams::find("orders_names").unwrap(), &mut Vec::<Message>::new())
        .await
        .unwrap_err();

    assert!(matches!(err, Error::Stream { ref source, .. } if matches!(**source, Error::Upstream { status: 500, .. })));
}

#[tokio::test]
async fn test_sync_all_stops_at_first_failure() {
    let server = MockServer::start().await;
    mock_variables(&server, json!({"updatedAt": 1}), graphql_page("orders", json!([]))).await;

    let mut driver = driver(test_config(&server), StateManager::new());
    let selected = [
        streams::find("orders_names").unwrap(),
        streams::find("rentals").unwrap(),
        streams::find("dao_earnings").unwrap(),
    ];
    let err = driver.sync_all(&selected, &mut Vec::<Message>::new()).await.unwrap_err();

    assert!(err.to_string().contains("rentals"));
    assert_eq!(driver.stats().streams_synced, 1);
}
