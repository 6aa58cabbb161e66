//! CLI runner - executes commands

use crate::cli::commands::{Cli, Commands};
use crate::config::TapConfig;
use crate::engine::{JsonLinesSink, StreamDriver};
use crate::error::Result;
use crate::state::StateManager;
use crate::streams::{self, StreamDefinition};
use serde_json::{json, Value};
use std::io::{self, Write};
use tracing::{info, warn};

/// CLI runner
pub struct Runner {
    cli: Cli,
}

impl Runner {
    /// Create a new runner
    pub fn new(cli: Cli) -> Self {
        Self { cli }
    }

    /// Run the CLI command against stdout
    pub async fn run(&self) -> Result<()> {
        self.execute(&mut io::stdout()).await
    }

    /// Run the CLI command, writing messages to `out`
    pub async fn execute(&self, out: &mut impl Write) -> Result<()> {
        match &self.cli.command {
            Commands::Discover => self.discover(out),
            Commands::Streams => self.streams(out),
            Commands::Read { streams } => self.read(streams, out).await,
        }
    }

    /// Load configuration; inline JSON takes precedence over a file
    fn load_config(&self) -> Result<TapConfig> {
        if let Some(json_str) = &self.cli.config_json {
            return TapConfig::from_json_str(json_str);
        }
        if let Some(path) = &self.cli.config {
            return TapConfig::from_file(path);
        }
        let config = TapConfig::default();
        config.validate()?;
        Ok(config)
    }

    /// Load state
    fn load_state(&self) -> Result<StateManager> {
        // Inline state takes precedence
        if let Some(state_json) = &self.cli.state_json {
            StateManager::from_json(state_json)
        } else if let Some(path) = &self.cli.state {
            StateManager::from_file(path)
        } else {
            Ok(StateManager::new())
        }
    }

    fn discover(&self, out: &mut impl Write) -> Result<()> {
        let entries: Vec<Value> = streams::catalog()
            .iter()
            .copied()
            .map(catalog_entry)
            .collect();
        write_line(
            out,
            &json!({
                "type": "CATALOG",
                "catalog": { "streams": entries }
            }),
        )
    }

    fn streams(&self, out: &mut impl Write) -> Result<()> {
        let names: Vec<&str> = streams::catalog().iter().map(|def| def.name).collect();
        write_line(out, &json!({ "type": "STREAMS", "streams": names }))
    }

    async fn read(&self, names: &[String], out: &mut impl Write) -> Result<()> {
        let config = self.load_config()?;
        let state = self.load_state()?;
        let selected = streams::select_for(names, &config)?;
        info!(
            streams = selected.len(),
            incremental_limit = config.incremental_limit,
            "Starting read"
        );

        let mut driver = StreamDriver::from_config(config, state)?;
        let mut sink = JsonLinesSink::new(&mut *out);
        let outcomes = driver.sync_all(&selected, &mut sink).await?;

        for outcome in outcomes.iter().filter(|o| o.is_truncated()) {
            warn!(
                stream = %outcome.stream,
                stop = ?outcome.stop_reason,
                "Stream stopped before exhausting upstream; rerun to continue"
            );
        }
        out.flush()?;
        Ok(())
    }
}

/// Discovery entry for one stream
fn catalog_entry(def: &StreamDefinition) -> Value {
    let method = if def.is_incremental() {
        "INCREMENTAL"
    } else {
        "FULL_TABLE"
    };
    let mut entry = json!({
        "stream": def.name,
        "tap_stream_id": def.name,
        "schema": (def.schema)().to_json_schema().to_json(),
        "key_properties": def.primary_keys,
        "replication_method": method,
        "pagination": def.pagination.name(),
    });
    if let Some(key) = def.replication_key() {
        entry["replication_key"] = json!(key);
    }
    if let Some(parent) = streams::parent_of(def) {
        entry["parent_stream"] = json!(parent.name);
    }
    entry
}

fn write_line(out: &mut impl Write, msg: &Value) -> Result<()> {
    serde_json::to_writer(&mut *out, msg)?;
    out.write_all(b"\n")?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;
    use pretty_assertions::assert_eq;
    use wiremock::matchers::{body_partial_json, method};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn runner(args: &[&str]) -> Runner {
        let mut argv = vec!["subgraph-tap"];
        argv.extend_from_slice(args);
        Runner::new(Cli::try_parse_from(argv).unwrap())
    }

    fn lines(out: Vec<u8>) -> Vec<Value> {
        String::from_utf8(out)
            .unwrap()
            .lines()
            .map(|l| serde_json::from_str(l).unwrap())
            .collect()
    }

    #[test]
    fn test_parse_read_streams() {
        let cli = Cli::try_parse_from([
            "subgraph-tap",
            "read",
            "--streams",
            "rentals,orders_names",
            "--state-json",
            "{}",
        ])
        .unwrap();
        match cli.command {
            Commands::Read { streams } => assert_eq!(streams, vec!["rentals", "orders_names"]),
            other => panic!("unexpected command: {other:?}"),
        }
        assert_eq!(cli.state_json.as_deref(), Some("{}"));
    }

    #[test]
    fn test_config_sources_conflict() {
        let result = Cli::try_parse_from([
            "subgraph-tap",
            "streams",
            "--config",
            "tap.json",
            "--config-json",
            "{}",
        ]);
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_streams_lists_catalog() {
        let mut out = Vec::new();
        runner(&["streams"]).execute(&mut out).await.unwrap();

        let msgs = lines(out);
        assert_eq!(msgs.len(), 1);
        assert_eq!(msgs[0]["type"], "STREAMS");
        assert_eq!(msgs[0]["streams"].as_array().unwrap().len(), 34);
    }

    #[tokio::test]
    async fn test_discover_describes_children() {
        let mut out = Vec::new();
        runner(&["discover"]).execute(&mut out).await.unwrap();

        let msgs = lines(out);
        let entries = msgs[0]["catalog"]["streams"].as_array().unwrap();
        let snapshot = entries
            .iter()
            .find(|e| e["stream"] == "historical_snapshot_estates_bids")
            .unwrap();
        assert_eq!(snapshot["parent_stream"], "bids_estates");
        assert_eq!(snapshot["replication_method"], "FULL_TABLE");
        assert_eq!(snapshot["key_properties"], json!(["rowId"]));

        let rentals = entries.iter().find(|e| e["stream"] == "rentals").unwrap();
        assert_eq!(rentals["replication_method"], "INCREMENTAL");
        assert_eq!(rentals["replication_key"], "updatedAt");
    }

    #[tokio::test]
    async fn test_read_unknown_stream_fails() {
        let err = runner(&["read", "--streams", "nope"])
            .execute(&mut Vec::<u8>::new())
            .await
            .unwrap_err();
        assert!(err.to_string().contains("nope"));
    }

    #[tokio::test]
    async fn test_read_writes_json_lines() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(body_partial_json(json!({"variables": {"updatedAt": 40}})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "data": {"rentals": [{"id": "r1", "updatedAt": "41", "rentalDays": "7"}]}
            })))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(body_partial_json(json!({"variables": {"updatedAt": 41}})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "data": {"rentals": []}
            })))
            .mount(&server)
            .await;

        let config = json!({"rentals_url": server.uri(), "backoff_initial_ms": 1}).to_string();
        let mut out = Vec::new();
        runner(&[
            "read",
            "--streams",
            "rentals",
            "--config-json",
            config.as_str(),
            "--state-json",
            r#"{"bookmarks": {"rentals": {"replication_key": "updatedAt", "replication_key_value": 40}}}"#,
        ])
        .execute(&mut out)
        .await
        .unwrap();

        let msgs = lines(out);
        let kinds: Vec<&str> = msgs.iter().map(|m| m["type"].as_str().unwrap()).collect();
        assert_eq!(kinds, vec!["SCHEMA", "RECORD", "STATE"]);
        assert_eq!(msgs[1]["record"]["rentalDays"], json!(7));
        assert_eq!(
            msgs[2]["value"]["bookmarks"]["rentals"]["replication_key_value"],
            json!(41)
        );
    }
}
