//! Execution engine module
//!
//! Main read loop and stream orchestration.
//!
//! # Overview
//!
//! [`StreamDriver`] runs one [`StreamDefinition`] at a time:
//!
//! 1. build the request for the current page token
//! 2. send it through the retrying transport
//! 3. parse the row array out of the response
//! 4. let the paginator decide on the next token
//! 5. post-process, dedupe and validate each row, then emit it
//! 6. drive the child stream for each emitted record, if any
//! 7. checkpoint the highest replication value seen
//!
//! until the paginator is done. Streams, pages and child runs are strictly
//! sequential.

mod types;

#[cfg(test)]
mod tests;

pub use types::{JsonLinesSink, Message, MessageSink, StreamOutcome, SyncStats};

use crate::budget::RunBudget;
use crate::config::TapConfig;
use crate::decode::ResponseParser;
use crate::dedup::{composite_key, DuplicateFilter};
use crate::error::{Error, Result};
use crate::http::{HttpClient, RequestSpec, RetryPolicy};
use crate::pagination::{NextPage, PageToken, PaginationState, Paginator, StopReason};
use crate::state::StateManager;
use crate::streams::{RequestTemplate, StreamContext, StreamDefinition};
use crate::template::{self, TemplateContext};
use crate::types::{JsonValue, ReplicationValue};
use serde_json::json;
use std::time::Instant;
use tracing::{debug, info, warn};
use url::Url;

/// Drives stream definitions against their upstreams
pub struct StreamDriver {
    client: HttpClient,
    config: TapConfig,
    /// Config rendered once for REST parameter templates
    config_value: JsonValue,
    state: StateManager,
    stats: SyncStats,
}

impl StreamDriver {
    /// Create a driver with an explicit client
    pub fn new(client: HttpClient, config: TapConfig, state: StateManager) -> Self {
        let config_value = config.to_value();
        Self {
            client,
            config,
            config_value,
            state,
            stats: SyncStats::new(),
        }
    }

    /// Create a driver whose client is built from the config
    pub fn from_config(config: TapConfig, state: StateManager) -> Result<Self> {
        let client = HttpClient::with_config(config.http_client_config())?;
        Ok(Self::new(client, config, state))
    }

    pub fn state(&self) -> &StateManager {
        &self.state
    }

    pub fn stats(&self) -> &SyncStats {
        &self.stats
    }

    pub fn config(&self) -> &TapConfig {
        &self.config
    }

    /// Run streams one after another, stopping at the first failure
    pub async fn sync_all(
        &mut self,
        streams: &[&'static StreamDefinition],
        sink: &mut dyn MessageSink,
    ) -> Result<Vec<StreamOutcome>> {
        let start = Instant::now();
        let mut outcomes = Vec::with_capacity(streams.len());

        for def in streams {
            outcomes.push(self.sync_stream(def, sink).await?);
        }

        self.stats.set_duration(start.elapsed().as_millis() as u64);
        info!(
            streams = self.stats.streams_synced,
            records = self.stats.records_emitted,
            pages = self.stats.pages_fetched,
            duplicates = self.stats.duplicates_skipped,
            duration_ms = self.stats.duration_ms,
            "Sync complete"
        );
        Ok(outcomes)
    }

    /// Run a top-level stream and any child runs it drives
    pub async fn sync_stream(
        &mut self,
        def: &'static StreamDefinition,
        sink: &mut dyn MessageSink,
    ) -> Result<StreamOutcome> {
        self.sync_with_context(def, &StreamContext::new(), sink)
            .await
    }

    /// Run a stream with a parent-supplied context
    pub async fn sync_with_context(
        &mut self,
        def: &'static StreamDefinition,
        ctx: &StreamContext,
        sink: &mut dyn MessageSink,
    ) -> Result<StreamOutcome> {
        sink.emit(Message::schema(def))?;
        if let Some(link) = def.child {
            sink.emit(Message::schema(link.stream))?;
        }

        let outcome = self.run_stream(def, ctx, sink).await?;
        self.stats.add_outcome(&outcome);
        Ok(outcome)
    }

    /// The read loop for one stream run; errors carry the stream name
    async fn run_stream(
        &mut self,
        def: &'static StreamDefinition,
        ctx: &StreamContext,
        sink: &mut dyn MessageSink,
    ) -> Result<StreamOutcome> {
        self.read_pages(def, ctx, sink)
            .await
            .map_err(|e| e.in_stream(def.name))
    }

    async fn read_pages(
        &mut self,
        def: &'static StreamDefinition,
        ctx: &StreamContext,
        sink: &mut dyn MessageSink,
    ) -> Result<StreamOutcome> {
        let base_url = self.config.endpoint_url(def.endpoint)?;
        let parser = ResponseParser::new(def.records_path);
        let schema = (def.schema)();
        let paginator = def.pagination;

        let mut pagination = PaginationState::new(paginator.first_token(self.start_value(def)?));
        let mut budget = RunBudget::new(self.config.incremental_limit);
        let mut dedup = DuplicateFilter::for_stream(def.dedupe);
        let mut outcome = StreamOutcome::new(def.name);

        if ctx.is_empty() {
            info!(stream = def.name, strategy = paginator.name(), token = %pagination.token, "Starting stream");
        } else {
            debug!(stream = def.name, context = %ctx, "Starting child stream");
        }

        let stop = loop {
            let token = pagination.token.clone();
            let request = self.build_request(def, &base_url, &token, ctx)?;
            let response = self.client.send(&request).await?;
            let page = parser.parse(&response.body)?;

            let next = paginator.process_page(&page.rows, &mut pagination, &mut budget)?;
            outcome.pages += 1;
            debug!(
                stream = def.name,
                page = outcome.pages,
                token = %token,
                rows = page.batch_size,
                "Fetched page"
            );

            // The whole page is emitted even when pagination stops here
            for raw in page.rows {
                let JsonValue::Object(raw) = raw else {
                    return Err(Error::malformed(def.records_path, "row is not an object"));
                };
                let record = (def.post_process)(raw, ctx)?;

                let key = composite_key(&record, def.primary_keys)?;
                if !dedup.check_and_remember(&key) {
                    warn!(stream = def.name, key = %key, "Skipping duplicate row");
                    continue;
                }

                schema.validate(&record)?;

                let child_ctx = match def.child {
                    Some(link) => Some((link.context)(&record)?),
                    None => None,
                };
                sink.emit(Message::record(def.name, record))?;
                outcome.records_emitted += 1;

                if let (Some(link), Some(child_ctx)) = (def.child, child_ctx) {
                    let child = Box::pin(self.run_stream(link.stream, &child_ctx, sink)).await?;
                    outcome.child_runs += 1;
                    outcome.child_records += child.records_emitted + child.child_records;
                }
            }

            self.checkpoint(def, &pagination, sink)?;

            match next {
                NextPage::Continue(_) => continue,
                NextPage::Done(reason) => break reason,
            }
        };

        outcome.duplicates_skipped = dedup.skipped();
        outcome.stop_reason = Some(stop);
        match stop {
            StopReason::BudgetExhausted => budget.warn_exhausted(def.name),
            StopReason::OffsetCeiling => warn!(
                stream = def.name,
                fetched = pagination.total_fetched,
                "Offset ceiling reached; rows past it are unreachable this run"
            ),
            _ => {}
        }

        if ctx.is_empty() {
            info!(
                stream = def.name,
                records = outcome.records_emitted,
                pages = outcome.pages,
                duplicates = outcome.duplicates_skipped,
                child_runs = outcome.child_runs,
                stop = ?stop,
                "Stream complete"
            );
        }
        Ok(outcome)
    }

    /// Checkpoint or configured start, for incremental streams
    fn start_value(&self, def: &StreamDefinition) -> Result<Option<ReplicationValue>> {
        if !def.is_incremental() {
            return Ok(None);
        }
        let kind = def.replication_kind();
        let start = self
            .state
            .get_checkpoint(def.name, kind)?
            .unwrap_or_else(|| self.config.start_value(kind));
        Ok(Some(start))
    }

    /// Advance the stream's bookmark and emit STATE when it moved
    fn checkpoint(
        &mut self,
        def: &StreamDefinition,
        pagination: &PaginationState,
        sink: &mut dyn MessageSink,
    ) -> Result<()> {
        let (Some(key), Some(latest)) = (def.replication_key(), &pagination.latest_seen) else {
            return Ok(());
        };
        if self.state.advance(def.name, key, latest) {
            debug!(stream = def.name, value = %latest, "Checkpoint advanced");
            sink.emit(Message::state(self.state.to_value()))?;
        }
        Ok(())
    }

    fn build_request(
        &self,
        def: &StreamDefinition,
        base_url: &Url,
        token: &PageToken,
        ctx: &StreamContext,
    ) -> Result<RequestSpec> {
        let backoff = self.config.initial_backoff();

        match def.request {
            RequestTemplate::GraphQl { query, .. } => {
                let variables = def.request.variables(token, ctx)?;
                let body = json!({ "query": query, "variables": variables });
                Ok(RequestSpec::graphql(base_url.as_str(), body)
                    .with_retry(RetryPolicy::graphql().with_initial_backoff(backoff)))
            }
            RequestTemplate::Rest { path, params } => {
                let url = format!("{}{}", base_url.as_str().trim_end_matches('/'), path);
                let first = def.pagination.page_size();
                let page = match token {
                    PageToken::Offset(offset) => json!({ "offset": offset, "first": first }),
                    PageToken::Timestamp(from) => json!({ "from": from.to_json(), "first": first }),
                    PageToken::Single => json!({ "first": first }),
                };
                let template_ctx = TemplateContext::new()
                    .with_config(self.config_value.clone())
                    .with_context(ctx.to_value())
                    .with_page(page);
                let query = template::render_params(params, &template_ctx)?;
                Ok(RequestSpec::rest(url, query)
                    .with_retry(RetryPolicy::rest().with_initial_backoff(backoff)))
            }
        }
    }
}
