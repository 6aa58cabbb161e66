//! Stream definition types
//!
//! A stream is plain data: where to send the request, how to build it from a
//! page token, where the rows live in the response, how to page, and how to
//! shape each row. One generic driver runs every definition.

use super::context::StreamContext;
use crate::config::Endpoint;
use crate::error::{Error, Result};
use crate::pagination::{PageToken, PaginationStrategy};
use crate::schema::StreamSchema;
use crate::types::{JsonObject, JsonValue, ReplicationKeyKind};
use std::fmt;

/// Row post-processing function
pub type PostProcessFn = fn(JsonObject, &StreamContext) -> Result<JsonObject>;

/// Derives a child context from an emitted parent record
pub type ChildContextFn = fn(&JsonObject) -> Result<StreamContext>;

/// Builds GraphQL variables from a parent context
pub type ContextVariablesFn = fn(&StreamContext) -> Result<JsonObject>;

/// How GraphQL variables are bound for each request
#[derive(Clone, Copy)]
pub enum GraphQlVariables {
    /// The page token is bound to this variable (`$updatedAt`, `$offset`)
    Token(&'static str),
    /// Variables come from the parent context
    Context(ContextVariablesFn),
}

/// Request shape for a stream
#[derive(Clone, Copy)]
pub enum RequestTemplate {
    /// POST `{"query": ..., "variables": {...}}` to the endpoint
    GraphQl {
        query: &'static str,
        variables: GraphQlVariables,
    },
    /// GET `<endpoint><path>` with templated query parameters
    Rest {
        path: &'static str,
        params: &'static [(&'static str, &'static str)],
    },
}

impl RequestTemplate {
    pub fn is_rest(&self) -> bool {
        matches!(self, RequestTemplate::Rest { .. })
    }

    /// GraphQL variables for the given token and context
    pub fn variables(&self, token: &PageToken, ctx: &StreamContext) -> Result<JsonObject> {
        let RequestTemplate::GraphQl { variables, .. } = self else {
            return Ok(JsonObject::new());
        };

        match variables {
            GraphQlVariables::Context(build) => build(ctx),
            GraphQlVariables::Token(name) => {
                let value = match token {
                    PageToken::Offset(offset) => JsonValue::from(*offset),
                    PageToken::Timestamp(value) => value.to_json(),
                    PageToken::Single => {
                        return Err(Error::config(format!(
                            "variable '${name}' needs a page token"
                        )))
                    }
                };
                let mut vars = JsonObject::new();
                vars.insert((*name).to_string(), value);
                Ok(vars)
            }
        }
    }
}

/// Link from a parent stream to the child it drives per record
pub struct ChildLink {
    pub stream: &'static StreamDefinition,
    pub context: ChildContextFn,
}

/// Immutable description of one stream
pub struct StreamDefinition {
    pub name: &'static str,
    pub endpoint: Endpoint,
    pub request: RequestTemplate,
    /// Dot path to the row array in the response body
    pub records_path: &'static str,
    pub pagination: PaginationStrategy,
    pub primary_keys: &'static [&'static str],
    /// Drop rows whose primary-key composite was already emitted this run
    pub dedupe: bool,
    pub schema: fn() -> StreamSchema,
    pub post_process: PostProcessFn,
    pub child: Option<&'static ChildLink>,
}

impl StreamDefinition {
    /// Replication key, for incremental streams
    pub fn replication_key(&self) -> Option<&'static str> {
        self.pagination.replication_key()
    }

    pub fn replication_kind(&self) -> ReplicationKeyKind {
        self.pagination.replication_kind().unwrap_or_default()
    }

    /// Whether the stream checkpoints a replication value
    pub fn is_incremental(&self) -> bool {
        self.replication_key().is_some()
    }

    /// Whether this stream only runs as another stream's child
    pub fn is_child(&self) -> bool {
        matches!(self.request, RequestTemplate::GraphQl { variables: GraphQlVariables::Context(_), .. })
    }
}

impl fmt::Debug for StreamDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StreamDefinition")
            .field("name", &self.name)
            .field("endpoint", &self.endpoint)
            .field("records_path", &self.records_path)
            .field("pagination", &self.pagination)
            .field("primary_keys", &self.primary_keys)
            .field("dedupe", &self.dedupe)
            .field("child", &self.child.map(|c| c.stream.name))
            .finish_non_exhaustive()
    }
}

/// Post-process function for streams emitted as fetched
pub fn passthrough(row: JsonObject, _ctx: &StreamContext) -> Result<JsonObject> {
    Ok(row)
}
