// Allow common clippy pedantic lints that aren't critical for this codebase
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_sign_loss)]
#![allow(clippy::cast_possible_wrap)]
#![allow(clippy::cast_precision_loss)]
#![allow(clippy::too_many_lines)]
#![allow(clippy::unused_self)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::items_after_statements)]
#![allow(clippy::unnecessary_wraps)]
#![allow(clippy::match_same_arms)]
#![allow(clippy::needless_pass_by_value)]

//! # Subgraph Tap
//!
//! Extracts Decentraland marketplace, collection, rental and balance data
//! from GraphQL subgraphs and the NFT metadata REST service, emitting
//! Singer-style SCHEMA / RECORD / STATE messages.
//!
//! ## Features
//!
//! - **Static stream catalog**: 34 streams declared as data, one request
//!   template, pagination strategy and post-processor each
//! - **Incremental sync**: inclusive replication-key cursors with boundary
//!   de-duplication and monotone checkpoints
//! - **Bounded runs**: a per-stream row budget and the upstream skip ceiling
//! - **Child streams**: sold estates drive point-in-time snapshot lookups
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use subgraph_tap::{config::TapConfig, engine::StreamDriver, state::StateManager, streams};
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> subgraph_tap::Result<()> {
//!     let config = TapConfig::from_file("tap.json")?;
//!     let mut driver = StreamDriver::from_config(config, StateManager::new())?;
//!
//!     let mut messages = Vec::new();
//!     driver.sync_stream(streams::find("rentals")?, &mut messages).await?;
//!     Ok(())
//! }
//! ```
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────────┐
//! │                           StreamDriver                           │
//! │  request → send → parse → paginate → post-process → dedup →      │
//! │  validate → RECORD → child run → STATE                           │
//! └──────────────────────────────────────────────────────────────────┘
//!                                 │
//! ┌──────────┬────────────┬───────┴──────┬────────────┬──────────────┐
//! │ Streams  │   HTTP     │  Paginate    │ Transform  │   State      │
//! ├──────────┼────────────┼──────────────┼────────────┼──────────────┤
//! │ Catalog  │ POST / GET │ Offset       │ Integers   │ Bookmarks    │
//! │ Queries  │ Retry      │ Timestamp    │ Flags      │ Checkpoints  │
//! │ Children │ Rate Limit │ Single row   │ Row ids    │              │
//! └──────────┴────────────┴──────────────┴────────────┴──────────────┘
//! ```

#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::doc_markdown)]

// ============================================================================
// Module declarations
// ============================================================================

/// Error types
pub mod error;

/// Common types and type aliases
pub mod types;

/// HTTP client with retry and rate limiting
pub mod http;

/// Pagination strategies
pub mod pagination;

/// Response envelope parsing
pub mod decode;

/// State management and checkpointing
pub mod state;

/// Per-run row budget
pub mod budget;

/// Composite-key duplicate filtering
pub mod dedup;

/// Record schemas and validation
pub mod schema;

/// Row post-processing helpers
pub mod transform;

/// Template interpolation
pub mod template;

/// Tap configuration
pub mod config;

/// Stream catalog
pub mod streams;

/// Main execution engine
pub mod engine;

/// Command-line interface
pub mod cli;

// ============================================================================
// Re-exports
// ============================================================================

pub use error::{Error, Result};
pub use types::*;

pub use config::TapConfig;
pub use engine::{Message, MessageSink, StreamDriver};
pub use state::StateManager;
pub use streams::{StreamContext, StreamDefinition};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Crate name
pub const NAME: &str = env!("CARGO_PKG_NAME");
