//! Checkpoint state
//!
//! Tracks the highest replication value emitted per stream so an
//! interrupted or budget-limited run resumes where it stopped.
//!
//! - `State` / `StreamBookmark` - serialized bookmark shape
//! - `StateManager` - loads input state and applies monotonic updates

mod manager;
mod types;

pub use manager::StateManager;
pub use types::{State, StreamBookmark};
