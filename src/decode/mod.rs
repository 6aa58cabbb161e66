//! Response parser module
//!
//! Extracts the result array from a decoded JSON envelope.
//!
//! # Overview
//!
//! Subgraphs answer with `{"data": {"<object>": [...]}}` and the REST metadata
//! service with `{"data": [...]}`. The parser walks a dot-separated records path
//! to the array and reports the batch size that drives pagination and the run
//! budget. A missing path means the upstream schema changed, so it is never
//! retried.

mod parser;

pub use parser::{extract_path, ParsedPage, ResponseParser};
