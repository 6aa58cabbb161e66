//! HTTP transport module
//!
//! Sends one prepared request to a subgraph or REST service, retrying
//! transient faults with exponential backoff.
//!
//! # Features
//!
//! - **Retry classification**: network faults and configured statuses (429/502
//!   for REST services) are retried; 401/403 and other 4xx/5xx fail fast
//! - **Exponential backoff**: `initial * factor^n`, no jitter, fixed attempt ceiling
//! - **Rate Limiting**: optional token bucket using governor

mod client;
mod rate_limit;

pub use client::{HttpClient, HttpClientConfig, HttpResponse, RequestSpec, RetryPolicy};
pub use rate_limit::{RateLimiter, RateLimiterConfig};
