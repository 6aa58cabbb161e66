//! HTTP client with backoff retry
//!
//! Provides the transport used by every stream:
//! - Exponential backoff retries with a fixed attempt ceiling
//! - Status code classification (fast-fail vs retry)
//! - Optional rate limiting
//! - Structured logging of failures and final success

use super::rate_limit::{RateLimiter, RateLimiterConfig};
use crate::error::{Error, Result};
use crate::types::Method;
use reqwest::{Client, StatusCode};
use serde_json::Value;
use std::collections::HashMap;
use std::time::Duration;
use tracing::{debug, error, warn};

/// Retry behaviour for one call site
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total number of attempts, including the first one
    pub max_attempts: u32,
    /// Delay before the first retry
    pub initial_backoff: Duration,
    /// Multiplier applied to the delay after every failed attempt
    pub factor: u32,
    /// HTTP statuses that are retried instead of failing fast
    pub retry_statuses: Vec<u16>,
}

impl RetryPolicy {
    /// Policy for GraphQL subgraph calls: network faults only
    pub fn graphql() -> Self {
        Self {
            max_attempts: 5,
            initial_backoff: Duration::from_secs(1),
            factor: 2,
            retry_statuses: Vec::new(),
        }
    }

    /// Policy for REST services, which also throttle with 429/502
    pub fn rest() -> Self {
        Self {
            max_attempts: 10,
            initial_backoff: Duration::from_secs(1),
            factor: 3,
            retry_statuses: vec![429, 502],
        }
    }

    /// Override the initial backoff
    #[must_use]
    pub fn with_initial_backoff(mut self, initial: Duration) -> Self {
        self.initial_backoff = initial;
        self
    }

    /// Override the attempt ceiling
    #[must_use]
    pub fn with_max_attempts(mut self, attempts: u32) -> Self {
        self.max_attempts = attempts.max(1);
        self
    }

    /// Delay to wait after the failed attempt with the given 0-based index
    pub fn backoff_for(&self, retry: u32) -> Duration {
        let multiplier = self.factor.saturating_pow(retry);
        self.initial_backoff.saturating_mul(multiplier)
    }

    /// The full schedule of delays between attempts
    pub fn delays(&self) -> Vec<Duration> {
        (0..self.max_attempts.saturating_sub(1))
            .map(|retry| self.backoff_for(retry))
            .collect()
    }

    fn retries_status(&self, status: u16) -> bool {
        self.retry_statuses.contains(&status)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::graphql()
    }
}

/// Configuration for the HTTP client
#[derive(Debug, Clone)]
pub struct HttpClientConfig {
    /// Request timeout
    pub timeout: Duration,
    /// Rate limiter configuration
    pub rate_limit: Option<RateLimiterConfig>,
    /// Default headers for all requests
    pub default_headers: HashMap<String, String>,
    /// User agent string
    pub user_agent: String,
}

impl Default for HttpClientConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
            rate_limit: None,
            default_headers: HashMap::new(),
            user_agent: format!("subgraph-tap/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

impl HttpClientConfig {
    /// Set the request timeout
    #[must_use]
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Enable rate limiting
    #[must_use]
    pub fn rate_limit(mut self, config: RateLimiterConfig) -> Self {
        self.rate_limit = Some(config);
        self
    }

    /// Add a default header
    #[must_use]
    pub fn header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.default_headers.insert(key.into(), value.into());
        self
    }

    /// Set user agent
    #[must_use]
    pub fn user_agent(mut self, agent: impl Into<String>) -> Self {
        self.user_agent = agent.into();
        self
    }
}

/// A fully prepared request: everything already resolved from the page token
#[derive(Debug, Clone)]
pub struct RequestSpec {
    /// HTTP method
    pub method: Method,
    /// Absolute URL
    pub url: String,
    /// Query string parameters, in order
    pub query: Vec<(String, String)>,
    /// JSON body
    pub body: Option<Value>,
    /// Retry policy for this call site
    pub retry: RetryPolicy,
}

impl RequestSpec {
    /// A GraphQL POST with the given JSON body
    pub fn graphql(url: impl Into<String>, body: Value) -> Self {
        Self {
            method: Method::POST,
            url: url.into(),
            query: Vec::new(),
            body: Some(body),
            retry: RetryPolicy::graphql(),
        }
    }

    /// A REST GET with query parameters
    pub fn rest(url: impl Into<String>, query: Vec<(String, String)>) -> Self {
        Self {
            method: Method::GET,
            url: url.into(),
            query,
            body: None,
            retry: RetryPolicy::rest(),
        }
    }

    /// Replace the retry policy
    #[must_use]
    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }
}

/// A successful response with its body read
#[derive(Debug, Clone)]
pub struct HttpResponse {
    /// HTTP status
    pub status: u16,
    /// Final URL of the request
    pub url: String,
    /// Response body text
    pub body: String,
}

/// HTTP client with retry and rate limiting
pub struct HttpClient {
    client: Client,
    config: HttpClientConfig,
    rate_limiter: Option<RateLimiter>,
}

impl HttpClient {
    /// Create a new HTTP client with default configuration
    pub fn new() -> Result<Self> {
        Self::with_config(HttpClientConfig::default())
    }

    /// Create a new HTTP client with custom configuration
    pub fn with_config(config: HttpClientConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.timeout)
            .user_agent(&config.user_agent)
            .build()
            .map_err(|e| Error::config(format!("Failed to build HTTP client: {e}")))?;

        let rate_limiter = config.rate_limit.as_ref().map(RateLimiter::new);

        Ok(Self {
            client,
            config,
            rate_limiter,
        })
    }

    /// Check if rate limiting is enabled
    pub fn has_rate_limiter(&self) -> bool {
        self.rate_limiter.is_some()
    }

    /// Send a request, retrying transient faults per its retry policy
    pub async fn send(&self, request: &RequestSpec) -> Result<HttpResponse> {
        let policy = &request.retry;
        let max_attempts = policy.max_attempts.max(1);
        let mut attempt = 0;

        loop {
            attempt += 1;

            let err = match self.send_once(request).await {
                Ok(response) => {
                    debug!(
                        url = %request.url,
                        attempt,
                        status = response.status,
                        "Response received successfully"
                    );
                    return Ok(response);
                }
                Err(e) if e.is_retryable() => e,
                Err(e) => {
                    error!(url = %request.url, error = %e, "Request failed, not retrying");
                    return Err(e);
                }
            };

            if attempt >= max_attempts {
                error!(
                    url = %request.url,
                    attempts = attempt,
                    error = %err,
                    "Giving up after exhausting retries"
                );
                return Err(Error::MaxRetriesExceeded {
                    attempts: attempt,
                    last: Box::new(err),
                });
            }

            let delay = policy.backoff_for(attempt - 1);
            warn!(
                url = %request.url,
                attempt,
                max_attempts,
                delay_ms = delay.as_millis() as u64,
                error = %err,
                "Request failed, backing off"
            );
            tokio::time::sleep(delay).await;
        }
    }

    /// One attempt, classified into success / retryable / fatal
    async fn send_once(&self, request: &RequestSpec) -> Result<HttpResponse> {
        if let Some(ref limiter) = self.rate_limiter {
            limiter.wait().await;
        }

        let mut req = self.client.request(request.method.into(), &request.url);

        for (key, value) in &self.config.default_headers {
            req = req.header(key.as_str(), value.as_str());
        }

        if !request.query.is_empty() {
            req = req.query(&request.query);
        }

        if let Some(ref body) = request.body {
            req = req.json(body);
        }

        let response = req.send().await?;
        let status = response.status();
        let url = response.url().to_string();

        if request.retry.retries_status(status.as_u16()) {
            return Err(Error::RateLimited {
                status: status.as_u16(),
            });
        }

        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            let body = response.text().await.unwrap_or_default();
            warn!(url = %url, status = status.as_u16(), body = %body, "Unauthorized request");
            return Err(Error::Authorization {
                status: status.as_u16(),
                url,
            });
        }

        if status.is_client_error() || status.is_server_error() {
            let body = response.text().await.unwrap_or_default();
            return Err(Error::upstream(status.as_u16(), url, &body));
        }

        // A body that dies mid-read is a network fault like any other
        let body = response.text().await?;

        Ok(HttpResponse {
            status: status.as_u16(),
            url,
            body,
        })
    }
}

impl std::fmt::Debug for HttpClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpClient")
            .field("config", &self.config)
            .field("has_rate_limiter", &self.rate_limiter.is_some())
            .finish_non_exhaustive()
    }
}
