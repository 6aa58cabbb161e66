//! Error types for the tap
//!
//! Every fallible operation returns `Result<T, Error>`. The transport-level
//! variants carry enough information to decide whether a retry is allowed;
//! everything else aborts the current stream run.

use thiserror::Error;

/// Maximum number of body characters kept on an upstream error
pub const MAX_ERROR_BODY_CHARS: usize = 512;

/// The main error type for the tap
#[derive(Error, Debug)]
pub enum Error {
    // ============================================================================
    // Transport Errors
    // ============================================================================
    #[error("Network error: {0}")]
    TransientNetwork(#[from] reqwest::Error),

    #[error("Rate limited or bad gateway (HTTP {status})")]
    RateLimited { status: u16 },

    #[error("Requested resource was unauthorized or forbidden (HTTP {status}): {url}")]
    Authorization { status: u16, url: String },

    #[error("Error making request to API: {url} [HTTP {status}: {body}]")]
    Upstream {
        status: u16,
        url: String,
        body: String,
    },

    #[error("Gave up after {attempts} attempts: {last}")]
    MaxRetriesExceeded { attempts: u32, last: Box<Error> },

    // ============================================================================
    // Data Errors
    // ============================================================================
    #[error("Malformed response at '{path}': {message}")]
    MalformedResponse { path: String, message: String },

    #[error("Post-processing failed: {message}")]
    PostProcessing { message: String },

    #[error("Record failed schema validation: {message}")]
    SchemaValidation { message: String },

    // ============================================================================
    // Configuration Errors
    // ============================================================================
    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("Missing required config field: {field}")]
    MissingConfigField { field: String },

    #[error("Failed to parse JSON: {0}")]
    JsonParse(#[from] serde_json::Error),

    #[error("Failed to parse YAML: {0}")]
    YamlParse(#[from] serde_yaml::Error),

    #[error("Undefined variable in template: {variable}")]
    UndefinedVariable { variable: String },

    // ============================================================================
    // State / Catalog Errors
    // ============================================================================
    #[error("State error: {message}")]
    State { message: String },

    #[error("Stream '{stream}' not found in catalog")]
    StreamNotFound { stream: String },

    #[error("Stream '{stream}' failed: {source}")]
    Stream {
        stream: String,
        #[source]
        source: Box<Error>,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Create a config error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Create a missing field error
    pub fn missing_field(field: impl Into<String>) -> Self {
        Self::MissingConfigField {
            field: field.into(),
        }
    }

    /// Create an upstream error, truncating the body
    pub fn upstream(status: u16, url: impl Into<String>, body: &str) -> Self {
        Self::Upstream {
            status,
            url: url.into(),
            body: truncate_body(body),
        }
    }

    /// Create a malformed response error
    pub fn malformed(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self::MalformedResponse {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Create a post-processing error
    pub fn post_processing(message: impl Into<String>) -> Self {
        Self::PostProcessing {
            message: message.into(),
        }
    }

    /// Create a schema validation error
    pub fn schema(message: impl Into<String>) -> Self {
        Self::SchemaValidation {
            message: message.into(),
        }
    }

    /// Create an undefined variable error
    pub fn undefined_var(variable: impl Into<String>) -> Self {
        Self::UndefinedVariable {
            variable: variable.into(),
        }
    }

    /// Create a state error
    pub fn state(message: impl Into<String>) -> Self {
        Self::State {
            message: message.into(),
        }
    }

    /// Attach the stream name to an error
    pub fn in_stream(self, stream: impl Into<String>) -> Self {
        match self {
            // Already wrapped by a nested (child) run
            Self::Stream { .. } => self,
            other => Self::Stream {
                stream: stream.into(),
                source: Box::new(other),
            },
        }
    }

    /// Check if this error may be retried by the transport
    pub fn is_retryable(&self) -> bool {
        match self {
            // A request that cannot be built fails the same way every time
            Error::TransientNetwork(e) => !e.is_builder(),
            Error::RateLimited { .. } => true,
            _ => false,
        }
    }
}

/// Truncate a response body for inclusion in an error message
fn truncate_body(body: &str) -> String {
    if body.chars().count() <= MAX_ERROR_BODY_CHARS {
        return body.to_string();
    }
    let mut truncated: String = body.chars().take(MAX_ERROR_BODY_CHARS).collect();
    truncated.push_str("...");
    truncated
}

/// Result type alias for the tap
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::config("test message");
        assert_eq!(err.to_string(), "Configuration error: test message");

        let err = Error::missing_field("rentals_url");
        assert_eq!(err.to_string(), "Missing required config field: rentals_url");

        let err = Error::upstream(404, "https://example.com", "Not found");
        assert_eq!(
            err.to_string(),
            "Error making request to API: https://example.com [HTTP 404: Not found]"
        );
    }

    #[test]
    fn test_upstream_body_is_truncated() {
        let body = "x".repeat(2000);
        match Error::upstream(500, "u", &body) {
            Error::Upstream { body, .. } => {
                assert_eq!(body.len(), MAX_ERROR_BODY_CHARS + 3);
                assert!(body.ends_with("..."));
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_is_retryable() {
        assert!(Error::RateLimited { status: 429 }.is_retryable());
        assert!(Error::RateLimited { status: 502 }.is_retryable());

        assert!(!Error::Authorization {
            status: 401,
            url: String::new()
        }
        .is_retryable());
        assert!(!Error::upstream(400, "", "").is_retryable());
        assert!(!Error::malformed("data.orders", "missing").is_retryable());
        assert!(!Error::post_processing("bad row").is_retryable());
    }

    #[test]
    fn test_request_build_failure_is_not_retryable() {
        let err = reqwest::Client::new().get("not a url").build().unwrap_err();
        assert!(err.is_builder());

        let err = Error::from(err);
        assert!(matches!(err, Error::TransientNetwork(_)));
        assert!(!err.is_retryable());
    }

    #[test]
    fn test_in_stream_wraps_once() {
        let err = Error::post_processing("boom").in_stream("child");
        let err = err.in_stream("parent");
        match err {
            Error::Stream { stream, source } => {
                assert_eq!(stream, "child");
                assert!(matches!(*source, Error::PostProcessing { .. }));
            }
            other => panic!("unexpected {other:?}"),
        }
    }
}
