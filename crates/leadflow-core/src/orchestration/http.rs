//! HTTP client port for networked step kinds.
//!
//! The trait is defined here in core and implemented by the infrastructure
//! layer (dependency inversion, same pattern as the repository traits in
//! the rest of the platform). Handlers build an [`HttpCall`] descriptor
//! with all templates already resolved; the client only moves bytes.

use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

use serde_json::Value;
use thiserror::Error;

/// A fully resolved HTTP request descriptor.
#[derive(Debug, Clone)]
pub struct HttpCall {
    /// HTTP method name ("GET", "POST", ...).
    pub method: String,
    pub url: String,
    pub headers: HashMap<String, String>,
    /// Query string pairs appended to the URL.
    pub query: Vec<(String, String)>,
    /// JSON body; string bodies are sent raw.
    pub body: Option<Value>,
    pub timeout: Duration,
}

/// Response surfaced back to the step handlers.
#[derive(Debug, Clone)]
pub struct HttpCallResponse {
    pub status: u16,
    /// Response body, parsed as JSON when possible, else a JSON string.
    pub body: Value,
}

impl HttpCallResponse {
    /// True for 2xx statuses.
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Errors surfaced by the HTTP client or the handlers sitting on top of it.
#[derive(Debug, Clone, Error)]
pub enum HttpError {
    #[error("invalid HTTP method '{0}'")]
    InvalidMethod(String),

    #[error("request to '{url}' timed out after {timeout_ms}ms")]
    Timeout { url: String, timeout_ms: u64 },

    #[error("request to '{url}' failed: {message}")]
    Transport { url: String, message: String },

    /// Non-2xx response. Raised by the handlers, not the client.
    #[error("'{url}' responded with status {status}")]
    Status { url: String, status: u16 },
}

/// Boxed future returned by the client port, keeping the trait object-safe.
pub type HttpFuture<'a> =
    Pin<Box<dyn Future<Output = Result<HttpCallResponse, HttpError>> + Send + 'a>>;

/// Port consumed by HTTP_REQUEST and WEBHOOK_CALL handlers.
pub trait OrchestrationHttpClient: Send + Sync {
    /// Execute one HTTP call within its timeout.
    fn execute(&self, call: HttpCall) -> HttpFuture<'_>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn success_range_is_2xx() {
        for (status, success) in [(199, false), (200, true), (204, true), (299, true), (302, false), (404, false), (500, false)] {
            let response = HttpCallResponse {
                status,
                body: Value::Null,
            };
            assert_eq!(response.is_success(), success, "status {status}");
        }
    }

    #[test]
    fn http_error_display() {
        let err = HttpError::Timeout {
            url: "https://api.example.com".to_string(),
            timeout_ms: 30_000,
        };
        assert_eq!(
            err.to_string(),
            "request to 'https://api.example.com' timed out after 30000ms"
        );
    }
}
