//! Reqwest-backed implementation of the core HTTP client port.
//!
//! The trait lives in `leadflow-core`; this adapter only moves bytes. Every
//! template has already been resolved by the handlers, and the per-call
//! timeout comes in on the [`HttpCall`] descriptor.

use leadflow_core::orchestration::http::{
    HttpCall, HttpCallResponse, HttpError, HttpFuture, OrchestrationHttpClient,
};
use serde_json::Value;

/// HTTP client for orchestration steps, sharing one reqwest connection pool.
pub struct ReqwestHttpClient {
    client: reqwest::Client,
}

impl ReqwestHttpClient {
    pub fn new() -> Self {
        let client = reqwest::Client::builder()
            .user_agent("leadflow-orchestrator/0.1")
            .build()
            .expect("failed to build HTTP client");
        Self { client }
    }
}

impl Default for ReqwestHttpClient {
    fn default() -> Self {
        Self::new()
    }
}

impl OrchestrationHttpClient for ReqwestHttpClient {
    fn execute(&self, call: HttpCall) -> HttpFuture<'_> {
        Box::pin(async move {
            let method: reqwest::Method = call
                .method
                .to_uppercase()
                .parse()
                .map_err(|_| HttpError::InvalidMethod(call.method.clone()))?;

            let mut request = self
                .client
                .request(method, &call.url)
                .timeout(call.timeout);

            for (key, value) in &call.headers {
                request = request.header(key.as_str(), value.as_str());
            }
            if !call.query.is_empty() {
                request = request.query(&call.query);
            }
            if let Some(body) = &call.body {
                // String bodies go out raw; everything else as JSON.
                request = match body {
                    Value::String(raw) => request.body(raw.clone()),
                    other => request.json(other),
                };
            }

            let response = request.send().await.map_err(|error| {
                if error.is_timeout() {
                    HttpError::Timeout {
                        url: call.url.clone(),
                        timeout_ms: call.timeout.as_millis() as u64,
                    }
                } else {
                    HttpError::Transport {
                        url: call.url.clone(),
                        message: error.to_string(),
                    }
                }
            })?;

            let status = response.status().as_u16();
            let text = response.text().await.map_err(|error| HttpError::Transport {
                url: call.url.clone(),
                message: format!("failed to read response body: {error}"),
            })?;

            // Surface JSON bodies structurally so steps can path into them.
            let body = serde_json::from_str(&text).unwrap_or(Value::String(text));

            tracing::debug!(url = call.url.as_str(), status, "http call finished");

            Ok(HttpCallResponse { status, body })
        })
    }
}
