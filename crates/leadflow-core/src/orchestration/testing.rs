//! Shared test doubles for the orchestration modules.

use std::collections::VecDeque;
use std::sync::Mutex;

use serde_json::{json, Value};

use super::http::{HttpCall, HttpCallResponse, HttpError, HttpFuture, OrchestrationHttpClient};

/// Scripted HTTP client: pops one queued response per call and records every
/// call it sees. An empty queue answers 200 with an empty object.
#[derive(Default)]
pub(crate) struct MockHttpClient {
    responses: Mutex<VecDeque<Result<HttpCallResponse, HttpError>>>,
    calls: Mutex<Vec<HttpCall>>,
}

impl MockHttpClient {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_ok(&self, status: u16, body: Value) {
        self.responses
            .lock()
            .unwrap()
            .push_back(Ok(HttpCallResponse { status, body }));
    }

    pub fn push_err(&self, error: HttpError) {
        self.responses.lock().unwrap().push_back(Err(error));
    }

    pub fn calls(&self) -> Vec<HttpCall> {
        self.calls.lock().unwrap().clone()
    }
}

impl OrchestrationHttpClient for MockHttpClient {
    fn execute(&self, call: HttpCall) -> HttpFuture<'_> {
        Box::pin(async move {
            self.calls.lock().unwrap().push(call);
            self.responses
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| {
                    Ok(HttpCallResponse {
                        status: 200,
                        body: json!({}),
                    })
                })
        })
    }
}
