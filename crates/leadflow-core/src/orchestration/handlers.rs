//! Leaf step handlers: HTTP_REQUEST, WEBHOOK_CALL, CONDITIONAL, WAIT,
//! DATA_TRANSFORM.
//!
//! Every string the caller authored (URL, header values, query values, body
//! strings) passes through template substitution before dispatch. A handler
//! failure returns `StepError` and is retried by the step executor;
//! CONDITIONAL, WAIT, and DATA_TRANSFORM degrade gracefully instead of
//! failing on missing data.
//!
//! PARALLEL and FOR_EACH live in `step_executor`, because they recurse into
//! the executor itself.

use std::collections::HashMap;
use std::time::Duration;

use serde_json::{json, Map, Value};

use leadflow_types::orchestration::{Condition, TransformSpec, WaitUnit};

use super::condition::evaluate_conditions;
use super::context::RunContext;
use super::error::StepError;
use super::http::{HttpCall, HttpError, OrchestrationHttpClient};
use super::template::{resolve_template, resolve_value};

/// Default HTTP_REQUEST timeout.
pub const DEFAULT_HTTP_TIMEOUT_MS: u64 = 30_000;

/// Fixed WEBHOOK_CALL timeout.
pub const WEBHOOK_TIMEOUT_MS: u64 = 10_000;

/// HTTP_REQUEST: substitute, dispatch, expose the response body.
#[allow(clippy::too_many_arguments)]
pub(crate) async fn http_request(
    http: &dyn OrchestrationHttpClient,
    method: &str,
    url: &str,
    headers: Option<&HashMap<String, String>>,
    query: Option<&HashMap<String, String>>,
    body: Option<&Value>,
    timeout_ms: Option<u64>,
    ctx: &RunContext,
) -> Result<Value, StepError> {
    let timeout_ms = timeout_ms.unwrap_or(DEFAULT_HTTP_TIMEOUT_MS);
    dispatch_http(http, method, url, headers, query, body, timeout_ms, ctx).await
}

/// WEBHOOK_CALL: method defaults to POST, timeout fixed at 10s.
pub(crate) async fn webhook_call(
    http: &dyn OrchestrationHttpClient,
    url: &str,
    method: Option<&str>,
    headers: Option<&HashMap<String, String>>,
    body: Option<&Value>,
    ctx: &RunContext,
) -> Result<Value, StepError> {
    let method = method.unwrap_or("POST");
    dispatch_http(http, method, url, headers, None, body, WEBHOOK_TIMEOUT_MS, ctx).await
}

#[allow(clippy::too_many_arguments)]
async fn dispatch_http(
    http: &dyn OrchestrationHttpClient,
    method: &str,
    url: &str,
    headers: Option<&HashMap<String, String>>,
    query: Option<&HashMap<String, String>>,
    body: Option<&Value>,
    timeout_ms: u64,
    ctx: &RunContext,
) -> Result<Value, StepError> {
    let url = resolve_template(url, ctx);

    let headers: HashMap<String, String> = headers
        .map(|map| {
            map.iter()
                .map(|(key, value)| (key.clone(), resolve_template(value, ctx)))
                .collect()
        })
        .unwrap_or_default();

    let query: Vec<(String, String)> = query
        .map(|map| {
            map.iter()
                .map(|(key, value)| (key.clone(), resolve_template(value, ctx)))
                .collect()
        })
        .unwrap_or_default();

    let body = body.map(|value| resolve_value(value, ctx));

    let response = http
        .execute(HttpCall {
            method: method.to_string(),
            url: url.clone(),
            headers,
            query,
            body,
            timeout: Duration::from_millis(timeout_ms),
        })
        .await?;

    if !response.is_success() {
        return Err(StepError::Http(HttpError::Status {
            url,
            status: response.status,
        }));
    }

    Ok(response.body)
}

/// CONDITIONAL: never fails; missing fields evaluate to false.
pub(crate) fn conditional(conditions: &[Condition], ctx: &RunContext) -> Value {
    let met = evaluate_conditions(conditions, ctx);
    json!({ "conditionMet": met })
}

/// WAIT: suspend for `duration` in `unit`.
pub(crate) async fn wait(duration: u64, unit: WaitUnit) -> Value {
    let millis = unit.to_millis(duration);
    tokio::time::sleep(Duration::from_millis(millis)).await;
    json!({ "waited": millis })
}

/// DATA_TRANSFORM: dotted-path mappings plus literal values.
///
/// A mapping whose source path is absent is skipped, mirroring the
/// non-fatal policy of template substitution.
pub(crate) fn data_transform(spec: &TransformSpec, ctx: &RunContext) -> Value {
    let mut output = Map::new();
    for mapping in &spec.mappings {
        if let Some(value) = ctx.get_path(&mapping.from) {
            output.insert(mapping.to.clone(), value.clone());
        }
    }
    for (key, value) in &spec.literals {
        output.insert(key.clone(), value.clone());
    }
    Value::Object(output)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
