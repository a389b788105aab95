//! Drives a single step through its handler with retry, backoff, and
//! timing, producing an [`OrchestrationStepResult`].
//!
//! Failure is data: after retries are exhausted the executor returns a
//! FAILED result instead of propagating an error, so the engine decides
//! whether the run continues.
//!
//! PARALLEL and FOR_EACH are implemented here rather than in `handlers`
//! because they resolve nested step IDs against the request's step registry
//! and recurse into this same executor -- nested steps get the identical
//! retry/logging/timing pipeline as top-level ones.

use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Instant;

use chrono::Utc;
use futures_util::future::join_all;
use serde_json::{json, Map, Value};

use leadflow_types::orchestration::{
    OrchestrationOptions, OrchestrationStepResult, RetryPolicy, StepConfig, StepStatus,
    WorkflowStep,
};

use super::context::RunContext;
use super::error::StepError;
use super::handlers;
use super::http::OrchestrationHttpClient;
use super::retry;

type StepFuture<'a> = Pin<Box<dyn Future<Output = OrchestrationStepResult> + Send + 'a>>;

/// Executes workflow steps against one request's step registry.
///
/// Cheap to clone; detached PARALLEL dispatch clones it into spawned tasks.
#[derive(Clone)]
pub struct StepExecutor {
    http: Arc<dyn OrchestrationHttpClient>,
    steps_by_id: Arc<HashMap<String, WorkflowStep>>,
    options: OrchestrationOptions,
    default_retry: RetryPolicy,
}

impl StepExecutor {
    /// Build an executor over the request's steps.
    pub fn new(
        http: Arc<dyn OrchestrationHttpClient>,
        steps: &[WorkflowStep],
        options: OrchestrationOptions,
        default_retry: RetryPolicy,
    ) -> Self {
        let steps_by_id = steps
            .iter()
            .map(|step| (step.id.clone(), step.clone()))
            .collect();
        Self {
            http,
            steps_by_id: Arc::new(steps_by_id),
            options,
            default_retry,
        }
    }

    /// Run one step to a terminal per-step result, retrying per policy.
    pub async fn execute(
        &self,
        step: &WorkflowStep,
        ctx: &RunContext,
    ) -> OrchestrationStepResult {
        let policy = step
            .retry
            .clone()
            .unwrap_or_else(|| self.default_retry.clone());
        let started_at = Utc::now();
        let timer = Instant::now();
        let mut attempt: u32 = 1;

        if self.options.enable_logging {
            tracing::debug!(
                step_id = step.id.as_str(),
                kind = step.config.kind(),
                "step started"
            );
        }

        loop {
            match self.dispatch(step, ctx).await {
                Ok(output) => {
                    let duration_ms = timer.elapsed().as_millis() as u64;
                    if self.options.enable_logging {
                        tracing::debug!(
                            step_id = step.id.as_str(),
                            attempt,
                            duration_ms,
                            "step completed"
                        );
                    }
                    return OrchestrationStepResult {
                        step_id: step.id.clone(),
                        step_name: step.name.clone(),
                        status: StepStatus::Completed,
                        output: Some(output),
                        error: None,
                        attempts: attempt,
                        started_at,
                        completed_at: Utc::now(),
                        duration_ms,
                    };
                }
                Err(error) => {
                    if !retry::should_retry(&policy, attempt) {
                        if self.options.enable_logging {
                            tracing::warn!(
                                step_id = step.id.as_str(),
                                attempt,
                                error = %error,
                                "step failed, retries exhausted"
                            );
                        }
                        return OrchestrationStepResult {
                            step_id: step.id.clone(),
                            step_name: step.name.clone(),
                            status: StepStatus::Failed,
                            output: None,
                            error: Some(error.to_string()),
                            attempts: attempt,
                            started_at,
                            completed_at: Utc::now(),
                            duration_ms: timer.elapsed().as_millis() as u64,
                        };
                    }

                    let delay = retry::delay_for_attempt(&policy, attempt);
                    if self.options.enable_logging {
                        tracing::warn!(
                            step_id = step.id.as_str(),
                            attempt,
                            delay_ms = delay.as_millis() as u64,
                            error = %error,
                            "step failed, retrying"
                        );
                    }
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
            }
        }
    }

    /// Boxed recursion point for nested execution inside containers.
    fn execute_boxed<'a>(
        &'a self,
        step: &'a WorkflowStep,
        ctx: &'a RunContext,
    ) -> StepFuture<'a> {
        Box::pin(self.execute(step, ctx))
    }

    async fn dispatch(&self, step: &WorkflowStep, ctx: &RunContext) -> Result<Value, StepError> {
        match &step.config {
            StepConfig::HttpRequest {
                method,
                url,
                headers,
                query,
                body,
                timeout_ms,
            } => {
                handlers::http_request(
                    self.http.as_ref(),
                    method,
                    url,
                    headers.as_ref(),
                    query.as_ref(),
                    body.as_ref(),
                    *timeout_ms,
                    ctx,
                )
                .await
            }
            StepConfig::WebhookCall {
                url,
                method,
                headers,
                body,
            } => {
                handlers::webhook_call(
                    self.http.as_ref(),
                    url,
                    method.as_deref(),
                    headers.as_ref(),
                    body.as_ref(),
                    ctx,
                )
                .await
            }
            StepConfig::Conditional { conditions } => Ok(handlers::conditional(conditions, ctx)),
            StepConfig::Wait { duration, unit } => Ok(handlers::wait(*duration, *unit).await),
            StepConfig::DataTransform { transform } => Ok(handlers::data_transform(transform, ctx)),
            StepConfig::Parallel {
                steps,
                wait_for_all,
                max_concurrency,
            } => {
                self.run_parallel(steps, *wait_for_all, *max_concurrency, ctx)
                    .await
            }
            StepConfig::ForEach {
                input_variable,
                item_variable,
                steps,
                max_concurrency,
            } => {
                self.run_for_each(input_variable, item_variable, steps, *max_concurrency, ctx)
                    .await
            }
        }
    }

    // -- PARALLEL: bounded batches over referenced steps --

    async fn run_parallel(
        &self,
        step_ids: &[String],
        wait_for_all: bool,
        max_concurrency: Option<usize>,
        ctx: &RunContext,
    ) -> Result<Value, StepError> {
        let batch_size = self.fan_out_limit(max_concurrency);
        let mut outputs = Map::new();

        if !wait_for_all {
            // Fire-and-forget: results are not awaited, every member reports
            // only that it was started.
            for step_id in step_ids {
                let step = self.resolve_step(step_id)?.clone();
                let executor = self.clone();
                let snapshot = ctx.clone();
                tokio::spawn(async move {
                    let result = executor.execute_boxed(&step, &snapshot).await;
                    tracing::debug!(
                        step_id = result.step_id.as_str(),
                        status = ?result.status,
                        "detached parallel step settled"
                    );
                });
                outputs.insert(step_id.clone(), json!({ "started": true }));
            }
            return Ok(Value::Object(outputs));
        }

        for batch in step_ids.chunks(batch_size) {
            let mut futures = Vec::with_capacity(batch.len());
            for step_id in batch {
                futures.push(self.execute_boxed(self.resolve_step(step_id)?, ctx));
            }

            for result in join_all(futures).await {
                match result.status {
                    StepStatus::Completed => {
                        outputs.insert(result.step_id, result.output.unwrap_or(Value::Null));
                    }
                    StepStatus::Failed => {
                        return Err(StepError::NestedStepFailed {
                            step_id: result.step_id,
                            error: result.error.unwrap_or_default(),
                        });
                    }
                }
            }
        }

        Ok(Value::Object(outputs))
    }

    // -- FOR_EACH: nested sequence per item, items in bounded batches --

    async fn run_for_each(
        &self,
        input_variable: &str,
        item_variable: &str,
        step_ids: &[String],
        max_concurrency: Option<usize>,
        ctx: &RunContext,
    ) -> Result<Value, StepError> {
        let items = match ctx.get(input_variable) {
            Some(Value::Array(items)) => items.clone(),
            Some(other) => {
                return Err(StepError::InvalidForEachInput {
                    variable: input_variable.to_string(),
                    found: json_kind(other),
                });
            }
            None => {
                return Err(StepError::InvalidForEachInput {
                    variable: input_variable.to_string(),
                    found: "nothing",
                });
            }
        };

        let batch_size = self.fan_out_limit(max_concurrency);
        let mut results = Vec::with_capacity(items.len());

        for batch in items.chunks(batch_size) {
            let futures: Vec<_> = batch
                .iter()
                .map(|item| {
                    let mut item_ctx = ctx.clone();
                    item_ctx.set(item_variable, item.clone());
                    self.run_sequence(step_ids, item_ctx)
                })
                .collect();

            // join_all preserves input order, so results stay index-aligned
            // with the input array regardless of completion timing.
            for item_result in join_all(futures).await {
                results.push(item_result?);
            }
        }

        Ok(json!({ "results": results }))
    }

    /// Run a nested step sequence against an owned per-item context,
    /// folding each output in so later steps can reference earlier ones.
    async fn run_sequence(
        &self,
        step_ids: &[String],
        mut item_ctx: RunContext,
    ) -> Result<Value, StepError> {
        let mut outputs = Map::new();
        for step_id in step_ids {
            let step = self.resolve_step(step_id)?;
            let result = self.execute_boxed(step, &item_ctx).await;
            match result.status {
                StepStatus::Completed => {
                    let output = result.output.unwrap_or(Value::Null);
                    item_ctx.merge_step_output(step_id, &output);
                    outputs.insert(step_id.clone(), output);
                }
                StepStatus::Failed => {
                    return Err(StepError::NestedStepFailed {
                        step_id: result.step_id,
                        error: result.error.unwrap_or_default(),
                    });
                }
            }
        }
        Ok(Value::Object(outputs))
    }

    fn resolve_step(&self, step_id: &str) -> Result<&WorkflowStep, StepError> {
        self.steps_by_id
            .get(step_id)
            .ok_or_else(|| StepError::UnknownStep(step_id.to_string()))
    }

    fn fan_out_limit(&self, max_concurrency: Option<usize>) -> usize {
        max_concurrency
            .unwrap_or(self.options.max_concurrent_steps)
            .max(1)
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
