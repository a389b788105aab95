//! Orchestration engine: the per-run lifecycle.
//!
//! One `execute` call takes a request through RUNNING to exactly one
//! terminal status. The engine builds the execution order, walks it
//! sequentially through the step executor, folds completed outputs into the
//! run context, and publishes a registry snapshot after every step. Only
//! graph-level errors abort a run before steps execute; per-step failures
//! are data in the result.
//!
//! # Run flow
//!
//! 1. Create the RUNNING result, register it, mint a cancellation token.
//! 2. Validate + topologically order the steps (fail the run on error).
//! 3. For each ordered step (skipping container-claimed ones): check
//!    cancellation, execute with retries, merge output, publish snapshot.
//! 4. Stop early on `stop_on_first_error`, cancellation, or the optional
//!    run deadline.
//! 5. Set the terminal status, stamp duration, deregister the run.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::Utc;
use dashmap::DashMap;
use tokio_util::sync::CancellationToken;

use leadflow_types::orchestration::{
    OrchestrationRequest, OrchestrationResult, RetryPolicy, RunStatus, StepStatus, WorkflowStep,
};

use super::context::RunContext;
use super::dag;
use super::http::OrchestrationHttpClient;
use super::registry::RunRegistry;
use super::step_executor::StepExecutor;

/// Executes orchestration requests and tracks the in-flight ones.
pub struct OrchestrationEngine {
    http: Arc<dyn OrchestrationHttpClient>,
    registry: Arc<RunRegistry>,
    cancellations: DashMap<String, CancellationToken>,
    default_retry: RetryPolicy,
}

impl OrchestrationEngine {
    /// Create an engine with its own private registry.
    pub fn new(http: Arc<dyn OrchestrationHttpClient>) -> Self {
        Self::with_registry(http, Arc::new(RunRegistry::new()))
    }

    /// Create an engine publishing into a caller-owned registry.
    pub fn with_registry(
        http: Arc<dyn OrchestrationHttpClient>,
        registry: Arc<RunRegistry>,
    ) -> Self {
        Self {
            http,
            registry,
            cancellations: DashMap::new(),
            default_retry: RetryPolicy::default(),
        }
    }

    /// Override the engine-wide default retry policy.
    pub fn with_default_retry(mut self, default_retry: RetryPolicy) -> Self {
        self.default_retry = default_retry;
        self
    }

    /// The registry this engine publishes into.
    pub fn registry(&self) -> Arc<RunRegistry> {
        Arc::clone(&self.registry)
    }

    /// Run a request to completion and return the full result.
    ///
    /// Suspends for the run's total duration. Always returns a complete
    /// result describing which steps ran, which failed, and why -- even
    /// when the run fails.
    pub async fn execute(&self, request: OrchestrationRequest) -> OrchestrationResult {
        let started_at = Utc::now();
        let timer = Instant::now();
        let enable_logging = request.options.enable_logging;

        let mut result = OrchestrationResult {
            request_id: request.request_id.clone(),
            status: RunStatus::Running,
            steps: Vec::new(),
            output: request.context.clone(),
            started_at,
            completed_at: None,
            duration_ms: None,
            error: None,
        };

        let cancel_token = CancellationToken::new();
        self.cancellations
            .insert(request.request_id.clone(), cancel_token.clone());
        self.registry.publish(result.clone());

        if enable_logging {
            tracing::info!(
                request_id = request.request_id.as_str(),
                steps = request.steps.len(),
                "orchestration run started"
            );
        }

        match dag::build_execution_order(&request.steps) {
            Err(error) => {
                result.status = RunStatus::Failed;
                result.error = Some(error.to_string());
                if enable_logging {
                    tracing::error!(
                        request_id = request.request_id.as_str(),
                        error = %error,
                        "orchestration request rejected"
                    );
                }
            }
            Ok(order) => {
                let run_error = self
                    .run_ordered(&request, &order, &mut result, &cancel_token)
                    .await;
                let any_failed = result
                    .steps
                    .iter()
                    .any(|step| step.status == StepStatus::Failed);
                result.status = if run_error.is_some() || any_failed {
                    RunStatus::Failed
                } else {
                    RunStatus::Completed
                };
                result.error =
                    run_error.or_else(|| any_failed.then(|| "one or more steps failed".to_string()));
            }
        }

        result.completed_at = Some(Utc::now());
        result.duration_ms = Some(timer.elapsed().as_millis() as u64);
        self.registry.remove(&request.request_id);
        self.cancellations.remove(&request.request_id);

        if enable_logging {
            tracing::info!(
                request_id = request.request_id.as_str(),
                status = ?result.status,
                executed = result.steps.len(),
                duration_ms = result.duration_ms,
                "orchestration run finished"
            );
        }

        result
    }

    /// Point-in-time snapshot of an in-flight run.
    pub fn active(&self, request_id: &str) -> Option<OrchestrationResult> {
        self.registry.active(request_id)
    }

    /// Snapshots of every in-flight run.
    pub fn all_active(&self) -> Vec<OrchestrationResult> {
        self.registry.all_active()
    }

    /// Request cooperative cancellation of an in-flight run.
    ///
    /// The run stops before its next step and terminates FAILED. Returns
    /// false when no such run is active.
    pub fn cancel(&self, request_id: &str) -> bool {
        match self.cancellations.get(request_id) {
            Some(token) => {
                token.cancel();
                true
            }
            None => false,
        }
    }

    /// Walk the ordered steps; returns the top-level error message for
    /// early-terminated runs (cancellation, deadline, stop-on-first-error).
    async fn run_ordered(
        &self,
        request: &OrchestrationRequest,
        order: &[String],
        result: &mut OrchestrationResult,
        cancel_token: &CancellationToken,
    ) -> Option<String> {
        let steps_by_id: HashMap<&str, &WorkflowStep> = request
            .steps
            .iter()
            .map(|step| (step.id.as_str(), step))
            .collect();

        // Steps referenced by PARALLEL/FOR_EACH containers execute through
        // their container, not through the top-level loop.
        let nested: HashSet<&str> = request
            .steps
            .iter()
            .flat_map(|step| step.config.nested_steps())
            .map(String::as_str)
            .collect();

        let executor = StepExecutor::new(
            Arc::clone(&self.http),
            &request.steps,
            request.options.clone(),
            self.default_retry.clone(),
        );
        let mut ctx = RunContext::new(request.context.clone());

        let step_loop = async {
            for step_id in order {
                if nested.contains(step_id.as_str()) {
                    continue;
                }
                if cancel_token.is_cancelled() {
                    return Some("orchestration cancelled".to_string());
                }

                let step = steps_by_id[step_id.as_str()];
                let step_result = executor.execute(step, &ctx).await;

                let failure = (step_result.status == StepStatus::Failed).then(|| {
                    format!(
                        "step '{}' failed: {}",
                        step_result.step_id,
                        step_result.error.as_deref().unwrap_or("unknown error")
                    )
                });
                if failure.is_none() {
                    if let Some(output) = &step_result.output {
                        ctx.merge_step_output(&step_result.step_id, output);
                    }
                }

                result.steps.push(step_result);
                result.output = ctx.values().clone();
                self.registry.publish(result.clone());

                if let Some(message) = failure {
                    if request.options.stop_on_first_error {
                        return Some(message);
                    }
                }
            }
            None
        };

        match request.options.run_timeout_ms {
            Some(limit_ms) => {
                match tokio::time::timeout(Duration::from_millis(limit_ms), step_loop).await {
                    Ok(outcome) => outcome,
                    Err(_) => Some(format!("orchestration exceeded {limit_ms}ms deadline")),
                }
            }
            None => step_loop.await,
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
