//! Orchestration domain types for Leadflow.
//!
//! Defines the model callers submit to the orchestration engine (steps,
//! retry policies, run options) and the result types the engine reports
//! back. Step kinds are an internally tagged union so dispatch is a closed,
//! typed extension rather than a string switch.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

// ---------------------------------------------------------------------------
// Workflow Step
// ---------------------------------------------------------------------------

/// A single step in an orchestration request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkflowStep {
    /// Caller-defined step ID (e.g. "score-lead"). Unique within a request.
    pub id: String,
    /// Human-readable step name.
    pub name: String,
    /// Step IDs this step depends on (DAG edges).
    #[serde(default)]
    pub depends_on: Vec<String>,
    /// Retry policy override for this step (engine default when absent).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub retry: Option<RetryPolicy>,
    /// Step-specific configuration payload.
    pub config: StepConfig,
}

/// Step-specific configuration payload.
///
/// Internally tagged by `type` to match the step documents produced by the
/// platform's callers:
/// ```json
/// { "type": "HTTP_REQUEST", "method": "GET", "url": "https://..." }
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum StepConfig {
    /// Make an HTTP request and expose the response body.
    HttpRequest {
        method: String,
        url: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        headers: Option<HashMap<String, String>>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        query: Option<HashMap<String, String>>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        body: Option<Value>,
        /// Request timeout in milliseconds (default 30_000).
        #[serde(default, skip_serializing_if = "Option::is_none")]
        timeout_ms: Option<u64>,
    },
    /// Evaluate structured conditions against the run context.
    Conditional { conditions: Vec<Condition> },
    /// Fan out other steps of the same request in bounded batches.
    Parallel {
        /// IDs of the steps to execute.
        steps: Vec<String>,
        /// Await each batch before starting the next (default true).
        #[serde(default = "default_wait_for_all")]
        wait_for_all: bool,
        /// Batch size override (falls back to `max_concurrent_steps`).
        #[serde(default, skip_serializing_if = "Option::is_none")]
        max_concurrency: Option<usize>,
    },
    /// Run nested steps once per element of an array in the context.
    ForEach {
        /// Context key holding the input array.
        input_variable: String,
        /// Context key the current element is bound to per iteration.
        item_variable: String,
        /// IDs of the steps to execute for each element.
        steps: Vec<String>,
        /// Concurrent item limit (falls back to `max_concurrent_steps`).
        #[serde(default, skip_serializing_if = "Option::is_none")]
        max_concurrency: Option<usize>,
    },
    /// Suspend the step for a fixed duration.
    Wait { duration: u64, unit: WaitUnit },
    /// Apply a declarative transform to the run context.
    DataTransform { transform: TransformSpec },
    /// Deliver a webhook with a fixed 10s timeout.
    WebhookCall {
        url: String,
        /// HTTP method (default POST).
        #[serde(default, skip_serializing_if = "Option::is_none")]
        method: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        headers: Option<HashMap<String, String>>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        body: Option<Value>,
    },
}

impl StepConfig {
    /// Wire name of this step kind, for logging and result reporting.
    pub fn kind(&self) -> &'static str {
        match self {
            StepConfig::HttpRequest { .. } => "HTTP_REQUEST",
            StepConfig::Conditional { .. } => "CONDITIONAL",
            StepConfig::Parallel { .. } => "PARALLEL",
            StepConfig::ForEach { .. } => "FOR_EACH",
            StepConfig::Wait { .. } => "WAIT",
            StepConfig::DataTransform { .. } => "DATA_TRANSFORM",
            StepConfig::WebhookCall { .. } => "WEBHOOK_CALL",
        }
    }

    /// IDs of steps this step claims for nested execution.
    ///
    /// Empty for leaf step kinds. Steps claimed by a container run through
    /// the container, not through the top-level loop.
    pub fn nested_steps(&self) -> &[String] {
        match self {
            StepConfig::Parallel { steps, .. } => steps,
            StepConfig::ForEach { steps, .. } => steps,
            _ => &[],
        }
    }
}

fn default_wait_for_all() -> bool {
    true
}

/// Time unit for WAIT steps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum WaitUnit {
    Milliseconds,
    Seconds,
    Minutes,
    Hours,
}

impl WaitUnit {
    /// Convert a duration expressed in this unit to milliseconds.
    pub fn to_millis(self, duration: u64) -> u64 {
        match self {
            WaitUnit::Milliseconds => duration,
            WaitUnit::Seconds => duration * 1_000,
            WaitUnit::Minutes => duration * 60_000,
            WaitUnit::Hours => duration * 3_600_000,
        }
    }
}

// ---------------------------------------------------------------------------
// Conditions
// ---------------------------------------------------------------------------

/// One clause of a CONDITIONAL step.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Condition {
    /// Dotted path resolved against the run context (e.g. "lead.score").
    pub field: String,
    pub operator: ConditionOperator,
    /// Right-hand operand.
    pub value: Value,
    /// How this clause combines with the running result (default AND).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub logic: Option<ConditionLogic>,
}

/// Comparison operator for a condition clause.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConditionOperator {
    Eq,
    Ne,
    Gt,
    Gte,
    Lt,
    Lte,
    In,
    NotIn,
    Contains,
    NotContains,
    Regex,
}

/// Boolean connective for combining condition clauses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ConditionLogic {
    And,
    Or,
}

// ---------------------------------------------------------------------------
// Data transform
// ---------------------------------------------------------------------------

/// Declarative transform applied to the run context.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TransformSpec {
    /// Dotted-path extractions from the context into output keys.
    #[serde(default)]
    pub mappings: Vec<FieldMapping>,
    /// Literal values copied verbatim into the output.
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub literals: HashMap<String, Value>,
}

/// Single mapping rule: read `from` (dotted path), write `to`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FieldMapping {
    pub from: String,
    pub to: String,
}

// ---------------------------------------------------------------------------
// Retry policy
// ---------------------------------------------------------------------------

/// Retry policy for a workflow step.
///
/// Immutable value, either attached to a step or supplied by the engine as
/// its default (`RetryPolicy::default()`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetryPolicy {
    /// Maximum number of attempts, including the first (>= 1, default 3).
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
    #[serde(default = "default_strategy")]
    pub strategy: BackoffStrategy,
    /// Base delay in milliseconds (default 1000).
    #[serde(default = "default_initial_delay_ms")]
    pub initial_delay_ms: u64,
    /// Cap on exponential growth in milliseconds (default 30_000).
    #[serde(default = "default_max_delay_ms")]
    pub max_delay_ms: u64,
    /// Growth factor for EXPONENTIAL (default 2.0).
    #[serde(default = "default_backoff_multiplier")]
    pub backoff_multiplier: f64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            strategy: default_strategy(),
            initial_delay_ms: default_initial_delay_ms(),
            max_delay_ms: default_max_delay_ms(),
            backoff_multiplier: default_backoff_multiplier(),
        }
    }
}

fn default_max_attempts() -> u32 {
    3
}

fn default_strategy() -> BackoffStrategy {
    BackoffStrategy::Exponential
}

fn default_initial_delay_ms() -> u64 {
    1_000
}

fn default_max_delay_ms() -> u64 {
    30_000
}

fn default_backoff_multiplier() -> f64 {
    2.0
}

/// Strategy mapping a retry attempt number to a wait time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BackoffStrategy {
    Fixed,
    Linear,
    Exponential,
}

// ---------------------------------------------------------------------------
// Orchestration request
// ---------------------------------------------------------------------------

/// A caller-supplied orchestration run: steps, seed context, options.
///
/// Immutable for the duration of the run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrchestrationRequest {
    /// Unique run identifier, minted by the caller.
    pub request_id: String,
    /// Ordered list of workflow steps.
    pub steps: Vec<WorkflowStep>,
    /// Initial key/value context the run starts from.
    #[serde(default)]
    pub context: serde_json::Map<String, Value>,
    #[serde(default)]
    pub options: OrchestrationOptions,
}

/// Per-run execution options.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrchestrationOptions {
    /// Fan-out bound for PARALLEL / FOR_EACH batches (default 5).
    #[serde(default = "default_max_concurrent_steps")]
    pub max_concurrent_steps: usize,
    /// Stop the run at the first FAILED step (default false).
    #[serde(default)]
    pub stop_on_first_error: bool,
    /// Emit run-progress logs (default true).
    #[serde(default = "default_enable_logging")]
    pub enable_logging: bool,
    /// Overall run deadline in milliseconds (no deadline when absent).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub run_timeout_ms: Option<u64>,
}

impl Default for OrchestrationOptions {
    fn default() -> Self {
        Self {
            max_concurrent_steps: default_max_concurrent_steps(),
            stop_on_first_error: false,
            enable_logging: default_enable_logging(),
            run_timeout_ms: None,
        }
    }
}

fn default_max_concurrent_steps() -> usize {
    5
}

fn default_enable_logging() -> bool {
    true
}

// ---------------------------------------------------------------------------
// Run results
// ---------------------------------------------------------------------------

/// Overall status of an orchestration run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RunStatus {
    Running,
    Completed,
    Failed,
}

/// Terminal status of an individual step execution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum StepStatus {
    Completed,
    Failed,
}

/// Result of one step execution, appended to the run result in execution
/// order. Created once per step; never mutated afterwards.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrchestrationStepResult {
    pub step_id: String,
    pub step_name: String,
    pub status: StepStatus,
    /// Handler output (present only on COMPLETED).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output: Option<Value>,
    /// Failure message after retry exhaustion (present only on FAILED).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Final attempt count (1-based).
    pub attempts: u32,
    pub started_at: DateTime<Utc>,
    pub completed_at: DateTime<Utc>,
    pub duration_ms: u64,
}

/// The full result of an orchestration run.
///
/// Created with status RUNNING when the engine accepts the request, mutated
/// in place as steps complete, and made terminal (COMPLETED or FAILED)
/// exactly once.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrchestrationResult {
    pub request_id: String,
    pub status: RunStatus,
    /// Per-step results in execution order.
    pub steps: Vec<OrchestrationStepResult>,
    /// Final merged context.
    pub output: serde_json::Map<String, Value>,
    pub started_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration_ms: Option<u64>,
    /// Top-level failure message (graph error, deadline, cancellation, or
    /// first failed step when the run stops early).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
