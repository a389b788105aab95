//! Error types for graph construction and step execution.
//!
//! `OrchestrationError` covers failures that abort a run before any step
//! executes. `StepError` covers handler failures; these are retried per
//! policy and then captured as FAILED step results -- they never propagate
//! past the step executor.

use thiserror::Error;

use super::http::HttpError;

/// Fatal request-level errors raised while building the execution order.
#[derive(Debug, Error)]
pub enum OrchestrationError {
    /// The dependency graph contains a cycle.
    #[error("cycle detected involving step '{0}'")]
    CycleDetected(String),

    /// Two steps in the request share an ID.
    #[error("duplicate step ID '{0}'")]
    DuplicateStepId(String),

    /// A step depends on an ID not present in the request.
    #[error("step '{step_id}' depends on unknown step '{dependency}'")]
    UnknownDependency { step_id: String, dependency: String },
}

/// Failures raised by step handlers.
#[derive(Debug, Error)]
pub enum StepError {
    /// HTTP transport, timeout, or non-success status.
    #[error(transparent)]
    Http(#[from] HttpError),

    /// FOR_EACH input did not resolve to an array.
    #[error("FOR_EACH input '{variable}' is not an array (found {found})")]
    InvalidForEachInput {
        variable: String,
        found: &'static str,
    },

    /// A container referenced a step ID outside the request.
    #[error("referenced step '{0}' is not defined in this request")]
    UnknownStep(String),

    /// A nested step came back FAILED after its own retries.
    #[error("nested step '{step_id}' failed: {error}")]
    NestedStepFailed { step_id: String, error: String },
}
