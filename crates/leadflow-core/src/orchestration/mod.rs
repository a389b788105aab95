//! Orchestration engine internals.
//!
//! Modules are layered leaf-first: `retry`, `template`, and `condition` are
//! pure; `dag` orders the step graph; `handlers` implement the leaf step
//! kinds against the `http` port; `step_executor` drives a single step with
//! retries and hosts the PARALLEL/FOR_EACH fan-out; `engine` owns the
//! per-run lifecycle and the active-run `registry`.

pub mod condition;
pub mod context;
pub mod dag;
pub mod engine;
pub mod error;
pub mod handlers;
pub mod http;
pub mod registry;
pub mod retry;
pub mod step_executor;
pub mod template;

#[cfg(test)]
pub(crate) mod testing;

pub use engine::OrchestrationEngine;
pub use error::{OrchestrationError, StepError};
pub use http::{HttpCall, HttpCallResponse, HttpError, OrchestrationHttpClient};
pub use registry::RunRegistry;
