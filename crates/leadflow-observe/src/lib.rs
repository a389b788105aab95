//! Observability setup for Leadflow services.

pub mod tracing_setup;
