//! Shared domain types for the Leadflow orchestration engine.
//!
//! This crate contains the wire-facing model for orchestration requests,
//! workflow steps, retry policies, and run results.
//!
//! Zero infrastructure dependencies -- only serde, serde_json, chrono.

pub mod orchestration;
