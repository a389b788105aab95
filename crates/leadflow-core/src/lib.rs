//! Workflow orchestration engine for Leadflow.
//!
//! This crate executes caller-supplied orchestration requests: it builds the
//! step dependency graph, orders it topologically, drives each step through
//! its handler with retry/backoff, and merges step outputs into the shared
//! run context. Network access goes through the [`orchestration::http`]
//! port, which the infrastructure layer implements -- this crate never
//! depends on an HTTP client directly.

pub mod orchestration;
