//! Infrastructure adapters for the Leadflow orchestration engine.
//!
//! Implements the ports defined in `leadflow-core` against real services;
//! currently the reqwest-backed HTTP client used by HTTP_REQUEST and
//! WEBHOOK_CALL steps.

pub mod http_client;

pub use http_client::ReqwestHttpClient;
