//! Tracing subscriber initialization.
//!
//! Callers embedding the orchestration engine (the API service, worker
//! binaries, integration tests) call [`init_tracing`] once at startup.
//! Output is human-readable by default; pass `json_output` for the
//! line-delimited JSON the platform's log shipper ingests.

use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

/// Install the global tracing subscriber.
///
/// Respects `RUST_LOG`, defaulting to `info` when unset.
///
/// # Errors
///
/// Returns an error if a global subscriber is already installed.
pub fn init_tracing(json_output: bool) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    if json_output {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer().json().with_target(true))
            .try_init()?;
    } else {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer().with_target(true))
            .try_init()?;
    }

    Ok(())
}
