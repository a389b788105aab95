//! Backoff arithmetic for step retries.
//!
//! Pure functions over [`RetryPolicy`]; the step executor owns the actual
//! sleep. Attempts are 1-based: the first execution is attempt 1, and the
//! delay after a failed attempt N is `delay_for_attempt(policy, N)`.

use std::time::Duration;

use leadflow_types::orchestration::{BackoffStrategy, RetryPolicy};

/// Whether another attempt is allowed after `attempt` just failed.
pub fn should_retry(policy: &RetryPolicy, attempt: u32) -> bool {
    attempt < policy.max_attempts
}

/// Delay to wait after failed attempt number `attempt` (1-based).
///
/// - FIXED: `initial_delay_ms`
/// - LINEAR: `initial_delay_ms * attempt`
/// - EXPONENTIAL: `min(initial_delay_ms * multiplier^(attempt - 1), max_delay_ms)`
pub fn delay_for_attempt(policy: &RetryPolicy, attempt: u32) -> Duration {
    let millis = match policy.strategy {
        BackoffStrategy::Fixed => policy.initial_delay_ms,
        BackoffStrategy::Linear => policy.initial_delay_ms.saturating_mul(u64::from(attempt)),
        BackoffStrategy::Exponential => {
            let exponent = attempt.saturating_sub(1).min(i32::MAX as u32) as i32;
            let grown = policy.initial_delay_ms as f64 * policy.backoff_multiplier.powi(exponent);
            grown.min(policy.max_delay_ms as f64) as u64
        }
    };
    Duration::from_millis(millis)
}
