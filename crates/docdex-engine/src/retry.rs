use std::time::Duration;

use docdex_core::errors::Result;

/// Bounded backoff policy for retryable failures
///
/// Applies to `ConcurrentModification` only; evaluation and choice errors
/// are data problems and are never retried.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    /// Maximum attempts including the first
    pub max_attempts: u32,
    /// Delay before the second attempt; doubles per attempt
    pub base_delay: Duration,
}

impl RetryPolicy {
    /// Delay to sleep after a failed attempt (0-based)
    pub fn delay_for(&self, attempt: u32) -> Duration {
        // Cap the shift so pathological attempt counts don't overflow
        let factor = 1u32 << attempt.min(10);
        self.base_delay.saturating_mul(factor)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            base_delay: Duration::from_millis(10),
        }
    }
}

/// Run an operation, retrying retryable failures within the policy budget
///
/// # Errors
/// Returns the last error once the budget is exhausted, or immediately for
/// non-retryable errors.
pub fn run_with_retry<T>(policy: &RetryPolicy, mut op: impl FnMut() -> Result<T>) -> Result<T> {
    let mut attempt = 0;
    loop {
        match op() {
            Ok(value) => return Ok(value),
            Err(err) if err.is_retryable() && attempt + 1 < policy.max_attempts => {
                tracing::debug!(
                    component = module_path!(),
                    attempt,
                    err.code = err.code(),
                    "retrying after transient failure"
                );
                std::thread::sleep(policy.delay_for(attempt));
                attempt += 1;
            }
            Err(err) => return Err(err),
        }
    }
}
