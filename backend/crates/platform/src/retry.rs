//! Bounded storage calls with exponential-backoff retry.
//!
//! Every storage call runs under a timeout. Only errors that classify
//! themselves as transient (storage unavailable) are retried; everything
//! else is returned to the caller on the first failure.

use std::future::Future;
use std::time::Duration;

/// Errors that can tell whether a retry may succeed
pub trait Transient {
    /// `true` for temporary storage failures
    fn is_transient(&self) -> bool;

    /// Error to report when a single call exceeds its timeout
    fn timed_out() -> Self;
}

/// Retry configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts including the first one
    pub max_attempts: u32,
    /// Delay before the second attempt; doubled afterwards
    pub base_delay: Duration,
    /// Upper bound for a single attempt
    pub timeout: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_millis(50),
            timeout: Duration::from_secs(5),
        }
    }
}

impl RetryPolicy {
    /// Backoff before attempt `n + 1` (n starts at 1)
    pub fn delay_after(&self, attempt: u32) -> Duration {
        self.base_delay
            .saturating_mul(2u32.saturating_pow(attempt.saturating_sub(1)))
    }
}

/// Run `fut` with an upper time bound, mapping elapse to [`Transient::timed_out`]
pub async fn with_timeout<T, E, Fut>(timeout: Duration, fut: Fut) -> Result<T, E>
where
    E: Transient,
    Fut: Future<Output = Result<T, E>>,
{
    match tokio::time::timeout(timeout, fut).await {
        Ok(result) => result,
        Err(_) => Err(E::timed_out()),
    }
}

/// Run `op` under `policy`, retrying transient failures with backoff
pub async fn retry_transient<T, E, F, Fut>(policy: &RetryPolicy, mut op: F) -> Result<T, E>
where
    E: Transient,
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
{
    let max_attempts = policy.max_attempts.max(1);
    let mut attempt = 1;
    loop {
        match with_timeout(policy.timeout, op()).await {
            Err(err) if err.is_transient() && attempt < max_attempts => {
                let delay = policy.delay_after(attempt);
                tracing::warn!(
                    attempt,
                    delay_ms = delay.as_millis() as u64,
                    "Transient storage failure, retrying"
                );
                tokio::time::sleep(delay).await;
                attempt += 1;
            }
            other => return other,
        }
    }
}
