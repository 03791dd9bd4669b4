//! Generic retry with exponential backoff.
//!
//! [`RetryPolicy::run`] executes an asynchronous operation, retrying on
//! transient failures with exponentially growing delays, up to a fixed
//! attempt ceiling. The executor carries no operation-specific logic:
//! errors classify themselves through the [`TransientError`] capability.

use std::fmt::Display;
use std::future::Future;
use std::time::Duration;

use tokio::time::sleep;
use tracing::{debug, warn};

/// Classification capability for retryable failures.
///
/// Implemented by error types whose values can tell whether a retry
/// after a delay is likely to succeed (throttling, transient server
/// failure) or pointless (auth, validation, not-found).
pub trait TransientError {
    /// Returns true if the failure is likely to succeed on retry.
    fn is_transient(&self) -> bool;
}

/// Retry schedule for remote operations.
///
/// The schedule is explicit configuration rather than process-wide
/// state, so tests can run with compressed timings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total number of attempts, including the first. At least 1.
    pub max_attempts: u32,
    /// Delay inserted before the second attempt.
    pub base_delay: Duration,
    /// Growth factor applied to the delay per subsequent attempt.
    pub multiplier: u32,
}

impl Default for RetryPolicy {
    /// The production schedule: 4 attempts with 5 s, 20 s, and 80 s
    /// backoffs between them.
    fn default() -> Self {
        Self {
            max_attempts: 4,
            base_delay: Duration::from_millis(5000),
            multiplier: 4,
        }
    }
}

impl RetryPolicy {
    /// Creates a policy with the given schedule.
    ///
    /// # Panics
    ///
    /// Panics if `max_attempts` is zero.
    pub fn new(max_attempts: u32, base_delay: Duration, multiplier: u32) -> Self {
        assert!(max_attempts >= 1, "RetryPolicy requires at least one attempt");
        Self {
            max_attempts,
            base_delay,
            multiplier,
        }
    }

    /// The delay inserted after the given 1-based attempt fails.
    pub fn backoff_delay(&self, attempt: u32) -> Duration {
        self.base_delay * self.multiplier.pow(attempt - 1)
    }

    /// Runs `op`, retrying transient failures per the schedule.
    ///
    /// The result of the first successful attempt is returned
    /// immediately. A non-transient error, or a transient error on the
    /// final attempt, propagates unchanged; errors are never swallowed.
    /// Each backoff is logged with the operation name and attempt index.
    pub async fn run<T, E, F, Fut>(&self, operation: &str, mut op: F) -> Result<T, E>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: TransientError + Display,
    {
        let mut attempt = 1;
        loop {
            match op().await {
                Ok(value) => {
                    debug!(operation, attempt, "operation succeeded");
                    return Ok(value);
                }
                Err(error) if attempt < self.max_attempts && error.is_transient() => {
                    let delay = self.backoff_delay(attempt);
                    warn!(
                        operation,
                        attempt,
                        delay_ms = delay.as_millis() as u64,
                        %error,
                        "transient failure, backing off"
                    );
                    sleep(delay).await;
                    attempt += 1;
                }
                Err(error) => return Err(error),
            }
        }
    }
}
