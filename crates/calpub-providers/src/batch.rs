//! Batched write execution.
//!
//! [`BatchExecutor`] treats a collection of independent write
//! operations as a single retryable unit: a transient failure resubmits
//! the entire batch, with no partial-success tracking. Callers are
//! responsible for making the individual writes idempotent under
//! resubmission (natural upsert semantics on the remote side).

use std::fmt::Display;
use std::future::Future;

use tracing::debug;

use crate::retry::{RetryPolicy, TransientError};

/// Executes independent write operations as one retryable unit.
#[derive(Debug, Clone, Default)]
pub struct BatchExecutor {
    policy: RetryPolicy,
}

impl BatchExecutor {
    /// Creates an executor with the given retry schedule.
    pub fn new(policy: RetryPolicy) -> Self {
        Self { policy }
    }

    /// Runs every operation in order as one retry unit.
    ///
    /// A transient failure resubmits the batch from the first
    /// operation; a non-transient failure propagates immediately.
    ///
    /// # Errors
    ///
    /// Propagates the first non-transient error, or the transient error
    /// of the final allowed attempt.
    pub async fn execute<E, F, Fut>(&self, operation: &str, operations: &[F]) -> Result<(), E>
    where
        F: Fn() -> Fut,
        Fut: Future<Output = Result<(), E>>,
        E: TransientError + Display,
    {
        self.policy
            .run(operation, || async {
                for op in operations {
                    op().await?;
                }
                Ok(())
            })
            .await?;
        debug!(operation, count = operations.len(), "batch complete");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::{Cell, RefCell};
    use std::fmt;

    #[derive(Debug, PartialEq, Eq)]
    enum TestError {
        Transient,
        Permanent,
    }

    impl fmt::Display for TestError {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            match self {
                Self::Transient => write!(f, "transient failure"),
                Self::Permanent => write!(f, "permanent failure"),
            }
        }
    }

    impl TransientError for TestError {
        fn is_transient(&self) -> bool {
            matches!(self, Self::Transient)
        }
    }

    #[tokio::test]
    async fn runs_all_operations_in_order() {
        let log = RefCell::new(Vec::new());
        let log = &log;
        let write = |n: u32| {
            move || async move {
                log.borrow_mut().push(n);
                Ok(())
            }
        };
        let operations = [write(1), write(2), write(3)];

        BatchExecutor::default()
            .execute::<TestError, _, _>("colors.patch", &operations)
            .await
            .unwrap();

        assert_eq!(*log.borrow(), vec![1, 2, 3]);
    }

    #[tokio::test(start_paused = true)]
    async fn transient_failure_resubmits_the_whole_batch() {
        let log = RefCell::new(Vec::new());
        let remaining_failures = Cell::new(1u32);
        let (log, remaining_failures) = (&log, &remaining_failures);
        let write = |n: u32| {
            move || async move {
                log.borrow_mut().push(n);
                if n == 2 && remaining_failures.get() > 0 {
                    remaining_failures.set(remaining_failures.get() - 1);
                    return Err(TestError::Transient);
                }
                Ok(())
            }
        };
        let operations = [write(1), write(2)];

        BatchExecutor::default()
            .execute("colors.patch", &operations)
            .await
            .unwrap();

        // First pass stops at the failing op; the retry reruns both.
        assert_eq!(*log.borrow(), vec![1, 2, 1, 2]);
    }

    #[tokio::test]
    async fn permanent_failure_stops_the_batch() {
        let log = RefCell::new(Vec::new());
        let log = &log;
        let write = |n: u32| {
            move || async move {
                log.borrow_mut().push(n);
                if n == 1 {
                    return Err(TestError::Permanent);
                }
                Ok(())
            }
        };
        let operations = [write(1), write(2)];

        let result = BatchExecutor::default()
            .execute("colors.patch", &operations)
            .await;

        assert_eq!(result, Err(TestError::Permanent));
        assert_eq!(*log.borrow(), vec![1]);
    }

    #[tokio::test]
    async fn empty_batch_succeeds() {
        let operations: [fn() -> std::future::Ready<Result<(), TestError>>; 0] = [];
        BatchExecutor::default()
            .execute("colors.patch", &operations)
            .await
            .unwrap();
    }
}
