//! Cursor-following pagination over a remote list API.
//!
//! [`Paginator::fetch_all`] repeatedly invokes a list-page operation,
//! following the continuation cursor until none remains, accumulating
//! items in arrival order. The entire multi-page sequence runs as a
//! single retryable unit under [`RetryPolicy`].

use std::fmt::Display;
use std::future::Future;

use chrono::{DateTime, Utc};
use tracing::debug;

use crate::retry::{RetryPolicy, TransientError};

/// Default number of items requested per page.
///
/// Large pages keep round trips to a minimum; 2500 is the calendar
/// API's per-page cap.
pub const DEFAULT_PAGE_SIZE: usize = 2500;

/// An optional inclusive time window restricting a fetch.
///
/// Both bounds are independently optional.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FetchWindow {
    /// Lower bound on event start time, if any.
    pub after: Option<DateTime<Utc>>,
    /// Upper bound on event start time, if any.
    pub before: Option<DateTime<Utc>>,
}

impl FetchWindow {
    /// A window with no bounds.
    pub fn unbounded() -> Self {
        Self::default()
    }

    /// Builder method to set the lower bound.
    #[must_use]
    pub fn after(mut self, after: DateTime<Utc>) -> Self {
        self.after = Some(after);
        self
    }

    /// Builder method to set the upper bound.
    #[must_use]
    pub fn before(mut self, before: DateTime<Utc>) -> Self {
        self.before = Some(before);
        self
    }
}

/// One page returned by a list operation.
#[derive(Debug, Clone)]
pub struct Page<T> {
    /// Items in arrival order.
    pub items: Vec<T>,
    /// Continuation cursor; absent on the last page.
    pub next_cursor: Option<String>,
}

/// Parameters for one list-page call.
#[derive(Debug, Clone)]
pub struct PageRequest {
    /// Time window for the whole fetch.
    pub window: FetchWindow,
    /// Maximum number of items to return in this page.
    pub page_size: usize,
    /// Continuation cursor from the previous page; absent on the first.
    pub cursor: Option<String>,
}

/// Streams every page of a remote listing into one ordered result set.
#[derive(Debug, Clone)]
pub struct Paginator {
    policy: RetryPolicy,
    page_size: usize,
}

impl Default for Paginator {
    fn default() -> Self {
        Self {
            policy: RetryPolicy::default(),
            page_size: DEFAULT_PAGE_SIZE,
        }
    }
}

impl Paginator {
    /// Creates a paginator with the given retry schedule and page size.
    pub fn new(policy: RetryPolicy, page_size: usize) -> Self {
        Self { policy, page_size }
    }

    /// Fetches every page, preserving page-internal and cross-page order.
    ///
    /// The whole cursor loop is one retry unit: a transient failure on
    /// any page restarts the sequence from the first page. Resuming
    /// mid-sequence against a dataset that may have changed between
    /// attempts could drop or duplicate items; restarting keeps the
    /// result set consistent at the cost of refetching earlier pages.
    /// Do not change this to resume from the failing cursor without
    /// re-deriving that consistency argument.
    ///
    /// # Errors
    ///
    /// Propagates the final error from the retry executor: the first
    /// non-transient failure, or the transient failure of the last
    /// allowed attempt.
    pub async fn fetch_all<T, E, F, Fut>(
        &self,
        operation: &str,
        window: FetchWindow,
        list_page: F,
    ) -> Result<Vec<T>, E>
    where
        F: Fn(PageRequest) -> Fut,
        Fut: Future<Output = Result<Page<T>, E>>,
        E: TransientError + Display,
    {
        self.policy
            .run(operation, || async {
                let mut items = Vec::new();
                let mut cursor: Option<String> = None;
                loop {
                    let request = PageRequest {
                        window: window.clone(),
                        page_size: self.page_size,
                        cursor: cursor.take(),
                    };
                    let page = list_page(request).await?;
                    items.extend(page.items);
                    match page.next_cursor {
                        Some(next) => cursor = Some(next),
                        None => break,
                    }
                }
                debug!(operation, items = items.len(), "pagination complete");
                Ok(items)
            })
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;
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

    /// A three-page source: 2500 + 2500 + 37 items, values 0..5037.
    fn page_for(cursor: Option<&str>) -> Page<u32> {
        match cursor {
            None => Page {
                items: (0..2500).collect(),
                next_cursor: Some("p2".to_string()),
            },
            Some("p2") => Page {
                items: (2500..5000).collect(),
                next_cursor: Some("p3".to_string()),
            },
            Some("p3") => Page {
                items: (5000..5037).collect(),
                next_cursor: None,
            },
            Some(other) => panic!("unexpected cursor {other}"),
        }
    }

    #[tokio::test]
    async fn fetches_all_pages_in_order() {
        let items = Paginator::default()
            .fetch_all("events.list", FetchWindow::unbounded(), |request| async move {
                Ok::<_, TestError>(page_for(request.cursor.as_deref()))
            })
            .await
            .unwrap();

        assert_eq!(items.len(), 5037);
        assert!(items.iter().enumerate().all(|(i, &v)| v == i as u32));
    }

    #[tokio::test]
    async fn single_page_source_stops_without_cursor() {
        let calls = Cell::new(0u32);
        let items = Paginator::default()
            .fetch_all("events.list", FetchWindow::unbounded(), |request| {
                calls.set(calls.get() + 1);
                assert!(request.cursor.is_none());
                async {
                    Ok::<_, TestError>(Page {
                        items: vec![1u32, 2, 3],
                        next_cursor: None,
                    })
                }
            })
            .await
            .unwrap();

        assert_eq!(items, vec![1, 2, 3]);
        assert_eq!(calls.get(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn restarts_whole_sequence_after_transient_page_failure() {
        let remaining_failures = Cell::new(1u32);
        let calls = Cell::new(0u32);
        let items = Paginator::default()
            .fetch_all("events.list", FetchWindow::unbounded(), |request| {
                calls.set(calls.get() + 1);
                let fail = request.cursor.as_deref() == Some("p3")
                    && remaining_failures.get() > 0;
                if fail {
                    remaining_failures.set(remaining_failures.get() - 1);
                }
                async move {
                    if fail {
                        Err(TestError::Transient)
                    } else {
                        Ok(page_for(request.cursor.as_deref()))
                    }
                }
            })
            .await
            .unwrap();

        // No gaps, no duplicates: the sequence restarted from page one.
        assert_eq!(items.len(), 5037);
        assert!(items.iter().enumerate().all(|(i, &v)| v == i as u32));
        // Two pages, a failed third, then all three pages again.
        assert_eq!(calls.get(), 6);
    }

    #[tokio::test]
    async fn permanent_failure_propagates_without_restart() {
        let calls = Cell::new(0u32);
        let result = Paginator::default()
            .fetch_all(
                "events.list",
                FetchWindow::unbounded(),
                |request| {
                    calls.set(calls.get() + 1);
                    async move {
                        match request.cursor.as_deref() {
                            None => Ok(Page {
                                items: vec![1u32],
                                next_cursor: Some("p2".to_string()),
                            }),
                            _ => Err(TestError::Permanent),
                        }
                    }
                },
            )
            .await;

        assert_eq!(result, Err(TestError::Permanent));
        assert_eq!(calls.get(), 2);
    }

    #[tokio::test]
    async fn page_request_carries_window_and_size() {
        let window = FetchWindow::unbounded()
            .after("2024-01-01T00:00:00Z".parse().unwrap())
            .before("2024-12-31T00:00:00Z".parse().unwrap());
        let expected = window.clone();

        let paginator = Paginator::new(RetryPolicy::default(), 500);
        paginator
            .fetch_all("events.list", window, |request| {
                assert_eq!(request.window, expected);
                assert_eq!(request.page_size, 500);
                async {
                    Ok::<_, TestError>(Page {
                        items: Vec::<u32>::new(),
                        next_cursor: None,
                    })
                }
            })
            .await
            .unwrap();
    }

    #[test]
    fn window_bounds_are_independent() {
        let after = "2024-01-01T00:00:00Z".parse().unwrap();
        let only_after = FetchWindow::unbounded().after(after);
        assert_eq!(only_after.after, Some(after));
        assert_eq!(only_after.before, None);

        let unbounded = FetchWindow::unbounded();
        assert_eq!(unbounded.after, None);
        assert_eq!(unbounded.before, None);
    }
}
