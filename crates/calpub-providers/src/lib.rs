//! Resilient access to the remote calendar API.
//!
//! This crate provides the fetch core used by the exporter:
//!
//! - [`RetryPolicy`] - Retry with exponential backoff over any
//!   asynchronous operation whose error type reports transience
//! - [`Paginator`] - Cursor-following pagination, retried as one unit
//! - [`BatchExecutor`] - Independent writes submitted as one retry unit
//! - [`GoogleCalendarClient`] - The Google Calendar API v3 binding
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────┐
//! │ GoogleCalendarClient │
//! └───────┬──────────┬───┘
//!         │          │ writes
//!         ▼          ▼
//! ┌───────────┐ ┌───────────────┐
//! │ Paginator │ │ BatchExecutor │
//! └─────┬─────┘ └───────┬───────┘
//!       │               │
//!       └───────┬───────┘
//!               ▼
//!       ┌─────────────┐
//!       │ RetryPolicy │  transient errors backed off, permanent
//!       └─────────────┘  errors propagated immediately
//! ```
//!
//! Every invocation is a single logical task: pages are fetched
//! strictly sequentially, retries never overlap, and all state lives in
//! the invocation itself, so independent fetches may run concurrently
//! at the caller's discretion.
//!
//! # Example
//!
//! ```ignore
//! use calpub_providers::{FetchWindow, GoogleCalendarClient};
//!
//! let client = GoogleCalendarClient::new(token, Duration::from_secs(30));
//! let events = client.list_events("primary", FetchWindow::unbounded()).await?;
//! let normalized: Vec<_> = events
//!     .into_iter()
//!     .filter_map(|e| e.into_calendar_event(chrono_tz::Europe::London))
//!     .collect();
//! ```

pub mod batch;
pub mod error;
pub mod google;
pub mod pager;
pub mod retry;

// Re-export main types at crate root
pub use batch::BatchExecutor;
pub use error::{ApiError, ApiResult};
pub use google::{ApiEvent, ApiEventTime, CalendarColorPatch, GoogleCalendarClient};
pub use pager::{DEFAULT_PAGE_SIZE, FetchWindow, Page, PageRequest, Paginator};
pub use retry::{RetryPolicy, TransientError};
