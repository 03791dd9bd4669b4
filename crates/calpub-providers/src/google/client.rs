//! HTTP client for the Google Calendar API.
//!
//! A low-level reqwest client handling request building, response
//! parsing, and the mapping from HTTP failures to the [`ApiError`]
//! taxonomy. Listings run through the resilient fetch core, so a
//! complete event list survives pagination and transient failures.

use std::future::Future;
use std::time::Duration;

use chrono::{DateTime, NaiveDateTime};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use calpub_core::CalendarEvent;

use crate::batch::BatchExecutor;
use crate::error::{ApiError, ApiResult};
use crate::pager::{DEFAULT_PAGE_SIZE, FetchWindow, Page, PageRequest, Paginator};
use crate::retry::RetryPolicy;

/// Base URL for Google Calendar API v3.
const CALENDAR_API_BASE: &str = "https://www.googleapis.com/calendar/v3";

/// Quota reasons Google reports inside a 403 body when the caller is
/// throttled rather than denied.
const RATE_LIMIT_REASONS: [&str; 3] = [
    "rateLimitExceeded",
    "userRateLimitExceeded",
    "quotaExceeded",
];

/// Google Calendar API client.
#[derive(Debug)]
pub struct GoogleCalendarClient {
    http_client: reqwest::Client,
    access_token: String,
    policy: RetryPolicy,
    paginator: Paginator,
}

impl GoogleCalendarClient {
    /// Creates a client with the given access token and request timeout.
    pub fn new(access_token: impl Into<String>, timeout: Duration) -> Self {
        let http_client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .expect("failed to create HTTP client");

        let policy = RetryPolicy::default();
        Self {
            http_client,
            access_token: access_token.into(),
            paginator: Paginator::new(policy.clone(), DEFAULT_PAGE_SIZE),
            policy,
        }
    }

    /// Overrides the retry schedule (tests use compressed timings).
    #[must_use]
    pub fn with_retry_policy(mut self, policy: RetryPolicy) -> Self {
        self.paginator = Paginator::new(policy.clone(), DEFAULT_PAGE_SIZE);
        self.policy = policy;
        self
    }

    /// Updates the access token (after an external refresh).
    pub fn set_access_token(&mut self, token: impl Into<String>) {
        self.access_token = token.into();
    }

    /// Lists every event in a calendar within the window.
    ///
    /// Pages are fetched sequentially and accumulated in arrival order;
    /// the whole listing retries as one unit on transient failures.
    ///
    /// # Errors
    ///
    /// Returns the final [`ApiError`] once retries are exhausted, or
    /// immediately for non-transient failures.
    pub async fn list_events(
        &self,
        calendar_id: &str,
        window: FetchWindow,
    ) -> ApiResult<Vec<ApiEvent>> {
        let events = self
            .paginator
            .fetch_all("events.list", window, |request| {
                self.list_events_page(calendar_id, request)
            })
            .await?;
        debug!(calendar_id, count = events.len(), "fetched events");
        Ok(events)
    }

    /// Fetches a single page of events.
    async fn list_events_page(
        &self,
        calendar_id: &str,
        request: PageRequest,
    ) -> ApiResult<Page<ApiEvent>> {
        let url = format!(
            "{}/calendars/{}/events",
            CALENDAR_API_BASE,
            urlencoding::encode(calendar_id)
        );

        let mut http_request = self
            .http_client
            .get(&url)
            .bearer_auth(&self.access_token)
            .query(&[("maxResults", request.page_size.to_string())]);

        if let Some(after) = request.window.after {
            http_request = http_request.query(&[("timeMin", after.to_rfc3339())]);
        }
        if let Some(before) = request.window.before {
            http_request = http_request.query(&[("timeMax", before.to_rfc3339())]);
        }
        if let Some(ref cursor) = request.cursor {
            http_request = http_request.query(&[("pageToken", cursor.as_str())]);
        }

        let body = self.send(http_request).await?;
        let response: EventListResponse = serde_json::from_str(&body).map_err(|e| {
            ApiError::InvalidResponse(format!("failed to parse event list: {e}"))
        })?;

        Ok(Page {
            items: response.items,
            next_cursor: response.next_page_token,
        })
    }

    /// Applies a color patch to a calendar list entry, with retry.
    ///
    /// # Errors
    ///
    /// Returns the final [`ApiError`] once retries are exhausted, or
    /// immediately for non-transient failures.
    pub async fn apply_color_patch(&self, patch: &CalendarColorPatch) -> ApiResult<()> {
        self.policy
            .run("calendarList.patch", || async {
                let request = self
                    .http_client
                    .patch(patch.url())
                    .bearer_auth(&self.access_token)
                    .header(reqwest::header::CONTENT_TYPE, "application/json")
                    .body(patch.body());
                self.send(request).await.map(drop)
            })
            .await
    }

    /// Submits independent write operations as one retryable batch.
    ///
    /// On transient failure the whole batch is resubmitted; the writes
    /// must be idempotent under resubmission.
    ///
    /// # Errors
    ///
    /// Propagates the first non-transient [`ApiError`], or the
    /// transient error of the final allowed attempt.
    pub async fn submit_batch<F, Fut>(&self, operation: &str, operations: &[F]) -> ApiResult<()>
    where
        F: Fn() -> Fut,
        Fut: Future<Output = ApiResult<()>>,
    {
        BatchExecutor::new(self.policy.clone())
            .execute(operation, operations)
            .await
    }

    /// Sends a request and maps transport and status failures onto the
    /// error taxonomy, returning the response body on success.
    async fn send(&self, request: reqwest::RequestBuilder) -> ApiResult<String> {
        let response = request.send().await.map_err(|e| {
            if e.is_timeout() {
                ApiError::Network("request timeout".to_string())
            } else if e.is_connect() {
                ApiError::Network(format!("connection failed: {e}"))
            } else {
                ApiError::Network(format!("request failed: {e}"))
            }
        })?;

        let status = response.status();
        if status.is_success() {
            return response
                .text()
                .await
                .map_err(|e| ApiError::Network(format!("failed to read response: {e}")));
        }

        let body = response.text().await.unwrap_or_default();
        Err(classify_status(status, body))
    }
}

/// Maps a non-success HTTP status onto [`ApiError`].
///
/// A 403 carrying one of Google's quota reasons is throttling, not a
/// permissions problem, and must stay retryable.
fn classify_status(status: reqwest::StatusCode, body: String) -> ApiError {
    match status {
        reqwest::StatusCode::TOO_MANY_REQUESTS => ApiError::RateLimited(body),
        reqwest::StatusCode::UNAUTHORIZED => {
            ApiError::Authentication("access token expired or invalid".to_string())
        }
        reqwest::StatusCode::FORBIDDEN => {
            if RATE_LIMIT_REASONS.iter().any(|reason| body.contains(reason)) {
                ApiError::RateLimited(body)
            } else {
                ApiError::Forbidden(body)
            }
        }
        reqwest::StatusCode::NOT_FOUND => ApiError::NotFound(body),
        s if s.is_server_error() => ApiError::Server {
            status: s.as_u16(),
            message: body,
        },
        s => ApiError::BadRequest(format!("API error ({s}): {body}")),
    }
}

/// A calendarList color patch request.
///
/// Pure request construction with no retry logic of its own;
/// submission goes through
/// [`GoogleCalendarClient::apply_color_patch`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CalendarColorPatch {
    calendar_id: String,
    color_id: String,
}

impl CalendarColorPatch {
    /// Creates a patch setting the color of the given calendar.
    pub fn new(calendar_id: impl Into<String>, color_id: impl Into<String>) -> Self {
        Self {
            calendar_id: calendar_id.into(),
            color_id: color_id.into(),
        }
    }

    /// URL of the calendarList entry being patched.
    pub fn url(&self) -> String {
        format!(
            "{}/users/me/calendarList/{}",
            CALENDAR_API_BASE,
            urlencoding::encode(&self.calendar_id)
        )
    }

    /// JSON body carrying the color change.
    pub fn body(&self) -> String {
        serde_json::to_string(&ColorPatchBody {
            color_id: &self.color_id,
        })
        .expect("color patch body serializes")
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ColorPatchBody<'a> {
    color_id: &'a str,
}

/// Response from the events.list endpoint.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct EventListResponse {
    #[serde(default)]
    items: Vec<ApiEvent>,
    next_page_token: Option<String>,
}

/// A single event from the Google Calendar API.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiEvent {
    /// The event identifier.
    pub id: Option<String>,
    /// The event title.
    pub summary: Option<String>,
    /// The event location.
    pub location: Option<String>,
    /// Event status ("confirmed", "tentative", "cancelled").
    pub status: Option<String>,
    /// Start time.
    pub start: Option<ApiEventTime>,
    /// End time.
    pub end: Option<ApiEventTime>,
}

/// Event time from the API: either an all-day date or an RFC 3339
/// datetime.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiEventTime {
    /// All-day event date, `YYYY-MM-DD`.
    pub date: Option<String>,
    /// RFC 3339 datetime with offset.
    pub date_time: Option<String>,
    /// IANA timezone identifier, if the API reported one.
    pub time_zone: Option<String>,
}

impl ApiEvent {
    /// Converts into the normalized event model, with wall-clock times
    /// in the given export timezone.
    ///
    /// Cancelled events, all-day events, and events without a parseable
    /// timed start and end are skipped, mirroring what the export
    /// pipeline can represent.
    pub fn into_calendar_event(self, timezone: Tz) -> Option<CalendarEvent> {
        if self.status.as_deref() == Some("cancelled") {
            return None;
        }

        let title = self.summary?;
        if title.trim().is_empty() {
            return None;
        }

        let start = wall_clock(self.start.as_ref()?, timezone)?;
        let end = wall_clock(self.end.as_ref()?, timezone)?;
        if end <= start {
            warn!(title = %title, "skipping event with non-positive duration");
            return None;
        }

        let mut event = CalendarEvent::new(title, start, end);
        if let Some(location) = self.location {
            event = event.with_location(location);
        }
        Some(event)
    }
}

/// Converts an API timestamp to wall-clock time in the export timezone.
fn wall_clock(time: &ApiEventTime, timezone: Tz) -> Option<NaiveDateTime> {
    let raw = time.date_time.as_deref()?;
    let instant = DateTime::parse_from_rfc3339(raw)
        .map_err(|e| warn!(raw, "failed to parse event time: {e}"))
        .ok()?;
    Some(instant.with_timezone(&timezone).naive_local())
}
