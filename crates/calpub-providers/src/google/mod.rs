//! Google Calendar API v3 access.
//!
//! [`GoogleCalendarClient`] wraps the HTTP surface the exporter needs:
//! the paginated events listing, single write operations with retry,
//! and the calendar color patch. Token acquisition is the caller's
//! concern; the client is handed a ready bearer token.

mod client;

pub use client::{ApiEvent, ApiEventTime, CalendarColorPatch, GoogleCalendarClient};
