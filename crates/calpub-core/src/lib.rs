//! Core types for calpub.
//!
//! This crate provides the domain model and the iCalendar serializer:
//!
//! - [`CalendarEvent`] - The normalized event model consumed by the serializer
//! - [`IcsWriter`] - Renders an ordered event list into an RFC 5545 document
//! - [`TimezoneSpec`] - The static timezone definition emitted with each document
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────┐
//! │  remote events   │  (fetched by calpub-providers)
//! └────────┬─────────┘
//!          ▼ caller mapping
//! ┌──────────────────┐
//! │  CalendarEvent   │  wall-clock times in the export timezone
//! └────────┬─────────┘
//!          ▼ IcsWriter::serialize
//! ┌──────────────────┐
//! │ .ics document    │  escaped, folded, CRLF-terminated
//! └──────────────────┘
//! ```
//!
//! # Example
//!
//! ```ignore
//! use calpub_core::{CalendarEvent, IcsWriter};
//!
//! let writer = IcsWriter::new();
//! writer.write(&events, "timetable.ics").await?;
//! ```

pub mod event;
pub mod ics;
pub mod tracing;

// Re-export main types at crate root
pub use event::{CalendarEvent, EventError};
pub use ics::{IcsError, IcsWriter, TimezoneSpec};
