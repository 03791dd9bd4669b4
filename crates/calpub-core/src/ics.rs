//! iCalendar (RFC 5545) document serialization.
//!
//! [`IcsWriter`] renders an ordered list of [`CalendarEvent`]s into a
//! complete calendar document: header, a static [`TimezoneSpec`] block,
//! one VEVENT per event, footer. Text values are escaped and physical
//! lines are folded at the 75-octet limit, so the output is accepted by
//! conformant calendar clients even for titles containing reserved
//! characters.
//!
//! Timestamps are rendered as wall-clock values with a `TZID` parameter
//! referencing the declared timezone; no UTC conversion happens here.

use std::io;
use std::path::Path;

use tracing::debug;
use uuid::Uuid;

use crate::event::{CalendarEvent, EventError};

/// Timestamp pattern for DTSTART/DTEND values.
const DATE_FORMAT: &str = "%Y%m%dT%H%M%S";

/// Maximum octets per physical line, excluding the CRLF terminator.
const MAX_LINE_OCTETS: usize = 75;

/// An error produced while serializing or writing a calendar document.
#[derive(Debug, thiserror::Error)]
pub enum IcsError {
    /// An input event failed validation. Nothing is written.
    #[error("event {index}: {source}")]
    InvalidEvent {
        /// Position of the offending event in the input list.
        index: usize,
        /// The underlying validation failure.
        #[source]
        source: EventError,
    },

    /// The destination could not be written. Surfaced unchanged; sink
    /// failures are not retried.
    #[error("failed to write calendar document: {0}")]
    Io(#[from] io::Error),
}

/// The timezone definition emitted once per document.
///
/// The block is static: a forward (daylight) transition on the last
/// Sunday of March and a reverse (standard) transition on the last
/// Sunday of October, with the given offset pair. It does not depend on
/// the input events.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimezoneSpec {
    /// IANA identifier referenced by every DTSTART/DTEND.
    pub tzid: String,
    /// Abbreviation for the standard-time rule (e.g. "GMT").
    pub standard_name: String,
    /// Abbreviation for the daylight-time rule (e.g. "BST").
    pub daylight_name: String,
    /// UTC offset in effect during standard time, e.g. "+0000".
    pub standard_offset: String,
    /// UTC offset in effect during daylight time, e.g. "+0100".
    pub daylight_offset: String,
}

impl Default for TimezoneSpec {
    fn default() -> Self {
        Self::europe_london()
    }
}

impl TimezoneSpec {
    /// The United Kingdom timezone: GMT with BST daylight saving.
    pub fn europe_london() -> Self {
        Self {
            tzid: "Europe/London".to_string(),
            standard_name: "GMT".to_string(),
            daylight_name: "BST".to_string(),
            standard_offset: "+0000".to_string(),
            daylight_offset: "+0100".to_string(),
        }
    }

    /// Appends the VTIMEZONE block as logical lines.
    fn push_lines(&self, lines: &mut Vec<String>) {
        lines.push("BEGIN:VTIMEZONE".to_string());
        lines.push(format!("TZID:{}", self.tzid));
        lines.push("BEGIN:DAYLIGHT".to_string());
        lines.push(format!("TZOFFSETFROM:{}", self.standard_offset));
        lines.push(format!("TZOFFSETTO:{}", self.daylight_offset));
        lines.push(format!("TZNAME:{}", self.daylight_name));
        lines.push("DTSTART:19700329T010000".to_string());
        lines.push("RRULE:FREQ=YEARLY;BYMONTH=3;BYDAY=-1SU".to_string());
        lines.push("END:DAYLIGHT".to_string());
        lines.push("BEGIN:STANDARD".to_string());
        lines.push(format!("TZOFFSETFROM:{}", self.daylight_offset));
        lines.push(format!("TZOFFSETTO:{}", self.standard_offset));
        lines.push(format!("TZNAME:{}", self.standard_name));
        lines.push("DTSTART:19701025T020000".to_string());
        lines.push("RRULE:FREQ=YEARLY;BYMONTH=10;BYDAY=-1SU".to_string());
        lines.push("END:STANDARD".to_string());
        lines.push("END:VTIMEZONE".to_string());
    }
}

/// Serializes events into a complete iCalendar document.
#[derive(Debug, Clone)]
pub struct IcsWriter {
    prodid: String,
    timezone: TimezoneSpec,
}

impl Default for IcsWriter {
    fn default() -> Self {
        Self::new()
    }
}

impl IcsWriter {
    /// Creates a writer with the default product identifier and timezone.
    pub fn new() -> Self {
        Self {
            prodid: "-//calpub//calpub-core//EN".to_string(),
            timezone: TimezoneSpec::default(),
        }
    }

    /// Builder method to override the PRODID line.
    #[must_use]
    pub fn with_prodid(mut self, prodid: impl Into<String>) -> Self {
        self.prodid = prodid.into();
        self
    }

    /// Builder method to override the declared timezone.
    #[must_use]
    pub fn with_timezone(mut self, timezone: TimezoneSpec) -> Self {
        self.timezone = timezone;
        self
    }

    /// The timezone this writer declares and references.
    pub fn timezone(&self) -> &TimezoneSpec {
        &self.timezone
    }

    /// Renders the events, in input order, into a document string.
    ///
    /// Every event is validated before any output is produced, so a
    /// malformed event yields an error and no document.
    ///
    /// # Errors
    ///
    /// Returns [`IcsError::InvalidEvent`] for the first event failing
    /// validation.
    pub fn serialize(&self, events: &[CalendarEvent]) -> Result<String, IcsError> {
        for (index, event) in events.iter().enumerate() {
            event
                .validate()
                .map_err(|source| IcsError::InvalidEvent { index, source })?;
        }

        let mut lines: Vec<String> = Vec::with_capacity(events.len() * 7 + 21);
        lines.push("BEGIN:VCALENDAR".to_string());
        lines.push(format!("PRODID:{}", self.prodid));
        lines.push("VERSION:2.0".to_string());
        self.timezone.push_lines(&mut lines);
        for event in events {
            lines.push("BEGIN:VEVENT".to_string());
            lines.push(format!("UID:{}", Uuid::new_v4()));
            lines.push(format!("SUMMARY:{}", escape_text(&event.title)));
            lines.push(format!(
                "DTSTART;TZID={}:{}",
                self.timezone.tzid,
                event.start.format(DATE_FORMAT)
            ));
            lines.push(format!(
                "DTEND;TZID={}:{}",
                self.timezone.tzid,
                event.end.format(DATE_FORMAT)
            ));
            if let Some(location) = event.location_if_present() {
                lines.push(format!("LOCATION:{}", escape_text(location)));
            }
            lines.push("END:VEVENT".to_string());
        }
        lines.push("END:VCALENDAR".to_string());

        let mut document = String::with_capacity(lines.iter().map(|l| l.len() + 2).sum());
        for line in &lines {
            document.push_str(&fold_line(line));
            document.push_str("\r\n");
        }
        Ok(document)
    }

    /// Serializes the events and writes the document to `path` as UTF-8.
    ///
    /// The document is rendered fully before the sink is touched, and
    /// written in one operation, so a failed export leaves no partial
    /// file behind.
    ///
    /// # Errors
    ///
    /// Returns [`IcsError::InvalidEvent`] before writing, or
    /// [`IcsError::Io`] if the write itself fails.
    pub async fn write(
        &self,
        events: &[CalendarEvent],
        path: impl AsRef<Path>,
    ) -> Result<(), IcsError> {
        let document = self.serialize(events)?;
        debug!(
            events = events.len(),
            path = %path.as_ref().display(),
            "writing calendar document"
        );
        tokio::fs::write(path, document).await?;
        Ok(())
    }
}

/// Escapes a text value per RFC 5545 section 3.3.11.
///
/// Backslash, semicolon, and comma gain a backslash prefix; newlines
/// become the two-character sequence `\n`; carriage returns are dropped.
fn escape_text(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for ch in value.chars() {
        match ch {
            '\\' => escaped.push_str("\\\\"),
            ';' => escaped.push_str("\\;"),
            ',' => escaped.push_str("\\,"),
            '\n' => escaped.push_str("\\n"),
            '\r' => {}
            _ => escaped.push(ch),
        }
    }
    escaped
}

/// Folds one logical line into physical lines of at most
/// [`MAX_LINE_OCTETS`] octets.
///
/// Continuation lines begin with a single space, which counts toward
/// their octet budget. Splits land on UTF-8 character boundaries.
fn fold_line(line: &str) -> String {
    if line.len() <= MAX_LINE_OCTETS {
        return line.to_string();
    }

    let mut folded = String::with_capacity(line.len() + 3 * (line.len() / MAX_LINE_OCTETS + 1));
    let mut remaining = line;
    let mut first = true;
    loop {
        let budget = if first {
            MAX_LINE_OCTETS
        } else {
            MAX_LINE_OCTETS - 1
        };
        if !first {
            folded.push_str("\r\n ");
        }
        if remaining.len() <= budget {
            folded.push_str(remaining);
            return folded;
        }
        let split = floor_char_boundary(remaining, budget);
        let (head, tail) = remaining.split_at(split);
        folded.push_str(head);
        remaining = tail;
        first = false;
    }
}

/// Largest index `<= at` that lands on a character boundary.
fn floor_char_boundary(s: &str, at: usize) -> usize {
    let mut index = at;
    while !s.is_char_boundary(index) {
        index -= 1;
    }
    index
}
