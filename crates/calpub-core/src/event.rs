//! The normalized calendar event model.
//!
//! [`CalendarEvent`] is the canonical representation handed to the
//! serializer: a title, wall-clock start/end times in the export
//! timezone, and an optional location. Events are produced by callers
//! (typically by mapping remote API data) and consumed once; the core
//! does not persist them.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Validation failure for a [`CalendarEvent`].
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum EventError {
    /// The title is empty or whitespace-only.
    #[error("event title is empty")]
    EmptyTitle,

    /// The event ends at or before it starts.
    #[error("event \"{title}\" ends at or before it starts")]
    InvalidTimeRange {
        /// Title of the offending event.
        title: String,
    },
}

/// A normalized calendar event.
///
/// Times are wall-clock values in the fixed export timezone; the
/// serializer attaches the timezone identifier when rendering, so no
/// UTC offset is stored here.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CalendarEvent {
    /// The event title, rendered as the SUMMARY.
    pub title: String,
    /// Wall-clock start time in the export timezone.
    pub start: NaiveDateTime,
    /// Wall-clock end time in the export timezone. Must be after `start`.
    pub end: NaiveDateTime,
    /// Optional location. Blank values are treated as absent.
    pub location: Option<String>,
}

impl CalendarEvent {
    /// Creates a new event with no location.
    pub fn new(title: impl Into<String>, start: NaiveDateTime, end: NaiveDateTime) -> Self {
        Self {
            title: title.into(),
            start,
            end,
            location: None,
        }
    }

    /// Builder method to set the location.
    #[must_use]
    pub fn with_location(mut self, location: impl Into<String>) -> Self {
        self.location = Some(location.into());
        self
    }

    /// Returns the location if it is present and not blank.
    pub fn location_if_present(&self) -> Option<&str> {
        self.location
            .as_deref()
            .filter(|location| !location.trim().is_empty())
    }

    /// Checks the invariants the serializer relies on.
    ///
    /// # Errors
    ///
    /// Returns [`EventError::EmptyTitle`] for a blank title and
    /// [`EventError::InvalidTimeRange`] when `end <= start`.
    pub fn validate(&self) -> Result<(), EventError> {
        if self.title.trim().is_empty() {
            return Err(EventError::EmptyTitle);
        }
        if self.end <= self.start {
            return Err(EventError::InvalidTimeRange {
                title: self.title.clone(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn wall(y: i32, m: u32, d: u32, h: u32, min: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d)
            .unwrap()
            .and_hms_opt(h, min, 0)
            .unwrap()
    }

    #[test]
    fn basic_creation() {
        let event = CalendarEvent::new("Maths", wall(2024, 3, 31, 9, 0), wall(2024, 3, 31, 10, 0));
        assert_eq!(event.title, "Maths");
        assert!(event.location.is_none());
        assert!(event.validate().is_ok());
    }

    #[test]
    fn builder_sets_location() {
        let event = CalendarEvent::new("Maths", wall(2024, 3, 31, 9, 0), wall(2024, 3, 31, 10, 0))
            .with_location("Room 12");
        assert_eq!(event.location_if_present(), Some("Room 12"));
    }

    #[test]
    fn blank_location_is_absent() {
        let event = CalendarEvent::new("Maths", wall(2024, 3, 31, 9, 0), wall(2024, 3, 31, 10, 0))
            .with_location("   ");
        assert_eq!(event.location_if_present(), None);

        let event = CalendarEvent::new("Maths", wall(2024, 3, 31, 9, 0), wall(2024, 3, 31, 10, 0))
            .with_location("");
        assert_eq!(event.location_if_present(), None);
    }

    #[test]
    fn empty_title_rejected() {
        let event = CalendarEvent::new("  ", wall(2024, 3, 31, 9, 0), wall(2024, 3, 31, 10, 0));
        assert_eq!(event.validate(), Err(EventError::EmptyTitle));
    }

    #[test]
    fn non_positive_duration_rejected() {
        let event = CalendarEvent::new("Maths", wall(2024, 3, 31, 10, 0), wall(2024, 3, 31, 10, 0));
        assert_eq!(
            event.validate(),
            Err(EventError::InvalidTimeRange {
                title: "Maths".to_string()
            })
        );

        let event = CalendarEvent::new("Maths", wall(2024, 3, 31, 10, 0), wall(2024, 3, 31, 9, 0));
        assert!(event.validate().is_err());
    }

    #[test]
    fn serde_roundtrip() {
        let event = CalendarEvent::new("Maths", wall(2024, 3, 31, 9, 0), wall(2024, 3, 31, 10, 0))
            .with_location("Room 12");
        let json = serde_json::to_string(&event).unwrap();
        let parsed: CalendarEvent = serde_json::from_str(&json).unwrap();
        assert_eq!(event, parsed);
    }
}
