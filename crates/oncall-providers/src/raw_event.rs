//! Raw event type from the shift calendar.
//!
//! A [`RawEvent`] is the event as the provider returned it. The resolver only
//! needs the title and the time window, so everything else the calendar API
//! sends is dropped during parsing.

use chrono::{DateTime, NaiveDate, Utc};
use oncall_core::Shift;
use serde::{Deserialize, Serialize};

/// The time specification for a raw event.
///
/// Calendar providers return times in different formats:
/// - RFC3339 datetime with timezone
/// - Date-only for all-day events
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value")]
pub enum RawEventTime {
    /// A specific datetime in UTC.
    DateTime(DateTime<Utc>),
    /// An all-day event date (no specific time).
    Date(NaiveDate),
}

impl RawEventTime {
    /// Creates a RawEventTime from a UTC datetime.
    pub fn from_datetime(dt: DateTime<Utc>) -> Self {
        Self::DateTime(dt)
    }

    /// Creates a RawEventTime from a date (all-day event).
    pub fn from_date(date: NaiveDate) -> Self {
        Self::Date(date)
    }

    /// Returns true if this is an all-day event time.
    pub fn is_all_day(&self) -> bool {
        matches!(self, Self::Date(_))
    }

    /// Returns the instant this time refers to. Dates map to midnight UTC.
    pub fn to_utc(&self) -> DateTime<Utc> {
        match self {
            Self::DateTime(dt) => *dt,
            Self::Date(date) => date.and_time(chrono::NaiveTime::MIN).and_utc(),
        }
    }
}

/// A raw shift event from the calendar.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawEvent {
    /// Unique identifier for the event within the provider.
    pub id: String,
    /// The event title, which names the person on call.
    pub title: String,
    /// When the event starts.
    pub start: RawEventTime,
    /// When the event ends.
    pub end: RawEventTime,
    /// The event status (e.g., "confirmed", "cancelled").
    #[serde(default)]
    pub status: Option<String>,
}

impl RawEvent {
    /// Creates a new raw event.
    pub fn new(
        id: impl Into<String>,
        title: impl Into<String>,
        start: RawEventTime,
        end: RawEventTime,
    ) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            start,
            end,
            status: None,
        }
    }

    /// Builder method to set the status.
    pub fn with_status(mut self, status: impl Into<String>) -> Self {
        self.status = Some(status.into());
        self
    }

    /// Returns true if the event is cancelled.
    pub fn is_cancelled(&self) -> bool {
        self.status
            .as_ref()
            .is_some_and(|s| s.eq_ignore_ascii_case("cancelled"))
    }

    /// Converts the event into a shift, trimming the title.
    pub fn into_shift(self) -> Shift {
        Shift::new(self.title.trim(), self.start.to_utc(), self.end.to_utc())
    }
}
