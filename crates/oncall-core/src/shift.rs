//! On-call shifts.
//!
//! A [`Shift`] is a named time interval taken from the shift calendar. The
//! title doubles as the lookup key into the contacts directory.

use chrono::{DateTime, Duration, TimeZone, Utc};
use serde::{Deserialize, Serialize};

const MILLIS_PER_DAY: i64 = 86_400_000;

/// A single on-call shift.
///
/// Times are stored in UTC. `start < end` is expected but not enforced, and
/// overlapping shifts are neither detected nor rejected.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Shift {
    /// Free-text title, also used as the contacts search query.
    pub title: String,
    /// When the shift starts.
    pub start: DateTime<Utc>,
    /// When the shift ends.
    pub end: DateTime<Utc>,
}

impl Shift {
    /// Creates a new shift from UTC timestamps.
    pub fn new(title: impl Into<String>, start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        Self {
            title: title.into(),
            start,
            end,
        }
    }

    /// Creates a new shift from timestamps in any timezone, normalized to UTC.
    pub fn from_local<Tz: TimeZone>(
        title: impl Into<String>,
        start: DateTime<Tz>,
        end: DateTime<Tz>,
    ) -> Self {
        Self::new(title, start.with_timezone(&Utc), end.with_timezone(&Utc))
    }

    /// Returns the length of the shift.
    pub fn duration(&self) -> Duration {
        self.end - self.start
    }

    /// Returns true if `now` lies strictly inside the shift.
    ///
    /// A shift that starts or ends exactly at `now` is not current.
    pub fn is_current_at(&self, now: DateTime<Utc>) -> bool {
        self.start < now && now < self.end
    }

    /// Returns the time left until the shift ends (negative once it is over).
    pub fn time_left(&self, now: DateTime<Utc>) -> Duration {
        self.end - now
    }

    /// Returns the number of whole days until the shift ends, rounded down.
    ///
    /// Half a day left is `0`, half a day past the end is `-1`.
    pub fn days_until_end(&self, now: DateTime<Utc>) -> i64 {
        self.time_left(now).num_milliseconds().div_euclid(MILLIS_PER_DAY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::FixedOffset;

    fn utc(y: i32, m: u32, d: u32, h: u32, min: u32, s: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, h, min, s).unwrap()
    }

    fn morning_shift() -> Shift {
        Shift::new("Alice", utc(2024, 1, 1, 10, 0, 0), utc(2024, 1, 1, 11, 0, 0))
    }

    #[test]
    fn current_inside_window() {
        assert!(morning_shift().is_current_at(utc(2024, 1, 1, 10, 30, 0)));
    }

    #[test]
    fn not_current_at_boundaries() {
        let shift = morning_shift();
        assert!(!shift.is_current_at(utc(2024, 1, 1, 10, 0, 0)));
        assert!(!shift.is_current_at(utc(2024, 1, 1, 11, 0, 0)));
    }

    #[test]
    fn not_current_outside_window() {
        let shift = morning_shift();
        assert!(!shift.is_current_at(utc(2024, 1, 1, 9, 59, 59)));
        assert!(!shift.is_current_at(utc(2024, 1, 1, 11, 0, 1)));
    }

    #[test]
    fn from_local_normalizes_to_utc() {
        let cet = FixedOffset::east_opt(3600).unwrap();
        let start = cet.with_ymd_and_hms(2024, 1, 1, 11, 0, 0).unwrap();
        let end = cet.with_ymd_and_hms(2024, 1, 1, 12, 0, 0).unwrap();
        let shift = Shift::from_local("Alice", start, end);
        assert_eq!(shift, morning_shift());
        assert_eq!(shift.duration(), Duration::hours(1));
    }

    #[test]
    fn days_until_end_rounds_down() {
        let shift = Shift::new("Bob", utc(2024, 1, 1, 0, 0, 0), utc(2024, 1, 10, 0, 0, 0));

        assert_eq!(shift.days_until_end(utc(2024, 1, 1, 0, 0, 0)), 9);
        assert_eq!(shift.days_until_end(utc(2024, 1, 1, 12, 0, 0)), 8);
        assert_eq!(shift.days_until_end(utc(2024, 1, 9, 12, 0, 0)), 0);
        assert_eq!(shift.days_until_end(utc(2024, 1, 10, 12, 0, 0)), -1);
    }
}
