//! Single-day wall-clock arithmetic for itinerary stops.
//!
//! Every time in an itinerary is a local wall-clock reading written the way
//! people write schedules (`9:05am`). There is no calendar date and no
//! timezone: adding minutes past midnight wraps back to the start of the day,
//! and comparisons look only at hour, minute and second.
//!
//! # Types
//!
//! - [`ClockTime`] — a valid wall-clock time, parsed from and displayed as `H:MMam|pm`
//! - [`TargetTime`] — the time a user *stated* for a stop: valid, absent, or malformed
//!
//! # Functions
//!
//! - [`diff_minutes`] — signed minute difference between two clock times
//! - [`minutes_from_seconds`] — provider travel seconds to whole minutes
//! - [`format_travel_duration`] — human-readable minute counts for travel tables

use std::fmt;
use std::str::FromStr;

use chrono::{NaiveTime, TimeDelta, Timelike};
use serde::{Deserialize, Serialize};

use crate::error::PlanError;

const MINUTES_PER_DAY: i64 = 24 * 60;

// ── ClockTime ───────────────────────────────────────────────────────────────

/// A wall-clock time of day with minute resolution.
///
/// Ordering follows the clock face from midnight (`12:00am`) to `11:59pm`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub struct ClockTime(NaiveTime);

impl ClockTime {
    /// Build a clock time from a 24-hour hour and a minute.
    ///
    /// Returns `None` when `hour > 23` or `minute > 59`.
    pub fn from_hm(hour: u32, minute: u32) -> Option<Self> {
        NaiveTime::from_hms_opt(hour, minute, 0).map(Self)
    }

    /// Truncate a chrono time (e.g. the local "now") to whole minutes.
    pub fn from_naive(time: NaiveTime) -> Self {
        // hour/minute of a valid NaiveTime are always in range
        Self(NaiveTime::from_hms_opt(time.hour(), time.minute(), 0).unwrap_or(NaiveTime::MIN))
    }

    /// Parse a 12-hour clock string: `H:MM` or `HH:MM` followed by `am` or `pm`.
    ///
    /// Matching is case-insensitive, surrounding whitespace is ignored and a
    /// single space may separate the minutes from the meridiem (`"9:05 PM"`).
    ///
    /// # Errors
    ///
    /// Returns [`PlanError::InvalidTime`] when the colon or meridiem is
    /// missing, the hour is outside 1–12 or the minute outside 0–59.
    ///
    /// # Examples
    ///
    /// ```
    /// use itinerary_engine::clock::ClockTime;
    ///
    /// let t = ClockTime::parse("09:05AM").unwrap();
    /// assert_eq!(t.to_string(), "9:05am");
    /// assert_eq!(ClockTime::parse("12:30am").unwrap().hour24(), 0);
    /// ```
    pub fn parse(text: &str) -> Result<Self, PlanError> {
        let invalid = |why: &str| PlanError::InvalidTime(format!("'{}': {why}", text.trim()));

        let lower = text.trim().to_ascii_lowercase();
        let (digits, is_pm) = if let Some(rest) = lower.strip_suffix("pm") {
            (rest, true)
        } else if let Some(rest) = lower.strip_suffix("am") {
            (rest, false)
        } else {
            return Err(invalid("missing am/pm"));
        };
        let digits = digits.strip_suffix(' ').unwrap_or(digits);

        let (hour_text, minute_text) = digits.split_once(':').ok_or_else(|| invalid("missing ':'"))?;
        if hour_text.is_empty()
            || hour_text.len() > 2
            || minute_text.len() != 2
            || !hour_text.bytes().all(|b| b.is_ascii_digit())
            || !minute_text.bytes().all(|b| b.is_ascii_digit())
        {
            return Err(invalid("expected H:MM or HH:MM"));
        }

        let hour: u32 = hour_text.parse().map_err(|_| invalid("bad hour"))?;
        let minute: u32 = minute_text.parse().map_err(|_| invalid("bad minute"))?;
        if !(1..=12).contains(&hour) {
            return Err(invalid("hour must be 1-12"));
        }
        if minute > 59 {
            return Err(invalid("minute must be 0-59"));
        }

        let hour24 = match (hour, is_pm) {
            (12, true) => 12,
            (12, false) => 0,
            (h, true) => h + 12,
            (h, false) => h,
        };
        Self::from_hm(hour24, minute).ok_or_else(|| invalid("out of range"))
    }

    /// Add (or subtract, for negative `minutes`) whole minutes, wrapping at midnight.
    pub fn add_minutes(self, minutes: i64) -> Self {
        let wrapped = minutes.rem_euclid(MINUTES_PER_DAY);
        let (time, _days) = self
            .0
            .overflowing_add_signed(TimeDelta::minutes(wrapped));
        Self(time)
    }

    /// Hour on a 24-hour clock (0–23).
    pub fn hour24(self) -> u32 {
        self.0.hour()
    }

    /// Minute of the hour (0–59).
    pub fn minute(self) -> u32 {
        self.0.minute()
    }

    /// Minutes elapsed since midnight (0–1439).
    pub fn minute_of_day(self) -> u32 {
        self.0.hour() * 60 + self.0.minute()
    }

    /// The underlying chrono time.
    pub fn as_naive(self) -> NaiveTime {
        self.0
    }
}

impl fmt::Display for ClockTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let hour = self.0.hour();
        let suffix = if hour >= 12 { "pm" } else { "am" };
        let hour12 = match hour % 12 {
            0 => 12,
            h => h,
        };
        write!(f, "{hour12}:{:02}{suffix}", self.0.minute())
    }
}

impl FromStr for ClockTime {
    type Err = PlanError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl From<ClockTime> for String {
    fn from(value: ClockTime) -> Self {
        value.to_string()
    }
}

impl TryFrom<String> for ClockTime {
    type Error = PlanError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

/// Signed minutes from `b` to `a` (`a - b`), negative when `a` is earlier.
///
/// ```
/// use itinerary_engine::clock::{diff_minutes, ClockTime};
///
/// let target = ClockTime::parse("9:20am").unwrap();
/// let eta = ClockTime::parse("9:45am").unwrap();
/// assert_eq!(diff_minutes(target, eta), -25);
/// ```
pub fn diff_minutes(a: ClockTime, b: ClockTime) -> i64 {
    (a.0 - b.0).num_minutes()
}

// ── TargetTime ──────────────────────────────────────────────────────────────

/// Placeholder shown (and persisted) for a stop without a stated time.
pub const UNSCHEDULED_MARK: &str = "—";

/// The arrival time a user stated for a stop.
///
/// Persisted as plain text so that a half-typed time survives a reload and
/// can be corrected later; only [`TargetTime::At`] takes part in timing.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(into = "String", from = "String")]
pub enum TargetTime {
    At(ClockTime),
    #[default]
    Unscheduled,
    Malformed(String),
}

impl TargetTime {
    /// Classify free text. Never fails: blanks and placeholder marks are
    /// unscheduled, anything else that does not parse is kept as malformed.
    pub fn parse(text: &str) -> Self {
        let trimmed = text.trim();
        if matches!(trimmed, "" | UNSCHEDULED_MARK | "-" | "?") {
            return TargetTime::Unscheduled;
        }
        match ClockTime::parse(trimmed) {
            Ok(time) => TargetTime::At(time),
            Err(_) => TargetTime::Malformed(trimmed.to_string()),
        }
    }

    /// The valid clock time, if any.
    pub fn time(&self) -> Option<ClockTime> {
        match self {
            TargetTime::At(time) => Some(*time),
            TargetTime::Unscheduled | TargetTime::Malformed(_) => None,
        }
    }

    pub fn is_set(&self) -> bool {
        self.time().is_some()
    }
}

impl From<ClockTime> for TargetTime {
    fn from(value: ClockTime) -> Self {
        TargetTime::At(value)
    }
}

impl fmt::Display for TargetTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TargetTime::At(time) => write!(f, "{time}"),
            TargetTime::Unscheduled => f.write_str(UNSCHEDULED_MARK),
            TargetTime::Malformed(raw) => f.write_str(raw),
        }
    }
}

impl From<TargetTime> for String {
    fn from(value: TargetTime) -> Self {
        value.to_string()
    }
}

impl From<String> for TargetTime {
    fn from(value: String) -> Self {
        TargetTime::parse(&value)
    }
}

// ── Durations ───────────────────────────────────────────────────────────────

/// Round a provider's travel time in seconds to whole minutes (half rounds up).
pub fn minutes_from_seconds(seconds: u32) -> u32 {
    seconds.saturating_add(30) / 60
}

/// Format a minute count for display (e.g., "1 hour, 5 minutes").
pub fn format_travel_duration(minutes: u32) -> String {
    let hours = minutes / 60;
    let minutes = minutes % 60;
    let mut parts = Vec::new();
    if hours > 0 {
        parts.push(format!("{} hour{}", hours, if hours == 1 { "" } else { "s" }));
    }
    if minutes > 0 || parts.is_empty() {
        parts.push(format!(
            "{} minute{}",
            minutes,
            if minutes == 1 { "" } else { "s" }
        ));
    }
    parts.join(", ")
}

// ── Tests ───────────────────────────────────────────────────────────────────
