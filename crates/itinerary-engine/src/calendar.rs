//! Calendar export: a stop's start and end as floating local timestamps.
//!
//! Timestamps use the compact `YYYYMMDDTHHMMSS` form with seconds fixed at
//! `00` and no offset, so the receiving calendar reads them as local
//! wall-clock time.

use chrono::{NaiveDate, NaiveDateTime, TimeDelta};
use url::Url;

use crate::error::{PlanError, Result};
use crate::stop::Stop;

/// Event template endpoint of Google Calendar.
pub const CALENDAR_TEMPLATE_URL: &str = "https://calendar.google.com/calendar/render";

const STAMP_FORMAT: &str = "%Y%m%dT%H%M00";

/// Start and end stamps of `stop` on `date`.
///
/// The end is the target time plus the dwell; an end past midnight lands on
/// the following date.
///
/// # Errors
///
/// Returns [`PlanError::Format`] when the stop has no valid target time.
///
/// # Examples
///
/// ```
/// use chrono::NaiveDate;
/// use itinerary_engine::calendar::to_calendar_range;
/// use itinerary_engine::clock::TargetTime;
/// use itinerary_engine::stop::Stop;
///
/// let stop = Stop::new("Museum", TargetTime::parse("2:30pm"), "SFMOMA", 90);
/// let date = NaiveDate::from_ymd_opt(2026, 3, 14).unwrap();
/// let (start, end) = to_calendar_range(&stop, date).unwrap();
/// assert_eq!(start, "20260314T143000");
/// assert_eq!(end, "20260314T160000");
/// ```
pub fn to_calendar_range(stop: &Stop, date: NaiveDate) -> Result<(String, String)> {
    let target = stop.target.time().ok_or_else(|| {
        PlanError::Format(format!(
            "'{}' has no valid time to export (got '{}')",
            stop.name, stop.target
        ))
    })?;

    let start = NaiveDateTime::new(date, target.as_naive());
    let end = start
        .checked_add_signed(TimeDelta::minutes(i64::from(stop.duration_minutes)))
        .ok_or_else(|| PlanError::Format(format!("'{}' ends out of range", stop.name)))?;

    Ok((
        start.format(STAMP_FORMAT).to_string(),
        end.format(STAMP_FORMAT).to_string(),
    ))
}

/// A ready-to-open "add to calendar" link for `stop` on `date`.
///
/// # Errors
///
/// Returns [`PlanError::Format`] when the stop has no valid target time.
pub fn calendar_url(stop: &Stop, date: NaiveDate) -> Result<String> {
    let (start, end) = to_calendar_range(stop, date)?;
    let dates = format!("{start}/{end}");

    let mut params = vec![
        ("action", "TEMPLATE"),
        ("text", stop.name.as_str()),
        ("dates", dates.as_str()),
        ("location", stop.location.as_str()),
    ];
    if !stop.note.is_empty() {
        params.push(("details", stop.note.as_str()));
    }

    Url::parse_with_params(CALENDAR_TEMPLATE_URL, &params)
        .map(String::from)
        .map_err(|e| PlanError::Format(format!("calendar link: {e}")))
}

// ── Tests ───────────────────────────────────────────────────────────────────
