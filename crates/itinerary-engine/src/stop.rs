//! Stop records and the field edits that can be applied to them.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::clock::TargetTime;
use crate::error::PlanError;

/// How much a stop matters to the user. Purely a label: timing ignores it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    #[default]
    Low,
    Medium,
    High,
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(match self {
            Priority::Low => "low",
            Priority::Medium => "medium",
            Priority::High => "high",
        })
    }
}

impl FromStr for Priority {
    type Err = PlanError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "low" => Ok(Priority::Low),
            "medium" => Ok(Priority::Medium),
            "high" => Ok(Priority::High),
            other => Err(PlanError::InvalidField(format!(
                "priority must be low, medium or high: '{other}'"
            ))),
        }
    }
}

/// One itinerary entry.
///
/// The serialized field names (`time`, `duration`) match the persisted
/// schedule format so saved sessions load unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Stop {
    pub name: String,
    /// Arrival time the user is aiming for.
    #[serde(rename = "time", default)]
    pub target: TargetTime,
    /// Free-text address or `"lat,lng"`; passed through to the routing provider.
    pub location: String,
    /// Minutes spent at the stop before departing.
    #[serde(rename = "duration", default)]
    pub duration_minutes: u32,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub note: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub category: String,
    #[serde(default)]
    pub priority: Priority,
}

impl Stop {
    pub fn new(
        name: impl Into<String>,
        target: TargetTime,
        location: impl Into<String>,
        duration_minutes: u32,
    ) -> Self {
        Self {
            name: name.into(),
            target,
            location: location.into(),
            duration_minutes,
            note: String::new(),
            category: String::new(),
            priority: Priority::default(),
        }
    }

    /// An ad-hoc stop added by address alone: no stated time, no dwell.
    pub fn unscheduled(location: impl Into<String>) -> Self {
        Self::new("Stop", TargetTime::Unscheduled, location, 0)
    }
}

/// A single-field edit, the command form of "the user changed a cell".
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StopField {
    Name(String),
    Target(TargetTime),
    Location(String),
    Duration(u32),
    Note(String),
    Category(String),
    Priority(Priority),
}

impl StopField {
    /// Build an edit from a field name and its text value.
    ///
    /// Field names: `name`, `time`, `location`, `duration`, `note`,
    /// `category`, `priority`. A time that does not parse is accepted and
    /// stored as malformed, exactly as if typed into the schedule.
    ///
    /// # Errors
    ///
    /// Returns [`PlanError::InvalidField`] for an unknown field, a duration
    /// that is not a non-negative integer, or an unknown priority.
    pub fn parse(field: &str, value: &str) -> Result<Self, PlanError> {
        match field.trim().to_ascii_lowercase().as_str() {
            "name" => Ok(StopField::Name(value.to_string())),
            "time" | "target" => Ok(StopField::Target(TargetTime::parse(value))),
            "location" => Ok(StopField::Location(value.trim().to_string())),
            "duration" => value
                .trim()
                .parse::<u32>()
                .map(StopField::Duration)
                .map_err(|_| {
                    PlanError::InvalidField(format!(
                        "duration must be a non-negative number of minutes: '{value}'"
                    ))
                }),
            "note" => Ok(StopField::Note(value.to_string())),
            "category" => Ok(StopField::Category(value.to_string())),
            "priority" => value.parse().map(StopField::Priority),
            other => Err(PlanError::InvalidField(format!("unknown field '{other}'"))),
        }
    }

    /// Whether the edit can change the route (and so the leg durations).
    pub fn affects_route(&self) -> bool {
        matches!(self, StopField::Location(_))
    }

    pub(crate) fn apply(self, stop: &mut Stop) {
        match self {
            StopField::Name(v) => stop.name = v,
            StopField::Target(v) => stop.target = v,
            StopField::Location(v) => stop.location = v,
            StopField::Duration(v) => stop.duration_minutes = v,
            StopField::Note(v) => stop.note = v,
            StopField::Category(v) => stop.category = v,
            StopField::Priority(v) => stop.priority = v,
        }
    }
}

// ── Tests ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ClockTime;

    #[test]
    fn test_stop_json_uses_schedule_field_names() {
        let stop = Stop::new(
            "Coffee",
            TargetTime::At(ClockTime::parse("9:00am").unwrap()),
            "Blue Bottle, Oakland",
            30,
        );
        let json = serde_json::to_value(&stop).unwrap();
        assert_eq!(json["time"], "9:00am");
        assert_eq!(json["duration"], 30);
        assert_eq!(json["priority"], "low");
        assert!(json.get("note").is_none());
    }

    #[test]
    fn test_stop_loads_with_missing_annotations() {
        let stop: Stop = serde_json::from_str(
            r#"{"name":"Stop","time":"—","location":"37.77,-122.41","duration":0}"#,
        )
        .unwrap();
        assert_eq!(stop.target, TargetTime::Unscheduled);
        assert_eq!(stop.priority, Priority::Low);
        assert!(stop.category.is_empty());
    }

    #[test]
    fn test_stop_rejects_negative_duration() {
        let result: Result<Stop, _> =
            serde_json::from_str(r#"{"name":"x","time":"—","location":"y","duration":-5}"#);
        assert!(result.is_err());
    }

    #[test]
    fn test_field_parse_known_fields() {
        assert_eq!(
            StopField::parse("duration", " 45 ").unwrap(),
            StopField::Duration(45)
        );
        assert_eq!(
            StopField::parse("Priority", "HIGH").unwrap(),
            StopField::Priority(Priority::High)
        );
        assert_eq!(
            StopField::parse("time", "soonish").unwrap(),
            StopField::Target(TargetTime::Malformed("soonish".to_string()))
        );
    }

    #[test]
    fn test_field_parse_rejects_bad_values() {
        assert!(StopField::parse("duration", "-10").is_err());
        assert!(StopField::parse("priority", "urgent").is_err());
        let err = StopField::parse("colour", "red").unwrap_err().to_string();
        assert!(err.contains("unknown field"), "got: {err}");
    }

    #[test]
    fn test_only_location_affects_route() {
        assert!(StopField::Location("x".into()).affects_route());
        assert!(!StopField::Duration(5).affects_route());
    }
}
