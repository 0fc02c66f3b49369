//! Travel legs between consecutive stops and the source that provides them.
//!
//! The engine only needs one travel duration per consecutive pair of stops.
//! Where those durations come from (a routing web service, a fixed table in
//! a test) sits behind [`LegDurationSource`].

use std::fmt;
use std::str::FromStr;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::clock::{format_travel_duration, minutes_from_seconds};
use crate::error::{PlanError, Result};

/// How the traveller moves between stops.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TravelMode {
    #[default]
    Driving,
    Walking,
    Bicycling,
    Transit,
}

impl TravelMode {
    /// Lowercase name used in provider requests and map links.
    pub fn as_str(self) -> &'static str {
        match self {
            TravelMode::Driving => "driving",
            TravelMode::Walking => "walking",
            TravelMode::Bicycling => "bicycling",
            TravelMode::Transit => "transit",
        }
    }
}

impl fmt::Display for TravelMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

impl FromStr for TravelMode {
    type Err = PlanError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "driving" | "drive" | "car" => Ok(TravelMode::Driving),
            "walking" | "walk" => Ok(TravelMode::Walking),
            "bicycling" | "cycling" | "bike" => Ok(TravelMode::Bicycling),
            "transit" => Ok(TravelMode::Transit),
            other => Err(PlanError::InvalidField(format!("unknown travel mode '{other}'"))),
        }
    }
}

/// Public-transport details of one step.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransitDetails {
    pub vehicle: Option<String>,
    pub line: Option<String>,
    pub departure_stop: Option<String>,
    pub arrival_stop: Option<String>,
}

/// One turn-by-turn instruction within a leg.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Step {
    pub instruction: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transit: Option<TransitDetails>,
}

/// The travel segment between two consecutive stops.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Leg {
    pub travel_seconds: u32,
    pub start_address: String,
    pub end_address: String,
    #[serde(default)]
    pub steps: Vec<Step>,
}

impl Leg {
    pub fn minutes(&self) -> u32 {
        minutes_from_seconds(self.travel_seconds)
    }
}

/// A row of the travel-time table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TravelRow {
    pub from: String,
    pub to: String,
    pub duration: String,
}

/// Legs returned by a provider for one ordered list of locations.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Route {
    pub legs: Vec<Leg>,
}

impl Route {
    pub fn new(legs: Vec<Leg>) -> Self {
        Self { legs }
    }

    /// Per-leg travel minutes, the engine's input.
    pub fn leg_minutes(&self) -> Vec<u32> {
        self.legs.iter().map(Leg::minutes).collect()
    }

    /// Whole trip travel time, rounded once over the summed seconds.
    pub fn total_minutes(&self) -> u32 {
        let seconds = self
            .legs
            .iter()
            .fold(0u32, |acc, leg| acc.saturating_add(leg.travel_seconds));
        minutes_from_seconds(seconds)
    }

    pub fn travel_rows(&self) -> Vec<TravelRow> {
        self.legs
            .iter()
            .map(|leg| TravelRow {
                from: leg.start_address.clone(),
                to: leg.end_address.clone(),
                duration: format_travel_duration(leg.minutes()),
            })
            .collect()
    }

    /// "Leg 2: Take BUS line 38 from Geary & Masonic to Union Square" for each
    /// transit step, in order.
    pub fn transit_summary(&self) -> Vec<String> {
        let mut lines = Vec::new();
        for (i, leg) in self.legs.iter().enumerate() {
            for transit in leg.steps.iter().filter_map(|s| s.transit.as_ref()) {
                lines.push(format!(
                    "Leg {}: Take {} line {} from {} to {}",
                    i + 1,
                    transit.vehicle.as_deref().unwrap_or("Transit"),
                    transit.line.as_deref().unwrap_or("Unnamed"),
                    transit.departure_stop.as_deref().unwrap_or("?"),
                    transit.arrival_stop.as_deref().unwrap_or("?"),
                ));
            }
        }
        lines
    }
}

/// Leg minutes tagged with the ordered locations they were computed for.
///
/// A reorder keeps the stop count but changes the pairs; comparing the
/// location list catches that case as well as added or removed stops.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RouteLegs {
    pub locations: Vec<String>,
    pub route: Route,
}

impl RouteLegs {
    pub fn leg_minutes(&self) -> Vec<u32> {
        self.route.leg_minutes()
    }

    pub fn matches(&self, locations: &[String]) -> bool {
        self.locations == locations
    }
}

/// Anything that can turn ordered locations into travel legs.
#[async_trait]
pub trait LegDurationSource: Send + Sync {
    /// Return exactly one leg per consecutive pair of `locations`.
    ///
    /// # Errors
    ///
    /// [`PlanError::InsufficientStops`] for fewer than two locations and
    /// [`PlanError::RouteUnavailable`] for any provider failure.
    async fn leg_durations(&self, locations: &[String], mode: TravelMode) -> Result<Route>;
}

/// Legs from a fixed list of minutes, one per pair. Used when durations are
/// typed in by hand or known in advance.
#[derive(Debug, Clone, Default)]
pub struct FixedLegs {
    minutes: Vec<u32>,
}

impl FixedLegs {
    pub fn new(minutes: Vec<u32>) -> Self {
        Self { minutes }
    }
}

#[async_trait]
impl LegDurationSource for FixedLegs {
    async fn leg_durations(&self, locations: &[String], _mode: TravelMode) -> Result<Route> {
        check_locations(locations)?;
        let pairs = locations.len() - 1;
        if self.minutes.len() != pairs {
            return Err(PlanError::RouteUnavailable(format!(
                "{} fixed leg durations for {pairs} legs",
                self.minutes.len()
            )));
        }
        let legs = locations
            .windows(2)
            .zip(&self.minutes)
            .map(|(pair, minutes)| Leg {
                travel_seconds: minutes.saturating_mul(60),
                start_address: pair[0].clone(),
                end_address: pair[1].clone(),
                steps: Vec::new(),
            })
            .collect();
        Ok(Route::new(legs))
    }
}

/// Shared precondition of every source.
pub fn check_locations(locations: &[String]) -> Result<()> {
    if locations.len() < 2 {
        return Err(PlanError::InsufficientStops(locations.len()));
    }
    Ok(())
}

// ── Tests ───────────────────────────────────────────────────────────────────
