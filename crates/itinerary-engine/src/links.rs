//! Deep link that opens the whole itinerary in Google Maps directions.

use url::Url;

use crate::error::{PlanError, Result};
use crate::legs::TravelMode;
use crate::stop::Stop;

pub const MAPS_DIRECTIONS_URL: &str = "https://www.google.com/maps/dir/";

/// Build a Maps URL with origin, destination and the intermediate stops as
/// `|`-separated waypoints, in itinerary order.
///
/// # Errors
///
/// Returns [`PlanError::InsufficientStops`] for fewer than two stops.
///
/// # Examples
///
/// ```
/// use itinerary_engine::legs::TravelMode;
/// use itinerary_engine::links::directions_url;
/// use itinerary_engine::stop::Stop;
///
/// let stops = vec![Stop::unscheduled("Oakland"), Stop::unscheduled("Berkeley")];
/// let link = directions_url(&stops, TravelMode::Walking).unwrap();
/// assert!(link.contains("origin=Oakland"));
/// assert!(link.contains("travelmode=walking"));
/// ```
pub fn directions_url(stops: &[Stop], mode: TravelMode) -> Result<String> {
    let (first, last) = match stops {
        [first, .., last] => (first, last),
        _ => return Err(PlanError::InsufficientStops(stops.len())),
    };

    let waypoints = stops[1..stops.len() - 1]
        .iter()
        .map(|s| s.location.as_str())
        .collect::<Vec<_>>()
        .join("|");

    let mut params = vec![
        ("api", "1"),
        ("origin", first.location.as_str()),
        ("destination", last.location.as_str()),
        ("travelmode", mode.as_str()),
    ];
    if !waypoints.is_empty() {
        params.push(("waypoints", waypoints.as_str()));
    }

    Url::parse_with_params(MAPS_DIRECTIONS_URL, &params)
        .map(String::from)
        .map_err(|e| PlanError::Format(format!("directions link: {e}")))
}

// ── Tests ───────────────────────────────────────────────────────────────────
