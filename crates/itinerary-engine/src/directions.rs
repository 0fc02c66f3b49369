//! Google Directions web service as a [`LegDurationSource`].
//!
//! Waypoints are sent in itinerary order and never optimized: the engine
//! pairs leg `i` with stops `i` and `i + 1`, so the provider must not
//! reorder them.

use std::time::Duration;

use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex::Regex;
use reqwest::Client;
use serde::Deserialize;
use tracing::{debug, info};

use crate::error::{PlanError, Result};
use crate::legs::{check_locations, Leg, LegDurationSource, Route, Step, TransitDetails, TravelMode};

/// Default Directions API endpoint.
pub const DIRECTIONS_ENDPOINT: &str = "https://maps.googleapis.com/maps/api/directions/json";

static HTML_TAG: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"<[^>]+>").expect("html tag pattern is valid"));

#[derive(Debug, Clone)]
pub struct DirectionsConfig {
    pub api_key: String,
    pub endpoint: String,
    pub timeout: Duration,
}

impl DirectionsConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            endpoint: DIRECTIONS_ENDPOINT.to_string(),
            timeout: Duration::from_secs(10),
        }
    }
}

// ── response model ──────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct DirectionsResponse {
    status: String,
    #[serde(default)]
    error_message: Option<String>,
    #[serde(default)]
    routes: Vec<ApiRoute>,
}

#[derive(Debug, Deserialize)]
struct ApiRoute {
    legs: Vec<ApiLeg>,
}

#[derive(Debug, Deserialize)]
struct ApiLeg {
    duration: ApiValue,
    #[serde(default)]
    start_address: String,
    #[serde(default)]
    end_address: String,
    #[serde(default)]
    steps: Vec<ApiStep>,
}

#[derive(Debug, Deserialize)]
struct ApiValue {
    value: u32,
}

#[derive(Debug, Deserialize)]
struct ApiStep {
    #[serde(default)]
    html_instructions: String,
    #[serde(default)]
    transit_details: Option<ApiTransit>,
}

#[derive(Debug, Deserialize)]
struct ApiTransit {
    #[serde(default)]
    line: Option<ApiLine>,
    #[serde(default)]
    departure_stop: Option<ApiNamed>,
    #[serde(default)]
    arrival_stop: Option<ApiNamed>,
}

#[derive(Debug, Deserialize)]
struct ApiLine {
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    short_name: Option<String>,
    #[serde(default)]
    vehicle: Option<ApiVehicle>,
}

#[derive(Debug, Deserialize)]
struct ApiVehicle {
    #[serde(rename = "type")]
    kind: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ApiNamed {
    name: Option<String>,
}

/// Convert a Directions JSON body into a [`Route`] for `expected_legs` legs.
///
/// # Errors
///
/// Returns [`PlanError::RouteUnavailable`] when the body is not valid JSON,
/// the status is not `OK`, there is no route, or the leg count is wrong.
pub fn parse_directions_response(body: &str, expected_legs: usize) -> Result<Route> {
    let response: DirectionsResponse = serde_json::from_str(body)
        .map_err(|e| PlanError::RouteUnavailable(format!("unreadable directions response: {e}")))?;

    if response.status != "OK" {
        let detail = response
            .error_message
            .map(|m| format!(": {m}"))
            .unwrap_or_default();
        return Err(PlanError::RouteUnavailable(format!(
            "directions status {}{detail}",
            response.status
        )));
    }

    let route = response
        .routes
        .into_iter()
        .next()
        .ok_or_else(|| PlanError::RouteUnavailable("no route returned".to_string()))?;
    if route.legs.len() != expected_legs {
        return Err(PlanError::RouteUnavailable(format!(
            "expected {expected_legs} legs, provider returned {}",
            route.legs.len()
        )));
    }

    let legs = route
        .legs
        .into_iter()
        .map(|leg| Leg {
            travel_seconds: leg.duration.value,
            start_address: leg.start_address,
            end_address: leg.end_address,
            steps: leg.steps.into_iter().map(convert_step).collect(),
        })
        .collect();
    Ok(Route::new(legs))
}

fn convert_step(step: ApiStep) -> Step {
    let transit = step.transit_details.map(|t| {
        let (line, vehicle) = match t.line {
            Some(line) => (
                line.name.or(line.short_name),
                line.vehicle.and_then(|v| v.kind),
            ),
            None => (None, None),
        };
        TransitDetails {
            vehicle,
            line,
            departure_stop: t.departure_stop.and_then(|s| s.name),
            arrival_stop: t.arrival_stop.and_then(|s| s.name),
        }
    });
    Step {
        instruction: HTML_TAG.replace_all(&step.html_instructions, "").into_owned(),
        transit,
    }
}

// ── client ──────────────────────────────────────────────────────────────────

pub struct GoogleDirections {
    client: Client,
    config: DirectionsConfig,
}

impl GoogleDirections {
    pub fn new(config: DirectionsConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| PlanError::RouteUnavailable(format!("http client: {e}")))?;
        Ok(Self { client, config })
    }

    /// Query parameters for one request, without the API key.
    fn query(locations: &[String], mode: TravelMode) -> Vec<(&'static str, String)> {
        let last = locations.len() - 1;
        let mut query = vec![
            ("origin", locations[0].clone()),
            ("destination", locations[last].clone()),
            ("mode", mode.as_str().to_string()),
        ];
        if last > 1 {
            query.push(("waypoints", locations[1..last].join("|")));
        }
        if mode == TravelMode::Driving {
            query.push(("departure_time", "now".to_string()));
        }
        query
    }
}

#[async_trait]
impl LegDurationSource for GoogleDirections {
    async fn leg_durations(&self, locations: &[String], mode: TravelMode) -> Result<Route> {
        check_locations(locations)?;
        let mut query = Self::query(locations, mode);
        query.push(("key", self.config.api_key.clone()));

        debug!(stops = locations.len(), %mode, "requesting directions");
        let response = self
            .client
            .get(&self.config.endpoint)
            .query(&query)
            .send()
            .await
            .map_err(|e| PlanError::RouteUnavailable(format!("directions request failed: {e}")))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| PlanError::RouteUnavailable(format!("directions body: {e}")))?;
        if !status.is_success() {
            return Err(PlanError::RouteUnavailable(format!(
                "directions HTTP {}",
                status.as_u16()
            )));
        }

        let route = parse_directions_response(&body, locations.len() - 1)?;
        info!(legs = route.legs.len(), total_minutes = route.total_minutes(), "directions received");
        Ok(route)
    }
}

// ── Tests ───────────────────────────────────────────────────────────────────
