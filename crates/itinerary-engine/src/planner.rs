//! The planner: one owned itinerary, its current legs, and the commands a UI
//! issues against them.
//!
//! # Route refresh
//!
//! A refresh is split in three so the slow provider call can happen between
//! user actions:
//!
//! 1. [`Planner::begin_refresh`] issues a [`RouteRequest`] carrying a fresh,
//!    monotonically increasing token and the itinerary revision.
//! 2. The caller asks a [`LegDurationSource`] for the request's locations.
//! 3. [`Planner::complete_refresh`] applies the response, or drops it when a
//!    newer request was issued or the itinerary changed in the meantime.
//!
//! [`Planner::refresh`] runs all three with a timeout around step 2.

use std::time::Duration;

use serde::Serialize;
use tracing::{info, warn};

use crate::autofix::{auto_fix, AutoFixReport};
use crate::clock::ClockTime;
use crate::error::{PlanError, Result};
use crate::legs::{check_locations, LegDurationSource, Route, RouteLegs, TravelMode};
use crate::session::SessionState;
use crate::store::Itinerary;
use crate::timing::{compute_timeline, expected_legs, Timeline};

/// Default bound on one provider call.
pub const DEFAULT_ROUTE_TIMEOUT: Duration = Duration::from_secs(10);

/// A route request issued by [`Planner::begin_refresh`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteRequest {
    pub token: u64,
    pub revision: u64,
    pub locations: Vec<String>,
    pub mode: TravelMode,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshOutcome {
    /// The response matched the current itinerary and its legs are in use.
    Applied { legs: usize },
    /// The response answered an outdated request and was dropped.
    Superseded,
}

/// What a UI may show for the current itinerary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", content = "timeline", rename_all = "snake_case")]
pub enum Snapshot {
    Ready(Timeline),
    /// Legs are missing or stale; derived data must not be shown.
    RecomputeRequired,
}

impl Snapshot {
    pub fn timeline(&self) -> Option<&Timeline> {
        match self {
            Snapshot::Ready(timeline) => Some(timeline),
            Snapshot::RecomputeRequired => None,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct Planner {
    itinerary: Itinerary,
    route: Option<RouteLegs>,
    mode: TravelMode,
    last_token: u64,
}

impl Planner {
    pub fn new(itinerary: Itinerary, mode: TravelMode) -> Self {
        Self {
            itinerary,
            route: None,
            mode,
            last_token: 0,
        }
    }

    pub fn from_session(state: SessionState, mode: TravelMode) -> Self {
        Self::new(state.into_itinerary(), mode)
    }

    pub fn to_session(&self) -> SessionState {
        SessionState::from_itinerary(&self.itinerary)
    }

    pub fn itinerary(&self) -> &Itinerary {
        &self.itinerary
    }

    /// Current legs, only while they match the itinerary's locations.
    pub fn route(&self) -> Option<&RouteLegs> {
        self.route.as_ref()
    }

    pub fn mode(&self) -> TravelMode {
        self.mode
    }

    /// Switch travel mode. Existing legs were timed for the old mode and are dropped.
    pub fn set_mode(&mut self, mode: TravelMode) {
        if mode != self.mode {
            self.mode = mode;
            self.route = None;
        }
    }

    /// Whether a route refresh is needed before derived data can be shown.
    pub fn needs_refresh(&self) -> bool {
        self.itinerary.len() >= 2 && self.route.is_none()
    }

    /// Apply a store command. Legs that no longer pair with the itinerary's
    /// locations are discarded.
    pub fn edit<T>(&mut self, command: impl FnOnce(&mut Itinerary) -> Result<T>) -> Result<T> {
        let out = command(&mut self.itinerary)?;
        let locations = self.itinerary.locations();
        if self.route.as_ref().is_some_and(|r| !r.matches(&locations)) {
            self.route = None;
        }
        Ok(out)
    }

    // ── refresh ─────────────────────────────────────────────────────────

    /// Issue a new route request, superseding any outstanding one.
    ///
    /// # Errors
    ///
    /// Returns [`PlanError::InsufficientStops`] for fewer than two stops.
    pub fn begin_refresh(&mut self) -> Result<RouteRequest> {
        let locations = self.itinerary.locations();
        check_locations(&locations)?;
        self.last_token += 1;
        Ok(RouteRequest {
            token: self.last_token,
            revision: self.itinerary.revision(),
            locations,
            mode: self.mode,
        })
    }

    /// Apply the provider's answer to `request`.
    ///
    /// A failed answer to the current request clears the legs and returns the
    /// error; an answer to an outdated request is dropped whatever it holds.
    pub fn complete_refresh(
        &mut self,
        request: RouteRequest,
        response: Result<Route>,
    ) -> Result<RefreshOutcome> {
        if request.token != self.last_token
            || request.revision != self.itinerary.revision()
            || request.mode != self.mode
        {
            warn!(
                token = request.token,
                latest = self.last_token,
                "dropping superseded route response"
            );
            return Ok(RefreshOutcome::Superseded);
        }

        match response {
            Ok(route) => {
                let legs = route.legs.len();
                let expected = expected_legs(request.locations.len());
                if legs != expected {
                    self.route = None;
                    return Err(PlanError::LengthMismatch {
                        stops: request.locations.len(),
                        expected,
                        actual: legs,
                    });
                }
                info!(token = request.token, legs, "route refreshed");
                self.route = Some(RouteLegs {
                    locations: request.locations,
                    route,
                });
                Ok(RefreshOutcome::Applied { legs })
            }
            Err(e) => {
                self.route = None;
                Err(e)
            }
        }
    }

    /// Begin, fetch with a timeout, and complete one refresh.
    ///
    /// A timeout counts as "no legs available" and surfaces as
    /// [`PlanError::RouteUnavailable`].
    pub async fn refresh(
        &mut self,
        source: &dyn LegDurationSource,
        timeout: Duration,
    ) -> Result<RefreshOutcome> {
        let request = self.begin_refresh()?;
        let response = match tokio::time::timeout(
            timeout,
            source.leg_durations(&request.locations, request.mode),
        )
        .await
        {
            Ok(response) => response,
            Err(_) => {
                warn!(token = request.token, ?timeout, "route request timed out");
                Err(PlanError::RouteUnavailable(format!(
                    "no response within {}s",
                    timeout.as_secs_f32()
                )))
            }
        };
        self.complete_refresh(request, response)
    }

    // ── derived state ───────────────────────────────────────────────────

    /// Leg minutes usable with the current itinerary, if any.
    fn leg_minutes(&self) -> Option<Vec<u32>> {
        if self.itinerary.len() < 2 {
            return Some(Vec::new());
        }
        self.route.as_ref().map(RouteLegs::leg_minutes)
    }

    /// Derived timing for display, or [`Snapshot::RecomputeRequired`].
    pub fn snapshot(&self, anchor: ClockTime) -> Snapshot {
        let Some(legs) = self.leg_minutes() else {
            return Snapshot::RecomputeRequired;
        };
        match compute_timeline(anchor, self.itinerary.stops(), &legs) {
            Ok(timeline) => Snapshot::Ready(timeline),
            Err(e) => {
                warn!(error = %e, "timeline unavailable");
                Snapshot::RecomputeRequired
            }
        }
    }

    /// Run one auto-fix pass with the current legs.
    ///
    /// # Errors
    ///
    /// Returns [`PlanError::RouteUnavailable`] when no current legs exist.
    pub fn auto_fix(&mut self, anchor: ClockTime) -> Result<AutoFixReport> {
        let legs = self.leg_minutes().ok_or_else(|| {
            PlanError::RouteUnavailable("refresh the route before fixing conflicts".to_string())
        })?;
        // only target times change, so the legs stay valid
        auto_fix(&mut self.itinerary, anchor, &legs)
    }
}

// ── Tests ───────────────────────────────────────────────────────────────────
