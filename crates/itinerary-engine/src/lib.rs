//! # itinerary-engine
//!
//! Timing and conflict detection for single-day itineraries.
//!
//! A user lists stops in order, each with an optional target arrival time and
//! a dwell. Given one travel duration per leg, the engine derives when each
//! stop ends, when the traveller will actually arrive, how much slack (or
//! overlap) that leaves against the stated schedule, and which stops will be
//! reached late. Auto-fix resolves late stops by adopting their projected
//! arrivals as the new targets.
//!
//! ## Modules
//!
//! - [`clock`] — 12-hour clock parsing, formatting and wrap-around arithmetic
//! - [`stop`] — Stop records and single-field edits
//! - [`store`] — The ordered, revisioned itinerary store
//! - [`timing`] — End times, projected ETAs, gaps and late flags
//! - [`autofix`] — One-pass conflict resolution
//! - [`calendar`] — Calendar timestamps and "add to calendar" links
//! - [`import`] — `TIME - NAME at LOCATION` schedule import
//! - [`legs`] — Travel legs and the [`LegDurationSource`] boundary
//! - [`directions`] — Google Directions web service source
//! - [`links`] — Google Maps directions deep link
//! - [`session`] — Persisted `{schedule, stops}` state
//! - [`planner`] — Command facade with token-guarded route refresh
//! - [`error`] — Error types

pub mod autofix;
pub mod calendar;
pub mod clock;
pub mod directions;
pub mod error;
pub mod import;
pub mod legs;
pub mod links;
pub mod planner;
pub mod session;
pub mod stop;
pub mod store;
pub mod timing;

pub use autofix::{auto_fix, propose_fixes, AutoFixReport, Fix};
pub use calendar::{calendar_url, to_calendar_range};
pub use clock::{diff_minutes, ClockTime, TargetTime};
pub use directions::{DirectionsConfig, GoogleDirections};
pub use error::PlanError;
pub use import::import_schedule;
pub use legs::{FixedLegs, Leg, LegDurationSource, Route, RouteLegs, TravelMode};
pub use links::directions_url;
pub use planner::{Planner, RefreshOutcome, RouteRequest, Snapshot};
pub use session::SessionState;
pub use stop::{Priority, Stop, StopField};
pub use store::Itinerary;
pub use timing::{compute_timeline, LateWarning, StopTiming, Timeline};
