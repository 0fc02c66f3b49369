//! Error types for itinerary-engine operations.

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PlanError {
    #[error("Invalid time: {0}")]
    InvalidTime(String),

    #[error("Leg count mismatch: {stops} stops need {expected} legs, got {actual}")]
    LengthMismatch {
        stops: usize,
        expected: usize,
        actual: usize,
    },

    #[error("Route unavailable: {0}")]
    RouteUnavailable(String),

    #[error("Insufficient stops: need at least 2, got {0}")]
    InsufficientStops(usize),

    #[error("Index {index} out of range for itinerary of {len} stops")]
    IndexOutOfRange { index: usize, len: usize },

    #[error("Format error: {0}")]
    Format(String),

    #[error("Invalid field: {0}")]
    InvalidField(String),

    #[error("Session error: {0}")]
    Session(String),
}

impl PlanError {
    /// Whether derived data must be hidden until the route is recomputed.
    pub fn requires_recompute(&self) -> bool {
        matches!(
            self,
            PlanError::LengthMismatch { .. }
                | PlanError::RouteUnavailable(_)
                | PlanError::InsufficientStops(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, PlanError>;
