//! Persisted session state: `{ "schedule": [...], "stops": [...] }`.
//!
//! `schedule` holds the stop records; `stops` is their ordered location
//! list, the input of the next route request. A session with two or more
//! locations is due for an immediate route refresh when loaded.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{PlanError, Result};
use crate::stop::Stop;
use crate::store::Itinerary;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionState {
    #[serde(default)]
    pub schedule: Vec<Stop>,
    #[serde(default)]
    pub stops: Vec<String>,
}

impl SessionState {
    pub fn from_itinerary(itinerary: &Itinerary) -> Self {
        Self {
            schedule: itinerary.stops().to_vec(),
            stops: itinerary.locations(),
        }
    }

    pub fn into_itinerary(self) -> Itinerary {
        Itinerary::from_stops(self.schedule)
    }

    /// Whether the route should be recomputed right after loading.
    pub fn needs_recompute(&self) -> bool {
        self.stops.len() >= 2
    }

    /// Parse persisted state and check `stops` against `schedule`.
    ///
    /// # Errors
    ///
    /// Returns [`PlanError::Session`] for invalid JSON or a location list
    /// that disagrees with the schedule.
    pub fn from_json(text: &str) -> Result<Self> {
        let mut state: Self = serde_json::from_str(text)
            .map_err(|e| PlanError::Session(format!("invalid session: {e}")))?;
        state.reconcile()?;
        Ok(state)
    }

    /// A missing location list is rebuilt from the schedule; one naming
    /// different locations is rejected.
    fn reconcile(&mut self) -> Result<()> {
        let locations: Vec<String> = self.schedule.iter().map(|s| s.location.clone()).collect();
        if self.stops.is_empty() {
            self.stops = locations;
        } else if self.stops != locations {
            return Err(PlanError::Session(format!(
                "stop list does not match schedule ({} locations for {} stops)",
                self.stops.len(),
                self.schedule.len()
            )));
        }
        Ok(())
    }

    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self).map_err(|e| PlanError::Session(e.to_string()))
    }

    /// Load from `path`; a missing file is an empty session.
    pub fn load(path: &Path) -> Result<Self> {
        match fs::read_to_string(path) {
            Ok(text) => {
                let state = Self::from_json(&text)?;
                debug!(path = %path.display(), stops = state.schedule.len(), "loaded session");
                Ok(state)
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Self::default()),
            Err(e) => Err(PlanError::Session(format!("{}: {e}", path.display()))),
        }
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let json = self.to_json()?;
        fs::write(path, json).map_err(|e| PlanError::Session(format!("{}: {e}", path.display())))?;
        debug!(path = %path.display(), stops = self.schedule.len(), "saved session");
        Ok(())
    }
}

// ── Tests ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::TargetTime;
    use tempfile::TempDir;

    fn sample() -> Itinerary {
        Itinerary::from_stops(vec![
            Stop::new("Coffee", TargetTime::parse("9:00am"), "Blue Bottle", 30),
            Stop::unscheduled("Dolores Park"),
        ])
    }

    #[test]
    fn test_state_shape() {
        let state = SessionState::from_itinerary(&sample());
        let json: serde_json::Value = serde_json::from_str(&state.to_json().unwrap()).unwrap();
        assert_eq!(json["stops"], serde_json::json!(["Blue Bottle", "Dolores Park"]));
        assert_eq!(json["schedule"][0]["time"], "9:00am");
        assert_eq!(json["schedule"][1]["time"], "—");
    }

    #[test]
    fn test_round_trip_through_json() {
        let state = SessionState::from_itinerary(&sample());
        let back = SessionState::from_json(&state.to_json().unwrap()).unwrap();
        assert_eq!(back, state);
        assert_eq!(back.into_itinerary().stops(), sample().stops());
    }

    #[test]
    fn test_needs_recompute_with_two_locations() {
        assert!(SessionState::from_itinerary(&sample()).needs_recompute());
        let single = SessionState {
            schedule: Vec::new(),
            stops: vec!["Home".to_string()],
        };
        assert!(!single.needs_recompute());
    }

    #[test]
    fn test_empty_object_is_empty_session() {
        let state = SessionState::from_json("{}").unwrap();
        assert!(state.schedule.is_empty());
        assert!(!state.needs_recompute());
    }

    #[test]
    fn test_invalid_json_is_session_error() {
        assert!(matches!(
            SessionState::from_json("[1,2"),
            Err(PlanError::Session(_))
        ));
    }

    #[test]
    fn test_missing_stop_list_is_rebuilt() {
        let state = SessionState::from_json(
            r#"{"schedule":[{"name":"A","time":"9:00am","location":"Oakland","duration":0},
                            {"name":"B","time":"—","location":"Berkeley","duration":0}]}"#,
        )
        .unwrap();
        assert_eq!(state.stops, vec!["Oakland".to_string(), "Berkeley".to_string()]);
        assert!(state.needs_recompute());
    }

    #[test]
    fn test_mismatched_stop_list_is_rejected() {
        let mut state = SessionState::from_itinerary(&sample());
        state.stops.reverse();
        let err = SessionState::from_json(&state.to_json().unwrap()).unwrap_err();
        assert!(matches!(err, PlanError::Session(ref m) if m.contains("does not match")), "got: {err}");
    }

    #[test]
    fn test_load_missing_file_is_empty() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("missing.json");
        assert_eq!(SessionState::load(&path).unwrap(), SessionState::default());
    }

    #[test]
    fn test_save_then_load() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("session.json");
        let state = SessionState::from_itinerary(&sample());
        state.save(&path).unwrap();
        assert_eq!(SessionState::load(&path).unwrap(), state);
    }

    #[test]
    fn test_load_unreadable_path_is_session_error() {
        let dir = TempDir::new().unwrap();
        assert!(matches!(
            SessionState::load(dir.path()),
            Err(PlanError::Session(_))
        ));
    }
}
