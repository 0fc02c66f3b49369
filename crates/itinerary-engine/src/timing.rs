//! The timing engine: end times, projected arrivals and schedule conflicts.
//!
//! [`compute_timeline`] is a pure function of the ordered stops, one travel
//! duration per consecutive pair and a "now" anchor. It never reads the
//! system clock and never mutates the stops.
//!
//! # Chain rules
//!
//! - A stop with a stated target ends at `target + duration`.
//! - The first stop is reached at its target, or at the anchor when it has none.
//! - Every later stop is reached at the previous stop's effective end plus the
//!   leg between them. The effective end is the stated end when there is one,
//!   otherwise the projected arrival plus the dwell.
//! - A later stop with a target reports `gap = target - eta`; zero or less is late.

use serde::Serialize;
use tracing::debug;

use crate::clock::{diff_minutes, ClockTime};
use crate::error::{PlanError, Result};
use crate::stop::Stop;

/// Derived timing for one stop.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct StopTiming {
    /// Stated target plus dwell; `None` when no valid target was given.
    pub end_time: Option<ClockTime>,
    /// Projected arrival from the chain of previous stops and legs.
    pub eta: ClockTime,
    /// When the stop is left: `end_time`, or `eta + dwell` without a target.
    pub effective_end: ClockTime,
    /// `target - eta` in minutes. Positive is slack, zero or negative a conflict.
    pub gap_minutes: Option<i64>,
    pub is_late: bool,
}

impl StopTiming {
    /// Arrival strictly after the stated target (negative gap).
    pub fn is_overdue(&self) -> bool {
        self.gap_minutes.is_some_and(|g| g < 0)
    }
}

/// A late-arrival notice for display.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LateWarning {
    pub index: usize,
    pub name: String,
    pub target: ClockTime,
    pub eta: ClockTime,
    /// How many minutes past the target the projected arrival lands.
    pub minutes_late: i64,
}

impl LateWarning {
    pub fn message(&self) -> String {
        format!("You may be late to {}", self.name)
    }
}

/// Derived timing for a whole itinerary, index-aligned with its stops.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Timeline {
    stops: Vec<StopTiming>,
}

impl Timeline {
    /// Per-stop timing, index-aligned with the itinerary.
    pub fn stops(&self) -> &[StopTiming] {
        &self.stops
    }

    pub fn get(&self, index: usize) -> Option<&StopTiming> {
        self.stops.get(index)
    }

    /// Number of stops covered, equal to the itinerary length.
    pub fn len(&self) -> usize {
        self.stops.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stops.is_empty()
    }

    /// Indices of stops reached after their target, in order.
    ///
    /// Stricter than [`StopTiming::is_late`]: a stop with zero slack is
    /// flagged late but arrives on time, so it is not a conflict.
    pub fn conflicts(&self) -> Vec<usize> {
        self.stops
            .iter()
            .enumerate()
            .filter(|(_, t)| t.is_overdue())
            .map(|(i, _)| i)
            .collect()
    }

    /// Whether any stop is reached after its target.
    pub fn has_conflicts(&self) -> bool {
        self.stops.iter().any(StopTiming::is_overdue)
    }

    /// One warning per conflicting stop. `stops` must be the slice the
    /// timeline was computed from.
    pub fn late_warnings(&self, stops: &[Stop]) -> Vec<LateWarning> {
        self.stops
            .iter()
            .zip(stops)
            .enumerate()
            .filter(|(_, (timing, _))| timing.is_overdue())
            .filter_map(|(index, (timing, stop))| {
                let target = stop.target.time()?;
                Some(LateWarning {
                    index,
                    name: stop.name.clone(),
                    target,
                    eta: timing.eta,
                    minutes_late: -timing.gap_minutes.unwrap_or(0),
                })
            })
            .collect()
    }
}

/// Number of legs an itinerary of `stop_count` stops needs.
pub fn expected_legs(stop_count: usize) -> usize {
    stop_count.saturating_sub(1)
}

/// Derive end times, projected arrivals, gaps and late flags for every stop.
///
/// # Arguments
///
/// * `anchor` — "now"; the arrival time of the first stop when it has no target
/// * `stops` — the itinerary in order
/// * `leg_minutes` — travel minutes between consecutive stops (`stops.len() - 1` entries)
///
/// # Errors
///
/// Returns [`PlanError::LengthMismatch`] when the leg count does not match the
/// stop count. No partial timeline is ever produced.
///
/// # Examples
///
/// ```
/// use itinerary_engine::clock::{ClockTime, TargetTime};
/// use itinerary_engine::stop::Stop;
/// use itinerary_engine::timing::compute_timeline;
///
/// let at = |s: &str| TargetTime::At(ClockTime::parse(s).unwrap());
/// let stops = vec![
///     Stop::new("A", at("9:00am"), "Oakland", 30),
///     Stop::new("B", at("9:20am"), "Berkeley", 0),
/// ];
/// let now = ClockTime::parse("8:00am").unwrap();
/// let timeline = compute_timeline(now, &stops, &[15]).unwrap();
/// let b = timeline.get(1).unwrap();
/// assert_eq!(b.eta.to_string(), "9:45am");
/// assert_eq!(b.gap_minutes, Some(-25));
/// assert!(b.is_late);
/// ```
pub fn compute_timeline(anchor: ClockTime, stops: &[Stop], leg_minutes: &[u32]) -> Result<Timeline> {
    let expected = expected_legs(stops.len());
    if leg_minutes.len() != expected {
        return Err(PlanError::LengthMismatch {
            stops: stops.len(),
            expected,
            actual: leg_minutes.len(),
        });
    }

    let mut timings: Vec<StopTiming> = Vec::with_capacity(stops.len());
    for (i, stop) in stops.iter().enumerate() {
        let target = stop.target.time();
        let dwell = i64::from(stop.duration_minutes);

        let eta = match timings.last() {
            None => target.unwrap_or(anchor),
            Some(prev) => prev.effective_end.add_minutes(i64::from(leg_minutes[i - 1])),
        };
        let end_time = target.map(|t| t.add_minutes(dwell));
        let effective_end = end_time.unwrap_or_else(|| eta.add_minutes(dwell));
        let gap_minutes = if i == 0 {
            None
        } else {
            target.map(|t| diff_minutes(t, eta))
        };

        timings.push(StopTiming {
            end_time,
            eta,
            effective_end,
            gap_minutes,
            is_late: gap_minutes.is_some_and(|g| g <= 0),
        });
    }

    let timeline = Timeline { stops: timings };
    debug!(
        stops = stops.len(),
        conflicts = timeline.conflicts().len(),
        "computed itinerary timeline"
    );
    Ok(timeline)
}

// ── Tests ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::TargetTime;

    fn t(s: &str) -> ClockTime {
        ClockTime::parse(s).unwrap()
    }

    fn at(name: &str, time: &str, dwell: u32) -> Stop {
        Stop::new(name, TargetTime::At(t(time)), name, dwell)
    }

    fn open(name: &str, dwell: u32) -> Stop {
        Stop::new(name, TargetTime::Unscheduled, name, dwell)
    }

    fn now() -> ClockTime {
        t("8:00am")
    }

    // ── precondition tests ──────────────────────────────────────────────

    #[test]
    fn test_empty_itinerary() {
        let timeline = compute_timeline(now(), &[], &[]).unwrap();
        assert!(timeline.is_empty());
    }

    #[test]
    fn test_single_stop_needs_no_legs() {
        let timeline = compute_timeline(now(), &[at("A", "9:00am", 30)], &[]).unwrap();
        assert_eq!(timeline.len(), 1);
        assert!(compute_timeline(now(), &[at("A", "9:00am", 30)], &[5]).is_err());
    }

    #[test]
    fn test_too_few_legs_is_mismatch() {
        let stops = [at("A", "9:00am", 0), at("B", "10:00am", 0), at("C", "11:00am", 0)];
        let err = compute_timeline(now(), &stops, &[10]).unwrap_err();
        assert_eq!(
            err,
            PlanError::LengthMismatch {
                stops: 3,
                expected: 2,
                actual: 1
            }
        );
    }

    #[test]
    fn test_too_many_legs_is_mismatch() {
        let stops = [at("A", "9:00am", 0), at("B", "10:00am", 0)];
        let err = compute_timeline(now(), &stops, &[10, 10]).unwrap_err();
        assert!(matches!(err, PlanError::LengthMismatch { .. }));
    }

    // ── chain tests ─────────────────────────────────────────────────────

    #[test]
    fn test_late_scenario() {
        let stops = [at("A", "9:00am", 30), at("B", "9:20am", 0)];
        let timeline = compute_timeline(now(), &stops, &[15]).unwrap();

        let a = timeline.get(0).unwrap();
        assert_eq!(a.end_time, Some(t("9:30am")));
        assert_eq!(a.eta, t("9:00am"));
        assert_eq!(a.gap_minutes, None);
        assert!(!a.is_late);

        let b = timeline.get(1).unwrap();
        assert_eq!(b.eta, t("9:45am"));
        assert_eq!(b.gap_minutes, Some(-25));
        assert!(b.is_late);
        assert_eq!(timeline.conflicts(), vec![1]);
    }

    #[test]
    fn test_slack_is_positive_gap() {
        let stops = [at("A", "9:00am", 30), at("B", "10:00am", 0)];
        let timeline = compute_timeline(now(), &stops, &[15]).unwrap();
        let b = timeline.get(1).unwrap();
        assert_eq!(b.gap_minutes, Some(15));
        assert!(!b.is_late);
    }

    #[test]
    fn test_exact_arrival_counts_as_late() {
        let stops = [at("A", "9:00am", 30), at("B", "9:45am", 0)];
        let timeline = compute_timeline(now(), &stops, &[15]).unwrap();
        assert_eq!(timeline.get(1).unwrap().gap_minutes, Some(0));
        assert!(timeline.get(1).unwrap().is_late);
    }

    #[test]
    fn test_exact_arrival_is_not_a_conflict() {
        let stops = [at("A", "9:00am", 30), at("B", "9:45am", 0)];
        let timeline = compute_timeline(now(), &stops, &[15]).unwrap();
        assert!(!timeline.get(1).unwrap().is_overdue());
        assert!(timeline.conflicts().is_empty());
        assert!(!timeline.has_conflicts());
        assert!(timeline.late_warnings(&stops).is_empty());
    }

    #[test]
    fn test_first_stop_without_target_uses_anchor() {
        let stops = [open("Home", 10), at("B", "9:00am", 0)];
        let timeline = compute_timeline(now(), &stops, &[20]).unwrap();
        assert_eq!(timeline.get(0).unwrap().eta, now());
        assert_eq!(timeline.get(0).unwrap().end_time, None);
        assert_eq!(timeline.get(0).unwrap().effective_end, t("8:10am"));
        assert_eq!(timeline.get(1).unwrap().eta, t("8:30am"));
        assert_eq!(timeline.get(1).unwrap().gap_minutes, Some(30));
    }

    #[test]
    fn test_untimed_stop_feeds_chain_without_gap() {
        let stops = [at("A", "9:00am", 30), open("Gas", 10), at("C", "10:00am", 60)];
        let timeline = compute_timeline(now(), &stops, &[5, 10]).unwrap();

        let gas = timeline.get(1).unwrap();
        assert_eq!(gas.eta, t("9:35am"));
        assert_eq!(gas.gap_minutes, None);
        assert!(!gas.is_late);

        let c = timeline.get(2).unwrap();
        assert_eq!(c.eta, t("9:55am"));
        assert_eq!(c.gap_minutes, Some(5));
        assert_eq!(c.end_time, Some(t("11:00am")));
    }

    #[test]
    fn test_stated_end_resets_chain() {
        // B is late, but C chains from B's stated end, not its projected arrival.
        let stops = [at("A", "9:00am", 60), at("B", "9:30am", 30), at("C", "10:15am", 0)];
        let timeline = compute_timeline(now(), &stops, &[10, 10]).unwrap();
        assert!(timeline.get(1).unwrap().is_late);
        assert_eq!(timeline.get(2).unwrap().eta, t("10:10am"));
        assert!(!timeline.get(2).unwrap().is_late);
    }

    #[test]
    fn test_malformed_target_treated_as_absent() {
        let mut b = open("B", 0);
        b.target = TargetTime::Malformed("9ish".to_string());
        let stops = [at("A", "9:00am", 0), b];
        let timeline = compute_timeline(now(), &stops, &[30]).unwrap();
        assert_eq!(timeline.get(1).unwrap().eta, t("9:30am"));
        assert_eq!(timeline.get(1).unwrap().gap_minutes, None);
    }

    #[test]
    fn test_late_warnings() {
        let stops = [at("A", "9:00am", 30), at("Lunch", "9:20am", 0)];
        let timeline = compute_timeline(now(), &stops, &[15]).unwrap();
        let warnings = timeline.late_warnings(&stops);
        assert_eq!(warnings.len(), 1);
        assert_eq!(warnings[0].index, 1);
        assert_eq!(warnings[0].minutes_late, 25);
        assert_eq!(warnings[0].message(), "You may be late to Lunch");
    }

    #[test]
    fn test_expected_legs() {
        assert_eq!(expected_legs(0), 0);
        assert_eq!(expected_legs(1), 0);
        assert_eq!(expected_legs(4), 3);
    }
}
