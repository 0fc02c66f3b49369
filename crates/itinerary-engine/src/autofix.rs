//! One-pass conflict resolution.
//!
//! Auto-fix adopts the projected arrival of every late stop as its new stated
//! target ("push the schedule out"). It runs the timing engine once, applies
//! all edits, and runs the engine once more so the caller sees the result.
//! Conflicts that only appear because an upstream target moved are reported
//! in that second timeline and left for the next auto-fix or a manual edit.
//!
//! A fixed stop arrives exactly on target. The engine still marks it
//! `is_late` (zero slack), but it is no longer a conflict: only stops reached
//! after their target are moved or warned about, so a second pass over
//! unchanged legs makes no edits.

use serde::Serialize;
use tracing::info;

use crate::clock::{ClockTime, TargetTime};
use crate::error::Result;
use crate::stop::{Stop, StopField};
use crate::store::Itinerary;
use crate::timing::{compute_timeline, Timeline};

/// A proposed change of one stop's stated target time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Fix {
    pub index: usize,
    pub previous: TargetTime,
    pub target: ClockTime,
}

/// Outcome of [`auto_fix`].
#[derive(Debug, Clone, Serialize)]
pub struct AutoFixReport {
    pub applied: Vec<Fix>,
    /// Timeline recomputed after the edits.
    pub timeline: Timeline,
    /// Stops the next pass would move: conflicts that appeared downstream of
    /// this pass's edits.
    pub remaining_conflicts: Vec<usize>,
}

/// Compute the edits auto-fix would make, without touching the stops.
///
/// # Errors
///
/// Propagates [`crate::PlanError::LengthMismatch`] from the timing engine.
pub fn propose_fixes(anchor: ClockTime, stops: &[Stop], leg_minutes: &[u32]) -> Result<Vec<Fix>> {
    let timeline = compute_timeline(anchor, stops, leg_minutes)?;
    Ok(fixes_for(&timeline, stops))
}

/// Apply one round of fixes to `itinerary` and return the recomputed timeline.
///
/// Nothing is mutated when the leg count does not match.
pub fn auto_fix(
    itinerary: &mut Itinerary,
    anchor: ClockTime,
    leg_minutes: &[u32],
) -> Result<AutoFixReport> {
    let fixes = propose_fixes(anchor, itinerary.stops(), leg_minutes)?;
    for fix in &fixes {
        itinerary.set_field(fix.index, StopField::Target(TargetTime::At(fix.target)))?;
    }
    if !fixes.is_empty() {
        info!(fixed = fixes.len(), "auto-fix moved late targets to projected arrivals");
    }

    let timeline = compute_timeline(anchor, itinerary.stops(), leg_minutes)?;
    let remaining_conflicts = fixes_for(&timeline, itinerary.stops())
        .into_iter()
        .map(|fix| fix.index)
        .collect();
    Ok(AutoFixReport {
        applied: fixes,
        timeline,
        remaining_conflicts,
    })
}

fn fixes_for(timeline: &Timeline, stops: &[Stop]) -> Vec<Fix> {
    timeline
        .stops()
        .iter()
        .zip(stops)
        .enumerate()
        .filter(|(_, (timing, _))| timing.is_overdue())
        .map(|(index, (timing, stop))| Fix {
            index,
            previous: stop.target.clone(),
            target: timing.eta,
        })
        .collect()
}

// ── Tests ───────────────────────────────────────────────────────────────────
