//! Plain-text rendering of stops, timelines and routes.

use std::fmt::Write as _;

use itinerary_engine::{LateWarning, Route, Stop, StopTiming, Timeline};

/// "+15 min gap", "no slack" or "overlap 25 min".
pub fn gap_label(gap: Option<i64>) -> String {
    match gap {
        Some(g) if g > 0 => format!("+{g} min gap"),
        Some(0) => "no slack".to_string(),
        Some(g) => format!("overlap {} min", -g),
        None => String::new(),
    }
}

fn time_span(stop: &Stop, timing: Option<&StopTiming>) -> String {
    match timing.and_then(|t| t.end_time) {
        Some(end) => format!("{} - {}", stop.target, end),
        None => stop.target.to_string(),
    }
}

/// The schedule table; derived columns are blank without a timeline.
pub fn schedule_table(stops: &[Stop], timeline: Option<&Timeline>) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "{:>3}  {:<20} {:<18} {:<8} {:<15} {:<8} {}",
        "#", "Stop", "Time", "ETA", "Gap", "Priority", "Location"
    );
    for (i, stop) in stops.iter().enumerate() {
        let timing = timeline.and_then(|t| t.get(i));
        let eta = timing.map(|t| t.eta.to_string()).unwrap_or_else(|| "—".to_string());
        let gap = gap_label(timing.and_then(|t| t.gap_minutes));
        let _ = writeln!(
            out,
            "{:>3}  {:<20} {:<18} {:<8} {:<15} {:<8} {}",
            i + 1,
            stop.name,
            time_span(stop, timing),
            eta,
            gap,
            stop.priority,
            stop.location
        );
        if !stop.note.is_empty() {
            let _ = writeln!(out, "     note: {}", stop.note);
        }
    }
    out
}

pub fn travel_table(route: &Route) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{:<30} {:<30} {}", "From", "To", "Duration");
    for row in route.travel_rows() {
        let _ = writeln!(out, "{:<30} {:<30} {}", row.from, row.to, row.duration);
    }
    let _ = writeln!(out, "Total trip duration: {} min", route.total_minutes());
    out
}

pub fn warnings(list: &[LateWarning]) -> String {
    list.iter()
        .map(|w| {
            format!(
                "warning: {} (target {}, arriving {}, {} min late)\n",
                w.message(),
                w.target,
                w.eta,
                w.minutes_late
            )
        })
        .collect()
}

// ── Tests ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use itinerary_engine::{compute_timeline, ClockTime, TargetTime};

    fn stops() -> Vec<Stop> {
        vec![
            Stop::new("Coffee", TargetTime::parse("9:00am"), "Blue Bottle", 30),
            Stop::new("Lunch", TargetTime::parse("9:20am"), "Tartine", 0),
        ]
    }

    #[test]
    fn test_gap_label() {
        assert_eq!(gap_label(Some(15)), "+15 min gap");
        assert_eq!(gap_label(Some(0)), "no slack");
        assert_eq!(gap_label(Some(-25)), "overlap 25 min");
        assert_eq!(gap_label(None), "");
    }

    #[test]
    fn test_schedule_table_with_timeline() {
        let stops = stops();
        let timeline = compute_timeline(ClockTime::parse("8:00am").unwrap(), &stops, &[15]).unwrap();
        let table = schedule_table(&stops, Some(&timeline));
        assert!(table.contains("9:00am - 9:30am"));
        assert!(table.contains("9:45am"));
        assert!(table.contains("overlap 25 min"));
    }

    #[test]
    fn test_schedule_table_without_timeline() {
        let table = schedule_table(&stops(), None);
        assert!(table.contains("Coffee"));
        assert!(!table.contains("overlap"));
    }

    #[test]
    fn test_warnings_text() {
        let stops = stops();
        let timeline = compute_timeline(ClockTime::parse("8:00am").unwrap(), &stops, &[15]).unwrap();
        let text = warnings(&timeline.late_warnings(&stops));
        assert_eq!(
            text,
            "warning: You may be late to Lunch (target 9:20am, arriving 9:45am, 25 min late)\n"
        );
    }
}
