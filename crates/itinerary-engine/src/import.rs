//! Schedule import from free text.
//!
//! Each line is one candidate event of the form `TIME - NAME at LOCATION`,
//! e.g. `9:30am - Brunch at Tartine, 600 Guerrero St`. Lines that do not
//! match are skipped without error; they are usually headings or chatter
//! around a pasted schedule.

use once_cell::sync::Lazy;
use regex::Regex;
use tracing::debug;

use crate::clock::ClockTime;
use crate::stop::Stop;

/// Dwell assigned to every imported event.
pub const IMPORTED_DURATION_MINUTES: u32 = 60;

static EVENT_LINE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^\s*(\d{1,2}:\d{2}(?:am|pm))\s*-\s*(.+?)\s+at\s+(.+)$")
        .expect("event line pattern is valid")
});

/// Parse one line, or `None` when it is not an event.
pub fn parse_event_line(line: &str) -> Option<Stop> {
    let caps = EVENT_LINE.captures(line.trim_end())?;
    let time = ClockTime::parse(&caps[1]).ok()?;
    Some(Stop::new(
        caps[2].trim(),
        time.into(),
        caps[3].trim(),
        IMPORTED_DURATION_MINUTES,
    ))
}

/// Parse every event line of `text`, in order.
pub fn import_schedule(text: &str) -> Vec<Stop> {
    let mut skipped = 0usize;
    let stops: Vec<Stop> = text
        .lines()
        .filter(|line| !line.trim().is_empty())
        .filter_map(|line| {
            let parsed = parse_event_line(line);
            if parsed.is_none() {
                skipped += 1;
            }
            parsed
        })
        .collect();
    debug!(imported = stops.len(), skipped, "imported schedule text");
    stops
}

// ── Tests ───────────────────────────────────────────────────────────────────
