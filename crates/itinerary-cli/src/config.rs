//! Command-line arguments and their environment fallbacks.

use std::path::PathBuf;
use std::time::Duration;

use chrono::{Local, NaiveDate};
use clap::{Args, Parser, Subcommand, ValueEnum};
use itinerary_engine::{ClockTime, TravelMode};

#[derive(Debug, Parser)]
#[command(name = "itinerary", version)]
#[command(about = "Plan a day of stops: arrival times, schedule conflicts, calendar and map links")]
pub struct Cli {
    /// Session file holding the itinerary
    #[arg(long, global = true, env = "ITINERARY_SESSION", default_value = "itinerary.json")]
    pub session: PathBuf,

    /// Print machine-readable JSON instead of tables
    #[arg(long, global = true)]
    pub json: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// List the stops in order, with arrival times when travel legs are available
    Show(RouteArgs),
    /// Append a stop
    Add {
        /// Address or "lat,lng"
        #[arg(long)]
        location: String,
        #[arg(long, default_value = "Stop")]
        name: String,
        /// Target arrival time, e.g. 9:30am
        #[arg(long)]
        time: Option<String>,
        /// Minutes spent at the stop
        #[arg(long, default_value_t = 0)]
        duration: u32,
    },
    /// Delete the stop at a 1-based position
    Remove { position: usize },
    /// Insert a copy of a stop right after it
    Duplicate { position: usize },
    /// Move a stop to another 1-based position
    Move { from: usize, to: usize },
    /// Change one field: name, time, location, duration, note, category, priority
    Set {
        position: usize,
        field: String,
        value: String,
    },
    /// Remove every stop
    Clear,
    /// Import "TIME - NAME at LOCATION" lines from a file, or stdin when omitted
    Import { file: Option<PathBuf> },
    /// Use a captured position as the start point
    Locate {
        #[arg(allow_negative_numbers = true)]
        lat: f64,
        #[arg(allow_negative_numbers = true)]
        lng: f64,
    },
    /// Fetch travel legs and show arrival times and conflicts
    Plan(RouteArgs),
    /// Move late stops' targets to their projected arrivals (one pass)
    Fix(RouteArgs),
    /// Print an "add to calendar" link for a stop
    Calendar {
        position: usize,
        /// Calendar date of the itinerary (defaults to today)
        #[arg(long)]
        date: Option<NaiveDate>,
    },
    /// Print a Google Maps directions link for the whole itinerary
    Directions {
        #[arg(long, value_enum, default_value_t = ModeArg::Driving)]
        mode: ModeArg,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ModeArg {
    Driving,
    Walking,
    Bicycling,
    Transit,
}

impl From<ModeArg> for TravelMode {
    fn from(value: ModeArg) -> Self {
        match value {
            ModeArg::Driving => TravelMode::Driving,
            ModeArg::Walking => TravelMode::Walking,
            ModeArg::Bicycling => TravelMode::Bicycling,
            ModeArg::Transit => TravelMode::Transit,
        }
    }
}

/// Where travel legs come from and how the day is anchored.
#[derive(Debug, Clone, Args)]
pub struct RouteArgs {
    #[arg(long, value_enum, default_value_t = ModeArg::Driving)]
    pub mode: ModeArg,

    /// Leg durations in minutes, comma-separated; skips the routing provider
    #[arg(long, value_delimiter = ',')]
    pub legs: Option<Vec<u32>>,

    /// Google Maps API key for the Directions service
    #[arg(long, env = "ITINERARY_MAPS_API_KEY", hide_env_values = true)]
    pub api_key: Option<String>,

    /// Seconds to wait for the routing provider
    #[arg(long, env = "ITINERARY_ROUTE_TIMEOUT_SECS", default_value_t = 10)]
    pub route_timeout_secs: u64,

    /// Current time, used when the first stop has no target (defaults to the local clock)
    #[arg(long, value_parser = parse_clock)]
    pub now: Option<ClockTime>,
}

impl RouteArgs {
    /// Whether leg durations can be obtained without asking the user.
    pub fn has_leg_source(&self) -> bool {
        self.legs.is_some() || self.api_key.is_some()
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.route_timeout_secs)
    }

    pub fn anchor(&self) -> ClockTime {
        self.now
            .unwrap_or_else(|| ClockTime::from_naive(Local::now().time()))
    }
}

fn parse_clock(text: &str) -> Result<ClockTime, String> {
    ClockTime::parse(text).map_err(|e| e.to_string())
}

/// Convert a 1-based position typed by the user into a store index.
pub fn to_index(position: usize) -> anyhow::Result<usize> {
    position
        .checked_sub(1)
        .ok_or_else(|| anyhow::anyhow!("positions start at 1"))
}

// ── Tests ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_definition_is_valid() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_plan_with_manual_legs() {
        let cli = Cli::try_parse_from([
            "itinerary", "--session", "trip.json", "plan", "--legs", "15,20", "--now", "8:00am",
        ])
        .unwrap();
        assert_eq!(cli.session, PathBuf::from("trip.json"));
        match cli.command {
            Command::Plan(args) => {
                assert_eq!(args.legs, Some(vec![15, 20]));
                assert_eq!(args.anchor(), ClockTime::parse("8:00am").unwrap());
                assert_eq!(args.timeout(), Duration::from_secs(10));
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_show_without_route_options() {
        let cli = Cli::try_parse_from(["itinerary", "show"]).unwrap();
        match cli.command {
            Command::Show(args) => {
                assert_eq!(args.legs, None);
                assert_eq!(args.has_leg_source(), args.api_key.is_some());
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_parse_rejects_bad_now() {
        assert!(Cli::try_parse_from(["itinerary", "plan", "--now", "25:00"]).is_err());
    }

    #[test]
    fn test_locate_accepts_negative_coordinates() {
        let cli = Cli::try_parse_from(["itinerary", "locate", "37.77", "-122.41"]).unwrap();
        assert!(matches!(cli.command, Command::Locate { lng, .. } if lng < 0.0));
    }

    #[test]
    fn test_to_index() {
        assert_eq!(to_index(1).unwrap(), 0);
        assert!(to_index(0).is_err());
    }
}
