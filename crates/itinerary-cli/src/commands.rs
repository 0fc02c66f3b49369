//! Subcommand handlers. Each one loads the session, drives the planner and
//! saves the session again when the itinerary changed.

use std::fs;
use std::io::{self, Read};
use std::path::Path;

use anyhow::{bail, Context, Result};
use chrono::Local;
use itinerary_engine::{
    calendar_url, directions_url, import_schedule, DirectionsConfig, FixedLegs, GoogleDirections,
    LegDurationSource, Planner, SessionState, Snapshot, Stop, StopField, TargetTime,
};
use serde_json::json;
use tracing::{debug, warn};

use crate::config::{to_index, Cli, Command, RouteArgs};
use crate::render;

pub async fn run(cli: Cli) -> Result<()> {
    let state = SessionState::load(&cli.session)
        .with_context(|| format!("failed to load session {}", cli.session.display()))?;
    let due = state.needs_recompute();
    debug!(due, "loaded session");
    let mut planner = Planner::from_session(state, Default::default());
    let session = cli.session.as_path();

    match cli.command {
        Command::Show(args) => show(&mut planner, &args, due, cli.json).await,
        Command::Add {
            location,
            name,
            time,
            duration,
        } => {
            let target = time.as_deref().map(TargetTime::parse).unwrap_or_default();
            planner.edit(|it| {
                it.append(Stop::new(name, target, location, duration));
                Ok(())
            })?;
            save(&planner, session)?;
            print_stops(&planner, cli.json)
        }
        Command::Remove { position } => {
            let index = to_index(position)?;
            let removed = planner
                .edit(|it| it.remove_at(index))
                .with_context(|| format!("cannot remove stop {position}"))?;
            save(&planner, session)?;
            debug!(name = %removed.name, "removed stop");
            print_stops(&planner, cli.json)
        }
        Command::Duplicate { position } => {
            let index = to_index(position)?;
            planner
                .edit(|it| it.duplicate_at(index))
                .with_context(|| format!("cannot duplicate stop {position}"))?;
            save(&planner, session)?;
            print_stops(&planner, cli.json)
        }
        Command::Move { from, to } => {
            let (src, dst) = (to_index(from)?, to_index(to)?);
            planner
                .edit(|it| it.move_to(src, dst))
                .with_context(|| format!("cannot move stop {from} to {to}"))?;
            save(&planner, session)?;
            print_stops(&planner, cli.json)
        }
        Command::Set {
            position,
            field,
            value,
        } => {
            let index = to_index(position)?;
            let edit = StopField::parse(&field, &value)?;
            planner
                .edit(|it| it.set_field(index, edit))
                .with_context(|| format!("cannot edit stop {position}"))?;
            save(&planner, session)?;
            print_stops(&planner, cli.json)
        }
        Command::Clear => {
            planner.edit(|it| {
                it.clear();
                Ok(())
            })?;
            save(&planner, session)?;
            print_stops(&planner, cli.json)
        }
        Command::Import { file } => {
            let text = match file {
                Some(path) => fs::read_to_string(&path)
                    .with_context(|| format!("failed to read {}", path.display()))?,
                None => {
                    let mut buf = String::new();
                    io::stdin()
                        .read_to_string(&mut buf)
                        .context("failed to read schedule from stdin")?;
                    buf
                }
            };
            let imported = import_schedule(&text);
            let count = imported.len();
            planner.edit(|it| {
                imported.into_iter().for_each(|stop| it.append(stop));
                Ok(())
            })?;
            save(&planner, session)?;
            if !cli.json {
                println!("imported {count} stop(s)");
            }
            print_stops(&planner, cli.json)
        }
        Command::Locate { lat, lng } => {
            planner.edit(|it| {
                it.set_origin(format!("{lat},{lng}"));
                Ok(())
            })?;
            save(&planner, session)?;
            print_stops(&planner, cli.json)
        }
        Command::Plan(args) => plan(&mut planner, &args, cli.json).await,
        Command::Fix(args) => {
            fix(&mut planner, &args, cli.json).await?;
            save(&planner, session)
        }
        Command::Calendar { position, date } => {
            let stop = planner.itinerary().get(to_index(position)?)?;
            let date = date.unwrap_or_else(|| Local::now().date_naive());
            let url = calendar_url(stop, date)
                .with_context(|| format!("cannot export stop {position}"))?;
            print_link(&url, cli.json)
        }
        Command::Directions { mode } => {
            let url = directions_url(planner.itinerary().stops(), mode.into())?;
            print_link(&url, cli.json)
        }
    }
}

fn save(planner: &Planner, path: &Path) -> Result<()> {
    planner
        .to_session()
        .save(path)
        .with_context(|| format!("failed to save session {}", path.display()))
}

fn print_json(value: &impl serde::Serialize) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn print_stops(planner: &Planner, json: bool) -> Result<()> {
    let stops = planner.itinerary().stops();
    if json {
        return print_json(&stops);
    }
    if stops.is_empty() {
        println!("no stops");
    } else {
        print!("{}", render::schedule_table(stops, None));
    }
    Ok(())
}

/// Recompute a loaded session when it is due and legs can be had without
/// prompting. A failed recompute only costs the arrival columns.
async fn show(planner: &mut Planner, args: &RouteArgs, due: bool, json: bool) -> Result<()> {
    let timeline = if due && args.has_leg_source() {
        match refresh(planner, args).await {
            Ok(()) => planner.snapshot(args.anchor()).timeline().cloned(),
            Err(e) => {
                warn!("arrival times unavailable: {e:#}");
                None
            }
        }
    } else {
        None
    };

    let stops = planner.itinerary().stops();
    if json {
        return print_json(&json!({ "stops": stops, "timeline": timeline }));
    }
    if stops.is_empty() {
        println!("no stops");
        return Ok(());
    }
    print!("{}", render::schedule_table(stops, timeline.as_ref()));
    if let Some(timeline) = &timeline {
        print!("{}", render::warnings(&timeline.late_warnings(stops)));
    }
    Ok(())
}

fn print_link(url: &str, json: bool) -> Result<()> {
    if json {
        return print_json(&json!({ "url": url }));
    }
    println!("{url}");
    Ok(())
}

// ── routing ─────────────────────────────────────────────────────────────────

fn leg_source(args: &RouteArgs) -> Result<Box<dyn LegDurationSource>> {
    if let Some(minutes) = &args.legs {
        return Ok(Box::new(FixedLegs::new(minutes.clone())));
    }
    let Some(api_key) = &args.api_key else {
        bail!("no travel times available: pass --legs or set ITINERARY_MAPS_API_KEY");
    };
    let mut config = DirectionsConfig::new(api_key.clone());
    config.timeout = args.timeout();
    Ok(Box::new(GoogleDirections::new(config)?))
}

async fn refresh(planner: &mut Planner, args: &RouteArgs) -> Result<()> {
    planner.set_mode(args.mode.into());
    if !planner.needs_refresh() {
        return Ok(());
    }
    let source = leg_source(args)?;
    planner
        .refresh(source.as_ref(), args.timeout())
        .await
        .context("route refresh failed")?;
    Ok(())
}

async fn plan(planner: &mut Planner, args: &RouteArgs, json: bool) -> Result<()> {
    refresh(planner, args).await?;
    let stops = planner.itinerary().stops();
    let snapshot = planner.snapshot(args.anchor());
    let warnings = snapshot
        .timeline()
        .map(|t| t.late_warnings(stops))
        .unwrap_or_default();
    let route = planner.route().map(|r| &r.route);

    if json {
        return print_json(&json!({
            "mode": planner.mode(),
            "stops": stops,
            "snapshot": snapshot,
            "warnings": warnings,
            "route": route,
        }));
    }

    if stops.is_empty() {
        println!("no stops");
        return Ok(());
    }
    print!("{}", render::schedule_table(stops, snapshot.timeline()));
    if let Snapshot::RecomputeRequired = snapshot {
        println!("arrival times unavailable: route needs to be recomputed");
    }
    print!("{}", render::warnings(&warnings));
    if let Some(route) = route {
        println!();
        print!("{}", render::travel_table(route));
        for line in route.transit_summary() {
            println!("{line}");
        }
    }
    Ok(())
}

async fn fix(planner: &mut Planner, args: &RouteArgs, json: bool) -> Result<()> {
    refresh(planner, args).await?;
    let report = planner
        .auto_fix(args.anchor())
        .context("auto-fix failed")?;

    if json {
        return print_json(&report);
    }

    let stops = planner.itinerary().stops();
    if report.applied.is_empty() {
        println!("no conflicts to fix");
    }
    for fix in &report.applied {
        println!(
            "moved {}: {} -> {}",
            stops[fix.index].name, fix.previous, fix.target
        );
    }
    print!("{}", render::schedule_table(stops, Some(&report.timeline)));
    if !report.remaining_conflicts.is_empty() {
        println!(
            "{} stop(s) now conflict downstream; run fix again to push them out",
            report.remaining_conflicts.len()
        );
    }
    Ok(())
}
