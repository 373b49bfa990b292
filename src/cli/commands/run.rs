//! `run` command.

use std::sync::Arc;

use chrono::Utc;
use tracing::warn;

use crate::cli::args::{OutputFormat, RunArgs};
use crate::config::{LoadResult, ScenarioLimits, load_scenario};
use crate::error::MediaUnlockError;
use crate::observability::{Event, EventEmitter, init_metrics};
use crate::simulation::{ScenarioReport, replay};

/// Replays the scenario named by `args` and prints a report.
///
/// # Errors
///
/// Returns an error if the scenario cannot be loaded, the events file or
/// metrics endpoint cannot be opened, or `--require-all` is set and some
/// target stayed locked.
pub async fn run(args: &RunArgs) -> Result<(), MediaUnlockError> {
    let LoadResult { scenario, warnings } = load_scenario(&args.scenario, &ScenarioLimits::default())?;
    for issue in &warnings {
        warn!(path = %issue.path, "{}", issue.message);
    }

    if let Some(port) = args.metrics_port {
        init_metrics(Some(port))?;
    }

    let emitter = Arc::new(match &args.events_file {
        Some(path) => EventEmitter::from_file(path)?,
        None => EventEmitter::noop(),
    });

    let report = replay(&scenario, Arc::clone(&emitter)).await;
    emitter.emit(Event::ScenarioFinished {
        timestamp: Utc::now(),
        summary: report.summary.clone(),
    });

    match args.format {
        OutputFormat::Human => print!("{}", render_human(&report)),
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&report)?),
    }

    if args.require_all && !report.summary.all_unlocked {
        return Err(MediaUnlockError::Incomplete {
            pending: report.pending(),
        });
    }
    Ok(())
}

fn render_human(report: &ScenarioReport) -> String {
    use std::fmt::Write;

    let mut out = String::new();
    let _ = writeln!(out, "scenario: {}", report.scenario);
    let width = report.targets.iter().map(|t| t.id.len()).max().unwrap_or(0);
    for target in &report.targets {
        let status = if target.unlocked { "unlocked" } else { "locked" };
        let _ = writeln!(
            out,
            "  {:<width$}  {status:<8}  plays={} pauses={}",
            target.id, target.plays, target.pauses
        );
    }
    let listeners = if report.listeners_detached { "detached" } else { "attached" };
    let _ = writeln!(out, "listeners: {listeners}");
    let _ = writeln!(out, "{}", report.summary);
    out
}
