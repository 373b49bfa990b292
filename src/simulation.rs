//! Scenario replay.
//!
//! Builds simulated targets and an in-memory surface from a [`Scenario`],
//! starts a coordinator over them, dispatches the scripted events and
//! reports where every target ended up.

use std::sync::Arc;
use std::time::Instant;

use serde::Serialize;
use tracing::{debug, info};

use crate::config::Scenario;
use crate::observability::events::{EventEmitter, RunSummary};
use crate::surface::InMemorySurface;
use crate::target::{MediaTarget, SimulatedTarget};
use crate::unlock::{LifecycleState, UnlockCoordinator};

/// Final state of one target after a replay.
#[derive(Debug, Clone, Serialize)]
pub struct TargetReport {
    /// Target identifier.
    pub id: String,
    /// Whether the target unlocked.
    pub unlocked: bool,
    /// Number of `play()` calls the target received.
    pub plays: u64,
    /// Number of `pause()` calls the target received.
    pub pauses: u64,
}

/// Outcome of a scenario replay.
#[derive(Debug, Clone, Serialize)]
pub struct ScenarioReport {
    /// Scenario name.
    pub scenario: String,
    /// Per-target results, in registration order.
    pub targets: Vec<TargetReport>,
    /// Whether the listeners were detached by the end of the run.
    pub listeners_detached: bool,
    /// Aggregate statistics.
    pub summary: RunSummary,
}

impl ScenarioReport {
    /// Identifiers of targets that stayed locked.
    #[must_use]
    pub fn pending(&self) -> Vec<String> {
        self.targets
            .iter()
            .filter(|t| !t.unlocked)
            .map(|t| t.id.clone())
            .collect()
    }
}

/// Replays `scenario` and waits for every probe to settle.
pub async fn replay(scenario: &Scenario, emitter: Arc<EventEmitter>) -> ScenarioReport {
    let started = Instant::now();

    let targets: Vec<Arc<SimulatedTarget>> = scenario
        .targets
        .iter()
        .map(|spec| {
            Arc::new(
                SimulatedTarget::new(spec.id.clone(), spec.outcomes.iter().copied(), spec.default)
                    .with_latency(spec.latency),
            )
        })
        .collect();

    let surface = Arc::new(InMemorySurface::new());
    let coordinator = UnlockCoordinator::builder(surface.clone())
        .targets(targets.iter().map(|t| Arc::clone(t) as Arc<dyn MediaTarget>))
        .emitter(emitter)
        .build();

    info!(scenario = %scenario.name, targets = targets.len(), events = scenario.events.len(), "replaying scenario");
    drop(coordinator.start());

    let mut dispatched = 0_u64;
    for kind in &scenario.events {
        if !scenario.event_interval.is_zero() {
            tokio::time::sleep(scenario.event_interval).await;
        }
        let invoked = surface.dispatch(*kind);
        dispatched += 1;
        debug!(event_kind = %kind, invoked, "dispatched interaction event");
    }

    coordinator.quiesce().await;

    let reports: Vec<TargetReport> = targets
        .iter()
        .map(|t| TargetReport {
            id: t.id().to_string(),
            unlocked: coordinator.is_unlocked(t.id()).unwrap_or(false),
            plays: t.play_count(),
            pauses: t.pause_count(),
        })
        .collect();

    let invocations = scenario
        .events
        .iter()
        .copied()
        .collect::<std::collections::HashSet<_>>()
        .into_iter()
        .map(|kind| surface.invocation_count(kind))
        .sum();

    ScenarioReport {
        scenario: scenario.name.clone(),
        listeners_detached: coordinator.lifecycle_state() == LifecycleState::Detached,
        summary: RunSummary {
            targets: reports.len(),
            unlocked: reports.iter().filter(|r| r.unlocked).count(),
            events_dispatched: dispatched,
            listener_invocations: invocations,
            all_unlocked: coordinator.all_unlocked(),
            elapsed_secs: started.elapsed().as_secs_f64(),
        },
        targets: reports,
    }
}
