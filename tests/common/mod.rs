//! Shared integration-test harness: gated media targets whose `play()`
//! settles only when the test releases it, coordinator setup helpers, and a
//! wrapper for running the `mediaunlock` binary.

#![allow(dead_code)]

use std::collections::VecDeque;
use std::io::Write;
use std::process::Output;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use mediaunlock::error::PlaybackError;
use mediaunlock::target::{MediaTarget, SimulatedTarget, TargetId};
use mediaunlock::{InMemorySurface, UnlockCoordinator};
use tokio::sync::oneshot;

/// Default timeout for waiting on probes in tests.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);

type Gate = oneshot::Sender<Result<(), PlaybackError>>;

/// A media target whose `play()` calls stay pending until released.
pub struct GatedTarget {
    id: TargetId,
    gates: Mutex<VecDeque<Gate>>,
    plays: AtomicU64,
    pauses: AtomicU64,
}

impl GatedTarget {
    pub fn new(id: &str) -> Arc<Self> {
        Arc::new(Self {
            id: TargetId::new(id),
            gates: Mutex::new(VecDeque::new()),
            plays: AtomicU64::new(0),
            pauses: AtomicU64::new(0),
        })
    }

    pub fn play_count(&self) -> u64 {
        self.plays.load(Ordering::SeqCst)
    }

    pub fn pause_count(&self) -> u64 {
        self.pauses.load(Ordering::SeqCst)
    }

    /// Settles the oldest pending `play()` call with `outcome`.
    #[allow(clippy::missing_panics_doc)]
    pub fn release_next(&self, outcome: Result<(), PlaybackError>) {
        let gate = self
            .gates
            .lock()
            .unwrap()
            .pop_front()
            .expect("no pending play() to release");
        gate.send(outcome).expect("probe dropped its gate");
    }

    /// Waits until at least `n` `play()` calls have been made.
    #[allow(clippy::missing_panics_doc)]
    pub async fn wait_for_plays(&self, n: u64) {
        tokio::time::timeout(DEFAULT_TIMEOUT, async {
            while self.play_count() < n {
                tokio::task::yield_now().await;
            }
        })
        .await
        .unwrap_or_else(|_| panic!("timed out waiting for {n} plays on {}", self.id));
    }
}

#[async_trait::async_trait]
impl MediaTarget for GatedTarget {
    fn id(&self) -> &TargetId {
        &self.id
    }

    async fn play(&self) -> Result<(), PlaybackError> {
        let (tx, rx) = oneshot::channel();
        self.gates.lock().unwrap().push_back(tx);
        self.plays.fetch_add(1, Ordering::SeqCst);
        rx.await
            .unwrap_or_else(|_| Err(PlaybackError::Aborted("gate dropped".to_string())))
    }

    fn pause(&self) {
        self.pauses.fetch_add(1, Ordering::SeqCst);
    }
}

/// Rejection used by gated targets to simulate a non-gesture context.
pub fn not_allowed() -> Result<(), PlaybackError> {
    Err(PlaybackError::NotAllowed("no user gesture".to_string()))
}

/// Builds a coordinator over `targets` bound to a fresh in-memory surface.
pub fn coordinator_with(
    targets: Vec<Arc<dyn MediaTarget>>,
) -> (Arc<InMemorySurface>, UnlockCoordinator) {
    let surface = Arc::new(InMemorySurface::new());
    let coordinator = UnlockCoordinator::builder(surface.clone())
        .targets(targets)
        .build();
    (surface, coordinator)
}

/// Shorthand for a scripted simulated target.
pub fn scripted(
    id: &str,
    script: &[mediaunlock::target::ScriptedOutcome],
) -> Arc<SimulatedTarget> {
    Arc::new(SimulatedTarget::new(
        id,
        script.iter().copied(),
        mediaunlock::target::ScriptedOutcome::Accept,
    ))
}

/// Waits for every in-flight probe, failing the test on timeout.
#[allow(clippy::missing_panics_doc)]
pub async fn settle(coordinator: &UnlockCoordinator) {
    tokio::time::timeout(DEFAULT_TIMEOUT, coordinator.quiesce())
        .await
        .expect("probes did not settle");
}

/// Writes `contents` to a temporary scenario file.
#[allow(clippy::missing_panics_doc)]
pub fn scenario_file(contents: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::Builder::new()
        .suffix(".yaml")
        .tempfile()
        .expect("create scenario file");
    file.write_all(contents.as_bytes()).expect("write scenario");
    file
}

/// Runs the `mediaunlock` binary with `args` and captures its output.
#[allow(clippy::missing_panics_doc)]
pub fn run_cli(args: &[&str]) -> Output {
    std::process::Command::new(env!("CARGO_BIN_EXE_mediaunlock"))
        .args(args)
        .env_remove("MEDIAUNLOCK_LOG_LEVEL")
        .output()
        .expect("failed to run mediaunlock")
}
