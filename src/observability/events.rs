//! Structured event stream for the unlock coordinator.
//!
//! Discrete, typed events emitted as the coordinator attaches listeners,
//! probes targets and tears down. Events are serialized as newline-delimited
//! JSON (JSONL) with a monotonically increasing sequence number.

use std::io::{BufWriter, Write};
use std::path::Path;
use std::sync::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};

use chrono::{DateTime, Utc};
use serde::Serialize;

// ---------------------------------------------------------------------------
// Supporting types
// ---------------------------------------------------------------------------

/// Summary statistics emitted when a scenario run finishes.
#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    /// Number of registered targets.
    pub targets: usize,
    /// Number of targets unlocked by the end of the run.
    pub unlocked: usize,
    /// Interaction events dispatched to the surface.
    pub events_dispatched: u64,
    /// Listener invocations the surface performed.
    pub listener_invocations: u64,
    /// Whether every target unlocked.
    pub all_unlocked: bool,
    /// Run duration in seconds.
    pub elapsed_secs: f64,
}

impl std::fmt::Display for RunSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "unlocked={}/{} events={} invocations={} elapsed={:.3}s",
            self.unlocked,
            self.targets,
            self.events_dispatched,
            self.listener_invocations,
            self.elapsed_secs,
        )
    }
}

// ---------------------------------------------------------------------------
// Event variants
// ---------------------------------------------------------------------------

/// A discrete event emitted during coordinator operation.
///
/// Each variant is tagged with `"type"` when serialized to JSON.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type")]
pub enum Event {
    /// Listeners attached and the eager attempt is about to run.
    CoordinatorStarted {
        /// When the coordinator started.
        timestamp: DateTime<Utc>,
        /// Number of registered targets.
        targets: usize,
        /// Number of listeners attached to the surface.
        listeners: usize,
    },

    /// An attempt pass began.
    AttemptStarted {
        /// When the pass began.
        timestamp: DateTime<Utc>,
        /// What triggered the pass (`"eager"` or an event kind).
        trigger: String,
        /// Targets still locked at the start of the pass.
        pending: usize,
    },

    /// A target was skipped because it is already unlocked.
    RedundantAttempt {
        /// When the skip happened.
        timestamp: DateTime<Utc>,
        /// Skipped target.
        target_id: String,
        /// Trigger of the pass.
        trigger: String,
    },

    /// A probe's play call succeeded.
    ProbeSucceeded {
        /// When the play call settled.
        timestamp: DateTime<Utc>,
        /// Probed target.
        target_id: String,
        /// Trigger of the pass that issued the probe.
        trigger: String,
        /// `true` if another probe had already unlocked the target.
        duplicate: bool,
    },

    /// A probe's play call was refused.
    ProbeFailed {
        /// When the play call settled.
        timestamp: DateTime<Utc>,
        /// Probed target.
        target_id: String,
        /// Trigger of the pass that issued the probe.
        trigger: String,
        /// Platform error message.
        error: String,
    },

    /// Every target is unlocked.
    AllUnlocked {
        /// When the last target unlocked.
        timestamp: DateTime<Utc>,
        /// Number of targets.
        targets: usize,
    },

    /// A completion signal was rejected, failing the aggregate.
    AggregateFailed {
        /// When the rejection happened.
        timestamp: DateTime<Utc>,
        /// Rejected target.
        target_id: String,
        /// Rejection reason.
        reason: String,
    },

    /// Listeners were removed from the surface.
    ListenersDetached {
        /// When teardown ran.
        timestamp: DateTime<Utc>,
        /// Number of listeners removed.
        removed: usize,
    },

    /// A scenario run finished.
    ScenarioFinished {
        /// When the run finished.
        timestamp: DateTime<Utc>,
        /// Run summary statistics.
        summary: RunSummary,
    },
}

#[derive(Serialize)]
struct EventEnvelope {
    /// Zero-based, monotonically increasing sequence counter.
    sequence: u64,
    /// The wrapped event (flattened into the same JSON object).
    #[serde(flatten)]
    event: Event,
}

// ---------------------------------------------------------------------------
// Emitter
// ---------------------------------------------------------------------------

/// Thread-safe, buffered JSONL event writer.
///
/// Serialization or I/O failures are dropped; observability must never
/// interfere with unlocking.
pub struct EventEmitter {
    writer: Mutex<BufWriter<Box<dyn Write + Send>>>,
    sequence: AtomicU64,
}

// Box<dyn Write> is not Debug
impl std::fmt::Debug for EventEmitter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventEmitter")
            .field("sequence", &self.sequence.load(Ordering::Relaxed))
            .finish_non_exhaustive()
    }
}

impl EventEmitter {
    /// Creates an emitter that writes to the given writer.
    #[must_use]
    pub fn new(writer: Box<dyn Write + Send>) -> Self {
        Self {
            writer: Mutex::new(BufWriter::new(writer)),
            sequence: AtomicU64::new(0),
        }
    }

    /// Creates an emitter that writes to stderr.
    #[must_use]
    pub fn stderr() -> Self {
        Self::new(Box::new(std::io::stderr()))
    }

    /// Creates an emitter that silently discards all events.
    #[must_use]
    pub fn noop() -> Self {
        Self::new(Box::new(std::io::sink()))
    }

    /// Creates an emitter that writes to a file at `path`.
    ///
    /// # Errors
    ///
    /// Returns an I/O error if the file cannot be created or opened.
    pub fn from_file(path: &Path) -> std::io::Result<Self> {
        let file = std::fs::File::create(path)?;
        Ok(Self::new(Box::new(file)))
    }

    /// Emits an event as a single JSONL line.
    pub fn emit(&self, event: Event) {
        let seq = self.sequence.fetch_add(1, Ordering::SeqCst);
        let envelope = EventEnvelope {
            sequence: seq,
            event,
        };

        if let Ok(mut w) = self.writer.lock() {
            if let Ok(line) = serde_json::to_string(&envelope) {
                let _ = writeln!(w, "{line}");
                let _ = w.flush();
            }
        }
    }

    /// Returns the number of events emitted so far.
    #[must_use]
    pub fn event_count(&self) -> u64 {
        self.sequence.load(Ordering::Relaxed)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
