//! Scripted media target.
//!
//! `SimulatedTarget` stands in for a platform media element. Each `play()`
//! call consumes the next scripted outcome; once the script runs out the
//! default outcome applies. Used by the `run` command and by tests.

use std::collections::VecDeque;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::{MediaTarget, TargetId};
use crate::error::PlaybackError;

/// Outcome of a single scripted `play()` call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScriptedOutcome {
    /// Playback starts.
    Accept,
    /// Playback is refused as not gesture-initiated.
    Reject,
}

/// A media target whose playback results follow a script.
pub struct SimulatedTarget {
    id: TargetId,
    script: Mutex<VecDeque<ScriptedOutcome>>,
    default_outcome: ScriptedOutcome,
    latency: Duration,
    plays: AtomicU64,
    pauses: AtomicU64,
    playing: AtomicBool,
}

impl SimulatedTarget {
    /// Creates a target that applies `script` in order, then `default_outcome`.
    #[must_use]
    pub fn new(
        id: impl Into<TargetId>,
        script: impl IntoIterator<Item = ScriptedOutcome>,
        default_outcome: ScriptedOutcome,
    ) -> Self {
        Self {
            id: id.into(),
            script: Mutex::new(script.into_iter().collect()),
            default_outcome,
            latency: Duration::ZERO,
            plays: AtomicU64::new(0),
            pauses: AtomicU64::new(0),
            playing: AtomicBool::new(false),
        }
    }

    /// Creates a target that accepts every `play()` call.
    #[must_use]
    pub fn permissive(id: impl Into<TargetId>) -> Self {
        Self::new(id, [], ScriptedOutcome::Accept)
    }

    /// Sets how long `play()` takes to settle.
    #[must_use]
    pub const fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    /// Number of `play()` calls made so far.
    #[must_use]
    pub fn play_count(&self) -> u64 {
        self.plays.load(Ordering::SeqCst)
    }

    /// Number of `pause()` calls made so far.
    #[must_use]
    pub fn pause_count(&self) -> u64 {
        self.pauses.load(Ordering::SeqCst)
    }

    /// Whether the target is currently playing.
    #[must_use]
    pub fn is_playing(&self) -> bool {
        self.playing.load(Ordering::SeqCst)
    }

    fn next_outcome(&self) -> ScriptedOutcome {
        self.script
            .lock()
            .map_or(self.default_outcome, |mut script| {
                script.pop_front().unwrap_or(self.default_outcome)
            })
    }
}

#[async_trait::async_trait]
impl MediaTarget for SimulatedTarget {
    fn id(&self) -> &TargetId {
        &self.id
    }

    async fn play(&self) -> Result<(), PlaybackError> {
        self.plays.fetch_add(1, Ordering::SeqCst);
        let outcome = self.next_outcome();

        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }

        match outcome {
            ScriptedOutcome::Accept => {
                self.playing.store(true, Ordering::SeqCst);
                Ok(())
            }
            ScriptedOutcome::Reject => Err(PlaybackError::NotAllowed(
                "play() was not initiated by a user gesture".to_string(),
            )),
        }
    }

    fn pause(&self) {
        self.pauses.fetch_add(1, Ordering::SeqCst);
        self.playing.store(false, Ordering::SeqCst);
    }
}

impl std::fmt::Debug for SimulatedTarget {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SimulatedTarget")
            .field("id", &self.id)
            .field("plays", &self.play_count())
            .field("pauses", &self.pause_count())
            .finish_non_exhaustive()
    }
}
