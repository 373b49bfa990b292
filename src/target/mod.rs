//! Media targets
//!
//! A target is a media-playback handle the coordinator tries to unlock. The
//! coordinator only needs two operations from it: an asynchronous
//! "begin playback" whose completion can fail, and a synchronous pause.

pub mod simulated;

pub use simulated::{ScriptedOutcome, SimulatedTarget};

use crate::error::PlaybackError;

/// Newtype wrapper for target identifiers, used as registry keys.
#[derive(Debug, Clone, Hash, Eq, PartialEq, PartialOrd, Ord)]
pub struct TargetId(pub String);

impl TargetId {
    /// Creates a new `TargetId` from a string.
    #[must_use]
    pub fn new(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    /// Returns the identifier as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for TargetId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for TargetId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for TargetId {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

/// A media element that can be probed.
///
/// `play` must resolve only once the platform has acknowledged that playback
/// actually started; the coordinator pauses the target right after.
#[async_trait::async_trait]
pub trait MediaTarget: Send + Sync {
    /// Stable, unique identifier of this target.
    fn id(&self) -> &TargetId;

    /// Begins playback.
    ///
    /// # Errors
    ///
    /// Returns a [`PlaybackError`] when the platform refuses to start
    /// playback, typically because the calling context was not accepted as
    /// a user gesture.
    async fn play(&self) -> Result<(), PlaybackError>;

    /// Pauses playback.
    fn pause(&self);
}
