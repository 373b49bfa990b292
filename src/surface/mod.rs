//! Interaction surface abstraction
//!
//! The surface is the shared object that emits user-interaction events and
//! accepts listener registrations (a canvas, a window, a scene root). The
//! coordinator receives it as an explicit handle instead of looking it up
//! from any global environment.

pub mod memory;

pub use memory::InMemorySurface;

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::error::SurfaceError;

/// Event kinds the coordinator listens for.
///
/// `TouchEnd` is absent: every qualifying touch release also
/// dispatches a click, so listening to both would double each attempt pass.
pub const QUALIFYING_EVENTS: [EventKind; 3] =
    [EventKind::Click, EventKind::DoubleClick, EventKind::KeyDown];

/// Interaction event kinds known to the surface.
#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventKind {
    /// Pointer click.
    Click,
    /// Pointer double click.
    #[serde(rename = "doubleclick", alias = "dblclick")]
    DoubleClick,
    /// Key press down.
    KeyDown,
    /// Touch release.
    TouchEnd,
    /// Pointer movement.
    PointerMove,
}

impl EventKind {
    /// All known event kinds.
    pub const ALL: [Self; 5] = [
        Self::Click,
        Self::DoubleClick,
        Self::KeyDown,
        Self::TouchEnd,
        Self::PointerMove,
    ];

    /// Returns the wire name of this event kind.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Click => "click",
            Self::DoubleClick => "doubleclick",
            Self::KeyDown => "keydown",
            Self::TouchEnd => "touchend",
            Self::PointerMove => "pointermove",
        }
    }

    /// Whether the platform attributes this kind to a genuine user gesture
    /// for the purpose of unlocking playback.
    #[must_use]
    pub fn is_qualifying(self) -> bool {
        QUALIFYING_EVENTS.contains(&self)
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EventKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "click" => Ok(Self::Click),
            "doubleclick" | "dblclick" => Ok(Self::DoubleClick),
            "keydown" => Ok(Self::KeyDown),
            "touchend" => Ok(Self::TouchEnd),
            "pointermove" => Ok(Self::PointerMove),
            other => Err(format!("unknown event kind '{other}'")),
        }
    }
}

/// A single interaction event delivered to listeners.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InteractionEvent {
    /// What kind of interaction this is.
    pub kind: EventKind,
    /// Sequence number assigned by the dispatching surface.
    pub sequence: u64,
}

impl InteractionEvent {
    /// Creates an event of the given kind with sequence `0`.
    #[must_use]
    pub const fn new(kind: EventKind) -> Self {
        Self { kind, sequence: 0 }
    }
}

/// Registration options for a listener.
///
/// A listener must be removed with the same options it was added with.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct ListenerOptions {
    /// Register for the capture phase instead of the bubble phase.
    pub capture: bool,
}

impl ListenerOptions {
    /// Options for a capture-phase listener.
    #[must_use]
    pub const fn capture() -> Self {
        Self { capture: true }
    }

    /// Options for a bubble-phase listener.
    #[must_use]
    pub const fn bubble() -> Self {
        Self { capture: false }
    }
}

/// Identifier handed out by a surface for each registered listener.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(pub u64);

impl fmt::Display for ListenerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Listener callback invoked synchronously for each dispatched event.
pub type Listener = Arc<dyn Fn(&InteractionEvent) + Send + Sync>;

/// A surface that emits interaction events to registered listeners.
pub trait InteractionSurface: Send + Sync {
    /// Registers `listener` for events of `kind`.
    ///
    /// # Errors
    ///
    /// Returns a [`SurfaceError`] if the surface refuses the registration.
    fn add_listener(
        &self,
        kind: EventKind,
        options: ListenerOptions,
        listener: Listener,
    ) -> Result<ListenerId, SurfaceError>;

    /// Removes a listener previously added with exactly these `kind` and
    /// `options`.
    ///
    /// # Errors
    ///
    /// Returns [`SurfaceError::UnknownListener`] when no listener matches.
    fn remove_listener(
        &self,
        kind: EventKind,
        options: ListenerOptions,
        id: ListenerId,
    ) -> Result<(), SurfaceError>;

    /// Number of listeners currently registered for `kind`.
    fn listener_count(&self, kind: EventKind) -> usize;
}
