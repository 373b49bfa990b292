//! `mediaunlock` - gesture-gated media unlock coordinator
//!
//! Platforms that block audible playback unless it starts from a user
//! gesture usually remember a media element once one gesture-attributed
//! `play()` has succeeded. This library tracks a fixed set of media targets,
//! probes each still-locked target (play, then pause) on every qualifying
//! interaction event, exposes per-target and aggregate completion signals,
//! and removes its own listeners once every target is unlocked.
//!
//! ```ignore
//! let coordinator = UnlockCoordinator::builder(surface)
//!     .targets(targets)
//!     .build();
//! coordinator.start();
//! coordinator.signal(&TargetId::new("intro-video")).unwrap().wait().await?;
//! ```

pub mod cli;
pub mod config;
pub mod error;
pub mod observability;
pub mod simulation;
pub mod surface;
pub mod target;
pub mod unlock;

pub use surface::{EventKind, InMemorySurface, InteractionSurface, QUALIFYING_EVENTS};
pub use target::{MediaTarget, TargetId};
pub use unlock::{CompletionSignal, UnlockCoordinator};
