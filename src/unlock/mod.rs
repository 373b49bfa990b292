//! Unlock coordination
//!
//! Tracks a fixed set of media targets and tries to satisfy the platform's
//! user-gesture requirement for each of them on every qualifying interaction.
//!
//! # Architecture
//!
//! - [`Registry`]: per-target unlock flag and completion signal, plus the
//!   aggregate signal
//! - [`UnlockCoordinator`]: attempt engine and orchestration
//! - [`ListenerLifecycle`]: attach/detach bookkeeping on the surface
//! - [`CompletionSignal`]: one-shot, awaitable settle-once signal

pub mod coordinator;
pub mod lifecycle;
pub mod registry;
pub mod signal;

pub use coordinator::{
    AttemptPass, CoordinatorBuilder, ProbeOutcome, Trigger, UnlockCoordinator,
};
pub use lifecycle::{Attachment, LifecycleState, ListenerLifecycle};
pub use registry::{MarkOutcome, Registry, RejectOutcome};
pub use signal::{CompletionSignal, SignalState};
