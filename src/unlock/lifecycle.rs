//! Listener lifecycle.
//!
//! Two states: `Listening` (initial) and `Detached` (terminal). Every
//! attachment is recorded with the exact options it was registered with so
//! teardown removes each listener with matching options.

use tracing::{debug, warn};

use crate::surface::{EventKind, InteractionSurface, Listener, ListenerId, ListenerOptions};

/// Lifecycle state of the coordinator's listeners.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleState {
    /// Listeners may be attached and attempts fire on qualifying events.
    Listening,
    /// Listeners have been removed; terminal.
    Detached,
}

/// A listener registration made on the surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Attachment {
    /// Event kind the listener was added for.
    pub kind: EventKind,
    /// Identifier returned by the surface.
    pub id: ListenerId,
    /// Options the listener was added with.
    pub options: ListenerOptions,
}

/// Tracks listener attachments and the listening/detached state.
#[derive(Debug)]
pub struct ListenerLifecycle {
    state: LifecycleState,
    attachments: Vec<Attachment>,
}

impl Default for ListenerLifecycle {
    fn default() -> Self {
        Self::new()
    }
}

impl ListenerLifecycle {
    /// Creates a lifecycle in the `Listening` state with no attachments.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            state: LifecycleState::Listening,
            attachments: Vec::new(),
        }
    }

    /// Current state.
    #[must_use]
    pub const fn state(&self) -> LifecycleState {
        self.state
    }

    /// Attachments currently held.
    #[must_use]
    pub fn attachments(&self) -> &[Attachment] {
        &self.attachments
    }

    /// Registers `listener` for every kind in `kinds`.
    ///
    /// Returns the number of listeners attached. Does nothing once detached.
    /// Registrations the surface refuses are logged and skipped.
    pub fn attach(
        &mut self,
        surface: &dyn InteractionSurface,
        kinds: &[EventKind],
        options: ListenerOptions,
        listener: &Listener,
    ) -> usize {
        if self.state == LifecycleState::Detached {
            debug!("lifecycle already detached, not attaching listeners");
            return 0;
        }

        let before = self.attachments.len();
        for &kind in kinds {
            match surface.add_listener(kind, options, listener.clone()) {
                Ok(id) => {
                    debug!(event_kind = %kind, listener_id = %id, capture = options.capture, "attached unlock listener");
                    self.attachments.push(Attachment { kind, id, options });
                }
                Err(e) => {
                    warn!(event_kind = %kind, error = %e, "failed to attach unlock listener");
                }
            }
        }
        self.attachments.len() - before
    }

    /// Removes every recorded attachment and enters `Detached`.
    ///
    /// Returns the number of listeners removed, or `None` if the lifecycle
    /// was already detached.
    pub fn detach(&mut self, surface: &dyn InteractionSurface) -> Option<usize> {
        if self.state == LifecycleState::Detached {
            return None;
        }
        self.state = LifecycleState::Detached;

        let mut removed = 0;
        for attachment in self.attachments.drain(..) {
            match surface.remove_listener(attachment.kind, attachment.options, attachment.id) {
                Ok(()) => removed += 1,
                Err(e) => {
                    warn!(
                        event_kind = %attachment.kind,
                        listener_id = %attachment.id,
                        error = %e,
                        "failed to remove unlock listener"
                    );
                }
            }
        }
        Some(removed)
    }
}
