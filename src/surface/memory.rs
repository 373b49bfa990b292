//! In-process interaction surface.
//!
//! Keeps listeners per event kind and invokes them synchronously from
//! [`InMemorySurface::dispatch`], capture-phase listeners first. Listener
//! lists are snapshotted before invocation so a listener may add or remove
//! registrations while it runs.

use std::sync::atomic::{AtomicU64, Ordering};

use dashmap::DashMap;
use tracing::trace;

use super::{EventKind, InteractionEvent, InteractionSurface, Listener, ListenerId, ListenerOptions};
use crate::error::SurfaceError;

#[derive(Clone)]
struct Registration {
    id: ListenerId,
    options: ListenerOptions,
    listener: Listener,
}

/// Interaction surface backed by in-memory listener tables.
#[derive(Default)]
pub struct InMemorySurface {
    listeners: DashMap<EventKind, Vec<Registration>>,
    invocations: DashMap<EventKind, AtomicU64>,
    next_listener: AtomicU64,
    next_sequence: AtomicU64,
}

impl InMemorySurface {
    /// Creates an empty surface.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Dispatches an event of `kind` to every matching listener.
    ///
    /// Returns the number of listeners invoked.
    pub fn dispatch(&self, kind: EventKind) -> usize {
        let event = InteractionEvent {
            kind,
            sequence: self.next_sequence.fetch_add(1, Ordering::SeqCst),
        };

        let mut snapshot = self
            .listeners
            .get(&kind)
            .map(|regs| regs.value().clone())
            .unwrap_or_default();
        // Stable sort keeps registration order within each phase.
        snapshot.sort_by_key(|reg| !reg.options.capture);

        trace!(event_kind = %kind, sequence = event.sequence, listeners = snapshot.len(), "dispatching");

        for reg in &snapshot {
            (reg.listener)(&event);
        }

        let invoked = snapshot.len();
        self.invocations
            .entry(kind)
            .or_insert_with(|| AtomicU64::new(0))
            .fetch_add(u64::try_from(invoked).unwrap_or(u64::MAX), Ordering::SeqCst);
        invoked
    }

    /// Total listener invocations performed for `kind`.
    #[must_use]
    pub fn invocation_count(&self, kind: EventKind) -> u64 {
        self.invocations
            .get(&kind)
            .map_or(0, |v| v.load(Ordering::SeqCst))
    }

    /// Total listeners registered across all kinds.
    #[must_use]
    pub fn total_listeners(&self) -> usize {
        self.listeners.iter().map(|entry| entry.value().len()).sum()
    }
}

impl InteractionSurface for InMemorySurface {
    fn add_listener(
        &self,
        kind: EventKind,
        options: ListenerOptions,
        listener: Listener,
    ) -> Result<ListenerId, SurfaceError> {
        let id = ListenerId(self.next_listener.fetch_add(1, Ordering::SeqCst));
        self.listeners.entry(kind).or_default().push(Registration {
            id,
            options,
            listener,
        });
        Ok(id)
    }

    fn remove_listener(
        &self,
        kind: EventKind,
        options: ListenerOptions,
        id: ListenerId,
    ) -> Result<(), SurfaceError> {
        let unknown = || SurfaceError::UnknownListener {
            kind: kind.to_string(),
            id: id.0,
        };

        let mut regs = self.listeners.get_mut(&kind).ok_or_else(unknown)?;
        let position = regs
            .iter()
            .position(|reg| reg.id == id && reg.options == options)
            .ok_or_else(unknown)?;
        regs.remove(position);
        Ok(())
    }

    fn listener_count(&self, kind: EventKind) -> usize {
        self.listeners.get(&kind).map_or(0, |regs| regs.len())
    }
}

impl std::fmt::Debug for InMemorySurface {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InMemorySurface")
            .field("listeners", &self.total_listeners())
            .finish_non_exhaustive()
    }
}
