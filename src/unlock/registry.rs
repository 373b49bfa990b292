//! Target registry.
//!
//! Built once from the discovered target set and never grown or shrunk.
//! Each entry pairs a monotonic unlock flag with a completion signal; the
//! registry also owns the aggregate signal that settles once every entry
//! has resolved.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use indexmap::IndexMap;
use indexmap::map::Entry as MapEntry;
use tracing::warn;

use super::signal::{CompletionSignal, SignalHandle, signal};
use crate::target::{MediaTarget, TargetId};

struct Entry {
    target: Arc<dyn MediaTarget>,
    unlocked: AtomicBool,
    handle: SignalHandle,
    signal: CompletionSignal,
}

/// Result of recording a successful probe for a target.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MarkOutcome {
    /// This call flipped the target to unlocked.
    Unlocked {
        /// Whether this was the last pending target.
        all_settled: bool,
    },
    /// The target had already been unlocked by an earlier probe.
    AlreadyUnlocked,
    /// The identifier is not in the registry.
    Unknown,
}

/// Result of rejecting a target's completion signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RejectOutcome {
    /// The target's signal was rejected.
    Rejected {
        /// Whether this rejection failed the aggregate signal.
        aggregate_failed: bool,
    },
    /// The target's signal had already settled.
    AlreadySettled,
    /// The identifier is not in the registry.
    Unknown,
}

/// Ordered mapping from target id to unlock status and completion signal.
pub struct Registry {
    entries: IndexMap<TargetId, Entry>,
    pending: AtomicUsize,
    aggregate: SignalHandle,
    aggregate_signal: CompletionSignal,
}

impl Registry {
    /// Builds the registry from the discovered targets, in the given order.
    ///
    /// Every target starts locked with a pending signal. When two targets
    /// share an identifier the first one is kept. An empty set produces an
    /// already-resolved aggregate signal.
    #[must_use]
    pub fn initialize(targets: impl IntoIterator<Item = Arc<dyn MediaTarget>>) -> Self {
        let mut entries = IndexMap::new();
        for target in targets {
            match entries.entry(target.id().clone()) {
                MapEntry::Occupied(existing) => {
                    warn!(target_id = %existing.key(), "duplicate target id, keeping the first registration");
                }
                MapEntry::Vacant(slot) => {
                    let (handle, signal) = signal();
                    slot.insert(Entry {
                        target,
                        unlocked: AtomicBool::new(false),
                        handle,
                        signal,
                    });
                }
            }
        }

        let (aggregate, aggregate_signal) = signal();
        if entries.is_empty() {
            aggregate.resolve();
        }

        Self {
            pending: AtomicUsize::new(entries.len()),
            entries,
            aggregate,
            aggregate_signal,
        }
    }

    /// Number of registered targets.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the registry has no targets.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Target identifiers in registry order.
    pub fn ids(&self) -> impl Iterator<Item = &TargetId> {
        self.entries.keys()
    }

    /// Whether `id` is registered.
    #[must_use]
    pub fn contains(&self, id: &TargetId) -> bool {
        self.entries.contains_key(id)
    }

    /// Unlock status of `id`, or `None` if it is not registered.
    #[must_use]
    pub fn is_unlocked(&self, id: &TargetId) -> Option<bool> {
        self.entries
            .get(id)
            .map(|entry| entry.unlocked.load(Ordering::SeqCst))
    }

    /// Snapshot of every target's status, in registry order.
    #[must_use]
    pub fn statuses(&self) -> Vec<(TargetId, bool)> {
        self.entries
            .iter()
            .map(|(id, entry)| (id.clone(), entry.unlocked.load(Ordering::SeqCst)))
            .collect()
    }

    /// Identifiers of targets that are still locked.
    #[must_use]
    pub fn pending_ids(&self) -> Vec<TargetId> {
        self.entries
            .iter()
            .filter(|(_, entry)| !entry.unlocked.load(Ordering::SeqCst))
            .map(|(id, _)| id.clone())
            .collect()
    }

    /// Number of targets that are still locked.
    #[must_use]
    pub fn pending_count(&self) -> usize {
        self.pending.load(Ordering::SeqCst)
    }

    /// Completion signal for `id`.
    #[must_use]
    pub fn signal(&self, id: &TargetId) -> Option<CompletionSignal> {
        self.entries.get(id).map(|entry| entry.signal.clone())
    }

    /// Signal that settles once every target's signal has resolved.
    #[must_use]
    pub fn aggregate(&self) -> CompletionSignal {
        self.aggregate_signal.clone()
    }

    /// Targets with their current status, in registry order.
    pub(crate) fn targets(&self) -> impl Iterator<Item = (&TargetId, &Arc<dyn MediaTarget>, bool)> {
        self.entries
            .iter()
            .map(|(id, entry)| (id, &entry.target, entry.unlocked.load(Ordering::SeqCst)))
    }

    /// Flips `id` to unlocked and resolves its signal.
    ///
    /// Only the first caller for a given target wins; later callers get
    /// [`MarkOutcome::AlreadyUnlocked`] and change nothing.
    pub(crate) fn mark_unlocked(&self, id: &TargetId) -> MarkOutcome {
        let Some(entry) = self.entries.get(id) else {
            return MarkOutcome::Unknown;
        };

        if entry
            .unlocked
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            return MarkOutcome::AlreadyUnlocked;
        }

        entry.handle.resolve();
        let remaining = self.pending.fetch_sub(1, Ordering::SeqCst).saturating_sub(1);
        let all_settled = remaining == 0 && self.aggregate.resolve();
        MarkOutcome::Unlocked { all_settled }
    }

    /// Rejects the completion signal of `id`, failing the aggregate.
    pub(crate) fn reject(&self, id: &TargetId, reason: &str) -> RejectOutcome {
        let Some(entry) = self.entries.get(id) else {
            return RejectOutcome::Unknown;
        };

        if !entry.handle.reject(reason) {
            return RejectOutcome::AlreadySettled;
        }

        let aggregate_failed = self.aggregate.reject(format!("{id}: {reason}"));
        RejectOutcome::Rejected { aggregate_failed }
    }
}

impl std::fmt::Debug for Registry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Registry")
            .field("targets", &self.len())
            .field("pending", &self.pending_count())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::target::SimulatedTarget;
    use crate::unlock::signal::SignalState;

    fn registry(ids: &[&str]) -> Registry {
        Registry::initialize(
            ids.iter()
                .map(|id| Arc::new(SimulatedTarget::permissive(*id)) as Arc<dyn MediaTarget>),
        )
    }

    #[test]
    fn initialize_starts_locked_and_pending() {
        let reg = registry(&["v1", "v2"]);
        assert_eq!(reg.len(), 2);
        assert_eq!(reg.pending_count(), 2);
        assert_eq!(
            reg.statuses(),
            vec![(TargetId::new("v1"), false), (TargetId::new("v2"), false)]
        );
        assert!(reg.signal(&TargetId::new("v1")).unwrap().is_pending());
        assert!(reg.aggregate().is_pending());
    }

    #[test]
    fn empty_registry_resolves_aggregate_immediately() {
        let reg = registry(&[]);
        assert!(reg.is_empty());
        assert!(reg.aggregate().is_resolved());
    }

    #[test]
    fn duplicate_ids_keep_first() {
        let reg = registry(&["v1", "v2", "v1"]);
        assert_eq!(reg.len(), 2);
        let ids: Vec<&str> = reg.ids().map(TargetId::as_str).collect();
        assert_eq!(ids, vec!["v1", "v2"]);
    }

    #[test]
    fn mark_unlocked_is_monotonic() {
        let reg = registry(&["v1", "v2"]);
        let v1 = TargetId::new("v1");

        assert_eq!(
            reg.mark_unlocked(&v1),
            MarkOutcome::Unlocked { all_settled: false }
        );
        assert_eq!(reg.mark_unlocked(&v1), MarkOutcome::AlreadyUnlocked);
        assert_eq!(reg.is_unlocked(&v1), Some(true));
        assert_eq!(reg.pending_count(), 1);
        assert!(reg.signal(&v1).unwrap().is_resolved());
        assert!(reg.aggregate().is_pending());
    }

    #[test]
    fn last_unlock_settles_aggregate() {
        let reg = registry(&["v1", "v2"]);
        reg.mark_unlocked(&TargetId::new("v1"));
        assert_eq!(
            reg.mark_unlocked(&TargetId::new("v2")),
            MarkOutcome::Unlocked { all_settled: true }
        );
        assert!(reg.aggregate().is_resolved());
        assert!(reg.pending_ids().is_empty());
    }

    #[test]
    fn unknown_ids_are_reported() {
        let reg = registry(&["v1"]);
        let ghost = TargetId::new("ghost");
        assert_eq!(reg.mark_unlocked(&ghost), MarkOutcome::Unknown);
        assert_eq!(reg.reject(&ghost, "nope"), RejectOutcome::Unknown);
        assert_eq!(reg.is_unlocked(&ghost), None);
        assert!(reg.signal(&ghost).is_none());
    }

    #[test]
    fn reject_fails_aggregate_once() {
        let reg = registry(&["v1", "v2"]);
        assert_eq!(
            reg.reject(&TargetId::new("v1"), "unreachable"),
            RejectOutcome::Rejected {
                aggregate_failed: true
            }
        );
        assert_eq!(
            reg.reject(&TargetId::new("v2"), "unreachable"),
            RejectOutcome::Rejected {
                aggregate_failed: false
            }
        );
        assert_eq!(
            reg.aggregate().state(),
            SignalState::Rejected("v1: unreachable".to_string())
        );
    }

    #[test]
    fn reject_after_unlock_is_a_no_op() {
        let reg = registry(&["v1"]);
        let v1 = TargetId::new("v1");
        reg.mark_unlocked(&v1);
        assert_eq!(reg.reject(&v1, "late"), RejectOutcome::AlreadySettled);
        assert!(reg.aggregate().is_resolved());
    }
}
