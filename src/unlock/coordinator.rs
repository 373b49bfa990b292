//! Unlock coordinator
//!
//! The `UnlockCoordinator` ties the registry, the attempt engine and the
//! listener lifecycle together:
//!
//! - `start()` attaches one shared listener per qualifying event kind, then
//!   runs one eager attempt pass.
//! - Each pass spawns a probe (play, then pause once play is confirmed) for
//!   every still-locked target and returns without waiting on them.
//! - When the last target unlocks, the coordinator flips the aggregate flag
//!   and detaches its listeners, exactly once.
//!
//! Overlapping passes may probe the same target twice. The registry's
//! compare-and-swap makes the first successful probe win; later ones only
//! pause the media again.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};

use chrono::Utc;
use futures_util::future::join_all;
use tokio::runtime::Handle;
use tokio::sync::Notify;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use super::lifecycle::{LifecycleState, ListenerLifecycle};
use super::registry::{MarkOutcome, Registry, RejectOutcome};
use super::signal::CompletionSignal;
use crate::error::PlaybackError;
use crate::observability::events::{Event, EventEmitter};
use crate::observability::metrics::{self, ProbeLabel};
use crate::surface::{
    InteractionEvent, InteractionSurface, Listener, ListenerOptions, QUALIFYING_EVENTS,
};
use crate::target::{MediaTarget, TargetId};

/// What caused an attempt pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Trigger {
    /// The proactive pass run by `start()`.
    Eager,
    /// A qualifying interaction event.
    Event(InteractionEvent),
}

impl Trigger {
    /// Short label for logs and metrics.
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Eager => "eager",
            Self::Event(event) => event.kind.as_str(),
        }
    }
}

impl std::fmt::Display for Trigger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Eager => f.write_str("eager"),
            Self::Event(event) => write!(f, "{}#{}", event.kind, event.sequence),
        }
    }
}

/// How a single probe settled.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProbeOutcome {
    /// This probe unlocked the target.
    Unlocked,
    /// Playback started, but an earlier probe had already unlocked the target.
    AlreadyUnlocked,
    /// The platform refused playback; the target stays locked.
    Failed(PlaybackError),
}

/// Result of one attempt pass.
///
/// Dropping it leaves the probes running in the background.
#[derive(Debug)]
pub struct AttemptPass {
    trigger: Trigger,
    skipped: Vec<TargetId>,
    probes: Vec<(TargetId, JoinHandle<ProbeOutcome>)>,
}

impl AttemptPass {
    /// What triggered this pass.
    #[must_use]
    pub const fn trigger(&self) -> Trigger {
        self.trigger
    }

    /// Targets skipped because they were already unlocked.
    #[must_use]
    pub fn skipped(&self) -> &[TargetId] {
        &self.skipped
    }

    /// Number of probes issued by this pass.
    #[must_use]
    pub fn probes_issued(&self) -> usize {
        self.probes.len()
    }

    /// Identifiers of the probed targets, in registry order.
    pub fn probed(&self) -> impl Iterator<Item = &TargetId> {
        self.probes.iter().map(|(id, _)| id)
    }

    /// Waits for every probe of this pass to settle.
    pub async fn join(self) -> Vec<(TargetId, ProbeOutcome)> {
        let (ids, handles): (Vec<_>, Vec<_>) = self.probes.into_iter().unzip();
        ids.into_iter()
            .zip(join_all(handles).await)
            .map(|(id, joined)| {
                let outcome = joined.unwrap_or_else(|e| {
                    ProbeOutcome::Failed(PlaybackError::Aborted(format!("probe task failed: {e}")))
                });
                (id, outcome)
            })
            .collect()
    }
}

/// Builder for [`UnlockCoordinator`].
pub struct CoordinatorBuilder {
    surface: Arc<dyn InteractionSurface>,
    targets: Vec<Arc<dyn MediaTarget>>,
    emitter: Option<Arc<EventEmitter>>,
    runtime: Option<Handle>,
}

impl CoordinatorBuilder {
    /// Adds one target.
    #[must_use]
    pub fn target(mut self, target: Arc<dyn MediaTarget>) -> Self {
        self.targets.push(target);
        self
    }

    /// Adds several targets, preserving order.
    #[must_use]
    pub fn targets(mut self, targets: impl IntoIterator<Item = Arc<dyn MediaTarget>>) -> Self {
        self.targets.extend(targets);
        self
    }

    /// Sends structured events to `emitter` instead of discarding them.
    #[must_use]
    pub fn emitter(mut self, emitter: Arc<EventEmitter>) -> Self {
        self.emitter = Some(emitter);
        self
    }

    /// Spawns probes on `runtime` instead of the ambient one.
    #[must_use]
    pub fn runtime(mut self, runtime: Handle) -> Self {
        self.runtime = Some(runtime);
        self
    }

    /// Builds the registry and the coordinator. Listeners are not attached
    /// until [`UnlockCoordinator::start`].
    ///
    /// # Panics
    ///
    /// Panics if no runtime was supplied and this is called outside a tokio
    /// runtime.
    #[must_use]
    pub fn build(self) -> UnlockCoordinator {
        let runtime = self.runtime.unwrap_or_else(Handle::current);
        let registry = Registry::initialize(self.targets);

        let inner = Arc::new(Inner {
            registry,
            surface: self.surface,
            lifecycle: Mutex::new(ListenerLifecycle::new()),
            all_unlocked: AtomicBool::new(false),
            started: AtomicBool::new(false),
            runtime,
            emitter: self
                .emitter
                .unwrap_or_else(|| Arc::new(EventEmitter::noop())),
            in_flight: AtomicUsize::new(0),
            idle: Notify::new(),
        });

        if inner.registry.aggregate().is_resolved() {
            debug!("no targets to unlock");
            inner.settle_all();
        }

        UnlockCoordinator { inner }
    }
}

/// Coordinates the one-time unlock of a fixed set of media targets.
///
/// Cloning yields another handle to the same coordinator.
#[derive(Clone)]
pub struct UnlockCoordinator {
    inner: Arc<Inner>,
}

struct Inner {
    registry: Registry,
    surface: Arc<dyn InteractionSurface>,
    lifecycle: Mutex<ListenerLifecycle>,
    all_unlocked: AtomicBool,
    started: AtomicBool,
    runtime: Handle,
    emitter: Arc<EventEmitter>,
    in_flight: AtomicUsize,
    idle: Notify,
}

impl UnlockCoordinator {
    /// Starts building a coordinator bound to `surface`.
    #[must_use]
    pub fn builder(surface: Arc<dyn InteractionSurface>) -> CoordinatorBuilder {
        CoordinatorBuilder {
            surface,
            targets: Vec::new(),
            emitter: None,
            runtime: None,
        }
    }

    /// Attaches the unlock listener for every qualifying event kind, then
    /// runs one eager attempt pass.
    ///
    /// A second call does nothing and returns an empty pass.
    pub fn start(&self) -> AttemptPass {
        if self.inner.started.swap(true, Ordering::SeqCst) {
            debug!("coordinator already started");
            return AttemptPass {
                trigger: Trigger::Eager,
                skipped: Vec::new(),
                probes: Vec::new(),
            };
        }

        let weak: Weak<Inner> = Arc::downgrade(&self.inner);
        let listener: Listener = Arc::new(move |event: &InteractionEvent| {
            if let Some(inner) = weak.upgrade() {
                drop(inner.attempt(Trigger::Event(*event)));
            }
        });

        let attached = self.inner.lifecycle().attach(
            self.inner.surface.as_ref(),
            &QUALIFYING_EVENTS,
            ListenerOptions::default(),
            &listener,
        );
        metrics::set_listeners_attached(attached);

        info!(
            targets = self.inner.registry.len(),
            listeners = attached,
            "unlock coordinator started"
        );
        self.inner.emitter.emit(Event::CoordinatorStarted {
            timestamp: Utc::now(),
            targets: self.inner.registry.len(),
            listeners: attached,
        });

        self.inner.attempt(Trigger::Eager)
    }

    /// Runs one attempt pass: probes every still-locked target.
    ///
    /// Returns immediately; the probes settle in the background.
    pub fn attempt(&self, trigger: Trigger) -> AttemptPass {
        self.inner.attempt(trigger)
    }

    /// Removes every attached listener and enters the detached state.
    ///
    /// The coordinator calls this itself when the last target unlocks.
    /// Calling it earlier stops all further event-driven attempts. Returns
    /// `false` if listeners were already detached.
    pub fn teardown(&self) -> bool {
        self.inner.teardown()
    }

    /// Rejects the completion signal of `id`, failing the aggregate signal.
    ///
    /// The attempt engine never does this on its own; it is reserved for
    /// hosts that decide a target can never unlock. Returns `true` if the
    /// signal was pending.
    pub fn reject_target(&self, id: &TargetId, reason: &str) -> bool {
        self.inner.reject_target(id, reason)
    }

    /// Whether every target has unlocked.
    #[must_use]
    pub fn all_unlocked(&self) -> bool {
        self.inner.all_unlocked.load(Ordering::SeqCst)
    }

    /// Signal that resolves once every target has unlocked.
    #[must_use]
    pub fn all_unlocked_signal(&self) -> CompletionSignal {
        self.inner.registry.aggregate()
    }

    /// Completion signal for `id`, or `None` if `id` is not registered.
    #[must_use]
    pub fn signal(&self, id: &TargetId) -> Option<CompletionSignal> {
        self.inner.registry.signal(id)
    }

    /// Unlock status of `id`, or `None` if `id` is not registered.
    #[must_use]
    pub fn is_unlocked(&self, id: &TargetId) -> Option<bool> {
        self.inner.registry.is_unlocked(id)
    }

    /// The target registry.
    #[must_use]
    pub fn registry(&self) -> &Registry {
        &self.inner.registry
    }

    /// Current listener lifecycle state.
    #[must_use]
    pub fn lifecycle_state(&self) -> LifecycleState {
        self.inner.lifecycle().state()
    }

    /// Number of probes that have not settled yet.
    #[must_use]
    pub fn in_flight(&self) -> usize {
        self.inner.in_flight.load(Ordering::SeqCst)
    }

    /// Waits until no probe is in flight.
    pub async fn quiesce(&self) {
        loop {
            let notified = self.inner.idle.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();
            if self.in_flight() == 0 {
                return;
            }
            notified.await;
        }
    }
}

impl std::fmt::Debug for UnlockCoordinator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UnlockCoordinator")
            .field("registry", &self.inner.registry)
            .field("all_unlocked", &self.all_unlocked())
            .field("in_flight", &self.in_flight())
            .finish_non_exhaustive()
    }
}

/// Decrements the in-flight counter when a probe task ends, however it ends.
struct InFlightGuard(Arc<Inner>);

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        if self.0.in_flight.fetch_sub(1, Ordering::SeqCst) == 1 {
            self.0.idle.notify_waiters();
        }
    }
}

impl Inner {
    fn lifecycle(&self) -> MutexGuard<'_, ListenerLifecycle> {
        self.lifecycle.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn attempt(self: &Arc<Self>, trigger: Trigger) -> AttemptPass {
        let label = trigger.label();
        metrics::record_attempt(label);
        debug!(%trigger, pending = self.registry.pending_count(), "attempt unlock");
        self.emitter.emit(Event::AttemptStarted {
            timestamp: Utc::now(),
            trigger: label.to_owned(),
            pending: self.registry.pending_count(),
        });

        let mut pass = AttemptPass {
            trigger,
            skipped: Vec::new(),
            probes: Vec::new(),
        };

        for (id, target, unlocked) in self.registry.targets() {
            if unlocked {
                debug!(target_id = %id, %trigger, "attempt to re-unlock an already unlocked target, skipping");
                metrics::record_redundant_attempt();
                self.emitter.emit(Event::RedundantAttempt {
                    timestamp: Utc::now(),
                    target_id: id.to_string(),
                    trigger: label.to_owned(),
                });
                pass.skipped.push(id.clone());
                continue;
            }

            self.in_flight.fetch_add(1, Ordering::SeqCst);
            let guard = InFlightGuard(Arc::clone(self));
            let target = Arc::clone(target);
            let handle = self.runtime.spawn(async move {
                let inner = Arc::clone(&guard.0);
                let outcome = inner.probe(target.as_ref(), trigger).await;
                drop(guard);
                outcome
            });
            pass.probes.push((id.clone(), handle));
        }

        pass
    }

    async fn probe(&self, target: &dyn MediaTarget, trigger: Trigger) -> ProbeOutcome {
        let id = target.id();
        let label = trigger.label();

        if let Err(e) = target.play().await {
            warn!(target_id = %id, %trigger, error = %e, "unlock play failed, will try again on future events");
            metrics::record_probe(ProbeLabel::Failed);
            self.emitter.emit(Event::ProbeFailed {
                timestamp: Utc::now(),
                target_id: id.to_string(),
                trigger: label.to_owned(),
                error: e.to_string(),
            });
            return ProbeOutcome::Failed(e);
        }

        let outcome = match self.registry.mark_unlocked(id) {
            MarkOutcome::Unlocked { all_settled } => {
                info!(target_id = %id, %trigger, "unlock play success");
                metrics::record_probe(ProbeLabel::Unlocked);
                metrics::set_targets_unlocked(self.registry.len() - self.registry.pending_count());
                self.emitter.emit(Event::ProbeSucceeded {
                    timestamp: Utc::now(),
                    target_id: id.to_string(),
                    trigger: label.to_owned(),
                    duplicate: false,
                });
                if all_settled {
                    self.settle_all();
                }
                ProbeOutcome::Unlocked
            }
            MarkOutcome::AlreadyUnlocked => {
                debug!(target_id = %id, %trigger, "overlapping probe settled after target unlocked");
                metrics::record_probe(ProbeLabel::Duplicate);
                self.emitter.emit(Event::ProbeSucceeded {
                    timestamp: Utc::now(),
                    target_id: id.to_string(),
                    trigger: label.to_owned(),
                    duplicate: true,
                });
                ProbeOutcome::AlreadyUnlocked
            }
            MarkOutcome::Unknown => {
                warn!(target_id = %id, "probed target is not registered");
                ProbeOutcome::AlreadyUnlocked
            }
        };

        // The media did start, whichever probe won.
        target.pause();
        outcome
    }

    fn settle_all(&self) {
        if self
            .all_unlocked
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            return;
        }

        info!(targets = self.registry.len(), "all targets unlocked");
        self.emitter.emit(Event::AllUnlocked {
            timestamp: Utc::now(),
            targets: self.registry.len(),
        });
        self.teardown();
    }

    fn teardown(&self) -> bool {
        let Some(removed) = self.lifecycle().detach(self.surface.as_ref()) else {
            return false;
        };

        info!(removed, "unlock listeners detached");
        metrics::set_listeners_attached(0);
        self.emitter.emit(Event::ListenersDetached {
            timestamp: Utc::now(),
            removed,
        });
        true
    }

    fn reject_target(&self, id: &TargetId, reason: &str) -> bool {
        match self.registry.reject(id, reason) {
            RejectOutcome::Rejected { aggregate_failed } => {
                if aggregate_failed {
                    error!(target_id = %id, reason, "unlocking error, aggregate signal failed");
                    self.emitter.emit(Event::AggregateFailed {
                        timestamp: Utc::now(),
                        target_id: id.to_string(),
                        reason: reason.to_owned(),
                    });
                }
                true
            }
            RejectOutcome::AlreadySettled => {
                debug!(target_id = %id, "signal already settled, rejection ignored");
                false
            }
            RejectOutcome::Unknown => {
                warn!(target_id = %id, "cannot reject unknown target");
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::surface::{EventKind, InMemorySurface};
    use crate::target::{ScriptedOutcome, SimulatedTarget};

    fn setup(
        targets: Vec<Arc<SimulatedTarget>>,
    ) -> (Arc<InMemorySurface>, UnlockCoordinator) {
        let surface = Arc::new(InMemorySurface::new());
        let coordinator = UnlockCoordinator::builder(surface.clone())
            .targets(targets.into_iter().map(|t| t as Arc<dyn MediaTarget>))
            .build();
        (surface, coordinator)
    }

    #[tokio::test]
    async fn start_attaches_qualifying_listeners() {
        let v1 = Arc::new(SimulatedTarget::new("v1", [], ScriptedOutcome::Reject));
        let (surface, coordinator) = setup(vec![v1]);

        let pass = coordinator.start();
        assert_eq!(pass.trigger(), Trigger::Eager);
        assert_eq!(pass.probes_issued(), 1);
        pass.join().await;

        for kind in QUALIFYING_EVENTS {
            assert_eq!(surface.listener_count(kind), 1, "{kind}");
        }
        assert_eq!(surface.listener_count(EventKind::TouchEnd), 0);
        assert_eq!(coordinator.lifecycle_state(), LifecycleState::Listening);
    }

    #[tokio::test]
    async fn second_start_is_a_no_op() {
        let v1 = Arc::new(SimulatedTarget::new("v1", [], ScriptedOutcome::Reject));
        let (surface, coordinator) = setup(vec![v1.clone()]);

        coordinator.start().join().await;
        let again = coordinator.start();
        assert_eq!(again.probes_issued(), 0);
        assert_eq!(surface.total_listeners(), 3);
        assert_eq!(v1.play_count(), 1);
    }

    #[tokio::test]
    async fn eager_success_unlocks_and_detaches() {
        let v1 = Arc::new(SimulatedTarget::permissive("v1"));
        let (surface, coordinator) = setup(vec![v1.clone()]);

        let outcomes = coordinator.start().join().await;
        assert_eq!(outcomes, vec![(TargetId::new("v1"), ProbeOutcome::Unlocked)]);
        assert!(coordinator.all_unlocked());
        assert_eq!(coordinator.lifecycle_state(), LifecycleState::Detached);
        assert_eq!(surface.total_listeners(), 0);
        assert_eq!(v1.pause_count(), 1);
        assert!(!v1.is_playing());
    }

    #[tokio::test]
    async fn failed_probe_leaves_target_locked() {
        let v1 = Arc::new(SimulatedTarget::new("v1", [], ScriptedOutcome::Reject));
        let (_surface, coordinator) = setup(vec![v1.clone()]);

        let outcomes = coordinator.start().join().await;
        assert!(matches!(outcomes[0].1, ProbeOutcome::Failed(PlaybackError::NotAllowed(_))));
        assert_eq!(coordinator.is_unlocked(&TargetId::new("v1")), Some(false));
        assert!(coordinator.signal(&TargetId::new("v1")).unwrap().is_pending());
        assert_eq!(v1.pause_count(), 0);
    }

    #[tokio::test]
    async fn empty_registry_is_unlocked_before_start() {
        let (surface, coordinator) = setup(vec![]);
        assert!(coordinator.all_unlocked());
        assert_eq!(coordinator.lifecycle_state(), LifecycleState::Detached);

        let pass = coordinator.start();
        assert_eq!(pass.probes_issued(), 0);
        assert!(pass.skipped().is_empty());
        assert_eq!(surface.total_listeners(), 0);
    }

    #[tokio::test]
    async fn reject_target_fails_aggregate_but_keeps_listening() {
        let v1 = Arc::new(SimulatedTarget::new("v1", [], ScriptedOutcome::Reject));
        let (surface, coordinator) = setup(vec![v1]);
        coordinator.start().join().await;

        assert!(coordinator.reject_target(&TargetId::new("v1"), "unreachable"));
        assert!(!coordinator.reject_target(&TargetId::new("v1"), "again"));
        assert!(!coordinator.reject_target(&TargetId::new("ghost"), "unknown"));

        assert!(coordinator.all_unlocked_signal().wait().await.is_err());
        assert!(!coordinator.all_unlocked());
        assert_eq!(surface.total_listeners(), 3);
    }

    #[tokio::test]
    async fn explicit_teardown_runs_once() {
        let v1 = Arc::new(SimulatedTarget::new("v1", [], ScriptedOutcome::Reject));
        let (surface, coordinator) = setup(vec![v1.clone()]);
        coordinator.start().join().await;

        assert!(coordinator.teardown());
        assert!(!coordinator.teardown());
        assert_eq!(surface.dispatch(EventKind::Click), 0);
        coordinator.quiesce().await;
        assert_eq!(v1.play_count(), 1);
    }

    #[tokio::test]
    async fn dropped_coordinator_ignores_late_events() {
        let v1 = Arc::new(SimulatedTarget::new("v1", [], ScriptedOutcome::Reject));
        let (surface, coordinator) = setup(vec![v1.clone()]);
        coordinator.start().join().await;
        drop(coordinator);

        // The listener only holds a weak reference.
        assert_eq!(surface.dispatch(EventKind::Click), 1);
        tokio::task::yield_now().await;
        assert_eq!(v1.play_count(), 1);
    }

    #[test]
    fn trigger_labels() {
        assert_eq!(Trigger::Eager.label(), "eager");
        let event = InteractionEvent {
            kind: EventKind::KeyDown,
            sequence: 4,
        };
        assert_eq!(Trigger::Event(event).label(), "keydown");
        assert_eq!(Trigger::Event(event).to_string(), "keydown#4");
    }
}
