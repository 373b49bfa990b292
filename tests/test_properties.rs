//! Property tests for the aggregate flag and the idempotent skip.

mod common;

use std::sync::Arc;

use mediaunlock::target::{ScriptedOutcome, SimulatedTarget};
use mediaunlock::unlock::{LifecycleState, Trigger};
use mediaunlock::{EventKind, InMemorySurface, MediaTarget, UnlockCoordinator};
use proptest::prelude::*;

fn runtime() -> tokio::runtime::Runtime {
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .unwrap()
}

fn outcome() -> impl Strategy<Value = ScriptedOutcome> {
    prop_oneof![Just(ScriptedOutcome::Accept), Just(ScriptedOutcome::Reject)]
}

fn event_kind() -> impl Strategy<Value = EventKind> {
    prop::sample::select(EventKind::ALL.to_vec())
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn aggregate_tracks_every_status(
        scripts in prop::collection::vec(prop::collection::vec(outcome(), 0..4), 0..5),
        events in prop::collection::vec(event_kind(), 0..12),
    ) {
        runtime().block_on(async {
            let targets: Vec<Arc<SimulatedTarget>> = scripts
                .iter()
                .enumerate()
                .map(|(i, script)| {
                    Arc::new(SimulatedTarget::new(
                        format!("t{i}"),
                        script.iter().copied(),
                        ScriptedOutcome::Reject,
                    ))
                })
                .collect();
            let surface = Arc::new(InMemorySurface::new());
            let coordinator = UnlockCoordinator::builder(surface.clone())
                .targets(targets.iter().map(|t| Arc::clone(t) as Arc<dyn MediaTarget>))
                .build();

            coordinator.start();
            common::settle(&coordinator).await;

            for &kind in &events {
                surface.dispatch(kind);
                common::settle(&coordinator).await;

                let all = coordinator.registry().statuses().iter().all(|(_, unlocked)| *unlocked);
                assert_eq!(coordinator.all_unlocked(), all);
                assert_eq!(coordinator.all_unlocked_signal().is_resolved(), all);
                assert_eq!(
                    coordinator.lifecycle_state() == LifecycleState::Detached,
                    all
                );
            }

            // A target unlocks at most once, so it pauses at most once.
            for target in &targets {
                assert!(target.pause_count() <= 1, "{} paused {} times", target.id(), target.pause_count());
            }
        });
    }

    #[test]
    fn unlocked_targets_are_never_probed_again(
        attempts in 1_usize..20,
        kinds in prop::collection::vec(event_kind(), 1..20),
    ) {
        runtime().block_on(async {
            let unlocked = Arc::new(SimulatedTarget::permissive("ready"));
            let locked = Arc::new(SimulatedTarget::new("stuck", [], ScriptedOutcome::Reject));
            let surface = Arc::new(InMemorySurface::new());
            let coordinator = UnlockCoordinator::builder(surface)
                .target(unlocked.clone())
                .target(locked.clone())
                .build();

            coordinator.start().join().await;
            assert_eq!(unlocked.play_count(), 1);

            for i in 0..attempts {
                let kind = kinds[i % kinds.len()];
                let pass = coordinator.attempt(Trigger::Event(
                    mediaunlock::surface::InteractionEvent::new(kind),
                ));
                assert_eq!(pass.skipped().len(), 1);
                assert_eq!(pass.probes_issued(), 1);
                pass.join().await;
            }

            assert_eq!(unlocked.play_count(), 1);
            assert_eq!(unlocked.pause_count(), 1);
            assert_eq!(locked.play_count() as usize, attempts + 1);
            assert!(!coordinator.all_unlocked());
        });
    }
}
