//! End-to-end module build lifecycle.

use crate::prelude::*;
use modforge_core::{BuildState, ComponentState, FakeClock, StateFilter};
use modforge_engine::{BuildMonitor, Outcome};
use modforge_storage::{RecordingNotifier, Store, StoreError};

#[test]
fn three_component_module_fails_when_the_last_wave_fails() {
    let clock = FakeClock::new();
    let store = Store::new();
    let notifier = RecordingNotifier::new();
    let monitor = BuildMonitor::new();

    let id = submit_and_start(
        &store,
        &notifier,
        &clock,
        request("testmodule", "master", 20210101),
        vec![plan("a", 1), plan("b", 1), plan("c", 2)],
    );

    let progress = deliver(&store, &notifier, &clock, id, 101, "a", ComponentState::Complete);
    monitor.observe_all(&progress.events);
    assert_eq!(progress.outcome, Outcome::InProgress);

    let progress = deliver(&store, &notifier, &clock, id, 102, "b", ComponentState::Complete);
    monitor.observe_all(&progress.events);
    assert_eq!(
        progress.outcome,
        Outcome::BatchAdvanced {
            batch: 2,
            submissions: vec!["c".to_string()],
        }
    );

    // The first wave is fully resolved before the second starts.
    store
        .transaction(&notifier, |txn| {
            let module = txn.module(id)?;
            assert_eq!(module.batch, 2);
            let unresolved = module
                .up_to_current_batch(StateFilter::Unbuilt)?
                .iter()
                .filter(|c| c.batch < 2)
                .count();
            assert_eq!(unresolved, 0);
            Ok::<_, StoreError>(())
        })
        .expect("inspect");

    let progress = deliver(&store, &notifier, &clock, id, 103, "c", ComponentState::Failed);
    monitor.observe_all(&progress.events);
    assert!(matches!(progress.outcome, Outcome::Failed { .. }));

    store
        .transaction(&notifier, |txn| {
            let module = txn.module(id)?;
            assert_eq!(module.state, BuildState::Failed);
            assert!(module.state_reason.as_deref().is_some_and(|r| r.contains('c')));
            let failed_rows = module
                .state_trace()
                .iter()
                .filter(|row| row.state == BuildState::Failed)
                .count();
            assert_eq!(failed_rows, 1);
            Ok::<_, StoreError>(())
        })
        .expect("inspect");

    // Exactly one failed notification pair for the one failed trace row.
    let failed_messages = notifier
        .messages()
        .into_iter()
        .filter(|m| m["state_name"] == "failed")
        .count();
    assert_eq!(failed_messages, 1);

    let snapshot = monitor.snapshot();
    assert_eq!(snapshot.failed_user, 1);
    assert_eq!(snapshot.succeeded, 0);
    assert_eq!(snapshot.batches_advanced, 1);
}

#[test]
fn successful_module_reaches_done_with_ordered_notifications() {
    let clock = FakeClock::new();
    let store = Store::new();
    let notifier = RecordingNotifier::new();

    let id = submit_and_start(
        &store,
        &notifier,
        &clock,
        request("testmodule", "master", 20210101),
        vec![plan("a", 1), plan("b", 2)],
    );
    deliver(&store, &notifier, &clock, id, 101, "a", ComponentState::Complete);
    let progress = deliver(&store, &notifier, &clock, id, 102, "b", ComponentState::Complete);
    assert_eq!(progress.outcome, Outcome::Done);

    // Per-module notification order follows commit order.
    let states: Vec<String> = notifier
        .messages()
        .into_iter()
        .filter(|m| m["id"] == id)
        .map(|m| m["state_name"].as_str().unwrap_or_default().to_string())
        .collect();
    assert_eq!(states, vec!["build".to_string(), "done".to_string()]);

    store
        .transaction(&notifier, |txn| {
            let module = txn.module(id)?;
            assert_eq!(module.state, BuildState::Done);
            assert!(module.time_completed.is_some());
            assert!(module.components.iter().all(|c| c.is_completed()));
            Ok::<_, StoreError>(())
        })
        .expect("inspect");
}

#[test]
fn canceled_components_also_fail_the_module() {
    let clock = FakeClock::new();
    let store = Store::new();
    let notifier = RecordingNotifier::new();

    let id = submit_and_start(
        &store,
        &notifier,
        &clock,
        request("testmodule", "master", 20210101),
        vec![plan("a", 1)],
    );
    let progress = deliver(&store, &notifier, &clock, id, 101, "a", ComponentState::Canceled);
    assert!(matches!(progress.outcome, Outcome::Failed { .. }));
}
