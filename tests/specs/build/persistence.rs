//! Snapshot persistence across a build in flight.

use crate::prelude::*;
use modforge_core::{BuildState, ComponentState, FakeClock};
use modforge_engine::Outcome;
use modforge_storage::{RecordingNotifier, Store, StoreError};

#[test]
fn a_build_in_flight_survives_a_save_load_cycle() {
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

    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("store.json");
    store.save(&path).expect("save");
    let restored = Store::load(&path).expect("load");

    // The restored store picks up exactly where the original stopped.
    let progress = deliver(&restored, &notifier, &clock, id, 102, "b", ComponentState::Complete);
    assert_eq!(progress.outcome, Outcome::Done);

    restored
        .transaction(&notifier, |txn| {
            let module = txn.module(id)?;
            assert_eq!(module.state, BuildState::Done);
            // The trace, including the pre-save rows, is intact.
            assert!(module
                .state_trace()
                .iter()
                .any(|row| row.state == BuildState::Build));
            Ok::<_, StoreError>(())
        })
        .expect("inspect");
}
