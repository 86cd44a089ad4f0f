//! Virtual-stream and arch registry behavior through the store.

use crate::prelude::*;
use modforge_core::{Config, FakeClock};
use modforge_engine::submit;
use modforge_storage::{RecordingNotifier, Store, StoreError};

#[test]
fn sole_referencer_detach_garbage_collects_the_stream() {
    let clock = FakeClock::new();
    let store = Store::new();
    let notifier = RecordingNotifier::new();
    let config = Config::default();

    let a = submit(&store, &notifier, &config, &clock, request("moda", "master", 1)).expect("submit");
    let b = submit(&store, &notifier, &config, &clock, request("modb", "master", 1)).expect("submit");

    store
        .transaction(&notifier, |txn| {
            txn.update_virtual_streams(a, &["foo".to_string()])?;
            txn.update_virtual_streams(b, &["foo".to_string(), "lts".to_string()])?;
            Ok::<_, StoreError>(())
        })
        .expect("attach");

    // "foo" survives while another module still references it.
    store
        .transaction(&notifier, |txn| {
            txn.update_virtual_streams(a, &[])?;
            assert!(txn.virtual_stream_exists("foo"));
            Ok::<_, StoreError>(())
        })
        .expect("detach a");

    // Dropping the last referencer deletes the row.
    store
        .transaction(&notifier, |txn| {
            let diff = txn.update_virtual_streams(b, &["lts".to_string()])?;
            assert_eq!(diff.deleted, vec!["foo".to_string()]);
            assert!(!txn.virtual_stream_exists("foo"));
            assert!(txn.virtual_stream_exists("lts"));
            Ok::<_, StoreError>(())
        })
        .expect("detach b");
}

#[test]
fn arches_are_not_garbage_collected() {
    let clock = FakeClock::new();
    let store = Store::new();
    let notifier = RecordingNotifier::new();
    let config = Config::default();

    let a = submit(&store, &notifier, &config, &clock, request("moda", "master", 1)).expect("submit");
    store
        .transaction(&notifier, |txn| {
            txn.set_arches(a, &["x86_64".to_string()])?;
            txn.set_arches(a, &[])?;
            assert!(txn.arch_exists("x86_64"));
            assert!(txn.arches_of(a).is_empty());
            Ok::<_, StoreError>(())
        })
        .expect("arches");
}
