use super::*;

#[test]
fn counters_break_failures_down_by_type() {
    let monitor = BuildMonitor::new();
    monitor.observe_all(&[
        Event::ModuleSucceeded { module_id: 1 },
        Event::ModuleFailed {
            module_id: 2,
            failure_type: FailureType::User,
        },
        Event::ModuleFailed {
            module_id: 3,
            failure_type: FailureType::Infra,
        },
        Event::BatchAdvanced {
            module_id: 1,
            batch: 2,
        },
    ]);

    let snapshot = monitor.snapshot();
    assert_eq!(snapshot.succeeded, 1);
    assert_eq!(snapshot.failed_user, 1);
    assert_eq!(snapshot.failed_infra, 1);
    assert_eq!(snapshot.failed_unspec, 0);
    assert_eq!(snapshot.failed_total(), 2);
    assert_eq!(snapshot.batches_advanced, 1);
}

#[test]
fn state_change_events_do_not_count_as_outcomes() {
    let monitor = BuildMonitor::new();
    monitor.observe(&Event::ModuleStateChanged {
        module_id: 1,
        old_state: modforge_core::BuildState::Init,
        new_state: modforge_core::BuildState::Wait,
    });
    let snapshot = monitor.snapshot();
    assert_eq!(snapshot.succeeded, 0);
    assert_eq!(snapshot.failed_total(), 0);
}
