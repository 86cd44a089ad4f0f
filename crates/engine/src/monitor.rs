// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Build outcome counters
//!
//! Observes the events committed transactions return and keeps
//! process-wide counters for operator triage, with failures broken
//! down by failure type.

use modforge_core::{Event, FailureType};
use std::sync::atomic::{AtomicU64, Ordering};

#[derive(Debug, Default)]
pub struct BuildMonitor {
    succeeded: AtomicU64,
    failed_unspec: AtomicU64,
    failed_user: AtomicU64,
    failed_infra: AtomicU64,
    batches_advanced: AtomicU64,
}

/// Point-in-time view of the counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MonitorSnapshot {
    pub succeeded: u64,
    pub failed_unspec: u64,
    pub failed_user: u64,
    pub failed_infra: u64,
    pub batches_advanced: u64,
}

impl MonitorSnapshot {
    pub fn failed_total(&self) -> u64 {
        self.failed_unspec + self.failed_user + self.failed_infra
    }
}

impl BuildMonitor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn observe_all(&self, events: &[Event]) {
        for event in events {
            self.observe(event);
        }
    }

    pub fn observe(&self, event: &Event) {
        match event {
            Event::ModuleSucceeded { .. } => {
                self.succeeded.fetch_add(1, Ordering::Relaxed);
            }
            Event::ModuleFailed { failure_type, .. } => {
                let counter = match failure_type {
                    FailureType::Unspec => &self.failed_unspec,
                    FailureType::User => &self.failed_user,
                    FailureType::Infra => &self.failed_infra,
                };
                counter.fetch_add(1, Ordering::Relaxed);
            }
            Event::BatchAdvanced { .. } => {
                self.batches_advanced.fetch_add(1, Ordering::Relaxed);
            }
            Event::ModuleStateChanged { .. } | Event::ComponentStateChanged { .. } => {}
        }
    }

    pub fn snapshot(&self) -> MonitorSnapshot {
        MonitorSnapshot {
            succeeded: self.succeeded.load(Ordering::Relaxed),
            failed_unspec: self.failed_unspec.load(Ordering::Relaxed),
            failed_user: self.failed_user.load(Ordering::Relaxed),
            failed_infra: self.failed_infra.load(Ordering::Relaxed),
            batches_advanced: self.batches_advanced.load(Ordering::Relaxed),
        }
    }
}

#[cfg(test)]
#[path = "monitor_tests.rs"]
mod tests;
