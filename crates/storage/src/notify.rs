// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Notifier implementations for the transactional outbox

use modforge_core::Notifier;
use serde_json::Value;
use std::sync::Mutex;

/// Notifier that records every snapshot, for tests.
#[derive(Debug, Default)]
pub struct RecordingNotifier {
    messages: Mutex<Vec<Value>>,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// All snapshots delivered so far, in delivery order.
    pub fn messages(&self) -> Vec<Value> {
        self.messages
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }
}

impl Notifier for RecordingNotifier {
    fn put(&self, snapshot: Value) {
        self.messages
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(snapshot);
    }
}

/// Notifier that logs each outbound change event.
#[derive(Debug, Default)]
pub struct TracingNotifier;

impl Notifier for TracingNotifier {
    fn put(&self, snapshot: Value) {
        tracing::info!(
            module_id = snapshot.get("id").and_then(serde_json::Value::as_u64),
            state = snapshot
                .get("state_name")
                .and_then(serde_json::Value::as_str)
                .unwrap_or("unknown"),
            "module state change notification"
        );
    }
}

#[cfg(test)]
#[path = "notify_tests.rs"]
mod tests;
