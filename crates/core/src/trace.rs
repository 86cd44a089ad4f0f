// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Append-only state transition traces
//!
//! Every state write on a module or component build appends exactly one
//! trace row through the single write path (`transition`). Rows are
//! never mutated and only disappear when the owning aggregate does.

use crate::clock::utc_to_iso;
use crate::state::{BuildState, ComponentState};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

/// One recorded state change of a module build.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModuleTraceEntry {
    pub state_time: DateTime<Utc>,
    pub state: BuildState,
    pub reason: Option<String>,
}

impl ModuleTraceEntry {
    pub fn json(&self) -> Value {
        json!({
            "time": utc_to_iso(Some(self.state_time)),
            "state": self.state.ordinal(),
            "state_name": self.state.name(),
            "reason": self.reason,
        })
    }
}

/// One recorded state change of a component build.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComponentTraceEntry {
    pub state_time: DateTime<Utc>,
    pub state: Option<ComponentState>,
    pub reason: Option<String>,
    pub task_id: Option<u64>,
}

impl ComponentTraceEntry {
    pub fn json(&self) -> Value {
        json!({
            "time": utc_to_iso(Some(self.state_time)),
            "state": self.state.map(ComponentState::code),
            "state_name": self.state.map(ComponentState::name),
            "reason": self.reason,
            "task_id": self.task_id,
        })
    }
}

/// Order trace rows by timestamp, keeping insertion order for ties.
///
/// Rows are appended in commit order, so a stable sort on `state_time`
/// yields the required total order.
pub fn ordered_by_time<T, F>(entries: &[T], time_of: F) -> Vec<&T>
where
    F: Fn(&T) -> DateTime<Utc>,
{
    let mut rows: Vec<&T> = entries.iter().collect();
    rows.sort_by_key(|row| time_of(row));
    rows
}

#[cfg(test)]
#[path = "trace_tests.rs"]
mod tests;
