// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Effects and events emitted by the build state machines
//!
//! Aggregate methods never talk to the outside world directly; they
//! return effects for the surrounding transaction to act on. The
//! notification effect in particular must only reach the gateway after
//! the enclosing transaction commits.

use crate::state::{BuildState, ComponentState, FailureType};
use serde_json::Value;

/// Side effects requested by a state transition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    /// Emit an event for observers (logging, counters).
    Emit(Event),
    /// Enqueue a state-change notification for the module, to be
    /// delivered at most once per committed transition.
    Notify { module_id: u64 },
}

/// Events emitted by the build state machines.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    ModuleStateChanged {
        module_id: u64,
        old_state: BuildState,
        new_state: BuildState,
    },
    ModuleSucceeded {
        module_id: u64,
    },
    ModuleFailed {
        module_id: u64,
        failure_type: FailureType,
    },
    BatchAdvanced {
        module_id: u64,
        batch: u32,
    },
    ComponentStateChanged {
        module_id: u64,
        component_id: u64,
        old_state: Option<ComponentState>,
        new_state: Option<ComponentState>,
    },
}

impl Event {
    /// Get the event name for pattern matching.
    /// Format: "category:action".
    pub fn name(&self) -> &'static str {
        match self {
            Event::ModuleStateChanged { .. } => "module:state-changed",
            Event::ModuleSucceeded { .. } => "module:succeeded",
            Event::ModuleFailed { .. } => "module:failed",
            Event::BatchAdvanced { .. } => "batch:advanced",
            Event::ComponentStateChanged { .. } => "component:state-changed",
        }
    }
}

/// Outbound change-notification gateway.
///
/// The core's contract: `put` is called at most once per committed
/// transition, only after the commit. Delivery itself may happen later
/// and out of process.
pub trait Notifier: Send + Sync {
    fn put(&self, snapshot: Value);
}
