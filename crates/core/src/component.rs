// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Component build state machine
//!
//! A component build is one buildable unit (an RPM package) owned by a
//! module build. Its state mirrors the external build backend's
//! vocabulary; `None` means the component has not been submitted yet.
//! The classification queries are derived from `state` on every call
//! and never cached.

use crate::clock::Clock;
use crate::effect::{Effect, Event};
use crate::error::BuildError;
use crate::state::ComponentState;
use crate::trace::{ordered_by_time, ComponentTraceEntry};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

/// One buildable unit within a module build.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComponentBuild {
    pub id: u64,
    pub module_id: u64,
    pub package: String,
    pub scmurl: String,
    /// Artifact format, e.g. "rpms".
    pub format: String,
    /// Task id in the external build backend, once submitted.
    pub task_id: Option<u64>,
    /// Commit hash the component was built from.
    pub scm_ref: Option<String>,
    pub state: Option<ComponentState>,
    pub state_reason: Option<String>,
    /// Stays `None` until the build completes.
    pub nvr: Option<String>,
    /// Tagged into the buildroot (-build tag).
    pub tagged: bool,
    /// Tagged into the final tag.
    pub tagged_in_final: bool,
    /// Only ever tagged into the -build tag.
    pub build_time_only: bool,
    /// buildonly was set in the manifest.
    pub buildonly: bool,
    /// Which wave this component belongs to; assigned at batch-planning
    /// time.
    pub batch: u32,
    /// Previously built component whose artifact is reused instead of
    /// rebuilding.
    pub reused_component_id: Option<u64>,
    /// Build complexity as estimated by the builder.
    pub weight: f64,
    pub trace: Vec<ComponentTraceEntry>,
}

/// Creation-time parameters for a component build.
#[derive(Debug, Clone)]
pub struct ComponentPlan {
    pub package: String,
    pub scmurl: String,
    pub format: String,
    pub batch: u32,
    pub scm_ref: Option<String>,
    pub buildonly: bool,
    pub build_time_only: bool,
    pub weight: f64,
}

impl ComponentBuild {
    /// Create a component at batch-planning time: unsubmitted, with its
    /// wave already assigned.
    pub fn new(id: u64, module_id: u64, plan: ComponentPlan) -> Self {
        ComponentBuild {
            id,
            module_id,
            package: plan.package,
            scmurl: plan.scmurl,
            format: plan.format,
            task_id: None,
            scm_ref: plan.scm_ref,
            state: None,
            state_reason: None,
            nvr: None,
            tagged: false,
            tagged_in_final: false,
            build_time_only: plan.build_time_only,
            buildonly: plan.buildonly,
            batch: plan.batch,
            reused_component_id: None,
            weight: plan.weight,
            trace: Vec::new(),
        }
    }

    pub fn is_completed(&self) -> bool {
        self.state == Some(ComponentState::Complete)
    }

    pub fn is_building(&self) -> bool {
        self.state == Some(ComponentState::Building)
    }

    pub fn is_failed(&self) -> bool {
        self.state == Some(ComponentState::Failed)
    }

    pub fn is_waiting_for_build(&self) -> bool {
        self.state.is_none()
    }

    pub fn is_unbuilt(&self) -> bool {
        self.is_waiting_for_build() || self.is_building()
    }

    pub fn is_unsuccessful(&self) -> bool {
        matches!(
            self.state,
            Some(ComponentState::Failed) | Some(ComponentState::Canceled)
        )
    }

    pub fn is_tagged(&self) -> bool {
        self.tagged && (self.tagged_in_final || self.build_time_only)
    }

    /// Record a state change reported by the build backend.
    ///
    /// Appends exactly one trace row. Emits a state-changed event only
    /// when the state actually changed, so repeated delivery of the
    /// same backend event is a no-op for observers.
    pub fn transition(
        &mut self,
        state: Option<ComponentState>,
        reason: Option<&str>,
        clock: &impl Clock,
    ) -> Vec<Effect> {
        let now = clock.now();
        let old_state = self.state;
        self.state = state;
        if let Some(reason) = reason {
            self.state_reason = Some(reason.to_string());
        }
        self.trace.push(ComponentTraceEntry {
            state_time: now,
            state,
            reason: reason.map(str::to_string),
            task_id: self.task_id,
        });

        tracing::info!(
            package = %self.package,
            module_id = self.module_id,
            old_state = ?old_state.map(ComponentState::name),
            new_state = ?state.map(ComponentState::name),
            "component state transition"
        );

        if old_state != state {
            vec![Effect::Emit(Event::ComponentStateChanged {
                module_id: self.module_id,
                component_id: self.id,
                old_state,
                new_state: state,
            })]
        } else {
            vec![]
        }
    }

    /// Mark the artifact as tagged into the buildroot.
    pub fn mark_tagged(&mut self) {
        self.tagged = true;
    }

    /// Mark the artifact as tagged into the final tag.
    ///
    /// Rejected for build-time-only components: their artifacts must
    /// never reach the final tag.
    pub fn mark_tagged_in_final(&mut self) -> Result<(), BuildError> {
        if self.build_time_only {
            return Err(BuildError::BuildTimeOnlyTagged {
                package: self.package.clone(),
            });
        }
        self.tagged_in_final = true;
        Ok(())
    }

    /// Reset a terminal component for a rebuild in a fresh batch.
    pub fn reset_for_rebuild(&mut self, new_batch: u32, clock: &impl Clock) -> Vec<Effect> {
        self.task_id = None;
        self.nvr = None;
        self.tagged = false;
        self.tagged_in_final = false;
        self.reused_component_id = None;
        self.batch = new_batch;
        self.transition(None, Some("reset for rebuild"), clock)
    }

    /// All trace rows in stable `state_time` order.
    pub fn state_trace(&self) -> Vec<&ComponentTraceEntry> {
        ordered_by_time(&self.trace, |row| row.state_time)
    }

    /// Export shape consumed by external tooling.
    pub fn json(&self) -> Value {
        json!({
            "id": self.id,
            "package": self.package,
            "format": self.format,
            "task_id": self.task_id,
            "state": self.state.map(ComponentState::code),
            "state_name": self.state.map(ComponentState::name),
            "state_reason": self.state_reason,
            "module_build": self.module_id,
            "nvr": self.nvr,
        })
    }
}

#[cfg(test)]
#[path = "component_tests.rs"]
mod tests;
