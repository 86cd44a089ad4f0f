// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Module build aggregate
//!
//! The aggregate root of the build core: owns its components and its
//! trace, drives batch progression queries, and is mutated exclusively
//! through `transition` and the batch operations so that every state
//! change produces exactly one trace row.
//!
//! Buildrequire links to base modules are weak id references to other
//! aggregates, never ownership; they are resolved through storage.

use crate::clock::{utc_to_iso, Clock};
use crate::component::ComponentBuild;
use crate::context::{Contexts, DEFAULT_MODULE_CONTEXT};
use crate::effect::{Effect, Event};
use crate::error::BuildError;
use crate::manifest::{BuildRequire, Manifest};
use crate::state::{BuildState, ComponentState, FailureType, RebuildStrategy};
use crate::trace::{ordered_by_time, ModuleTraceEntry};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

/// Filter applied to batch queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StateFilter {
    /// Every component.
    Any,
    /// Components in exactly this state (`None` = not yet submitted).
    Exact(Option<ComponentState>),
    /// Components still waiting or building.
    Unbuilt,
    /// Components that failed or were canceled.
    Unsuccessful,
}

impl StateFilter {
    fn matches(self, component: &ComponentBuild) -> bool {
        match self {
            StateFilter::Any => true,
            StateFilter::Exact(state) => component.state == state,
            StateFilter::Unbuilt => component.is_unbuilt(),
            StateFilter::Unsuccessful => component.is_unsuccessful(),
        }
    }
}

/// Creation-time parameters for a module build.
#[derive(Debug, Clone)]
pub struct ModuleRequest {
    pub name: String,
    pub stream: String,
    pub version: String,
    pub modulemd: String,
    pub scmurl: Option<String>,
    pub owner: String,
    pub rebuild_strategy: RebuildStrategy,
    pub scratch: bool,
    pub srpms: Vec<String>,
}

/// A composite build request: one module built from many components.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModuleBuild {
    pub id: u64,
    pub name: String,
    pub stream: String,
    pub version: String,
    /// 8-hex-char derived id; placeholder until the hashes are stamped.
    pub context: String,
    pub build_context: Option<String>,
    pub build_context_no_bms: Option<String>,
    pub runtime_context: Option<String>,
    pub state: BuildState,
    pub state_reason: Option<String>,
    /// Raw manifest the build was submitted with.
    pub modulemd: String,
    /// Backend tag the module builds into; set after `wait`.
    pub koji_tag: Option<String>,
    pub scmurl: Option<String>,
    pub scratch: bool,
    /// Links of custom SRPMs uploaded for scratch builds.
    pub srpms: Vec<String>,
    pub owner: String,
    pub time_submitted: DateTime<Utc>,
    pub time_modified: DateTime<Utc>,
    pub time_completed: Option<DateTime<Utc>>,
    pub rebuild_strategy: RebuildStrategy,
    /// Which wave of components is currently building; 0 = not yet
    /// building.
    pub batch: u32,
    /// Numeric stream version, only meaningful for base modules.
    pub stream_version: Option<f64>,
    /// Previous identical build whose outputs were adopted verbatim.
    pub reused_module_id: Option<u64>,
    /// Base modules this module was built against, in configured
    /// priority order. Weak references, resolved through storage.
    pub buildrequires: Vec<u64>,
    pub components: Vec<ComponentBuild>,
    pub trace: Vec<ModuleTraceEntry>,
}

impl ModuleBuild {
    /// Create a module build in state `init` with the placeholder
    /// context. Storage assigns the id on insert.
    pub fn create(request: ModuleRequest, clock: &impl Clock) -> Self {
        let now = clock.now();
        let state = BuildState::Init;
        ModuleBuild {
            id: 0,
            name: request.name,
            stream: request.stream,
            version: request.version,
            context: DEFAULT_MODULE_CONTEXT.to_string(),
            build_context: None,
            build_context_no_bms: None,
            runtime_context: None,
            state,
            state_reason: None,
            modulemd: request.modulemd,
            koji_tag: None,
            scmurl: request.scmurl,
            scratch: request.scratch,
            srpms: request.srpms,
            owner: request.owner,
            time_submitted: now,
            time_modified: now,
            time_completed: None,
            rebuild_strategy: request.rebuild_strategy,
            batch: 0,
            stream_version: None,
            reused_module_id: None,
            buildrequires: Vec::new(),
            components: Vec::new(),
            trace: vec![ModuleTraceEntry {
                state_time: now,
                state,
                reason: None,
            }],
        }
    }

    /// Stamp the context hashes computed at creation time.
    pub fn stamp_contexts(&mut self, contexts: &Contexts) {
        self.build_context = Some(contexts.build_context.clone());
        self.build_context_no_bms = Some(contexts.build_context_no_bms.clone());
        self.runtime_context = Some(contexts.runtime_context.clone());
        self.context = contexts.context.clone();
    }

    /// The parsed manifest this build was submitted with.
    pub fn manifest(&self) -> Result<Manifest, BuildError> {
        Manifest::parse(&self.modulemd)
    }

    /// Record that this build has transitioned state.
    ///
    /// Appends exactly one trace row per call; re-affirming the current
    /// state is legal (e.g. to update the reason) but only an actual
    /// change emits the notification effect, so the gateway sees at
    /// most one outbound event per real transition.
    pub fn transition(
        &mut self,
        new_state: BuildState,
        reason: Option<&str>,
        failure_type: FailureType,
        clock: &impl Clock,
    ) -> Vec<Effect> {
        let now = clock.now();
        let old_state = self.state;
        self.state = new_state;
        self.time_modified = now;

        let mut effects = Vec::new();
        match new_state {
            BuildState::Done => {
                self.time_completed = Some(now);
                effects.push(Effect::Emit(Event::ModuleSucceeded { module_id: self.id }));
            }
            BuildState::Failed => {
                self.time_completed = Some(now);
                effects.push(Effect::Emit(Event::ModuleFailed {
                    module_id: self.id,
                    failure_type,
                }));
            }
            _ => {}
        }

        if let Some(reason) = reason {
            self.state_reason = Some(reason.to_string());
        }

        self.trace.push(ModuleTraceEntry {
            state_time: now,
            state: new_state,
            reason: reason.map(str::to_string),
        });

        tracing::info!(
            module = %self.nsvc(),
            old_state = old_state.name(),
            new_state = new_state.name(),
            "module state transition"
        );

        if old_state != new_state {
            effects.push(Effect::Emit(Event::ModuleStateChanged {
                module_id: self.id,
                old_state,
                new_state,
            }));
            effects.push(Effect::Notify { module_id: self.id });
        }
        effects
    }

    /// All components of this module in the current batch.
    ///
    /// Fails when no batch is in progress.
    pub fn current_batch(&self, filter: StateFilter) -> Result<Vec<&ComponentBuild>, BuildError> {
        if self.batch == 0 {
            return Err(BuildError::NoBatchInProgress(self.batch));
        }
        Ok(self
            .components
            .iter()
            .filter(|c| c.batch == self.batch && filter.matches(c))
            .collect())
    }

    /// All components of this module in the current batch and in the
    /// previous batches.
    pub fn up_to_current_batch(
        &self,
        filter: StateFilter,
    ) -> Result<Vec<&ComponentBuild>, BuildError> {
        if self.batch == 0 {
            return Err(BuildError::NoBatchInProgress(self.batch));
        }
        Ok(self
            .components
            .iter()
            .filter(|c| c.batch <= self.batch && filter.matches(c))
            .collect())
    }

    /// The highest batch number any component is planned into,
    /// independent of the module's own batch counter.
    pub fn last_batch_id(&self) -> u32 {
        self.components.iter().map(|c| c.batch).max().unwrap_or(0)
    }

    pub fn component(&self, package: &str) -> Option<&ComponentBuild> {
        self.components.iter().find(|c| c.package == package)
    }

    pub fn component_mut(&mut self, package: &str) -> Option<&mut ComponentBuild> {
        self.components.iter_mut().find(|c| c.package == package)
    }

    /// The last trace state that was not `failed`.
    pub fn previous_non_failed_state(&self) -> Option<BuildState> {
        self.trace
            .iter()
            .rev()
            .map(|row| row.state)
            .find(|state| *state != BuildState::Failed)
    }

    /// All trace rows in stable `state_time` order.
    pub fn state_trace(&self) -> Vec<&ModuleTraceEntry> {
        ordered_by_time(&self.trace, |row| row.state_time)
    }

    pub fn nsvc(&self) -> String {
        format!(
            "{}:{}:{}:{}",
            self.name, self.stream, self.version, self.context
        )
    }

    /// NVR mapping of the module build: the stream becomes the version
    /// (dashes replaced) and version.context becomes the release.
    pub fn nvr(&self) -> Value {
        json!({
            "name": self.name,
            "version": self.stream.replace('-', "_"),
            "release": format!("{}.{}", self.version, self.context),
        })
    }

    pub fn nvr_string(&self) -> String {
        format!(
            "{}-{}-{}.{}",
            self.name,
            self.stream.replace('-', "_"),
            self.version,
            self.context
        )
    }

    /// Short export shape.
    pub fn short_json(&self, show_stream_version: bool, show_scratch: bool) -> Value {
        let mut rv = json!({
            "id": self.id,
            "state": self.state.ordinal(),
            "state_name": self.state.name(),
            "stream": self.stream,
            "version": self.version,
            "name": self.name,
            "context": self.context,
        });
        if show_stream_version {
            rv["stream_version"] = json!(self.stream_version);
        }
        if show_scratch {
            rv["scratch"] = json!(self.scratch);
        }
        rv
    }

    /// Full export shape. `siblings` are the ids of other builds
    /// sharing name/stream/version/scratch, supplied by storage.
    pub fn json(&self, siblings: &[u64]) -> Result<Value, BuildError> {
        let manifest = self.manifest()?;
        let mut rv = self.short_json(false, true);
        rv["component_builds"] = json!(self
            .components
            .iter()
            .map(|c| c.id)
            .collect::<Vec<_>>());
        rv["koji_tag"] = json!(self.koji_tag);
        rv["owner"] = json!(self.owner);
        rv["rebuild_strategy"] = json!(self.rebuild_strategy.as_str());
        rv["scmurl"] = json!(self.scmurl);
        rv["srpms"] = json!(self.srpms);
        rv["siblings"] = json!(siblings);
        rv["state_reason"] = json!(self.state_reason);
        rv["time_completed"] = json!(utc_to_iso(self.time_completed));
        rv["time_modified"] = json!(utc_to_iso(Some(self.time_modified)));
        rv["time_submitted"] = json!(utc_to_iso(Some(self.time_submitted)));
        rv["buildrequires"] = manifest.buildrequires_overview();
        Ok(rv)
    }
}

/// The declared subset of the configured base module names, in priority
/// order, with their NSVC records from the expanded buildrequires.
///
/// A base module name that is simply not declared is skipped; a
/// manifest without the expansion section is an error.
pub fn declared_base_modules(
    manifest: &Manifest,
    base_module_names: &[String],
) -> Result<Vec<(String, BuildRequire)>, BuildError> {
    let buildrequires = manifest.expanded_buildrequires()?;
    Ok(base_module_names
        .iter()
        .filter_map(|name| {
            buildrequires
                .get(name)
                .map(|req| (name.clone(), req.clone()))
        })
        .collect())
}

#[cfg(test)]
#[path = "module_tests.rs"]
mod tests;
