// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Transactional store for module builds
//!
//! An in-memory relational-style store with the query surface the build
//! core needs: NSVC lookup, koji-tag lookup, latest-per-stream queries
//! with version-as-big-integer ordering, state and virtual-stream
//! filters, and the registry join tables.
//!
//! Mutations run inside `transaction`: the closure operates on a staged
//! copy of the tables, a returned error discards the staging, and a
//! successful commit swaps it in. Notification snapshots accumulated
//! during the transaction form the outbox and reach the notifier only
//! after the swap, so a rolled-back transition is never announced. The
//! store-wide lock also serializes the batch-advance and registry
//! updates of concurrent event handlers.

use crate::registry::{TagDiff, TagRegistry};
use modforge_core::{
    declared_base_modules, BuildError, BuildState, Clock, ComponentState, Effect, FailureType,
    Manifest, ModuleBuild, Notifier,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::Path;
use std::sync::Mutex;

/// Errors that can occur in store operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("module build {0} not found")]
    ModuleNotFound(u64),

    #[error("component {package} of module {module_id} not found")]
    ComponentNotFound { module_id: u64, package: String },

    #[error("module build already exists for {nsvc}")]
    BuildExists { nsvc: String },

    #[error("task {task_id} already assigned in module {module_id}")]
    TaskIdExists { module_id: u64, task_id: u64 },

    #[error("{count} module builds in flight for {tag}")]
    AmbiguousTag { tag: String, count: usize },

    #[error(transparent)]
    Build(#[from] BuildError),

    #[error("store io: {0}")]
    Io(#[from] std::io::Error),

    #[error("store encoding: {0}")]
    Encoding(#[from] serde_json::Error),
}

/// Outcome of resolving a module's declared base modules.
///
/// Unresolvable declared base modules degrade the result instead of
/// aborting it, but the caller can see the list is incomplete.
#[derive(Debug, Clone, Default)]
pub struct BaseModuleResolution {
    /// Resolved base module ids, in configured priority order.
    pub resolved: Vec<u64>,
    /// Declared base module names that could not be resolved.
    pub missing: Vec<String>,
}

impl BaseModuleResolution {
    pub fn is_complete(&self) -> bool {
        self.missing.is_empty()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct Tables {
    modules: BTreeMap<u64, ModuleBuild>,
    next_module_id: u64,
    next_component_id: u64,
    virtual_streams: TagRegistry,
    arches: TagRegistry,
}

impl Default for Tables {
    fn default() -> Self {
        Tables {
            modules: BTreeMap::new(),
            next_module_id: 1,
            next_component_id: 1,
            virtual_streams: TagRegistry::with_gc(),
            arches: TagRegistry::keep_orphans(),
        }
    }
}

/// The shared store. One logical operation = one transaction.
#[derive(Debug, Default)]
pub struct Store {
    tables: Mutex<Tables>,
}

fn version_as_int(version: &str) -> u64 {
    version.parse().unwrap_or(0)
}

impl Store {
    pub fn new() -> Self {
        Self::default()
    }

    /// Run one logical operation against a staged copy of the tables.
    ///
    /// On success the staging is committed and the accumulated outbox
    /// is flushed to the notifier; on error both are discarded.
    pub fn transaction<T>(
        &self,
        notifier: &dyn Notifier,
        f: impl FnOnce(&mut Txn<'_>) -> Result<T, StoreError>,
    ) -> Result<T, StoreError> {
        let mut guard = self.tables.lock().unwrap_or_else(|e| e.into_inner());
        let mut staged = guard.clone();
        let (result, outbox) = {
            let mut txn = Txn {
                tables: &mut staged,
                outbox: Vec::new(),
            };
            let result = f(&mut txn);
            (result, txn.outbox)
        };
        match result {
            Ok(value) => {
                *guard = staged;
                drop(guard);
                for snapshot in outbox {
                    notifier.put(snapshot);
                }
                Ok(value)
            }
            Err(e) => Err(e),
        }
    }

    /// Persist a snapshot of the tables as JSON.
    pub fn save(&self, path: &Path) -> Result<(), StoreError> {
        let guard = self.tables.lock().unwrap_or_else(|e| e.into_inner());
        let file = File::create(path)?;
        serde_json::to_writer_pretty(BufWriter::new(file), &*guard)?;
        Ok(())
    }

    /// Load a previously saved snapshot.
    pub fn load(path: &Path) -> Result<Self, StoreError> {
        let file = File::open(path)?;
        let tables: Tables = serde_json::from_reader(BufReader::new(file))?;
        Ok(Store {
            tables: Mutex::new(tables),
        })
    }
}

/// One in-flight transaction against the store.
pub struct Txn<'a> {
    tables: &'a mut Tables,
    outbox: Vec<Value>,
}

impl Txn<'_> {
    /// Insert a new module build, assigning its id.
    ///
    /// The `(name, stream, version, context)` key is unique; an insert
    /// conflict means someone else already created the canonical build
    /// and callers should adopt it instead of treating this as fatal.
    pub fn insert_module(&mut self, mut module: ModuleBuild) -> Result<u64, StoreError> {
        if self
            .get_build_from_nsvc(&module.name, &module.stream, &module.version, &module.context)
            .is_some()
        {
            return Err(StoreError::BuildExists {
                nsvc: module.nsvc(),
            });
        }
        let id = self.tables.next_module_id;
        self.tables.next_module_id += 1;
        module.id = id;
        for component in &mut module.components {
            component.module_id = id;
        }
        self.tables.modules.insert(id, module);
        Ok(id)
    }

    pub fn module(&self, id: u64) -> Result<&ModuleBuild, StoreError> {
        self.tables
            .modules
            .get(&id)
            .ok_or(StoreError::ModuleNotFound(id))
    }

    /// Mutable access to a module build. Mutations of `state` must go
    /// through `transition_module` so the trace and the outbox stay
    /// consistent.
    pub fn module_mut(&mut self, id: u64) -> Result<&mut ModuleBuild, StoreError> {
        self.tables
            .modules
            .get_mut(&id)
            .ok_or(StoreError::ModuleNotFound(id))
    }

    /// Allocate an id for a new component build.
    pub fn next_component_id(&mut self) -> u64 {
        let id = self.tables.next_component_id;
        self.tables.next_component_id += 1;
        id
    }

    /// Lookup by exact NSVC.
    pub fn get_build_from_nsvc(
        &self,
        name: &str,
        stream: &str,
        version: &str,
        context: &str,
    ) -> Option<&ModuleBuild> {
        self.tables.modules.values().find(|m| {
            m.name == name && m.stream == stream && m.version == version && m.context == context
        })
    }

    /// Lookup by the koji-like backend tag; accepts the `-build`
    /// variant of the tag. More than one in-flight build for one tag is
    /// a data-integrity error.
    pub fn get_build_by_koji_tag(&self, tag: &str) -> Result<Option<&ModuleBuild>, StoreError> {
        let tag = tag.strip_suffix("-build").unwrap_or(tag);
        let matches: Vec<&ModuleBuild> = self
            .tables
            .modules
            .values()
            .filter(|m| m.koji_tag.as_deref() == Some(tag) && m.state == BuildState::Build)
            .collect();
        if matches.len() > 1 {
            return Err(StoreError::AmbiguousTag {
                tag: tag.to_string(),
                count: matches.len(),
            });
        }
        Ok(matches.into_iter().next())
    }

    /// All module builds in the given state.
    pub fn by_state(&self, state: BuildState) -> Vec<&ModuleBuild> {
        self.tables
            .modules
            .values()
            .filter(|m| m.state == state)
            .collect()
    }

    /// The latest `ready` build for name:stream, ordering versions as
    /// big integers rather than strings.
    pub fn last_build_in_stream(&self, name: &str, stream: &str) -> Option<&ModuleBuild> {
        self.tables
            .modules
            .values()
            .filter(|m| m.name == name && m.stream == stream && m.state == BuildState::Ready)
            .max_by_key(|m| (version_as_int(&m.version), m.id))
    }

    /// All latest `ready` builds for name:stream: every context of the
    /// greatest version, optionally restricted to virtual-stream
    /// membership.
    pub fn last_builds_in_stream(
        &self,
        name: &str,
        stream: &str,
        virtual_streams: Option<&[String]>,
    ) -> Vec<&ModuleBuild> {
        let candidates: Vec<&ModuleBuild> = self
            .tables
            .modules
            .values()
            .filter(|m| m.name == name && m.stream == stream && m.state == BuildState::Ready)
            .filter(|m| self.matches_virtual_streams(m.id, virtual_streams))
            .collect();
        let max_version = candidates
            .iter()
            .map(|m| version_as_int(&m.version))
            .max();
        match max_version {
            Some(max) => candidates
                .into_iter()
                .filter(|m| version_as_int(&m.version) == max)
                .collect(),
            None => Vec::new(),
        }
    }

    /// Latest builds per name:stream with the stream version limited to
    /// the `XX0000 <= v <= XXYYZZ` window of the given stream version.
    pub fn last_builds_in_stream_version_lte(
        &self,
        name: &str,
        stream_version: Option<f64>,
        virtual_streams: Option<&[String]>,
        states: Option<&[BuildState]>,
    ) -> Vec<&ModuleBuild> {
        let states = states.unwrap_or(&[BuildState::Ready]);
        let mut builds: Vec<&ModuleBuild> = self
            .tables
            .modules
            .values()
            .filter(|m| m.name == name && states.contains(&m.state))
            .filter(|m| match (stream_version, m.stream_version) {
                (None, _) => true,
                (Some(limit), Some(v)) => {
                    let min = (limit / 10000.0).trunc() * 10000.0;
                    v >= min && v <= limit
                }
                (Some(_), None) => false,
            })
            .filter(|m| self.matches_virtual_streams(m.id, virtual_streams))
            .collect();
        builds.sort_by(|a, b| {
            version_as_int(&b.version)
                .cmp(&version_as_int(&a.version))
                .then(a.id.cmp(&b.id))
        });

        // Keep only the greatest version of each name:stream, but all
        // contexts of that version.
        let mut seen: BTreeMap<String, &str> = BTreeMap::new();
        let mut ret = Vec::new();
        for build in builds {
            let ns = format!("{}:{}", build.name, build.stream);
            match seen.get(&ns) {
                Some(version) if *version != build.version => continue,
                Some(_) => ret.push(build),
                None => {
                    seen.insert(ns, &build.version);
                    ret.push(build);
                }
            }
        }
        ret
    }

    fn matches_virtual_streams(&self, module_id: u64, filter: Option<&[String]>) -> bool {
        match filter {
            None => true,
            Some(names) if names.is_empty() => true,
            Some(names) => names
                .iter()
                .any(|name| self.tables.virtual_streams.members(name).contains(&module_id)),
        }
    }

    /// Ids of other builds sharing name/stream/version/scratch.
    pub fn siblings(&self, module: &ModuleBuild) -> Vec<u64> {
        self.tables
            .modules
            .values()
            .filter(|m| {
                m.id != module.id
                    && m.name == module.name
                    && m.stream == module.stream
                    && m.version == module.version
                    && m.scratch == module.scratch
            })
            .map(|m| m.id)
            .collect()
    }

    /// Transition a module build, enqueueing the change notification
    /// into the transaction's outbox.
    pub fn transition_module(
        &mut self,
        id: u64,
        state: BuildState,
        reason: Option<&str>,
        failure_type: FailureType,
        clock: &impl Clock,
    ) -> Result<Vec<modforge_core::Event>, StoreError> {
        let effects = {
            let module = self.module_mut(id)?;
            module.transition(state, reason, failure_type, clock)
        };
        self.apply_effects(effects)
    }

    /// Record a component state change reported by the build backend.
    pub fn transition_component(
        &mut self,
        module_id: u64,
        package: &str,
        state: Option<ComponentState>,
        reason: Option<&str>,
        nvr: Option<&str>,
        clock: &impl Clock,
    ) -> Result<Vec<modforge_core::Event>, StoreError> {
        let effects = {
            let module = self.module_mut(module_id)?;
            let component =
                module
                    .component_mut(package)
                    .ok_or_else(|| StoreError::ComponentNotFound {
                        module_id,
                        package: package.to_string(),
                    })?;
            if let Some(nvr) = nvr {
                component.nvr = Some(nvr.to_string());
            }
            component.transition(state, reason, clock)
        };
        self.apply_effects(effects)
    }

    fn apply_effects(
        &mut self,
        effects: Vec<Effect>,
    ) -> Result<Vec<modforge_core::Event>, StoreError> {
        let mut events = Vec::new();
        for effect in effects {
            match effect {
                Effect::Emit(event) => events.push(event),
                Effect::Notify { module_id } => {
                    let module = self.module(module_id)?;
                    let siblings = self.siblings(module);
                    let snapshot = module.json(&siblings)?;
                    self.outbox.push(snapshot);
                }
            }
        }
        Ok(events)
    }

    /// Find the component a backend task id belongs to.
    pub fn component_by_task(&self, task_id: u64) -> Option<(u64, String)> {
        self.tables.modules.values().find_map(|m| {
            m.components
                .iter()
                .find(|c| c.task_id == Some(task_id))
                .map(|c| (m.id, c.package.clone()))
        })
    }

    /// Assign a backend task id to a component. `(module, task_id)` is
    /// unique.
    pub fn assign_task(
        &mut self,
        module_id: u64,
        package: &str,
        task_id: u64,
    ) -> Result<(), StoreError> {
        {
            let module = self.module(module_id)?;
            if module
                .components
                .iter()
                .any(|c| c.task_id == Some(task_id) && c.package != package)
            {
                return Err(StoreError::TaskIdExists { module_id, task_id });
            }
        }
        let module = self.module_mut(module_id)?;
        let component = module
            .component_mut(package)
            .ok_or_else(|| StoreError::ComponentNotFound {
                module_id,
                package: package.to_string(),
            })?;
        component.task_id = Some(task_id);
        Ok(())
    }

    /// Resolve the declared base modules of a manifest against storage.
    ///
    /// A declared base module that cannot be resolved signals that the
    /// manifest was not properly expanded before persisting; it is
    /// logged and skipped so the remaining base modules still resolve,
    /// but the result reports the list as incomplete.
    pub fn resolve_base_modules(
        &self,
        manifest: &Manifest,
        base_module_names: &[String],
    ) -> Result<BaseModuleResolution, StoreError> {
        let mut resolution = BaseModuleResolution::default();
        for (name, req) in declared_base_modules(manifest, base_module_names)? {
            match self.get_build_from_nsvc(&name, &req.stream, &req.version, &req.context) {
                Some(base) => resolution.resolved.push(base.id),
                None => {
                    tracing::error!(
                        base_module = %name,
                        stream = %req.stream,
                        version = %req.version,
                        context = %req.context,
                        "declared base module buildrequire not found in storage"
                    );
                    resolution.missing.push(name);
                }
            }
        }
        Ok(resolution)
    }

    /// Replace a module's virtual streams; orphaned stream rows are
    /// deleted.
    pub fn update_virtual_streams(
        &mut self,
        module_id: u64,
        names: &[String],
    ) -> Result<TagDiff, StoreError> {
        self.module(module_id)?;
        Ok(self.tables.virtual_streams.update(module_id, names))
    }

    /// Replace a module's arch tags; arch rows are kept for reuse.
    pub fn set_arches(&mut self, module_id: u64, names: &[String]) -> Result<TagDiff, StoreError> {
        self.module(module_id)?;
        Ok(self.tables.arches.update(module_id, names))
    }

    pub fn virtual_stream_exists(&self, name: &str) -> bool {
        self.tables.virtual_streams.contains(name)
    }

    pub fn virtual_streams_of(&self, module_id: u64) -> Vec<String> {
        self.tables.virtual_streams.names_for(module_id)
    }

    pub fn arch_exists(&self, name: &str) -> bool {
        self.tables.arches.contains(name)
    }

    pub fn arches_of(&self, module_id: u64) -> Vec<String> {
        self.tables.arches.names_for(module_id)
    }
}

#[cfg(test)]
#[path = "store_tests.rs"]
mod tests;
