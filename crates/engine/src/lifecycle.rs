// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Module build lifecycle: submission and batch planning
//!
//! `submit` turns a request into a stored module build with its
//! context hashes stamped and its base modules resolved. `begin_build`
//! consumes the batch plan produced by the (external) scheduler and
//! starts the first wave.

use crate::error::EngineError;
use modforge_core::{
    contexts_from_manifest, get_stream_version, BuildState, Clock, ComponentBuild, ComponentPlan,
    Config, FailureType, ModuleBuild, ModuleRequest, Notifier,
};
use modforge_storage::{Store, StoreError};

/// Submit a module build request.
///
/// Parses the manifest, computes the context hashes and stream
/// version, resolves the declared base modules, and inserts the build
/// in state `init`. An NSVC conflict means an identical build was
/// submitted concurrently; the lookup is retried once in a fresh
/// transaction and the existing build is adopted.
pub fn submit(
    store: &Store,
    notifier: &dyn Notifier,
    config: &Config,
    clock: &impl Clock,
    request: ModuleRequest,
) -> Result<u64, EngineError> {
    let suffixes = config.compiled_stream_suffixes()?;
    let mut module = ModuleBuild::create(request, clock);
    let manifest = module.manifest()?;
    let contexts = contexts_from_manifest(&manifest, &config.base_module_names)?;
    module.stamp_contexts(&contexts);
    module.stream_version = get_stream_version(&module.stream, true, &suffixes);
    let nsvc = module.nsvc();

    let inserted = store.transaction(notifier, |txn| {
        let resolution = txn.resolve_base_modules(&manifest, &config.base_module_names)?;
        module.buildrequires = resolution.resolved.clone();
        txn.insert_module(module.clone())
    });

    match inserted {
        Ok(id) => Ok(id),
        Err(StoreError::BuildExists { .. }) => {
            tracing::warn!(%nsvc, "build already exists, adopting it");
            let adopted = store.transaction(notifier, |txn| {
                Ok(parse_nsvc(&nsvc)
                    .and_then(|(n, s, v, c)| txn.get_build_from_nsvc(n, s, v, c))
                    .map(|m| m.id))
            })?;
            adopted.ok_or(EngineError::AdoptionFailed { nsvc })
        }
        Err(e) => Err(e.into()),
    }
}

fn parse_nsvc(nsvc: &str) -> Option<(&str, &str, &str, &str)> {
    let mut parts = nsvc.splitn(4, ':');
    Some((parts.next()?, parts.next()?, parts.next()?, parts.next()?))
}

/// Start building a module from its batch plan.
///
/// Creates the component builds with their assigned waves, stamps the
/// backend tag, transitions the module to `build` with batch 1, and
/// returns the packages of the first wave for submission. A module
/// planned without components completes immediately.
pub fn begin_build(
    store: &Store,
    notifier: &dyn Notifier,
    clock: &impl Clock,
    module_id: u64,
    plans: Vec<ComponentPlan>,
) -> Result<Vec<String>, EngineError> {
    let planned = store.transaction(notifier, |txn| {
        let (state, tag) = {
            let module = txn.module(module_id)?;
            (module.state, koji_tag_for(module))
        };
        if !matches!(state, BuildState::Init | BuildState::Wait) {
            return Ok(Err(state));
        }

        let components: Vec<ComponentBuild> = plans
            .iter()
            .map(|plan| {
                let id = txn.next_component_id();
                ComponentBuild::new(id, module_id, plan.clone())
            })
            .collect();

        let module = txn.module_mut(module_id)?;
        if module.koji_tag.is_none() {
            module.koji_tag = Some(tag);
        }
        module.components = components;

        if plans.is_empty() {
            txn.transition_module(module_id, BuildState::Build, None, FailureType::Unspec, clock)?;
            txn.transition_module(
                module_id,
                BuildState::Done,
                Some("Completed building all components"),
                FailureType::Unspec,
                clock,
            )?;
            return Ok(Ok(Vec::new()));
        }

        txn.module_mut(module_id)?.batch = 1;
        txn.transition_module(module_id, BuildState::Build, None, FailureType::Unspec, clock)?;

        let module = txn.module(module_id)?;
        let first_wave = module
            .components
            .iter()
            .filter(|c| c.batch == 1)
            .map(|c| c.package.clone())
            .collect();
        Ok(Ok(first_wave))
    })?;
    planned.map_err(|state| EngineError::NotStartable {
        module_id,
        state: state.name().to_string(),
    })
}

fn koji_tag_for(module: &ModuleBuild) -> String {
    format!(
        "module-{}-{}-{}-{}",
        module.name, module.stream, module.version, module.context
    )
}

#[cfg(test)]
#[path = "lifecycle_tests.rs"]
mod tests;
