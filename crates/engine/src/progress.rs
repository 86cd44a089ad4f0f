// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Batch progression
//!
//! Maps build-backend component events onto the owning module and
//! re-evaluates the current wave: advance the batch when the wave is
//! fully resolved and later waves exist, finish the module when none
//! remain. The whole evaluation runs inside one store transaction, so
//! two concurrent completion events for the same module cannot both
//! decide to advance, and re-running the evaluation without new events
//! never double-advances.

use crate::error::EngineError;
use crate::policy::FailurePolicy;
use modforge_core::{
    BuildState, Clock, ComponentState, Event, FailureType, Notifier, StateFilter,
};
use modforge_storage::{Store, StoreError, Txn};

/// A component completion/failure report from the build backend.
#[derive(Debug, Clone)]
pub struct ComponentEvent {
    pub task_id: u64,
    pub package: String,
    pub state: ComponentState,
    pub nvr: Option<String>,
    pub reason: Option<String>,
}

/// What the evaluation decided for the module.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    /// The current wave still has unbuilt components.
    InProgress,
    /// The wave resolved; the next one should be submitted.
    BatchAdvanced { batch: u32, submissions: Vec<String> },
    /// Every wave resolved successfully.
    Done,
    /// An intolerable component failure failed the module.
    Failed { reason: String },
}

/// The committed result of processing one backend event.
#[derive(Debug, Clone)]
pub struct Progress {
    pub outcome: Outcome,
    pub events: Vec<Event>,
}

/// Apply one backend component event and re-evaluate the module.
///
/// Duplicate delivery of an already-applied event records a trace row
/// but changes nothing else; the re-evaluation is idempotent.
pub fn on_component_event(
    store: &Store,
    notifier: &dyn Notifier,
    policy: &dyn FailurePolicy,
    clock: &impl Clock,
    module_id: u64,
    event: &ComponentEvent,
) -> Result<Progress, EngineError> {
    let progress = store.transaction(notifier, |txn| {
        txn.assign_task(module_id, &event.package, event.task_id)?;
        let mut events = txn.transition_component(
            module_id,
            &event.package,
            Some(event.state),
            event.reason.as_deref(),
            event.nvr.as_deref(),
            clock,
        )?;
        let outcome = evaluate(txn, policy, clock, module_id, &mut events)?;
        Ok(Progress { outcome, events })
    })?;
    Ok(progress)
}

/// Re-evaluate a module's current wave without a new backend event.
pub fn evaluate_module(
    store: &Store,
    notifier: &dyn Notifier,
    policy: &dyn FailurePolicy,
    clock: &impl Clock,
    module_id: u64,
) -> Result<Progress, EngineError> {
    let progress = store.transaction(notifier, |txn| {
        let mut events = Vec::new();
        let outcome = evaluate(txn, policy, clock, module_id, &mut events)?;
        Ok(Progress { outcome, events })
    })?;
    Ok(progress)
}

fn evaluate(
    txn: &mut Txn<'_>,
    policy: &dyn FailurePolicy,
    clock: &impl Clock,
    module_id: u64,
    events: &mut Vec<Event>,
) -> Result<Outcome, StoreError> {
    loop {
        struct Wave {
            unbuilt: usize,
            intolerable: Vec<String>,
            last_batch: u32,
            batch: u32,
        }

        let wave = {
            let module = txn.module(module_id)?;
            if module.state != BuildState::Build || module.batch == 0 {
                return Ok(Outcome::InProgress);
            }
            let strategy = module.rebuild_strategy;
            Wave {
                unbuilt: module.current_batch(StateFilter::Unbuilt)?.len(),
                intolerable: module
                    .up_to_current_batch(StateFilter::Unsuccessful)?
                    .into_iter()
                    .filter(|c| !policy.tolerates(strategy, c))
                    .map(|c| c.package.clone())
                    .collect(),
                last_batch: module.last_batch_id(),
                batch: module.batch,
            }
        };

        if wave.unbuilt > 0 {
            return Ok(Outcome::InProgress);
        }

        if !wave.intolerable.is_empty() {
            let reason = format!(
                "Component(s) {} failed to build.",
                wave.intolerable.join(", ")
            );
            events.extend(txn.transition_module(
                module_id,
                BuildState::Failed,
                Some(&reason),
                FailureType::User,
                clock,
            )?);
            return Ok(Outcome::Failed { reason });
        }

        if wave.last_batch > wave.batch {
            let next = wave.batch + 1;
            txn.module_mut(module_id)?.batch = next;
            events.push(Event::BatchAdvanced {
                module_id,
                batch: next,
            });
            tracing::info!(module_id, batch = next, "batch advanced");

            let submissions: Vec<String> = txn
                .module(module_id)?
                .current_batch(StateFilter::Exact(None))?
                .into_iter()
                .map(|c| c.package.clone())
                .collect();
            if submissions.is_empty() {
                // Every component of the new wave is already resolved
                // (reused artifacts); keep evaluating.
                continue;
            }
            return Ok(Outcome::BatchAdvanced {
                batch: next,
                submissions,
            });
        }

        events.extend(txn.transition_module(
            module_id,
            BuildState::Done,
            Some("Completed building all components"),
            FailureType::Unspec,
            clock,
        )?);
        return Ok(Outcome::Done);
    }
}

#[cfg(test)]
#[path = "progress_tests.rs"]
mod tests;
