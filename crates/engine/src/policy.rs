// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Failure tolerance policy
//!
//! Decides whether an unsuccessful component build may be tolerated
//! without failing the whole module. The tolerance rules are keyed by
//! rebuild strategy and kept behind a trait so deployments can confirm
//! them against their scheduler's actual behavior.

use modforge_core::{ComponentBuild, Config, RebuildStrategy};

/// Per-component failure tolerance, keyed by the module's rebuild
/// strategy.
pub trait FailurePolicy: Send + Sync {
    fn tolerates(&self, strategy: RebuildStrategy, component: &ComponentBuild) -> bool;
}

/// Default tolerance rules.
///
/// A full rebuild tolerates no failures. The incremental strategies
/// may tolerate failures of components whose artifacts were reused
/// from a previous build (the failure pre-existed and this build did
/// not touch the component), gated by configuration.
#[derive(Debug, Clone)]
pub struct DefaultPolicy {
    tolerate_reused: bool,
}

impl DefaultPolicy {
    pub fn new(tolerate_reused: bool) -> Self {
        DefaultPolicy { tolerate_reused }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(config.tolerate_reused_failures)
    }
}

impl FailurePolicy for DefaultPolicy {
    fn tolerates(&self, strategy: RebuildStrategy, component: &ComponentBuild) -> bool {
        match strategy {
            RebuildStrategy::All => false,
            RebuildStrategy::OnlyChanged | RebuildStrategy::ChangedAndAfter => {
                self.tolerate_reused && component.reused_component_id.is_some()
            }
        }
    }
}

#[cfg(test)]
#[path = "policy_tests.rs"]
mod tests;
