// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Many-to-many tag registries attached to module builds
//!
//! Virtual streams are garbage-collected when the last referencing
//! module detaches; arches are reusable reference tags and stay around.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// Result of a diff-then-apply registry update.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TagDiff {
    /// Names newly associated with the module.
    pub added: Vec<String>,
    /// Names the module was detached from.
    pub removed: Vec<String>,
    /// Names whose rows were deleted because no module references them
    /// anymore.
    pub deleted: Vec<String>,
}

/// A name <-> module many-to-many registry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TagRegistry {
    gc_on_detach: bool,
    tags: BTreeMap<String, BTreeSet<u64>>,
}

impl TagRegistry {
    /// Registry that deletes a tag row once it is orphaned.
    pub fn with_gc() -> Self {
        TagRegistry {
            gc_on_detach: true,
            tags: BTreeMap::new(),
        }
    }

    /// Registry that keeps orphaned tag rows for reuse.
    pub fn keep_orphans() -> Self {
        TagRegistry {
            gc_on_detach: false,
            tags: BTreeMap::new(),
        }
    }

    /// Replace a module's tag set with `names`.
    ///
    /// Computes the difference against the current associations and
    /// applies it: added names are looked up or created, dropped names
    /// are detached and, for a GC registry, deleted once orphaned.
    pub fn update(&mut self, module_id: u64, names: &[String]) -> TagDiff {
        let current: BTreeSet<String> = self.names_for(module_id).into_iter().collect();
        let desired: BTreeSet<String> = names.iter().cloned().collect();

        let mut diff = TagDiff::default();
        for name in desired.difference(&current) {
            self.tags
                .entry(name.clone())
                .or_default()
                .insert(module_id);
            diff.added.push(name.clone());
        }
        for name in current.difference(&desired) {
            if let Some(members) = self.tags.get_mut(name) {
                members.remove(&module_id);
                if members.is_empty() && self.gc_on_detach {
                    self.tags.remove(name);
                    diff.deleted.push(name.clone());
                }
            }
            diff.removed.push(name.clone());
        }
        diff
    }

    /// Whether a tag row with this name exists.
    pub fn contains(&self, name: &str) -> bool {
        self.tags.contains_key(name)
    }

    /// Tag names associated with a module, sorted.
    pub fn names_for(&self, module_id: u64) -> Vec<String> {
        self.tags
            .iter()
            .filter(|(_, members)| members.contains(&module_id))
            .map(|(name, _)| name.clone())
            .collect()
    }

    /// Module ids associated with a tag name.
    pub fn members(&self, name: &str) -> Vec<u64> {
        self.tags
            .get(name)
            .map(|members| members.iter().copied().collect())
            .unwrap_or_default()
    }
}

#[cfg(test)]
#[path = "registry_tests.rs"]
mod tests;
