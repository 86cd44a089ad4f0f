// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Error types for the build engine

use modforge_core::BuildError;
use modforge_storage::StoreError;
use thiserror::Error;

/// Errors that can occur in engine operations.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Build(#[from] BuildError),

    /// The insert conflicted and the conflicting row could not be
    /// found on the retry read.
    #[error("build {nsvc} conflicted on insert but could not be adopted")]
    AdoptionFailed { nsvc: String },

    #[error("module build {module_id} cannot start building from state {state}")]
    NotStartable { module_id: u64, state: String },
}
