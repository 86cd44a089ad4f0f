// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Error taxonomy for the build core
//!
//! Validation errors are caller mistakes; manifest errors point at an
//! upstream pipeline defect (the manifest should have been expanded
//! before it reached this core) and are reported distinctly.

use thiserror::Error;

/// Errors raised by the core state machines and hashers.
#[derive(Debug, Error)]
pub enum BuildError {
    #[error("invalid build state: {0}")]
    InvalidState(String),

    #[error("the rebuild_strategy of \"{value}\" is invalid. Choose from: {choices}")]
    InvalidRebuildStrategy { value: String, choices: String },

    #[error("invalid failure type: {0}")]
    InvalidFailureType(String),

    #[error("no batch is in progress: {0}")]
    NoBatchInProgress(u32),

    #[error("invalid modulemd: {0}")]
    InvalidManifest(String),

    #[error("manifest for {nsvc} is missing {key}; was dependency expansion run?")]
    MissingExpansion { nsvc: String, key: String },

    #[error("component {package} is build-time only and cannot be tagged into the final tag")]
    BuildTimeOnlyTagged { package: String },

    #[error("invalid stream suffix pattern {pattern}: {source}")]
    InvalidStreamSuffix {
        pattern: String,
        source: regex::Error,
    },

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("failed to serialize hash input: {0}")]
    HashInput(#[from] serde_json::Error),
}
