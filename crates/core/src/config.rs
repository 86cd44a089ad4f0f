// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Build core configuration
//!
//! Loaded from TOML. The base-module name list doubles as a priority
//! order wherever base modules are resolved or filtered.

use crate::error::BuildError;
use crate::state::RebuildStrategy;
use regex::Regex;
use serde::{Deserialize, Serialize};

/// A stream pattern that adds a fractional bump to the parsed stream
/// version, e.g. to order rolling streams after their numbered peers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StreamSuffix {
    pub pattern: String,
    pub bump: f64,
}

/// Configuration of the build core.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Base module names in priority order (e.g. ["platform"]).
    pub base_module_names: Vec<String>,
    /// Strategy applied when a submission does not pick one.
    pub default_rebuild_strategy: RebuildStrategy,
    /// First-match-wins stream version adjustments.
    pub stream_suffixes: Vec<StreamSuffix>,
    /// Whether `only-changed` / `changed-and-after` builds tolerate
    /// failures of components whose artifacts were reused.
    pub tolerate_reused_failures: bool,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            base_module_names: vec!["platform".to_string()],
            default_rebuild_strategy: RebuildStrategy::All,
            stream_suffixes: Vec::new(),
            tolerate_reused_failures: true,
        }
    }
}

impl Config {
    /// Load configuration from a TOML document.
    pub fn from_toml_str(raw: &str) -> Result<Self, BuildError> {
        toml::from_str(raw).map_err(|e| BuildError::InvalidConfig(e.to_string()))
    }

    /// Compile the stream-suffix table for use with
    /// [`crate::context::get_stream_version`].
    pub fn compiled_stream_suffixes(&self) -> Result<Vec<(Regex, f64)>, BuildError> {
        self.stream_suffixes
            .iter()
            .map(|suffix| {
                Regex::new(&suffix.pattern)
                    .map(|re| (re, suffix.bump))
                    .map_err(|source| BuildError::InvalidStreamSuffix {
                        pattern: suffix.pattern.clone(),
                        source,
                    })
            })
            .collect()
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
