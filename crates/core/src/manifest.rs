// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Parsed-manifest abstraction
//!
//! The real modulemd pipeline lives upstream; this core only consumes
//! its output: a JSON document carrying the module identity, the
//! dependency blocks, and the `xmd/mbs/buildrequires` section that the
//! dependency-expansion stage fills in. A document that does not parse
//! is an `InvalidManifest` error; a document that parses but lacks the
//! expansion section is a `MissingExpansion` error, because it means an
//! upstream stage was skipped.

use crate::error::BuildError;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::{BTreeMap, BTreeSet};

/// One expanded buildrequire entry from `xmd/mbs/buildrequires`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildRequire {
    pub stream: String,
    #[serde(default)]
    pub version: String,
    #[serde(default = "BuildRequire::default_context")]
    pub context: String,
}

impl BuildRequire {
    fn default_context() -> String {
        crate::context::DEFAULT_MODULE_CONTEXT.to_string()
    }
}

/// One dependency declaration block of a manifest.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DependencyBlock {
    #[serde(default)]
    pub buildrequires: BTreeMap<String, BTreeSet<String>>,
    #[serde(default)]
    pub requires: BTreeMap<String, BTreeSet<String>>,
}

impl DependencyBlock {
    /// Module names this block requires at runtime.
    pub fn runtime_modules(&self) -> impl Iterator<Item = &str> {
        self.requires.keys().map(|s| s.as_str())
    }

    /// Runtime streams declared for a module name, if any.
    pub fn runtime_streams(&self, name: &str) -> Option<&BTreeSet<String>> {
        self.requires.get(name)
    }
}

#[derive(Debug, Clone, Deserialize)]
struct RawManifest {
    data: RawData,
}

#[derive(Debug, Clone, Deserialize)]
struct RawData {
    name: String,
    stream: String,
    #[serde(default)]
    version: Option<u64>,
    #[serde(default)]
    xmd: Value,
    #[serde(default)]
    dependencies: Vec<DependencyBlock>,
}

/// A parsed module manifest.
#[derive(Debug, Clone)]
pub struct Manifest {
    name: String,
    stream: String,
    version: Option<u64>,
    xmd: Value,
    dependencies: Vec<DependencyBlock>,
}

impl Manifest {
    /// Parse a manifest document.
    pub fn parse(raw: &str) -> Result<Self, BuildError> {
        let raw: RawManifest =
            serde_json::from_str(raw).map_err(|e| BuildError::InvalidManifest(e.to_string()))?;
        Ok(Manifest {
            name: raw.data.name,
            stream: raw.data.stream,
            version: raw.data.version,
            xmd: raw.data.xmd,
            dependencies: raw.data.dependencies,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn stream(&self) -> &str {
        &self.stream
    }

    pub fn version(&self) -> Option<u64> {
        self.version
    }

    /// The arbitrary nested metadata section.
    pub fn xmd(&self) -> &Value {
        &self.xmd
    }

    pub fn dependencies(&self) -> &[DependencyBlock] {
        &self.dependencies
    }

    /// The expanded buildrequires from `xmd/mbs/buildrequires`.
    ///
    /// The dependency-expansion stage must have filled this in before
    /// the manifest reaches the core.
    pub fn expanded_buildrequires(&self) -> Result<BTreeMap<String, BuildRequire>, BuildError> {
        let section = self
            .xmd
            .get("mbs")
            .and_then(|mbs| mbs.get("buildrequires"))
            .ok_or_else(|| BuildError::MissingExpansion {
                nsvc: format!("{}:{}", self.name, self.stream),
                key: "xmd/mbs/buildrequires".to_string(),
            })?;
        serde_json::from_value(section.clone()).map_err(|e| BuildError::InvalidManifest(format!(
            "malformed xmd/mbs/buildrequires for {}:{}: {}",
            self.name, self.stream, e
        )))
    }

    /// The raw buildrequires section for echoing into JSON exports.
    ///
    /// Returns an empty object when the expansion has not run; exports
    /// must not fail just because a build never left `init`.
    pub fn buildrequires_overview(&self) -> Value {
        self.xmd
            .get("mbs")
            .and_then(|mbs| mbs.get("buildrequires"))
            .cloned()
            .unwrap_or_else(|| Value::Object(Default::default()))
    }
}

#[cfg(test)]
#[path = "manifest_tests.rs"]
mod tests;
