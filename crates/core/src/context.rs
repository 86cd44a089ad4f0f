// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Deterministic context hashes identifying a module's dependencies
//!
//! A module build is identified by hashes over its expanded dependency
//! declarations: the build context (buildrequires), the runtime context
//! (runtime requires) and the combined module context. The hashes are
//! order independent: the input maps are canonicalized (sorted keys,
//! sorted stream sets) before being serialized and digested.

use crate::error::BuildError;
use crate::manifest::{BuildRequire, DependencyBlock, Manifest};
use regex::Regex;
use sha1::{Digest, Sha1};
use std::collections::{BTreeMap, BTreeSet};

/// Placeholder context of a module build whose hashes have not yet been
/// computed.
pub const DEFAULT_MODULE_CONTEXT: &str = "00000000";

/// Width of the truncated module context in hex characters.
///
/// The NSVC uniqueness constraint in storage surfaces a genuine
/// truncation collision as a duplicate-build error; widening this
/// constant is the escape hatch if that ever happens in practice.
pub const MODULE_CONTEXT_LEN: usize = 8;

/// All context hashes derived from one manifest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Contexts {
    pub build_context: String,
    pub runtime_context: String,
    pub context: String,
    /// Build context computed with base modules filtered out, used for
    /// build-reuse matching across base-module rebuilds.
    pub build_context_no_bms: String,
}

fn sha1_hex(input: &str) -> String {
    let mut hasher = Sha1::new();
    hasher.update(input.as_bytes());
    hasher
        .finalize()
        .iter()
        .map(|b| format!("{b:02x}"))
        .collect()
}

/// Hash of the stream names of the expanded buildrequires.
///
/// When `filter_base_modules` is set, the configured base module names
/// are excluded from the hash input.
pub fn calculate_build_context(
    buildrequires: &BTreeMap<String, BuildRequire>,
    filter_base_modules: bool,
    base_module_names: &[String],
) -> Result<String, BuildError> {
    let formatted: BTreeMap<&str, &str> = buildrequires
        .iter()
        .filter(|(name, _)| {
            !filter_base_modules || !base_module_names.iter().any(|bm| bm == *name)
        })
        .map(|(name, req)| (name.as_str(), req.stream.as_str()))
        .collect();
    let property_json = serde_json::to_string(&formatted)?;
    Ok(sha1_hex(&property_json))
}

/// Hash of the stream names of the expanded runtime requires.
///
/// Streams are unioned per module name across all dependency blocks.
pub fn calculate_runtime_context(dependencies: &[DependencyBlock]) -> Result<String, BuildError> {
    let mut requires: BTreeMap<&str, BTreeSet<&str>> = BTreeMap::new();
    for block in dependencies {
        for name in block.runtime_modules() {
            let streams = requires.entry(name).or_default();
            if let Some(block_streams) = block.runtime_streams(name) {
                streams.extend(block_streams.iter().map(|s| s.as_str()));
            }
        }
    }
    let property_json = serde_json::to_string(&requires)?;
    Ok(sha1_hex(&property_json))
}

/// Hash of the combined build and runtime context hashes, truncated to
/// [`MODULE_CONTEXT_LEN`] hex characters.
pub fn calculate_module_context(build_context: &str, runtime_context: &str) -> String {
    let combined = format!("{build_context}:{runtime_context}");
    let mut digest = sha1_hex(&combined);
    digest.truncate(MODULE_CONTEXT_LEN);
    digest
}

/// Compute all context hashes from a parsed manifest.
///
/// The manifest must already contain the expanded buildrequires in its
/// `xmd/mbs/buildrequires` section; a missing section is an upstream
/// pipeline defect, not a caller mistake.
pub fn contexts_from_manifest(
    manifest: &Manifest,
    base_module_names: &[String],
) -> Result<Contexts, BuildError> {
    let buildrequires = manifest.expanded_buildrequires()?;
    let build_context = calculate_build_context(&buildrequires, false, base_module_names)?;
    let build_context_no_bms = calculate_build_context(&buildrequires, true, base_module_names)?;
    let runtime_context = calculate_runtime_context(manifest.dependencies())?;
    let context = calculate_module_context(&build_context, &runtime_context);
    Ok(Contexts {
        build_context,
        runtime_context,
        context,
        build_context_no_bms,
    })
}

/// Parse the leading numeric version out of a stream name.
///
/// A stream such as `"f27"` yields `270000.0` and `"f27.0.1"` yields
/// `270001.0`: each dot-separated section is zero-padded to width 2 and
/// the result is right-padded to 6 digits unless `right_pad` is false.
/// The first matching entry of the `suffixes` table adds a fractional
/// bump to distinguish e.g. rolling streams. Returns `None` when the
/// stream carries no digits at all.
pub fn get_stream_version(
    stream: &str,
    right_pad: bool,
    suffixes: &[(Regex, f64)],
) -> Option<f64> {
    let mut version = String::new();
    for ch in stream.chars() {
        if ch.is_ascii_digit() {
            version.push(ch);
        } else if !version.is_empty() {
            if ch == '.' {
                version.push('.');
            } else {
                // The rest of the stream is a suffix like "-beta".
                break;
            }
        }
    }

    if version.is_empty() {
        return None;
    }

    let version: String = version
        .trim_end_matches('.')
        .split('.')
        .map(|section| format!("{section:0>2}"))
        .collect();

    let padded = if right_pad {
        format!("{version:0<6}")
    } else {
        version
    };

    let mut result = padded.parse::<f64>().ok()?;
    for (pattern, bump) in suffixes {
        if pattern.is_match(stream) {
            result += bump;
            break;
        }
    }
    Some(result)
}

#[cfg(test)]
#[path = "context_tests.rs"]
mod tests;
