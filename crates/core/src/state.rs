// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Closed state vocabularies for module and component builds
//!
//! Module states are persisted by ordinal, so the mapping between the
//! symbolic name and the number is fixed forever. Component states mirror
//! the external build backend's numeric vocabulary one to one.

use crate::error::BuildError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Lifecycle states of a module build.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BuildState {
    /// Freshly submitted; manifest parsed, record created.
    Init,
    /// Validated and queued for the scheduler.
    Wait,
    /// Components are being submitted and built in batches.
    Build,
    /// All components succeeded.
    Done,
    /// At least one component failed (or an earlier stage failed).
    Failed,
    /// Promoted externally after `done`; ready for composes.
    Ready,
    /// Failed and garbage-collected.
    Garbage,
}

/// States counted as failures for reporting purposes.
pub const FAILED_STATES: [BuildState; 2] = [BuildState::Failed, BuildState::Garbage];

impl BuildState {
    /// The persisted ordinal of this state.
    pub fn ordinal(self) -> i32 {
        match self {
            BuildState::Init => 0,
            BuildState::Wait => 1,
            BuildState::Build => 2,
            BuildState::Done => 3,
            BuildState::Failed => 4,
            BuildState::Ready => 5,
            BuildState::Garbage => 6,
        }
    }

    /// Look up a state by its persisted ordinal.
    pub fn from_ordinal(ordinal: i32) -> Option<Self> {
        match ordinal {
            0 => Some(BuildState::Init),
            1 => Some(BuildState::Wait),
            2 => Some(BuildState::Build),
            3 => Some(BuildState::Done),
            4 => Some(BuildState::Failed),
            5 => Some(BuildState::Ready),
            6 => Some(BuildState::Garbage),
            _ => None,
        }
    }

    /// The symbolic name of this state.
    pub fn name(self) -> &'static str {
        match self {
            BuildState::Init => "init",
            BuildState::Wait => "wait",
            BuildState::Build => "build",
            BuildState::Done => "done",
            BuildState::Failed => "failed",
            BuildState::Ready => "ready",
            BuildState::Garbage => "garbage",
        }
    }

    /// Whether this state counts as a failure for reporting.
    pub fn is_failed_state(self) -> bool {
        FAILED_STATES.contains(&self)
    }
}

impl fmt::Display for BuildState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for BuildState {
    type Err = BuildError;

    /// Accepts either the symbolic name or the ordinal as digits.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "init" => Ok(BuildState::Init),
            "wait" => Ok(BuildState::Wait),
            "build" => Ok(BuildState::Build),
            "done" => Ok(BuildState::Done),
            "failed" => Ok(BuildState::Failed),
            "ready" => Ok(BuildState::Ready),
            "garbage" => Ok(BuildState::Garbage),
            other => other
                .parse::<i32>()
                .ok()
                .and_then(BuildState::from_ordinal)
                .ok_or_else(|| BuildError::InvalidState(other.to_string())),
        }
    }
}

/// Classification of why a build failed, for operator triage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum FailureType {
    #[default]
    Unspec,
    User,
    Infra,
}

impl FailureType {
    pub fn as_str(self) -> &'static str {
        match self {
            FailureType::Unspec => "unspec",
            FailureType::User => "user",
            FailureType::Infra => "infra",
        }
    }
}

impl fmt::Display for FailureType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FailureType {
    type Err = BuildError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "unspec" => Ok(FailureType::Unspec),
            "user" => Ok(FailureType::User),
            "infra" => Ok(FailureType::Infra),
            other => Err(BuildError::InvalidFailureType(other.to_string())),
        }
    }
}

/// How component rebuilds are selected on successive builds of a module.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RebuildStrategy {
    /// All components will be rebuilt.
    All,
    /// All components that have changed and those in subsequent batches
    /// will be rebuilt.
    ChangedAndAfter,
    /// All changed components will be rebuilt.
    OnlyChanged,
}

impl RebuildStrategy {
    pub const ALL: [RebuildStrategy; 3] = [
        RebuildStrategy::All,
        RebuildStrategy::ChangedAndAfter,
        RebuildStrategy::OnlyChanged,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            RebuildStrategy::All => "all",
            RebuildStrategy::ChangedAndAfter => "changed-and-after",
            RebuildStrategy::OnlyChanged => "only-changed",
        }
    }

    pub fn describe(self) -> &'static str {
        match self {
            RebuildStrategy::All => "All components will be rebuilt",
            RebuildStrategy::ChangedAndAfter => {
                "All components that have changed and those in subsequent batches will be rebuilt"
            }
            RebuildStrategy::OnlyChanged => "All changed components will be rebuilt",
        }
    }
}

impl fmt::Display for RebuildStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RebuildStrategy {
    type Err = BuildError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "all" => Ok(RebuildStrategy::All),
            "changed-and-after" => Ok(RebuildStrategy::ChangedAndAfter),
            "only-changed" => Ok(RebuildStrategy::OnlyChanged),
            other => {
                let choices = RebuildStrategy::ALL
                    .iter()
                    .map(|s| s.as_str())
                    .collect::<Vec<_>>()
                    .join(", ");
                Err(BuildError::InvalidRebuildStrategy {
                    value: other.to_string(),
                    choices,
                })
            }
        }
    }
}

/// Component build states as reported by the external build backend.
///
/// The numeric codes are the backend's own and must not be renumbered.
/// A component that has not yet been submitted carries no state at all
/// (`Option<ComponentState>` is `None`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ComponentState {
    Building,
    Complete,
    Failed,
    Canceled,
}

impl ComponentState {
    pub fn code(self) -> i32 {
        match self {
            ComponentState::Building => 0,
            ComponentState::Complete => 1,
            ComponentState::Failed => 3,
            ComponentState::Canceled => 4,
        }
    }

    pub fn from_code(code: i32) -> Option<Self> {
        match code {
            0 => Some(ComponentState::Building),
            1 => Some(ComponentState::Complete),
            3 => Some(ComponentState::Failed),
            4 => Some(ComponentState::Canceled),
            _ => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            ComponentState::Building => "BUILDING",
            ComponentState::Complete => "COMPLETE",
            ComponentState::Failed => "FAILED",
            ComponentState::Canceled => "CANCELED",
        }
    }

    /// Terminal states reported by the backend.
    pub fn is_terminal(self) -> bool {
        !matches!(self, ComponentState::Building)
    }
}

impl fmt::Display for ComponentState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
#[path = "state_tests.rs"]
mod tests;
