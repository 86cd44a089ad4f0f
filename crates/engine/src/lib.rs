// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! Module build engine: lifecycle operations and batch progression

mod error;
mod lifecycle;
mod monitor;
mod policy;
mod progress;

pub use error::EngineError;
pub use lifecycle::{begin_build, submit};
pub use monitor::{BuildMonitor, MonitorSnapshot};
pub use policy::{DefaultPolicy, FailurePolicy};
pub use progress::{evaluate_module, on_component_event, ComponentEvent, Outcome, Progress};
