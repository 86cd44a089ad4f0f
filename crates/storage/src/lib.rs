// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! Persistence layer for module builds
//!
//! Owns the module-build tables, the virtual-stream and arch registries,
//! and the transactional outbox that defers change notifications until
//! after commit.

pub mod notify;
pub mod registry;
pub mod store;

pub use notify::{RecordingNotifier, TracingNotifier};
pub use registry::{TagDiff, TagRegistry};
pub use store::{BaseModuleResolution, Store, StoreError, Txn};
