//! modforge-core: state machines and hashing for module build
//! orchestration
//!
//! This crate provides:
//! - Pure state machines for module and component builds
//! - Deterministic context hashing for build deduplication
//! - The parsed-manifest abstraction and configuration
//! - Effect-based notification of committed transitions

pub mod clock;
pub mod config;
pub mod error;

pub mod context;
pub mod manifest;

// State machines (order matters for dependencies)
pub mod state;
pub mod trace;
pub mod effect;
pub mod component;
pub mod module;

// Re-exports
pub use clock::{Clock, FakeClock, SystemClock};
pub use config::{Config, StreamSuffix};
pub use context::{
    calculate_build_context, calculate_module_context, calculate_runtime_context,
    contexts_from_manifest, get_stream_version, Contexts, DEFAULT_MODULE_CONTEXT,
};
pub use component::{ComponentBuild, ComponentPlan};
pub use effect::{Effect, Event, Notifier};
pub use error::BuildError;
pub use manifest::{BuildRequire, DependencyBlock, Manifest};
pub use module::{declared_base_modules, ModuleBuild, ModuleRequest, StateFilter};
pub use state::{BuildState, ComponentState, FailureType, RebuildStrategy, FAILED_STATES};
pub use trace::{ComponentTraceEntry, ModuleTraceEntry};
