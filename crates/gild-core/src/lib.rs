//! Gild Core - Theme Asset Build Graph
//!
//! Features:
//! - Per-theme, per-build-set task graph generated from configuration
//! - Sass compilation with grass, external prefixer and minifier
//! - Vendor bundles and copies declared in each theme's manifest
//! - Clean tasks that always run before their build counterparts
//! - Async executor with series/parallel composition
//! - Watch plan mapping changed files to the tasks they rebuild

pub mod action;
pub mod config;
pub mod error;
pub mod generator;
pub mod globs;
pub mod graph;
pub mod key;
pub mod manifest;
pub mod registry;
pub mod scheduler;
pub mod toolchain;
pub mod watch_plan;

pub use action::Action;
pub use config::{Config, Theme, ThemePaths, ToolchainConfig};
pub use error::{ConfigError, ExecError, GraphError, ManifestError};
pub use generator::build_graph;
pub use graph::{render_tree, validate, TaskGraph};
pub use key::{AssetKind, Role, Scope, TaskKey, Variant};
pub use manifest::{load_manifests, Manifests, VendorManifest};
pub use registry::{Body, TaskDef, TaskRegistry};
pub use scheduler::{Executor, RunReport, TaskResult, TaskStatus};
pub use toolchain::{DefaultToolchain, Toolchain};
pub use watch_plan::{WatchPlan, WatchSubscription};
