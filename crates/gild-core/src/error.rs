//! Error types shared by the graph generator and the executor

use std::path::PathBuf;
use thiserror::Error;

use crate::scheduler::RunReport;

/// Project configuration could not be loaded
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("package.json has no `name`, cannot locate the theme directory")]
    MissingPackageName,

    #[error("no {0} configured")]
    Empty(&'static str),

    #[error("invalid {what} name {name:?}")]
    InvalidName { what: &'static str, name: String },

    #[error("theme {0:?} has no entry in `paths`")]
    MissingPaths(String),
}

/// A theme's vendor manifest is missing or malformed. Always fatal.
#[derive(Debug, Error)]
pub enum ManifestError {
    #[error("theme {theme:?}: failed to read vendor manifest {}: {source}", path.display())]
    Read {
        theme: String,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("theme {theme:?}: malformed vendor manifest {}: {source}", path.display())]
    Parse {
        theme: String,
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// The generated task graph is inconsistent
#[derive(Debug, Error)]
pub enum GraphError {
    #[error("task {0:?} registered twice")]
    Duplicate(String),

    #[error("task {task:?} references unknown task {missing:?}")]
    MissingDependency { task: String, missing: String },

    #[error("dependency cycle through {0:?}")]
    Cycle(String),

    #[error("no vendor manifest loaded for theme {0:?}")]
    MissingManifest(String),

    #[error("{0} assets cannot be registered through this pipeline")]
    WrongPipeline(&'static str),
}

/// Failure while running a task
#[derive(Debug, Error)]
pub enum ExecError {
    #[error("task {0:?} is not registered")]
    UnknownTask(String),

    #[error("task {task:?} failed: {failed} did not complete")]
    Failed {
        task: String,
        failed: String,
        report: RunReport,
    },
}
