//! Watch Session - turns file changes into rebuilds
//!
//! Started after the `watch` task has run: its watch leaves have filled the
//! executor's plan, which decides what to observe and what to rebuild.

use anyhow::Result;
use gild_core::{ExecError, Executor, TaskKey, WatchPlan};
use std::path::PathBuf;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use crate::watcher::{FileChange, FileWatcher};

/// Poll interval of the session loop
const POLL_INTERVAL_MS: u64 = 100;

pub struct WatchSession {
    executor: Executor,
    plan: WatchPlan,
    watcher: FileWatcher,
}

impl WatchSession {
    /// Snapshot the executor's watch plan
    pub async fn new(executor: Executor) -> Self {
        let plan = executor.watch_plan().await;
        let watcher = FileWatcher::new(plan.roots());
        Self {
            executor,
            plan,
            watcher,
        }
    }

    pub fn plan(&self) -> &WatchPlan {
        &self.plan
    }

    /// Watch until ctrl-c
    pub async fn run(&mut self) -> Result<()> {
        if self.plan.is_empty() {
            warn!("Nothing to watch");
            return Ok(());
        }

        let watched = self.watcher.start()?;
        info!(
            "Watching {} directories for {} subscriptions",
            watched,
            self.plan.len()
        );

        loop {
            tokio::select! {
                _ = tokio::signal::ctrl_c() => {
                    info!("Stopping watch session");
                    break;
                }

                // Poll for file changes periodically
                _ = tokio::time::sleep(tokio::time::Duration::from_millis(POLL_INTERVAL_MS)) => {
                    let paths = changed_paths(self.watcher.poll());
                    if !paths.is_empty() {
                        self.dispatch(&paths);
                    }
                }
            }
        }

        self.watcher.stop();
        Ok(())
    }

    /// Start one rebuild per target touched by this batch of changes.
    ///
    /// Rebuilds are not awaited; overlapping rebuilds of the same target
    /// are allowed.
    pub fn dispatch(&self, paths: &[PathBuf]) -> Vec<JoinHandle<Result<(), ExecError>>> {
        targets(&self.plan, paths)
            .into_iter()
            .map(|target| {
                let executor = self.executor.clone();
                tokio::spawn(async move { rebuild(executor, target).await })
            })
            .collect()
    }
}

/// Paths of a batch of changes, in arrival order
fn changed_paths(changes: Vec<FileChange>) -> Vec<PathBuf> {
    changes
        .into_iter()
        .map(|change| {
            debug!("{:?}: {:?}", change.kind, change.path);
            change.path
        })
        .collect()
}

/// Targets for a batch of changed paths, first-match order, no repeats
pub fn targets(plan: &WatchPlan, paths: &[PathBuf]) -> Vec<TaskKey> {
    let mut out: Vec<TaskKey> = Vec::new();
    for path in paths {
        for target in plan.targets_for(path) {
            debug!("{:?} → {}", path, target);
            if !out.contains(target) {
                out.push(target.clone());
            }
        }
    }
    out
}

async fn rebuild(executor: Executor, target: TaskKey) -> Result<(), ExecError> {
    info!("🔄 Rebuilding {}", target);
    match executor.run_key(&target).await {
        Ok(report) => {
            info!("✅ {} rebuilt in {:?}", target, report.duration);
            Ok(())
        }
        Err(e) => {
            error!("❌ {}", e);
            Err(e)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::watcher::ChangeKind;
    use gild_core::globs::within;
    use gild_core::{Action, AssetKind, DefaultToolchain, Role, TaskDef, TaskRegistry, Variant};
    use std::path::Path;
    use std::sync::Arc;
    use tempfile::TempDir;

    fn scripts(set: &str, role: Role) -> TaskKey {
        TaskKey::leaf("parent", AssetKind::Scripts, Variant::Set(set.into()), role)
    }

    /// Registry with a concat build leaf and a watch leaf per set
    fn registry(root: &Path) -> TaskRegistry {
        let mut registry = TaskRegistry::new();
        let mut watchers = Vec::new();

        for set in ["main", "admin"] {
            let dir = root.join("scripts").join(set);
            std::fs::create_dir_all(&dir).unwrap();
            std::fs::write(dir.join("a.js"), format!("var {set} = 1")).unwrap();

            let pattern = within(&dir, "**/*.js");
            registry
                .register(TaskDef::action(
                    scripts(set, Role::Build),
                    Action::ConcatScripts {
                        patterns: vec![pattern.clone()],
                        output: root.join("_").join(format!("{set}.js")),
                        minify: false,
                    },
                ))
                .unwrap();
            registry
                .register(TaskDef::action(
                    scripts(set, Role::Watch),
                    Action::Watch {
                        patterns: vec![pattern],
                        target: scripts(set, Role::Build),
                    },
                ))
                .unwrap();
            watchers.push(scripts(set, Role::Watch));
        }

        registry
            .register(TaskDef::parallel(TaskKey::root(Role::Watch), watchers))
            .unwrap();
        registry
    }

    async fn session(root: &Path) -> WatchSession {
        let executor = Executor::new(
            Arc::new(registry(root)),
            Arc::new(DefaultToolchain::default()),
            2,
        );
        executor.run("watch").await.unwrap();
        WatchSession::new(executor).await
    }

    #[tokio::test]
    async fn test_targets_deduplicated_per_batch() {
        let dir = TempDir::new().unwrap();
        let root = dir.path();
        let session = session(root).await;

        let batch = vec![
            root.join("scripts/main/a.js"),
            root.join("scripts/main/lib/b.js"),
            root.join("scripts/admin/a.js"),
            root.join("scripts/main/a.js"),
            root.join("scripts/main/notes.txt"),
        ];

        assert_eq!(
            targets(session.plan(), &batch),
            vec![scripts("main", Role::Build), scripts("admin", Role::Build)]
        );
        assert_eq!(session.plan().roots().len(), 2);
    }

    #[tokio::test]
    async fn test_dispatch_rebuilds_only_matching_set() {
        let dir = TempDir::new().unwrap();
        let root = dir.path();
        let session = session(root).await;

        let handles = session.dispatch(&[root.join("scripts/admin/a.js")]);
        assert_eq!(handles.len(), 1);
        for handle in handles {
            handle.await.unwrap().unwrap();
        }

        assert!(root.join("_/admin.js").exists());
        assert!(!root.join("_/main.js").exists());
    }

    #[test]
    fn test_changed_paths_keep_every_kind() {
        let change = |path: &str, kind| FileChange {
            path: PathBuf::from(path),
            kind,
        };
        let batch = vec![
            change("/t/a.scss", ChangeKind::Create),
            change("/t/b.scss", ChangeKind::Delete),
            change("/t/a.scss", ChangeKind::Modify),
        ];

        assert_eq!(
            changed_paths(batch),
            vec![PathBuf::from("/t/a.scss"), PathBuf::from("/t/b.scss"), PathBuf::from("/t/a.scss")]
        );
    }

    #[tokio::test]
    async fn test_unmatched_batch_dispatches_nothing() {
        let dir = TempDir::new().unwrap();
        let root = dir.path();
        let session = session(root).await;

        assert!(session.dispatch(&[root.join("styles/main/main.scss")]).is_empty());
    }
}
