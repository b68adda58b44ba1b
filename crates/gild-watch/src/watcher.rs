//! File Watcher - source directory monitoring
//!
//! Uses notify crate (FSEvents on macOS, inotify on Linux)

use anyhow::Result;
use notify::{Config, Event, RecommendedWatcher, RecursiveMode, Watcher};
use std::path::{Component, Path, PathBuf};
use std::sync::mpsc::{channel, Receiver};
use std::time::Duration;
use tracing::{debug, info, warn};

/// File change event
#[derive(Debug, Clone)]
pub struct FileChange {
    pub path: PathBuf,
    pub kind: ChangeKind,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeKind {
    Create,
    Modify,
    Delete,
}

/// Directory names never reported, wherever they appear
const IGNORED: [&str; 2] = ["node_modules", ".git"];

/// Recursive watcher over a set of root directories
pub struct FileWatcher {
    roots: Vec<PathBuf>,
    watcher: Option<RecommendedWatcher>,
    receiver: Option<Receiver<Result<Event, notify::Error>>>,
}

impl FileWatcher {
    pub fn new(roots: Vec<PathBuf>) -> Self {
        Self {
            roots,
            watcher: None,
            receiver: None,
        }
    }

    fn should_ignore(path: &Path) -> bool {
        path.components().any(|c| match c {
            Component::Normal(name) => IGNORED.iter().any(|i| name == *i),
            _ => false,
        })
    }

    /// Start watching. Roots that do not exist are skipped.
    ///
    /// Returns how many roots are being watched.
    pub fn start(&mut self) -> Result<usize> {
        let (tx, rx) = channel();

        let config = Config::default().with_poll_interval(Duration::from_millis(100));
        let mut watcher = RecommendedWatcher::new(tx, config)?;

        let mut watched = 0;
        for root in &self.roots {
            if !root.is_dir() {
                warn!("Not watching {:?}: no such directory", root);
                continue;
            }
            watcher.watch(root, RecursiveMode::Recursive)?;
            debug!("Watching {:?}", root);
            watched += 1;
        }

        self.watcher = Some(watcher);
        self.receiver = Some(rx);

        info!("File watcher started on {} directories", watched);
        Ok(watched)
    }

    /// Stop watching
    pub fn stop(&mut self) {
        if self.watcher.take().is_some() {
            info!("File watcher stopped");
        }
        self.receiver = None;
    }

    /// Poll for changes (non-blocking)
    pub fn poll(&self) -> Vec<FileChange> {
        let mut changes = Vec::new();

        if let Some(ref rx) = self.receiver {
            // Drain all pending events
            while let Ok(result) = rx.try_recv() {
                match result {
                    Ok(event) => {
                        let kind = match event.kind {
                            notify::EventKind::Create(_) => ChangeKind::Create,
                            notify::EventKind::Modify(_) => ChangeKind::Modify,
                            notify::EventKind::Remove(_) => ChangeKind::Delete,
                            _ => continue,
                        };

                        for path in event.paths {
                            if Self::should_ignore(&path) {
                                continue;
                            }
                            debug!("File change: {:?} ({:?})", path, kind);
                            changes.push(FileChange { path, kind });
                        }
                    }
                    Err(e) => {
                        warn!("Watch error: {:?}", e);
                    }
                }
            }
        }

        changes
    }
}

impl Drop for FileWatcher {
    fn drop(&mut self) {
        self.stop();
    }
}
