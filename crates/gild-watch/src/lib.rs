//! Gild Watch - rebuild on source changes
//!
//! Features:
//! - File watching with notify (FSEvents on macOS, inotify on Linux)
//! - Watch roots taken from the executor's watch plan
//! - One spawned rebuild per affected task and change batch

pub mod session;
pub mod watcher;

pub use session::{targets, WatchSession};
pub use watcher::{ChangeKind, FileChange, FileWatcher};
