//! Watch Plan - file patterns subscribed by executed watch tasks

use glob::Pattern;
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use crate::globs::{literal_base, MATCH_OPTIONS};
use crate::key::TaskKey;

/// Re-run `target` when a path matching `patterns` changes
#[derive(Debug, Clone)]
pub struct WatchSubscription {
    /// The watch task that registered this subscription
    pub source: TaskKey,
    pub patterns: Vec<Pattern>,
    pub target: TaskKey,
    /// Literal directories to observe
    pub roots: Vec<PathBuf>,
}

impl WatchSubscription {
    pub fn new(source: TaskKey, patterns: &[String], target: TaskKey) -> Result<Self, glob::PatternError> {
        Ok(Self {
            source,
            roots: patterns.iter().map(|p| literal_base(p)).collect(),
            patterns: patterns
                .iter()
                .map(|p| Pattern::new(p))
                .collect::<Result<_, _>>()?,
            target,
        })
    }

    pub fn matches(&self, path: &Path) -> bool {
        self.patterns
            .iter()
            .any(|p| p.matches_path_with(path, MATCH_OPTIONS))
    }
}

#[derive(Debug, Clone, Default)]
pub struct WatchPlan {
    subscriptions: Vec<WatchSubscription>,
}

impl WatchPlan {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a subscription; a watch task running again replaces its old one
    pub fn subscribe(&mut self, subscription: WatchSubscription) {
        self.subscriptions.retain(|s| s.source != subscription.source);
        self.subscriptions.push(subscription);
    }

    /// Targets to rebuild for a changed path, in subscription order, without repeats
    pub fn targets_for(&self, path: &Path) -> Vec<&TaskKey> {
        let mut targets: Vec<&TaskKey> = Vec::new();
        for subscription in &self.subscriptions {
            if subscription.matches(path) && !targets.contains(&&subscription.target) {
                targets.push(&subscription.target);
            }
        }
        targets
    }

    /// Directories to watch recursively, with nested ones collapsed into their parent
    pub fn roots(&self) -> Vec<PathBuf> {
        let all: BTreeSet<&PathBuf> = self
            .subscriptions
            .iter()
            .flat_map(|s| s.roots.iter())
            .collect();

        let mut collapsed: Vec<PathBuf> = Vec::new();
        for root in all {
            if !collapsed.iter().any(|parent| root.starts_with(parent)) {
                collapsed.push(root.clone());
            }
        }
        collapsed
    }

    pub fn len(&self) -> usize {
        self.subscriptions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.subscriptions.is_empty()
    }
}
