//! Task Executor - runs registered tasks respecting series/parallel composition
//!
//! Features:
//! - Dependencies run one after another, then the task body
//! - Parallel children are spawned as separate tokio tasks
//! - Leaf actions run on the blocking pool, limited by a semaphore
//! - A failed child fails its parent only after every sibling has finished

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::{Mutex, Semaphore};
use tracing::{debug, error, info};

use crate::action::Action;
use crate::error::ExecError;
use crate::key::TaskKey;
use crate::registry::{Body, TaskRegistry};
use crate::toolchain::Toolchain;
use crate::watch_plan::{WatchPlan, WatchSubscription};

/// Task status
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskStatus {
    Completed,
    /// No-op leaf
    Skipped,
    Failed,
}

/// Outcome of one leaf action
#[derive(Debug, Clone)]
pub struct TaskResult {
    pub name: String,
    pub status: TaskStatus,
    pub duration: Duration,
    pub error: Option<String>,
}

/// Leaf results of one invocation, in completion order
#[derive(Debug, Clone)]
pub struct RunReport {
    pub task: String,
    pub results: Vec<TaskResult>,
    pub duration: Duration,
}

impl RunReport {
    pub fn count(&self, status: TaskStatus) -> usize {
        self.results.iter().filter(|r| r.status == status).count()
    }

    pub fn failures(&self) -> impl Iterator<Item = &TaskResult> {
        self.results.iter().filter(|r| r.status == TaskStatus::Failed)
    }

    /// Position of a leaf in completion order
    pub fn position(&self, name: &str) -> Option<usize> {
        self.results.iter().position(|r| r.name == name)
    }
}

/// Name of the first leaf that failed below a task
#[derive(Debug, Clone)]
struct Failure(String);

type Journal = Arc<Mutex<Vec<TaskResult>>>;
type BoxFuture<T> = Pin<Box<dyn Future<Output = T> + Send + 'static>>;

struct Inner {
    registry: Arc<TaskRegistry>,
    toolchain: Arc<dyn Toolchain>,
    semaphore: Semaphore,
    plan: Mutex<WatchPlan>,
}

/// Runs tasks from a registry. Cheap to clone; clones share the watch plan.
#[derive(Clone)]
pub struct Executor {
    inner: Arc<Inner>,
}

impl Executor {
    /// Create executor with a concurrency limit for leaf actions
    pub fn new(registry: Arc<TaskRegistry>, toolchain: Arc<dyn Toolchain>, concurrency: usize) -> Self {
        Self {
            inner: Arc::new(Inner {
                registry,
                toolchain,
                semaphore: Semaphore::new(concurrency.max(1)),
                plan: Mutex::new(WatchPlan::new()),
            }),
        }
    }

    /// Create executor with default concurrency (CPU cores)
    pub fn with_default_concurrency(registry: Arc<TaskRegistry>, toolchain: Arc<dyn Toolchain>) -> Self {
        let cpus = std::thread::available_parallelism()
            .map(|p| p.get())
            .unwrap_or(4);
        Self::new(registry, toolchain, cpus)
    }

    pub fn registry(&self) -> &TaskRegistry {
        &self.inner.registry
    }

    /// Run a task by display name
    pub async fn run(&self, name: &str) -> Result<RunReport, ExecError> {
        let key = self
            .inner
            .registry
            .resolve(name)
            .map(|t| t.key.clone())
            .ok_or_else(|| ExecError::UnknownTask(name.to_string()))?;

        self.run_key(&key).await
    }

    /// Run a task and everything it depends on
    pub async fn run_key(&self, key: &TaskKey) -> Result<RunReport, ExecError> {
        if !self.inner.registry.contains(key) {
            return Err(ExecError::UnknownTask(key.to_string()));
        }

        let start = Instant::now();
        let journal: Journal = Arc::new(Mutex::new(Vec::new()));

        let outcome = visit(Arc::clone(&self.inner), key.clone(), Arc::clone(&journal)).await;

        let results = std::mem::take(&mut *journal.lock().await);
        let report = RunReport {
            task: key.to_string(),
            results,
            duration: start.elapsed(),
        };

        info!(
            "Finished {} in {:?} ({} leaves)",
            report.task,
            report.duration,
            report.results.len()
        );

        match outcome {
            Ok(()) => Ok(report),
            Err(Failure(failed)) => Err(ExecError::Failed {
                task: key.to_string(),
                failed,
                report,
            }),
        }
    }

    /// Snapshot of the subscriptions registered by watch tasks so far
    pub async fn watch_plan(&self) -> WatchPlan {
        self.inner.plan.lock().await.clone()
    }
}

/// Run dependencies in series, then the body
fn visit(inner: Arc<Inner>, key: TaskKey, journal: Journal) -> BoxFuture<Result<(), Failure>> {
    Box::pin(async move {
        let Some(task) = inner.registry.get(&key) else {
            return Err(Failure(key.to_string()));
        };

        for dep in &task.depends_on {
            visit(Arc::clone(&inner), dep.clone(), Arc::clone(&journal)).await?;
        }

        match &task.body {
            Body::Action(action) => run_action(&inner, &key, action, &journal).await,
            Body::Parallel(children) => {
                let handles: Vec<_> = children
                    .iter()
                    .map(|child| {
                        tokio::spawn(visit(Arc::clone(&inner), child.clone(), Arc::clone(&journal)))
                    })
                    .collect();

                // Wait for every sibling before reporting the first failure
                let mut failure = None;
                for (child, handle) in children.iter().zip(handles) {
                    let outcome = match handle.await {
                        Ok(outcome) => outcome,
                        Err(e) => {
                            error!("{} panicked: {}", child, e);
                            Err(Failure(child.to_string()))
                        }
                    };
                    if let Err(f) = outcome {
                        failure.get_or_insert(f);
                    }
                }

                match failure {
                    Some(f) => Err(f),
                    None => Ok(()),
                }
            }
        }
    })
}

async fn run_action(inner: &Arc<Inner>, key: &TaskKey, action: &Action, journal: &Journal) -> Result<(), Failure> {
    let name = key.to_string();
    let start = Instant::now();

    let (status, error) = match action {
        Action::Noop { reason } => {
            debug!("⏭ {} ({})", name, reason);
            (TaskStatus::Skipped, None)
        }
        Action::Watch { patterns, target } => {
            match WatchSubscription::new(key.clone(), patterns, target.clone()) {
                Ok(subscription) => {
                    debug!("👀 {} → {}", name, target);
                    inner.plan.lock().await.subscribe(subscription);
                    (TaskStatus::Completed, None)
                }
                Err(e) => (TaskStatus::Failed, Some(e.to_string())),
            }
        }
        _ => {
            let Ok(_permit) = inner.semaphore.acquire().await else {
                return Err(Failure(name));
            };

            info!("▶ {}", name);
            let action = action.clone();
            let toolchain = Arc::clone(&inner.toolchain);
            let result = tokio::task::spawn_blocking(move || action.run(toolchain.as_ref())).await;

            match result {
                Ok(Ok(())) => (TaskStatus::Completed, None),
                Ok(Err(e)) => (TaskStatus::Failed, Some(format!("{:#}", e))),
                Err(e) => (TaskStatus::Failed, Some(format!("Task panicked: {}", e))),
            }
        }
    };

    let duration = start.elapsed();
    match &error {
        Some(e) => error!("✗ {}: {}", name, e),
        None if status == TaskStatus::Completed => info!("✓ {} in {:?}", name, duration),
        None => {}
    }

    journal.lock().await.push(TaskResult {
        name: name.clone(),
        status,
        duration,
        error,
    });

    if status == TaskStatus::Failed {
        Err(Failure(name))
    } else {
        Ok(())
    }
}
