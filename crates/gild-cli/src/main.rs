//! Gild CLI - Theme Asset Build Tool
//!
//! Commands:
//! - gild                  - Build everything (same as gild run default)
//! - gild run <task>...    - Run tasks by name, one after another
//! - gild watch            - Build everything, then rebuild on changes
//! - gild list             - List every task name
//! - gild graph [task]     - Show what a task runs

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use gild_core::{
    build_graph, load_manifests, render_tree, Config, DefaultToolchain, ExecError, Executor,
    RunReport, TaskGraph, TaskRegistry, TaskStatus,
};
use gild_watch::WatchSession;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;
use tracing_subscriber::{layer::SubscriberExt as _, util::SubscriberInitExt as _};

/// Gild - Theme Asset Build Tool
#[derive(Parser)]
#[command(name = "gild", version, about = "Theme asset build tool")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Production build: minify scripts
    #[arg(short, long, global = true)]
    build: bool,

    /// Config file (default: gild.json in the project root)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Max concurrent actions (default: CPU cores)
    #[arg(short = 'j', long, global = true)]
    concurrency: Option<usize>,

    /// Debug logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Run tasks by name (e.g., gild run clean styles)
    Run {
        /// Task names
        #[arg(default_value = "default")]
        tasks: Vec<String>,
    },
    /// Build everything, then rebuild whatever a source change affects
    Watch,
    /// List every task name
    List,
    /// Show the tree of tasks a task runs
    Graph {
        /// Task name
        #[arg(default_value = "default")]
        task: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| level.into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cwd = std::env::current_dir()?;
    let (config, registry) = load_registry(&cwd, cli.config.as_deref(), cli.build)?;

    match cli.command.unwrap_or(Commands::Run {
        tasks: vec!["default".to_string()],
    }) {
        Commands::Run { tasks } => {
            let executor = executor(&config, registry, cli.concurrency);
            for task in &tasks {
                run_task(&executor, task).await?;
            }
        }

        Commands::Watch => {
            let executor = executor(&config, registry, cli.concurrency);
            run_task(&executor, "watch").await?;

            let mut session = WatchSession::new(executor).await;
            println!("👀 Watching {} source patterns (ctrl-c to stop)", session.plan().len());
            session.run().await?;
        }

        Commands::List => {
            for name in registry.names() {
                println!("{}", name);
            }
        }

        Commands::Graph { task } => {
            show_graph(&registry, &task)?;
        }
    }

    Ok(())
}

/// Configuration → manifests → task registry
fn load_registry(
    root: &Path,
    config: Option<&Path>,
    production: bool,
) -> Result<(Config, TaskRegistry)> {
    let config = Config::load(root, config, production).context("failed to load configuration")?;
    let manifests = load_manifests(&config)?;
    let registry = build_graph(&config, &manifests)?;

    tracing::debug!(
        "{} themes, {} build sets, {} tasks",
        config.themes.len(),
        config.build_sets.len(),
        registry.len()
    );
    Ok((config, registry))
}

fn executor(config: &Config, registry: TaskRegistry, concurrency: Option<usize>) -> Executor {
    let registry = Arc::new(registry);
    let toolchain = Arc::new(DefaultToolchain::from_config(&config.toolchain));

    match concurrency {
        Some(n) => Executor::new(registry, toolchain, n),
        None => Executor::with_default_concurrency(registry, toolchain),
    }
}

async fn run_task(executor: &Executor, task: &str) -> Result<()> {
    println!("🔨 gild {}", task);
    let start = Instant::now();

    match executor.run(task).await {
        Ok(report) => {
            print_summary(&report, start);
            Ok(())
        }
        Err(ExecError::Failed { report, failed, .. }) => {
            print_summary(&report, start);
            bail!("{} failed at {}", task, failed)
        }
        Err(e) => Err(e.into()),
    }
}

fn print_summary(report: &RunReport, start: Instant) {
    let elapsed = start.elapsed();
    let succeeded = report.count(TaskStatus::Completed);
    let skipped = report.count(TaskStatus::Skipped);
    let failed = report.count(TaskStatus::Failed);

    println!();
    if failed == 0 {
        println!(
            "✅ {} tasks completed, {} skipped in {:?}",
            succeeded, skipped, elapsed
        );
    } else {
        println!(
            "❌ {} succeeded, {} failed in {:?}",
            succeeded, failed, elapsed
        );
        for r in report.failures() {
            if let Some(err) = &r.error {
                println!("   • {} failed: {}", r.name, err);
            }
        }
    }
}

/// Show the task tree of one task
fn show_graph(registry: &TaskRegistry, task: &str) -> Result<()> {
    let Some(def) = registry.resolve(task) else {
        bail!("task {:?} is not registered", task);
    };

    let graph = TaskGraph::new(registry)?;
    println!("📦 Tasks: {}", graph.node_count());
    println!("🔗 Edges: {}", graph.edge_count());
    println!("📋 {} runs {} tasks:", task, graph.reachable(&def.key).len());
    println!();
    print!("{}", render_tree(registry, &def.key));

    Ok(())
}
