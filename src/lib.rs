// src/lib.rs

pub mod cli;
pub mod config;
pub mod dag;
pub mod engine;
pub mod errors;
pub mod exec;
pub mod fs;
pub mod logging;
pub mod pipeline;
pub mod server;
pub mod types;
pub mod watch;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Result;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::cli::CliArgs;
use crate::config::model::{ConfigFile, StepConfig};
use crate::config::resolve_config;
use crate::dag::{DagGraph, Scheduler};
use crate::engine::{CoreRuntime, Runtime, RuntimeEvent, RuntimeOptions, TriggerReason};
use crate::errors::PipelineError;
use crate::exec::RealExecutorBackend;
use crate::fs::RealFileSystem;
use crate::pipeline::ExecContext;
use crate::server::{DevServer, ReloadHub, ReloadNotifier};
use crate::watch::WatchRuleSet;

/// High-level entry point used by `main.rs`.
///
/// This wires together:
/// - config loading
/// - scheduler / queue / runtime
/// - executor
/// - the startup build
/// - Ctrl-C handling
/// - dev server and file watcher (unless build-only)
pub async fn run(args: CliArgs) -> Result<()> {
    let config_path = PathBuf::from(&args.config);
    let cfg = resolve_config(&config_path)?;

    if args.dry_run {
        print_dry_run(&cfg);
        return Ok(());
    }

    let seed = startup_triggers(&cfg, &args)?;
    let root = config_root_dir(&config_path);

    // DAG + scheduler.
    let scheduler = Scheduler::from_config(&cfg);
    let behaviour = cfg.config.triggered_while_running_behaviour;
    let queue_length = cfg.config.queue_length;

    // Runtime event channel.
    let (rt_tx, rt_rx) = mpsc::channel::<RuntimeEvent>(64);

    let ctx = ExecContext::new(root.clone(), Arc::new(RealFileSystem)).with_force(args.force);
    let executor = RealExecutorBackend::new(rt_tx.clone(), ctx);

    let options = RuntimeOptions {
        exit_when_idle: true,
    };
    let core = CoreRuntime::new(scheduler, behaviour, queue_length, options);
    let mut runtime = Runtime::new(core, rt_rx, executor);

    let serving = !args.build_only() && cfg.serve.enabled;
    let hub = ReloadHub::default();
    if serving {
        let notifier: Arc<dyn ReloadNotifier> = Arc::new(hub.clone());
        runtime = runtime.with_reloader(notifier);
    }

    // Ctrl-C → graceful shutdown, during the startup build too.
    {
        let tx = rt_tx.clone();
        tokio::spawn(async move {
            if let Err(e) = tokio::signal::ctrl_c().await {
                warn!("failed to listen for Ctrl+C: {e}");
                return;
            }
            let _ = tx.send(RuntimeEvent::ShutdownRequested).await;
        });
    }

    // Startup build.
    if seed.tasks.is_empty() {
        warn!("no tasks to run at startup");
    } else {
        info!(tasks = ?seed.tasks, "starting build");
        rt_tx
            .send(RuntimeEvent::TasksTriggered {
                tasks: seed.tasks,
                reason: seed.reason,
            })
            .await?;

        let summary = runtime.run().await?;
        if !runtime.core().is_idle() {
            info!("interrupted during the startup build; shutting down");
            return Ok(());
        }
        if !summary.is_success() {
            return Err(PipelineError::BuildFailed(summary.failed.join(", ")).into());
        }
        info!("build finished");
    }

    if args.build_only() {
        return Ok(());
    }

    // Serve + watch until Ctrl-C.
    let _server = if serving {
        Some(DevServer::start(&root, &cfg.serve).await?)
    } else {
        None
    };

    let rules = WatchRuleSet::from_config(&cfg)?;
    let _watcher_handle = if rules.is_empty() {
        info!("no watch rules configured");
        None
    } else {
        Some(crate::watch::spawn_watcher(root.clone(), rules, rt_tx.clone())?)
    };

    runtime.core_mut().begin_serving();
    let summary = runtime.run().await?;
    if !summary.is_success() {
        debug!(failed = ?summary.failed, "failures during watch session");
    }

    info!("shutting down");
    Ok(())
}

/// The first trigger batch of a session.
#[derive(Debug)]
struct Seed {
    tasks: Vec<String>,
    reason: TriggerReason,
}

/// `--task` names if given, otherwise every startup task.
fn startup_triggers(cfg: &ConfigFile, args: &CliArgs) -> Result<Seed> {
    if args.tasks.is_empty() {
        return Ok(Seed {
            tasks: cfg.startup_tasks(),
            reason: TriggerReason::Startup,
        });
    }

    for name in &args.tasks {
        if !cfg.task.contains_key(name) {
            return Err(PipelineError::TaskNotFound(name.clone()).into());
        }
    }

    Ok(Seed {
        tasks: args.tasks.clone(),
        reason: TriggerReason::Manual,
    })
}

/// Figure out the project root.
///
/// - If the config path has a non-empty parent (e.g. "site/Sitepipe.toml"),
///   we use that directory.
/// - If it's just a bare filename like "Sitepipe.toml" (parent = ""),
///   we fall back to the current working directory "."
fn config_root_dir(config_path: &Path) -> PathBuf {
    match config_path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")),
    }
}

/// Dry-run output: tasks in execution order, then watch rules.
fn print_dry_run(cfg: &ConfigFile) {
    println!("sitepipe dry-run");
    println!(
        "  config.triggered_while_running_behaviour = {:?}",
        cfg.config.triggered_while_running_behaviour
    );
    println!("  config.queue_length = {}", cfg.config.queue_length);
    println!(
        "  serve = {}:{} -> {} (enabled: {})",
        cfg.serve.host, cfg.serve.port, cfg.serve.dir, cfg.serve.enabled
    );
    println!();

    let graph = DagGraph::from_config(cfg);
    println!("tasks ({}):", cfg.task.len());
    for name in graph.tasks() {
        let Some(task) = cfg.task.get(name) else {
            continue;
        };
        println!("  - {name}");
        if let Some(stage) = task.stage {
            println!("      stage: {stage}");
        }
        println!("      src: {:?}", task.src);
        if let Some(ref dest) = task.dest {
            println!("      dest: {dest}");
        }
        if !task.steps.is_empty() {
            let steps: Vec<String> = task.steps.iter().map(describe_step).collect();
            println!("      steps: {}", steps.join(" -> "));
        }
        if !task.after.is_empty() {
            println!("      after: {:?}", task.after);
        }
        if task.newer {
            println!("      newer: true");
        }
        if task.reload {
            println!("      reload: true");
        }
        if !task.startup {
            println!("      startup: false");
        }
    }

    if !cfg.watch.is_empty() {
        println!();
        println!("watch ({}):", cfg.watch.len());
        for rule in &cfg.watch {
            println!("  - {:?} -> {:?}", rule.patterns, rule.tasks);
        }
    }

    debug!("dry-run complete (no execution)");
}

fn describe_step(step: &StepConfig) -> String {
    match step {
        StepConfig::Clean => "clean".to_string(),
        StepConfig::Concat { file } => format!("concat({file})"),
        StepConfig::Include { .. } => "include".to_string(),
        StepConfig::Command { cmd, .. } => {
            let tool = cmd.split_whitespace().next().unwrap_or(cmd);
            format!("command({tool})")
        }
    }
}
