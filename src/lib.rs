// src/lib.rs

pub mod cli;
pub mod config;
pub mod engine;
pub mod errors;
pub mod exec;
pub mod logging;
pub mod task;
pub mod types;
pub mod watch;

use std::path::{Path, PathBuf};

use tokio::sync::mpsc;
use tracing::{debug, info};

use crate::cli::CliArgs;
use crate::config::loader::load_and_validate;
use crate::config::model::ConfigFile;
use crate::engine::{
    CoreRuntime, RunReport, Runtime, RuntimeEvent, RuntimeOptions, TaskOutcome, TriggerReason,
};
use crate::errors::{Result, TaskwatchError};
use crate::exec::RealExecutorBackend;
use crate::task::Scheduler;

/// High-level entry point used by `main.rs`.
///
/// This wires together:
/// - config loading (fatal on any configuration error, before anything runs)
/// - name resolution: watch rule first, then task
/// - [`run_task`] or [`watch`]
///
/// Returns the outcome of a one-shot run, or `None` for dry runs and
/// watch sessions that ended on Ctrl-C.
pub async fn run(args: CliArgs) -> anyhow::Result<Option<TaskOutcome>> {
    let config_path = args.config.clone();
    let cfg = load_and_validate(&config_path)?;

    if args.dry_run {
        print_dry_run(&cfg);
        return Ok(None);
    }

    let Some(name) = args.name.as_deref() else {
        return Err(TaskwatchError::TaskNotFound("<none given>".to_string()).into());
    };

    if let Some(rule) = cfg.watch_rule(name) {
        if args.once {
            info!(rule = %name, task = %rule.task, "--once given; running watch target once");
            return Ok(Some(run_task(&cfg, &rule.task).await?));
        }
        let root = config_root_dir(&config_path);
        watch(&cfg, name, &root).await?;
        return Ok(None);
    }

    if cfg.task(name).is_some() {
        return Ok(Some(run_task(&cfg, name).await?));
    }

    Err(TaskwatchError::TaskNotFound(name.to_string()).into())
}

/// Run every step of task `name` once, in order, and return its outcome.
///
/// Stops at the first failing step and reports that step's exit code. An
/// interrupt (Ctrl-C) kills the running step and yields `Cancelled`.
pub async fn run_task(cfg: &ConfigFile, name: &str) -> Result<TaskOutcome> {
    if cfg.task(name).is_none() {
        return Err(TaskwatchError::TaskNotFound(name.to_string()));
    }

    let (rt_tx, rt_rx) = mpsc::channel::<RuntimeEvent>(64);
    let executor = RealExecutorBackend::new(rt_tx.clone());
    spawn_ctrl_c_listener(rt_tx.clone());

    send_trigger(&rt_tx, name, TriggerReason::Manual).await?;

    let report = build_runtime(cfg, rt_rx, executor, true).run().await?;
    Ok(report.last_outcome.unwrap_or(TaskOutcome::Cancelled))
}

/// Watch `root` according to watch rule `rule_name` until Ctrl-C.
///
/// - `at_begin` rules trigger one run before any file event is handled.
/// - Step failures are reported and watching continues.
/// - Failing to start the filesystem watcher is fatal.
pub async fn watch(cfg: &ConfigFile, rule_name: &str, root: &Path) -> Result<RunReport> {
    let rule = cfg
        .watch_rule(rule_name)
        .ok_or_else(|| TaskwatchError::TaskNotFound(rule_name.to_string()))?;

    let (rt_tx, rt_rx) = mpsc::channel::<RuntimeEvent>(64);

    // Queued ahead of any file event.
    if rule.at_begin {
        info!(rule = %rule.name, task = %rule.task, "at_begin: running task before watching");
        send_trigger(&rt_tx, &rule.task, TriggerReason::Manual).await?;
    }

    // Keep the handle alive for the whole session.
    let _watcher = crate::watch::spawn_watcher(root, rule, rt_tx.clone())?;

    let executor = RealExecutorBackend::new(rt_tx.clone());
    spawn_ctrl_c_listener(rt_tx.clone());

    build_runtime(cfg, rt_rx, executor, false).run().await
}

fn build_runtime<E: exec::ExecutorBackend>(
    cfg: &ConfigFile,
    rt_rx: mpsc::Receiver<RuntimeEvent>,
    executor: E,
    exit_when_idle: bool,
) -> Runtime<E> {
    let section = cfg.config_section();
    let core = CoreRuntime::new(
        Scheduler::from_config(cfg),
        section.triggered_while_running_behaviour,
        section.queue_length,
        RuntimeOptions { exit_when_idle },
    );
    Runtime::new(core, rt_rx, executor)
}

async fn send_trigger(
    tx: &mpsc::Sender<RuntimeEvent>,
    task: &str,
    reason: TriggerReason,
) -> Result<()> {
    tx.send(RuntimeEvent::TaskTriggered {
        task: task.to_string(),
        reason,
    })
    .await
    .map_err(anyhow::Error::from)?;
    Ok(())
}

/// Ctrl-C -> graceful shutdown. In-flight children are killed on drop.
fn spawn_ctrl_c_listener(tx: mpsc::Sender<RuntimeEvent>) {
    tokio::spawn(async move {
        if let Err(e) = tokio::signal::ctrl_c().await {
            eprintln!("failed to listen for Ctrl+C: {e}");
            return;
        }
        let _ = tx.send(RuntimeEvent::ShutdownRequested).await;
    });
}

/// Figure out a sensible project root for watching.
///
/// - If the config path has a non-empty parent (e.g. "ci/Taskwatch.toml"),
///   we use that directory.
/// - If it's just a bare filename like "Taskwatch.toml" (parent = ""),
///   we fall back to the current working directory "."
fn config_root_dir(config_path: &Path) -> PathBuf {
    match config_path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")),
    }
}

/// Simple dry-run output: print tasks, steps and watch rules.
fn print_dry_run(cfg: &ConfigFile) {
    let section = cfg.config_section();
    println!("taskwatch dry-run");
    println!(
        "  config.triggered_while_running_behaviour = {:?}",
        section.triggered_while_running_behaviour
    );
    println!("  config.queue_length = {}", section.queue_length);
    println!();

    println!("tasks ({}):", cfg.tasks().len());
    for (name, task) in cfg.tasks().iter() {
        println!("  - {name}");
        for (idx, step) in task.steps().iter().enumerate() {
            println!("      step {}: {}", idx + 1, step);
        }
    }

    if !cfg.watch_rules().is_empty() {
        println!();
        println!("watch rules ({}):", cfg.watch_rules().len());
        for (name, rule) in cfg.watch_rules().iter() {
            println!("  - {name} -> task {}", rule.task);
            println!("      files: {:?}", rule.files);
            if !rule.exclude.is_empty() {
                println!("      exclude: {:?}", rule.exclude);
            }
            println!("      at_begin: {}", rule.at_begin);
            println!("      debounce: {:?}", rule.debounce);
            if rule.use_hash {
                println!("      use_hash: true");
            }
        }
    }

    debug!("dry-run complete (no execution)");
}
