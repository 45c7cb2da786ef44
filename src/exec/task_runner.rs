// src/exec/task_runner.rs

//! Runs the steps of a single task, in order.

use std::process::Stdio;

use anyhow::{Context, Result};
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, error, info, warn};

use crate::engine::{RuntimeEvent, TaskOutcome};
use crate::task::{ScheduledTask, StepCommand};

/// Run every step of `task` and report exactly one `TaskCompleted` event.
///
/// - Steps run strictly in order; a step starts only after the previous one
///   exited with status 0.
/// - The first non-zero exit stops the task with `Failed(code)`.
/// - Child stdout/stderr are inherited, so the user sees tool output as is.
/// - If the cancel channel fires, the current child is killed, remaining
///   steps are skipped and the outcome is `Cancelled`.
pub async fn run_task(
    task: ScheduledTask,
    runtime_tx: mpsc::Sender<RuntimeEvent>,
    cancel_rx: oneshot::Receiver<()>,
) {
    let outcome = run_steps(&task, cancel_rx).await;

    info!(
        task = %task.name,
        run_id = task.run_id,
        ?outcome,
        "task run finished"
    );

    if let Err(err) = runtime_tx
        .send(RuntimeEvent::TaskCompleted {
            task: task.name.clone(),
            run_id: task.run_id,
            outcome,
        })
        .await
    {
        warn!(task = %task.name, run_id = task.run_id, error = %err, "runtime gone; dropping completion");
    }
}

/// Result of a single step.
enum StepResult {
    Exited { code: i32, success: bool },
    Cancelled,
}

async fn run_steps(task: &ScheduledTask, cancel_rx: oneshot::Receiver<()>) -> TaskOutcome {
    let mut cancel_rx = Some(cancel_rx);
    let total = task.steps.len();

    for (idx, step) in task.steps.iter().enumerate() {
        info!(
            task = %task.name,
            run_id = task.run_id,
            step = idx + 1,
            of = total,
            cmd = %step,
            "running step"
        );

        match run_step(task, step, &mut cancel_rx).await {
            Ok(StepResult::Exited { success: true, .. }) => {}
            Ok(StepResult::Exited { code, .. }) => {
                error!(
                    task = %task.name,
                    run_id = task.run_id,
                    step = idx + 1,
                    exit_code = code,
                    cmd = %step,
                    "step failed; skipping remaining steps"
                );
                return TaskOutcome::Failed(code);
            }
            Ok(StepResult::Cancelled) => return TaskOutcome::Cancelled,
            Err(err) => {
                error!(
                    task = %task.name,
                    run_id = task.run_id,
                    step = idx + 1,
                    error = %format!("{err:#}"),
                    "step could not be executed"
                );
                return TaskOutcome::Failed(-1);
            }
        }
    }

    TaskOutcome::Success
}

async fn run_step(
    task: &ScheduledTask,
    step: &StepCommand,
    cancel_rx: &mut Option<oneshot::Receiver<()>>,
) -> Result<StepResult> {
    let mut cmd = step.to_command();
    cmd.stdin(Stdio::inherit())
        .stdout(Stdio::inherit())
        .stderr(Stdio::inherit())
        .kill_on_drop(true);

    let mut child = cmd
        .spawn()
        .with_context(|| format!("spawning process for task '{}' step `{}`", task.name, step))?;

    tokio::select! {
        status_res = child.wait() => {
            let status = status_res.with_context(|| {
                format!("waiting for process of task '{}'", task.name)
            })?;

            let code = status.code().unwrap_or(-1);
            debug!(
                task = %task.name,
                run_id = task.run_id,
                exit_code = code,
                success = status.success(),
                "step process exited"
            );
            Ok(StepResult::Exited { code, success: status.success() })
        }

        _ = cancelled(cancel_rx) => {
            info!(
                task = %task.name,
                run_id = task.run_id,
                "cancellation requested; killing step process"
            );
            if let Err(e) = child.kill().await {
                warn!(
                    task = %task.name,
                    run_id = task.run_id,
                    error = %e,
                    "failed to kill child process on cancellation"
                );
            }
            Ok(StepResult::Cancelled)
        }
    }
}

/// Resolves when cancellation is requested; never resolves if the sender
/// was dropped without requesting it.
async fn cancelled(cancel_rx: &mut Option<oneshot::Receiver<()>>) {
    if let Some(rx) = cancel_rx.as_mut() {
        if rx.await.is_ok() {
            return;
        }
        *cancel_rx = None;
    }
    std::future::pending::<()>().await
}
