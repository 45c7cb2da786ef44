// src/exec/executor_loop.rs

//! Main executor loop that manages running task processes.

use std::collections::HashMap;

use tokio::sync::{mpsc, oneshot};
use tracing::{debug, info, warn};

use crate::engine::{RuntimeEvent, TaskName};
use crate::exec::task_runner::run_task;
use crate::task::ScheduledTask;

/// Message accepted by the executor loop.
#[derive(Debug, Clone)]
pub enum ExecutorMessage {
    /// Start running a task's steps.
    Run(ScheduledTask),
    /// Kill the given run if it is still in flight.
    Cancel { task: TaskName, run_id: u64 },
}

/// Internal handle for a currently-running task.
///
/// - `cancel` is used by the executor to request that the run be stopped.
/// - `handle` is the Tokio task that is actually running the steps.
struct ActiveTask {
    run_id: u64,
    cancel: Option<oneshot::Sender<()>>,
    handle: tokio::task::JoinHandle<()>,
}

/// Spawn the background executor loop.
///
/// The returned `mpsc::Sender<ExecutorMessage>` is what
/// `RealExecutorBackend` uses. Each run is executed in its own Tokio task,
/// and **per task name there will never be more than one run in flight**:
/// a `Run` for a task whose previous run is still alive first cancels that
/// run. The engine never asks for this, so it is logged as a warning.
pub fn spawn_executor(runtime_tx: mpsc::Sender<RuntimeEvent>) -> mpsc::Sender<ExecutorMessage> {
    let (tx, mut rx) = mpsc::channel::<ExecutorMessage>(32);

    tokio::spawn(async move {
        info!("executor loop started");

        // At most one ActiveTask per task name.
        let mut active: HashMap<TaskName, ActiveTask> = HashMap::new();

        while let Some(msg) = rx.recv().await {
            match msg {
                ExecutorMessage::Run(task) => {
                    handle_scheduled_task(task, &mut active, &runtime_tx).await;
                }
                ExecutorMessage::Cancel { task, run_id } => {
                    handle_cancel(&task, run_id, &mut active);
                }
            }
        }

        info!("executor loop finished (channel closed)");
    });

    tx
}

/// Handle a newly scheduled task.
async fn handle_scheduled_task(
    task: ScheduledTask,
    active: &mut HashMap<TaskName, ActiveTask>,
    runtime_tx: &mpsc::Sender<RuntimeEvent>,
) {
    let name = task.name.clone();

    if let Some(mut existing) = active.remove(&name) {
        if !existing.handle.is_finished() {
            warn!(
                task = %name,
                run_id = task.run_id,
                previous_run_id = existing.run_id,
                "previous run still alive; cancelling it before starting the new one"
            );
            if let Some(cancel) = existing.cancel.take() {
                let _ = cancel.send(());
            }
            // Wait for the previous run so their processes never overlap.
            if let Err(e) = existing.handle.await {
                warn!(task = %name, error = %e, "previous task runner panicked");
            }
        }
    }

    // Create a fresh cancel channel and spawn the new run.
    let (cancel_tx, cancel_rx) = oneshot::channel::<()>();
    let rt_tx = runtime_tx.clone();
    let run_id = task.run_id;
    let spawn_name = name.clone();

    let handle = tokio::spawn(async move {
        run_task(task, rt_tx, cancel_rx).await;
        debug!(task = %spawn_name, run_id, "task runner future finished");
    });

    active.insert(
        name,
        ActiveTask {
            run_id,
            cancel: Some(cancel_tx),
            handle,
        },
    );
}

/// Cancel a running task instance, if it is still the one in flight.
fn handle_cancel(task: &str, run_id: u64, active: &mut HashMap<TaskName, ActiveTask>) {
    let Some(existing) = active.get_mut(task) else {
        debug!(task = %task, run_id, "cancel for a task that never ran; ignoring");
        return;
    };

    if existing.run_id != run_id || existing.handle.is_finished() {
        debug!(
            task = %task,
            run_id,
            active_run_id = existing.run_id,
            "run already finished or replaced; nothing to cancel"
        );
        return;
    }

    match existing.cancel.take() {
        Some(cancel) => {
            info!(task = %task, run_id, "cancelling running task instance");
            if cancel.send(()).is_err() {
                debug!(task = %task, run_id, "run finished while cancelling");
            }
        }
        None => {
            debug!(task = %task, run_id, "cancellation already requested");
        }
    }
}
