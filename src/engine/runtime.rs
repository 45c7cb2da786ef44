// src/engine/runtime.rs

use std::fmt;

use tokio::sync::mpsc;
use tracing::{debug, info};

use crate::errors::Result;
use crate::exec::ExecutorBackend;

use super::core::CoreRuntime;
use super::{CoreCommand, RunReport, RuntimeEvent};

/// Why the event loop stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum StopReason {
    /// Every sender (watcher, executor, Ctrl-C listener) is gone.
    ChannelClosed,
    /// The core asked to stop: shutdown request, or idle in one-shot mode.
    CoreRequested,
}

/// Async shell around [`CoreRuntime`].
///
/// Reads `RuntimeEvent`s, lets the core decide, then forwards dispatches and
/// cancellations to the `ExecutorBackend`. All task semantics live in the
/// core.
pub struct Runtime<E: ExecutorBackend> {
    core: CoreRuntime,
    event_rx: mpsc::Receiver<RuntimeEvent>,
    executor: E,
}

impl<E: ExecutorBackend> fmt::Debug for Runtime<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Runtime")
            .field("core", &self.core)
            .finish_non_exhaustive()
    }
}

impl<E: ExecutorBackend> Runtime<E> {
    pub fn new(core: CoreRuntime, event_rx: mpsc::Receiver<RuntimeEvent>, executor: E) -> Self {
        Self {
            core,
            event_rx,
            executor,
        }
    }

    /// Process events until the core asks to stop or every sender is dropped,
    /// then return the core's report.
    ///
    /// An executor error aborts the loop.
    pub async fn run(mut self) -> Result<RunReport> {
        info!("taskwatch runtime started");

        let reason = self.event_loop().await?;
        let report = self.core.report();

        info!(
            ?reason,
            runs_finished = report.runs_finished,
            last_outcome = ?report.last_outcome,
            "runtime stopped"
        );
        Ok(report)
    }

    async fn event_loop(&mut self) -> Result<StopReason> {
        while let Some(event) = self.event_rx.recv().await {
            debug!(?event, "runtime received event");

            let step = self.core.step(event);
            for command in step.commands {
                self.execute(command).await?;
            }

            if !step.keep_running {
                return Ok(StopReason::CoreRequested);
            }
        }
        Ok(StopReason::ChannelClosed)
    }

    async fn execute(&mut self, command: CoreCommand) -> Result<()> {
        match command {
            CoreCommand::DispatchTasks(tasks) if tasks.is_empty() => Ok(()),
            CoreCommand::DispatchTasks(tasks) => {
                for t in &tasks {
                    debug!(task = %t.name, run_id = t.run_id, steps = t.steps.len(), "dispatching run");
                }
                self.executor.spawn_ready_tasks(tasks).await
            }
            CoreCommand::CancelTask { task, run_id } => {
                debug!(task = %task, run_id, "forwarding cancellation to executor");
                self.executor.cancel_task(task, run_id).await
            }
            // keep_running is already false for this step.
            CoreCommand::RequestExit => Ok(()),
        }
    }
}
