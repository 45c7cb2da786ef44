// src/exec/backend.rs

//! Pluggable executor backend abstraction.
//!
//! The runtime talks to an `ExecutorBackend` instead of a raw mpsc sender.
//! This makes it easy to swap in a fake executor in tests while keeping the
//! production executor implementation in [`executor_loop`].
//!
//! - `RealExecutorBackend` is the default implementation used by `taskwatch`.
//!   It wraps the `spawn_executor` loop and forwards scheduled tasks and
//!   cancellations over an mpsc channel.
//! - Tests can provide their own `ExecutorBackend` that, for example, records
//!   which tasks were scheduled and directly emits `TaskCompleted` events.
//!
//! [`executor_loop`]: super::executor_loop

use std::future::Future;
use std::pin::Pin;

use tokio::sync::mpsc;

use crate::engine::{RuntimeEvent, TaskName};
use crate::errors::{Error, Result};
use crate::task::ScheduledTask;

use super::executor_loop::{spawn_executor, ExecutorMessage};

/// Trait abstracting how scheduled tasks are executed.
///
/// Production code uses [`RealExecutorBackend`]; tests can provide their own
/// implementation that doesn't spawn real processes.
pub trait ExecutorBackend: Send {
    /// Dispatch the given tasks for execution.
    ///
    /// Every dispatched task must eventually produce exactly one
    /// `RuntimeEvent::TaskCompleted` carrying its `run_id`.
    fn spawn_ready_tasks(
        &mut self,
        tasks: Vec<ScheduledTask>,
    ) -> Pin<Box<dyn Future<Output = Result<()>> + Send + '_>>;

    /// Stop the in-flight run `run_id` of `task`.
    ///
    /// The killed run reports `TaskOutcome::Cancelled`; a run that already
    /// finished reports its real outcome instead.
    fn cancel_task(
        &mut self,
        task: TaskName,
        run_id: u64,
    ) -> Pin<Box<dyn Future<Output = Result<()>> + Send + '_>>;
}

/// Real executor backend used in production.
pub struct RealExecutorBackend {
    tx: mpsc::Sender<ExecutorMessage>,
}

impl RealExecutorBackend {
    /// Create a new real executor backend, wiring it to the given runtime
    /// event sender.
    ///
    /// This spawns the background executor loop immediately.
    pub fn new(runtime_tx: mpsc::Sender<RuntimeEvent>) -> Self {
        let tx = spawn_executor(runtime_tx);
        Self { tx }
    }
}

impl ExecutorBackend for RealExecutorBackend {
    fn spawn_ready_tasks(
        &mut self,
        tasks: Vec<ScheduledTask>,
    ) -> Pin<Box<dyn Future<Output = Result<()>> + Send + '_>> {
        // Clone the sender so the future doesn't borrow `self` across `await`.
        let tx = self.tx.clone();

        Box::pin(async move {
            for task in tasks {
                tx.send(ExecutorMessage::Run(task))
                    .await
                    .map_err(Error::from)?;
            }
            Ok(())
        })
    }

    fn cancel_task(
        &mut self,
        task: TaskName,
        run_id: u64,
    ) -> Pin<Box<dyn Future<Output = Result<()>> + Send + '_>> {
        let tx = self.tx.clone();

        Box::pin(async move {
            tx.send(ExecutorMessage::Cancel { task, run_id })
                .await
                .map_err(Error::from)?;
            Ok(())
        })
    }
}
