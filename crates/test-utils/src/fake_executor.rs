use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Mutex};

use tokio::sync::mpsc;
use taskwatch::engine::{RuntimeEvent, TaskName, TaskOutcome};
use taskwatch::errors::Result;
use taskwatch::exec::ExecutorBackend;
use taskwatch::task::ScheduledTask;

/// A fake executor that:
/// - records which tasks were "run"
/// - immediately reports the configured outcome (default `Success`) for
///   each scheduled task.
pub struct FakeExecutor {
    runtime_tx: mpsc::Sender<RuntimeEvent>,
    executed: Arc<Mutex<Vec<String>>>,
    outcome: TaskOutcome,
}

impl FakeExecutor {
    pub fn new(
        runtime_tx: mpsc::Sender<RuntimeEvent>,
        executed: Arc<Mutex<Vec<String>>>,
    ) -> Self {
        Self {
            runtime_tx,
            executed,
            outcome: TaskOutcome::Success,
        }
    }

    pub fn with_outcome(mut self, outcome: TaskOutcome) -> Self {
        self.outcome = outcome;
        self
    }
}

impl ExecutorBackend for FakeExecutor {
    fn spawn_ready_tasks(
        &mut self,
        tasks: Vec<ScheduledTask>,
    ) -> Pin<Box<dyn Future<Output = Result<()>> + Send + '_>> {
        let tx = self.runtime_tx.clone();
        let executed = Arc::clone(&self.executed);
        let outcome = self.outcome;

        Box::pin(async move {
            for t in tasks {
                {
                    let mut guard = executed.lock().unwrap();
                    guard.push(t.name.clone());
                }

                tx.send(RuntimeEvent::TaskCompleted {
                    task: t.name.clone(),
                    run_id: t.run_id,
                    outcome,
                })
                .await
                .map_err(anyhow::Error::from)?;
            }
            Ok(())
        })
    }

    fn cancel_task(
        &mut self,
        _task: TaskName,
        _run_id: u64,
    ) -> Pin<Box<dyn Future<Output = Result<()>> + Send + '_>> {
        // Runs complete immediately, so there is never anything to cancel.
        Box::pin(async { Ok(()) })
    }
}
