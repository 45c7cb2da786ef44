// tests/runtime_fake_executor.rs

use std::collections::HashMap;
use std::error::Error;
use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::time::timeout;

use taskwatch::config::ConfigFile;
use taskwatch::engine::{
    CoreRuntime, RunReport, Runtime, RuntimeEvent, RuntimeOptions, TaskName, TaskOutcome,
    TriggerReason, TriggerWhileRunningBehaviour,
};
use taskwatch::exec::ExecutorBackend;
use taskwatch::task::{ScheduledTask, Scheduler};
use taskwatch_test_utils::builders::{ConfigFileBuilder, WatchConfigBuilder};
use taskwatch_test_utils::fake_executor::FakeExecutor;
use taskwatch_test_utils::{init_tracing, with_timeout};

type TestResult = Result<(), Box<dyn Error>>;

fn test_config(behaviour: TriggerWhileRunningBehaviour) -> ConfigFile {
    ConfigFileBuilder::new()
        .with_behaviour(behaviour)
        .with_task("test", &["go test -v github.com/peferron/alternate/..."])
        .with_watch(
            "test",
            WatchConfigBuilder::new("test")
                .files("Gruntfile.js")
                .files("**/*.go")
                .at_begin(true)
                .build(),
        )
        .build()
}

fn runtime<E: ExecutorBackend>(
    cfg: &ConfigFile,
    rx: mpsc::Receiver<RuntimeEvent>,
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
    Runtime::new(core, rx, executor)
}

#[tokio::test]
async fn at_begin_runs_exactly_once_before_any_change() -> TestResult {
    init_tracing();

    let cfg = test_config(TriggerWhileRunningBehaviour::Queue);
    let rule = cfg.watch_rule("test").expect("rule").clone();
    assert!(rule.at_begin);

    let (rt_tx, rt_rx) = mpsc::channel::<RuntimeEvent>(16);
    let executed = Arc::new(Mutex::new(Vec::new()));
    let executor = FakeExecutor::new(rt_tx.clone(), executed.clone());

    rt_tx
        .send(RuntimeEvent::TaskTriggered {
            task: rule.task.clone(),
            reason: TriggerReason::Manual,
        })
        .await?;

    let report = timeout(Duration::from_secs(3), runtime(&cfg, rt_rx, executor, true).run())
        .await
        .expect("runtime did not finish within 3 seconds")?;

    assert_eq!(*executed.lock().unwrap(), vec!["test".to_string()]);
    assert_eq!(
        report,
        RunReport {
            last_outcome: Some(TaskOutcome::Success),
            runs_finished: 1,
        }
    );
    Ok(())
}

#[tokio::test]
async fn failed_run_is_reported() -> TestResult {
    init_tracing();

    let cfg = test_config(TriggerWhileRunningBehaviour::Queue);
    let (rt_tx, rt_rx) = mpsc::channel::<RuntimeEvent>(16);
    let executed = Arc::new(Mutex::new(Vec::new()));
    let executor =
        FakeExecutor::new(rt_tx.clone(), executed.clone()).with_outcome(TaskOutcome::Failed(1));

    rt_tx
        .send(RuntimeEvent::TaskTriggered {
            task: "test".to_string(),
            reason: TriggerReason::Manual,
        })
        .await?;

    let report = with_timeout(runtime(&cfg, rt_rx, executor, true).run()).await?;
    assert_eq!(report.last_outcome, Some(TaskOutcome::Failed(1)));
    Ok(())
}

/// Executor whose runs only finish when the test says so, and which tracks
/// how many runs of each task are alive at the same time.
#[derive(Clone)]
struct ManualExecutor {
    runtime_tx: mpsc::Sender<RuntimeEvent>,
    in_flight: Arc<Mutex<HashMap<TaskName, Vec<u64>>>>,
    max_concurrent: Arc<Mutex<usize>>,
    started: Arc<Mutex<Vec<u64>>>,
    cancelled: Arc<Mutex<Vec<u64>>>,
}

impl ManualExecutor {
    fn new(runtime_tx: mpsc::Sender<RuntimeEvent>) -> Self {
        Self {
            runtime_tx,
            in_flight: Arc::default(),
            max_concurrent: Arc::default(),
            started: Arc::default(),
            cancelled: Arc::default(),
        }
    }

    /// Finish the oldest in-flight run of `task` with `outcome`.
    async fn finish(&self, task: &str, outcome: TaskOutcome) {
        let run_id = {
            let mut map = self.in_flight.lock().unwrap();
            let runs = map.get_mut(task).expect("no run in flight");
            runs.remove(0)
        };
        self.runtime_tx
            .send(RuntimeEvent::TaskCompleted {
                task: task.to_string(),
                run_id,
                outcome,
            })
            .await
            .unwrap();
    }

    fn started(&self) -> Vec<u64> {
        self.started.lock().unwrap().clone()
    }
}

impl ExecutorBackend for ManualExecutor {
    fn spawn_ready_tasks(
        &mut self,
        tasks: Vec<ScheduledTask>,
    ) -> Pin<Box<dyn Future<Output = taskwatch::errors::Result<()>> + Send + '_>> {
        Box::pin(async move {
            for t in tasks {
                let mut map = self.in_flight.lock().unwrap();
                let runs = map.entry(t.name.clone()).or_default();
                runs.push(t.run_id);
                let mut max = self.max_concurrent.lock().unwrap();
                *max = (*max).max(runs.len());
                self.started.lock().unwrap().push(t.run_id);
            }
            Ok(())
        })
    }

    fn cancel_task(
        &mut self,
        task: TaskName,
        run_id: u64,
    ) -> Pin<Box<dyn Future<Output = taskwatch::errors::Result<()>> + Send + '_>> {
        Box::pin(async move {
            self.cancelled.lock().unwrap().push(run_id);
            {
                let mut map = self.in_flight.lock().unwrap();
                if let Some(runs) = map.get_mut(&task) {
                    runs.retain(|id| *id != run_id);
                }
            }
            self.runtime_tx
                .send(RuntimeEvent::TaskCompleted {
                    task,
                    run_id,
                    outcome: TaskOutcome::Cancelled,
                })
                .await
                .map_err(anyhow::Error::from)?;
            Ok(())
        })
    }
}

async fn settle() {
    tokio::time::sleep(Duration::from_millis(50)).await;
}

async fn file_change(tx: &mpsc::Sender<RuntimeEvent>) {
    tx.send(RuntimeEvent::TaskTriggered {
        task: "test".to_string(),
        reason: TriggerReason::FileWatch,
    })
    .await
    .unwrap();
}

#[tokio::test]
async fn rapid_changes_never_overlap_runs() -> TestResult {
    init_tracing();

    let cfg = test_config(TriggerWhileRunningBehaviour::Queue);
    let (rt_tx, rt_rx) = mpsc::channel::<RuntimeEvent>(16);
    let executor = ManualExecutor::new(rt_tx.clone());
    let handle = executor.clone();

    let rt = tokio::spawn(runtime(&cfg, rt_rx, executor, false).run());

    file_change(&rt_tx).await;
    settle().await;
    // Two near-simultaneous changes while the first run is in flight.
    file_change(&rt_tx).await;
    file_change(&rt_tx).await;
    settle().await;
    assert_eq!(handle.started().len(), 1);

    handle.finish("test", TaskOutcome::Success).await;
    settle().await;
    assert_eq!(handle.started().len(), 2, "one coalesced follow-up run");

    handle.finish("test", TaskOutcome::Failed(1)).await;
    settle().await;
    assert_eq!(handle.started().len(), 2, "no further runs without changes");

    rt_tx.send(RuntimeEvent::ShutdownRequested).await?;
    let report = with_timeout(rt).await??;

    assert_eq!(*handle.max_concurrent.lock().unwrap(), 1);
    assert_eq!(report.runs_finished, 2);
    assert_eq!(report.last_outcome, Some(TaskOutcome::Failed(1)));
    Ok(())
}

#[tokio::test]
async fn cancel_mode_restarts_after_the_killed_run_reports() -> TestResult {
    init_tracing();

    let cfg = test_config(TriggerWhileRunningBehaviour::Cancel);
    let (rt_tx, rt_rx) = mpsc::channel::<RuntimeEvent>(16);
    let executor = ManualExecutor::new(rt_tx.clone());
    let handle = executor.clone();

    let rt = tokio::spawn(runtime(&cfg, rt_rx, executor, false).run());

    file_change(&rt_tx).await;
    settle().await;
    file_change(&rt_tx).await;
    settle().await;

    let started = handle.started();
    assert_eq!(started.len(), 2);
    assert_eq!(*handle.cancelled.lock().unwrap(), vec![started[0]]);
    assert_eq!(*handle.max_concurrent.lock().unwrap(), 1);

    rt_tx.send(RuntimeEvent::ShutdownRequested).await?;
    let report = with_timeout(rt).await??;
    assert_eq!(report.runs_finished, 1);
    assert_eq!(report.last_outcome, None);
    Ok(())
}
