// src/engine/core.rs

//! Pure core runtime state machine.
//!
//! This module contains a synchronous, deterministic "core runtime" that
//! consumes [`RuntimeEvent`]s and produces:
//! - an updated core state
//! - a list of "commands" describing what the IO shell should do next
//!
//! The async/IO-heavy shell (`engine::runtime::Runtime`) is responsible for:
//! - reading events from channels
//! - sending `ScheduledTask`s and cancellations to the executor
//! - handling Ctrl+C / shutdown
//!
//! The core is unit tested without any Tokio, channels, filesystem, or
//! processes.

use crate::engine::event_handlers::{handle_task_completion, handle_task_trigger, CoreStep};
use crate::engine::queue::TriggerQueue;
use crate::engine::{RunReport, RuntimeEvent, RuntimeOptions, TaskOutcome};
use crate::task::Scheduler;
use crate::types::TriggerWhileRunningBehaviour;

/// Pure core runtime state.
///
/// This owns:
/// - the per-task scheduler
/// - the trigger queue
/// - runtime options (e.g. `exit_when_idle`)
/// - the running report (last outcome, finished runs)
///
/// It has **no** channels, no Tokio types, and does not perform any IO.
#[derive(Debug)]
pub struct CoreRuntime {
    scheduler: Scheduler,
    queue: TriggerQueue,
    options: RuntimeOptions,
    report: RunReport,
}

impl CoreRuntime {
    pub fn new(
        scheduler: Scheduler,
        behaviour: TriggerWhileRunningBehaviour,
        queue_length: usize,
        options: RuntimeOptions,
    ) -> Self {
        let queue = TriggerQueue::new(behaviour, queue_length);
        Self {
            scheduler,
            queue,
            options,
            report: RunReport::default(),
        }
    }

    /// Expose whether every task is idle (for tests).
    pub fn is_idle(&self) -> bool {
        self.scheduler.is_idle()
    }

    /// Expose queue emptiness (for tests).
    pub fn queue_is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    pub fn scheduler(&self) -> &Scheduler {
        &self.scheduler
    }

    pub fn report(&self) -> RunReport {
        self.report
    }

    /// Handle a single runtime event, updating core state and returning the
    /// resulting commands for the IO shell.
    pub fn step(&mut self, event: RuntimeEvent) -> CoreStep {
        match event {
            RuntimeEvent::TaskTriggered { task, reason } => {
                handle_task_trigger(&mut self.scheduler, &mut self.queue, task, reason)
            }
            RuntimeEvent::TaskCompleted {
                task,
                run_id,
                outcome,
            } => {
                let (step, accepted) = handle_task_completion(
                    &mut self.scheduler,
                    &mut self.queue,
                    &self.options,
                    task,
                    run_id,
                    outcome,
                );
                if accepted {
                    self.report.runs_finished += 1;
                    if outcome != TaskOutcome::Cancelled {
                        self.report.last_outcome = Some(outcome);
                    }
                }
                step
            }
            RuntimeEvent::ShutdownRequested => CoreStep {
                commands: Vec::new(),
                keep_running: false,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use super::*;
    use crate::config::model::{ConfigFile, ConfigSection, RawConfigFile, TaskConfig};
    use crate::engine::{CoreCommand, TriggerReason};
    use crate::task::ScheduledTask;

    fn core(behaviour: TriggerWhileRunningBehaviour, exit_when_idle: bool) -> CoreRuntime {
        let mut task = BTreeMap::new();
        task.insert(
            "test".to_string(),
            TaskConfig {
                steps: vec!["go test ./...".to_string()],
            },
        );
        let cfg = ConfigFile::try_from(RawConfigFile {
            config: ConfigSection::default(),
            task,
            watch: BTreeMap::new(),
        })
        .unwrap();

        CoreRuntime::new(
            Scheduler::from_config(&cfg),
            behaviour,
            1,
            RuntimeOptions { exit_when_idle },
        )
    }

    fn trigger(reason: TriggerReason) -> RuntimeEvent {
        RuntimeEvent::TaskTriggered {
            task: "test".to_string(),
            reason,
        }
    }

    fn completed(run_id: u64, outcome: TaskOutcome) -> RuntimeEvent {
        RuntimeEvent::TaskCompleted {
            task: "test".to_string(),
            run_id,
            outcome,
        }
    }

    fn dispatched(step: &CoreStep) -> Vec<ScheduledTask> {
        step.commands
            .iter()
            .filter_map(|c| match c {
                CoreCommand::DispatchTasks(tasks) => Some(tasks.clone()),
                _ => None,
            })
            .flatten()
            .collect()
    }

    #[test]
    fn burst_of_triggers_yields_one_follow_up_run() {
        let mut core = core(TriggerWhileRunningBehaviour::Queue, false);

        let first = dispatched(&core.step(trigger(TriggerReason::Manual)));
        assert_eq!(first.len(), 1);

        // Two near-simultaneous changes while the first run is in flight.
        assert!(dispatched(&core.step(trigger(TriggerReason::FileWatch))).is_empty());
        assert!(dispatched(&core.step(trigger(TriggerReason::FileWatch))).is_empty());

        let follow_up = dispatched(&core.step(completed(first[0].run_id, TaskOutcome::Success)));
        assert_eq!(follow_up.len(), 1);
        assert!(follow_up[0].run_id > first[0].run_id);

        let after = dispatched(&core.step(completed(follow_up[0].run_id, TaskOutcome::Success)));
        assert!(after.is_empty());
        assert!(core.is_idle());
        assert!(core.queue_is_empty());
        assert_eq!(core.scheduler().runs_started("test"), 2);
    }

    #[test]
    fn cancel_mode_waits_for_the_killed_run() {
        let mut core = core(TriggerWhileRunningBehaviour::Cancel, false);

        let first = dispatched(&core.step(trigger(TriggerReason::Manual)));
        let run_id = first[0].run_id;

        let step = core.step(trigger(TriggerReason::FileWatch));
        assert_eq!(
            step.commands,
            vec![CoreCommand::CancelTask {
                task: "test".to_string(),
                run_id
            }]
        );

        // A second change while cancelling neither cancels twice nor dispatches.
        assert!(core.step(trigger(TriggerReason::FileWatch)).commands.is_empty());

        let restarted = dispatched(&core.step(completed(run_id, TaskOutcome::Cancelled)));
        assert_eq!(restarted.len(), 1);
        assert_eq!(core.report().last_outcome, None);
        assert_eq!(core.report().runs_finished, 1);
    }

    #[test]
    fn one_shot_mode_exits_with_last_outcome() {
        let mut core = core(TriggerWhileRunningBehaviour::Queue, true);

        let first = dispatched(&core.step(trigger(TriggerReason::Manual)));
        let step = core.step(completed(first[0].run_id, TaskOutcome::Failed(2)));

        assert!(!step.keep_running);
        assert!(step.commands.contains(&CoreCommand::RequestExit));
        assert_eq!(core.report().last_outcome, Some(TaskOutcome::Failed(2)));
    }

    #[test]
    fn failure_does_not_stop_watch_mode() {
        let mut core = core(TriggerWhileRunningBehaviour::Queue, false);

        let first = dispatched(&core.step(trigger(TriggerReason::Manual)));
        let step = core.step(completed(first[0].run_id, TaskOutcome::Failed(1)));
        assert!(step.keep_running);

        assert_eq!(dispatched(&core.step(trigger(TriggerReason::FileWatch))).len(), 1);
    }

    #[test]
    fn shutdown_stops_the_loop() {
        let mut core = core(TriggerWhileRunningBehaviour::Queue, false);
        assert!(!core.step(RuntimeEvent::ShutdownRequested).keep_running);
    }
}
