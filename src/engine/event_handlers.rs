// src/engine/event_handlers.rs

//! Event handling logic for the core runtime.

use tracing::{debug, info, warn};

use crate::engine::queue::TriggerQueue;
use crate::engine::{RuntimeOptions, TaskName, TaskOutcome, TriggerReason};
use crate::task::{ScheduledTask, Scheduler, TriggerDecision};
use crate::types::TriggerWhileRunningBehaviour;

/// Command produced by the pure core, to be executed by the outer IO shell.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CoreCommand {
    /// Send these tasks to the executor.
    DispatchTasks(Vec<ScheduledTask>),
    /// Kill the in-flight instance `run_id` of `task`.
    CancelTask { task: TaskName, run_id: u64 },
    /// Request that the process exits (one-shot mode, once idle).
    RequestExit,
}

/// Decision returned by the core after handling a single `RuntimeEvent`.
#[derive(Debug, Clone)]
pub struct CoreStep {
    /// Commands the IO shell should execute (dispatch, cancel, exit).
    pub commands: Vec<CoreCommand>,
    /// Whether the outer runtime loop should keep running.
    pub keep_running: bool,
}

impl CoreStep {
    fn continue_with(commands: Vec<CoreCommand>) -> Self {
        Self {
            commands,
            keep_running: true,
        }
    }
}

/// Handle a task trigger event.
///
/// - Idle task: dispatch a run right away.
/// - Running task: remember the trigger in the queue. In cancel mode the
///   in-flight run is also asked to stop; the follow-up is dispatched only
///   once the cancelled run has reported back, so two instances of a task
///   never overlap.
pub fn handle_task_trigger(
    scheduler: &mut Scheduler,
    queue: &mut TriggerQueue,
    task: TaskName,
    reason: TriggerReason,
) -> CoreStep {
    let mut commands = Vec::new();

    match scheduler.handle_trigger(&task) {
        TriggerDecision::Dispatch(scheduled) => {
            info!(task = %task, run_id = scheduled.run_id, ?reason, "starting task run");
            commands.push(CoreCommand::DispatchTasks(vec![scheduled]));
        }
        TriggerDecision::AlreadyRunning => {
            queue.record_trigger(&task);

            if queue.behaviour() == TriggerWhileRunningBehaviour::Cancel {
                if let Some(run_id) = scheduler.mark_cancelling(&task) {
                    info!(task = %task, run_id, "re-triggered while running; cancelling current run");
                    commands.push(CoreCommand::CancelTask { task, run_id });
                }
            } else {
                debug!(task = %task, ?reason, "re-triggered while running; queued");
            }
        }
        TriggerDecision::Unknown => {
            // Validated configs never reference unknown tasks.
        }
    }

    CoreStep::continue_with(commands)
}

/// Handle a task completion event.
///
/// Returns the step plus whether the completion was accepted (i.e. it was
/// for the in-flight run of `task`).
pub fn handle_task_completion(
    scheduler: &mut Scheduler,
    queue: &mut TriggerQueue,
    options: &RuntimeOptions,
    task: TaskName,
    run_id: u64,
    outcome: TaskOutcome,
) -> (CoreStep, bool) {
    let mut commands = Vec::new();

    let accepted = scheduler.handle_completion(&task, run_id, outcome);

    if accepted {
        match outcome {
            TaskOutcome::Success => {}
            TaskOutcome::Failed(code) => {
                warn!(task = %task, run_id, exit_code = code, "task failed");
            }
            TaskOutcome::Cancelled => {
                debug!(task = %task, run_id, "cancelled run reaped");
            }
        }

        if queue.take_pending(&task) {
            if let TriggerDecision::Dispatch(scheduled) = scheduler.handle_trigger(&task) {
                info!(task = %task, run_id = scheduled.run_id, "starting queued re-run");
                commands.push(CoreCommand::DispatchTasks(vec![scheduled]));
            }
        }
    }

    // In one-shot mode, we can exit when every task is idle and there are no
    // pending triggers in the queue.
    let mut keep_running = true;
    if options.exit_when_idle && scheduler.is_idle() && queue.is_empty() {
        keep_running = false;
        commands.push(CoreCommand::RequestExit);
    }

    (
        CoreStep {
            commands,
            keep_running,
        },
        accepted,
    )
}
