use std::collections::HashMap;

use tracing::{debug, info, warn};

use crate::config::model::ConfigFile;
use crate::engine::TaskOutcome;
use crate::task::state::{RunState, ScheduledTask, TaskInfo, TaskRunState};
use crate::types::TaskName;

/// Outcome of asking the scheduler to start a task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TriggerDecision {
    /// The task was idle; hand this to the executor.
    Dispatch(ScheduledTask),
    /// An instance of the task is already in flight.
    AlreadyRunning,
    /// No task with that name exists.
    Unknown,
}

/// Scheduler holds the immutable task definitions plus per-task run state.
///
/// It guarantees at most one in-flight instance per task name; the queueing
/// of triggers that arrive while a task runs is handled by the engine.
#[derive(Debug)]
pub struct Scheduler {
    tasks: HashMap<TaskName, TaskInfo>,
    /// Monotonically increasing run ID.
    run_counter: u64,
}

impl Scheduler {
    /// Construct a scheduler from a validated [`ConfigFile`].
    pub fn from_config(cfg: &ConfigFile) -> Self {
        let tasks = cfg
            .tasks()
            .iter()
            .map(|(name, def)| (name.clone(), TaskInfo::new(def.clone())))
            .collect();

        Self {
            tasks,
            run_counter: 0,
        }
    }

    /// Returns `true` if no task has an in-flight instance.
    pub fn is_idle(&self) -> bool {
        self.tasks.values().all(|info| info.state == RunState::Idle)
    }

    /// Read-only view of the given task's run state.
    pub fn run_state_of(&self, task: &str) -> Option<TaskRunState> {
        let info = self.tasks.get(task)?;
        Some(info.state.into())
    }

    /// Outcome of the most recently finished run of `task`.
    pub fn last_outcome_of(&self, task: &str) -> Option<TaskOutcome> {
        self.tasks.get(task)?.last_outcome
    }

    /// How many runs of `task` have been dispatched so far.
    pub fn runs_started(&self, task: &str) -> u64 {
        self.tasks.get(task).map(|info| info.runs_started).unwrap_or(0)
    }

    /// Try to start a run of `task`.
    pub fn handle_trigger(&mut self, task: &str) -> TriggerDecision {
        let Some(info) = self.tasks.get_mut(task) else {
            warn!(task = %task, "trigger for unknown task ignored");
            return TriggerDecision::Unknown;
        };

        if info.state != RunState::Idle {
            debug!(task = %task, state = ?info.state, "task already in flight");
            return TriggerDecision::AlreadyRunning;
        }

        self.run_counter += 1;
        let run_id = self.run_counter;
        info.state = RunState::Running { run_id };
        info.runs_started += 1;

        debug!(task = %task, run_id, "scheduler: dispatching run");
        TriggerDecision::Dispatch(ScheduledTask::from_definition(&info.definition, run_id))
    }

    /// Mark the in-flight instance of `task` as being cancelled.
    ///
    /// Returns the run id to cancel, or `None` if the task is idle or a
    /// cancellation is already pending.
    pub fn mark_cancelling(&mut self, task: &str) -> Option<u64> {
        let info = self.tasks.get_mut(task)?;
        match info.state {
            RunState::Running { run_id } => {
                info.state = RunState::Cancelling { run_id };
                debug!(task = %task, run_id, "scheduler: marked cancelling");
                Some(run_id)
            }
            RunState::Cancelling { .. } | RunState::Idle => None,
        }
    }

    /// Record the completion of a run.
    ///
    /// Returns `false` (and changes nothing) if `run_id` is not the in-flight
    /// instance of `task`, e.g. a late report from an already replaced run.
    pub fn handle_completion(&mut self, task: &str, run_id: u64, outcome: TaskOutcome) -> bool {
        let Some(info) = self.tasks.get_mut(task) else {
            warn!(task = %task, run_id, "completion for unknown task ignored");
            return false;
        };

        if info.active_run_id() != Some(run_id) {
            debug!(
                task = %task,
                run_id,
                active = ?info.active_run_id(),
                "stale completion ignored"
            );
            return false;
        }

        info.state = RunState::Idle;
        info.last_outcome = Some(outcome);
        info!(task = %task, run_id, ?outcome, "scheduler: run finished");
        true
    }
}
