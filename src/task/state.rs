// src/task/state.rs

//! Per-task run state and the dispatch unit handed to the executor.

use crate::engine::TaskOutcome;
use crate::task::definition::{StepCommand, TaskDefinition};
use crate::types::TaskName;

/// Internal run state of a task slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum RunState {
    Idle,
    /// Dispatched to the executor; waiting for its completion event.
    Running { run_id: u64 },
    /// A kill was requested; waiting for the executor to confirm.
    Cancelling { run_id: u64 },
}

/// Public, read-only view of a task's run state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskRunState {
    Idle,
    Running,
    Cancelling,
}

impl From<RunState> for TaskRunState {
    fn from(state: RunState) -> Self {
        match state {
            RunState::Idle => TaskRunState::Idle,
            RunState::Running { .. } => TaskRunState::Running,
            RunState::Cancelling { .. } => TaskRunState::Cancelling,
        }
    }
}

/// Static task definition plus its mutable run bookkeeping.
#[derive(Debug, Clone)]
pub(crate) struct TaskInfo {
    pub definition: TaskDefinition,
    pub state: RunState,
    pub last_outcome: Option<TaskOutcome>,
    pub runs_started: u64,
}

impl TaskInfo {
    pub fn new(definition: TaskDefinition) -> Self {
        Self {
            definition,
            state: RunState::Idle,
            last_outcome: None,
            runs_started: 0,
        }
    }

    /// Run id of the in-flight instance, if any.
    pub fn active_run_id(&self) -> Option<u64> {
        match self.state {
            RunState::Idle => None,
            RunState::Running { run_id } | RunState::Cancelling { run_id } => Some(run_id),
        }
    }
}

/// Description of a task run the scheduler wants the executor to start now.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScheduledTask {
    pub name: TaskName,
    pub steps: Vec<StepCommand>,
    /// Monotonically increasing run identifier, unique across all tasks.
    pub run_id: u64,
}

impl ScheduledTask {
    pub fn from_definition(def: &TaskDefinition, run_id: u64) -> Self {
        Self {
            name: def.name().to_string(),
            steps: def.steps().to_vec(),
            run_id,
        }
    }
}
