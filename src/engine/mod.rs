// src/engine/mod.rs

//! Orchestration engine for taskwatch.
//!
//! This module ties together:
//! - the per-task scheduler (at most one in-flight run per task)
//! - the trigger queue (what happens when triggers arrive while a task runs)
//! - the main runtime event loop that reacts to:
//!   - file-watch triggers
//!   - task completion events
//!   - shutdown signals
//!
//! The pure core state machine lives in [`core`]; the async/IO shell is
//! implemented in [`runtime`].

pub use crate::types::TaskName;

/// Outcome of a task run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskOutcome {
    /// Every step exited with status 0.
    Success,
    /// A step exited non-zero; carries that step's exit code (-1 when the
    /// process was killed by a signal or never started).
    Failed(i32),
    /// The run was killed because a newer trigger replaced it.
    Cancelled,
}

/// Why a task was triggered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TriggerReason {
    /// Manual trigger (CLI run, or `at_begin` of a watch rule).
    Manual,
    /// Triggered due to a filesystem event.
    FileWatch,
}

/// Runtime options used by both the core and the async shell.
#[derive(Debug, Clone, Copy)]
pub struct RuntimeOptions {
    /// If true, exit the runtime once every task is idle and there are no
    /// queued triggers (used for one-shot runs).
    pub exit_when_idle: bool,
}

/// Events flowing into the runtime from watchers, executors, etc.
#[derive(Debug, Clone)]
pub enum RuntimeEvent {
    /// A task should be run.
    TaskTriggered {
        task: TaskName,
        reason: TriggerReason,
    },
    /// A task run finished (or was killed) with a concrete outcome.
    TaskCompleted {
        task: TaskName,
        run_id: u64,
        outcome: TaskOutcome,
    },
    /// Graceful shutdown requested (e.g. Ctrl-C).
    ShutdownRequested,
}

/// Summary returned by [`Runtime::run`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunReport {
    /// Outcome of the last run that was not cancelled, if any finished.
    pub last_outcome: Option<TaskOutcome>,
    /// Number of finished runs, cancelled ones included.
    pub runs_finished: u64,
}

pub mod core;
pub mod event_handlers;
pub mod queue;
pub mod runtime;

pub use core::CoreRuntime;
pub use event_handlers::{CoreCommand, CoreStep};
pub use queue::TriggerQueue;
pub use crate::types::TriggerWhileRunningBehaviour;
pub use runtime::Runtime;
