// src/engine/queue.rs

use std::collections::HashMap;

use tracing::{debug, warn};

use crate::types::{TaskName, TriggerWhileRunningBehaviour};

/// Triggers that arrived while their task was already running.
///
/// Semantics:
/// - Each task has a count of pending re-runs.
/// - `max_runs` (`queue_length` in the config) caps that count. The default
///   of 1 means any burst of triggers during a run collapses into a single
///   follow-up run.
/// - When a run of a task finishes, the runtime calls [`take_pending`] to
///   decide whether to start the next one.
///
/// [`take_pending`]: TriggerQueue::take_pending
#[derive(Debug)]
pub struct TriggerQueue {
    behaviour: TriggerWhileRunningBehaviour,
    max_runs: usize,
    pending: HashMap<TaskName, usize>,
}

impl TriggerQueue {
    /// Create a new queue with the given behaviour and maximum queued runs.
    ///
    /// `max_runs` is clamped to at least 1, as a zero-length queue would make
    /// queuing semantics meaningless.
    pub fn new(behaviour: TriggerWhileRunningBehaviour, max_runs: usize) -> Self {
        let max_runs = max_runs.max(1);
        Self {
            behaviour,
            max_runs,
            pending: HashMap::new(),
        }
    }

    /// Returns true if no task has a queued re-run.
    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    /// Returns the configured behaviour.
    pub fn behaviour(&self) -> TriggerWhileRunningBehaviour {
        self.behaviour
    }

    /// Number of re-runs queued for `task`.
    pub fn pending_for(&self, task: &str) -> usize {
        self.pending.get(task).copied().unwrap_or(0)
    }

    /// Record that `task` was triggered while a run of it is in progress.
    ///
    /// - `Queue`: add one pending re-run, capped at `max_runs`; excess
    ///   triggers are merged into the last queued run.
    /// - `Cancel`: the running instance is about to be killed, so exactly one
    ///   re-run is kept, no matter how many triggers arrive.
    pub fn record_trigger(&mut self, task: &str) {
        let count = self.pending.entry(task.to_string()).or_insert(0);

        match self.behaviour {
            TriggerWhileRunningBehaviour::Queue => {
                if *count < self.max_runs {
                    *count += 1;
                    debug!(task = %task, pending = *count, "queued re-run (queue mode)");
                } else {
                    warn!(
                        task = %task,
                        max_runs = self.max_runs,
                        "queue full; merging trigger into last queued run"
                    );
                }
            }
            TriggerWhileRunningBehaviour::Cancel => {
                *count = 1;
                debug!(task = %task, "reset queued re-runs to the latest trigger (cancel mode)");
            }
        }
    }

    /// Consume one queued re-run of `task`, returning true if there was one.
    pub fn take_pending(&mut self, task: &str) -> bool {
        let Some(count) = self.pending.get_mut(task) else {
            return false;
        };

        *count -= 1;
        if *count == 0 {
            self.pending.remove(task);
        }
        debug!(task = %task, "dequeued re-run");
        true
    }
}
