// src/task/mod.rs

//! Task model and per-task run tracking.
//!
//! - [`definition`] holds tasks and their shell steps.
//! - [`rule`] holds watch rules binding glob patterns to a task.
//! - [`state`] provides run state and scheduled task types.
//! - [`scheduler`] makes sure a task never has two instances in flight.

pub mod definition;
pub mod rule;
pub mod scheduler;
pub mod state;

pub use definition::{StepCommand, TaskDefinition};
pub use rule::{WatchRule, DEFAULT_DEBOUNCE, MAX_DEBOUNCE};
pub use scheduler::{Scheduler, TriggerDecision};
pub use state::{ScheduledTask, TaskRunState};
