// src/task/rule.rs

use std::time::Duration;

use crate::types::TaskName;

/// Default coalescing window for file-change bursts.
pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(500);

/// Longest accepted coalescing window.
pub const MAX_DEBOUNCE: Duration = Duration::from_secs(60 * 60);

/// Binding from a set of glob patterns to a task.
///
/// Built once from a `[watch.<name>]` section after the target task has been
/// resolved; immutable afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WatchRule {
    pub name: String,
    /// Globs relative to the watch root, e.g. `"**/*.go"`.
    pub files: Vec<String>,
    /// Globs removed from the `files` match set.
    pub exclude: Vec<String>,
    /// Name of the task to run on change.
    pub task: TaskName,
    /// Run the task once before the first file event.
    pub at_begin: bool,
    pub debounce: Duration,
    /// Only count a change when the file content hash differs.
    pub use_hash: bool,
}
