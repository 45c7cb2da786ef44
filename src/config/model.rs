// src/config/model.rs

use std::collections::BTreeMap;

use serde::Deserialize;

use crate::task::{TaskDefinition, WatchRule};
use crate::types::{TaskName, TriggerWhileRunningBehaviour};

/// Top-level configuration as read from a TOML file.
///
/// ```toml
/// [config]
/// triggered_while_running_behaviour = "queue"
/// queue_length = 1
///
/// [task.install]
/// steps = ["go test ./...", "go install ."]
///
/// [watch.test]
/// files = ["**/*.go"]
/// task = "test"
/// at_begin = true
/// ```
///
/// This is the unvalidated form; convert it into a [`ConfigFile`] with
/// `ConfigFile::try_from`.
#[derive(Debug, Clone, Deserialize)]
pub struct RawConfigFile {
    /// Global behaviour config from `[config]`.
    #[serde(default)]
    pub config: ConfigSection,

    /// All tasks from `[task.<name>]`, keyed by task name.
    #[serde(default)]
    pub task: BTreeMap<String, TaskConfig>,

    /// All watch rules from `[watch.<name>]`, keyed by rule name.
    #[serde(default)]
    pub watch: BTreeMap<String, WatchConfig>,
}

/// `[config]` section.
///
/// Controls what happens when a task is triggered while it is still running.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct ConfigSection {
    /// `"queue"` (default) or `"cancel"`.
    #[serde(default)]
    pub triggered_while_running_behaviour: TriggerWhileRunningBehaviour,

    /// Maximum number of re-runs remembered per task while it runs.
    ///
    /// The default of 1 coalesces any burst of triggers into one follow-up.
    #[serde(default = "default_queue_length")]
    pub queue_length: usize,
}

fn default_queue_length() -> usize {
    1
}

impl Default for ConfigSection {
    fn default() -> Self {
        Self {
            triggered_while_running_behaviour: TriggerWhileRunningBehaviour::default(),
            queue_length: default_queue_length(),
        }
    }
}

/// `[task.<name>]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct TaskConfig {
    /// Shell commands, run in order; a failing step stops the task.
    pub steps: Vec<String>,
}

/// `[watch.<name>]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct WatchConfig {
    /// Glob patterns, relative to the watch root.
    pub files: Vec<String>,

    #[serde(default)]
    pub exclude: Vec<String>,

    /// Task to run when a matching file changes.
    pub task: String,

    /// Run the task once at startup, before any change.
    #[serde(default)]
    pub at_begin: bool,

    /// Coalescing window such as `"500ms"`; defaults to 500ms.
    #[serde(default)]
    pub debounce: Option<String>,

    /// Skip triggers for files whose content did not change.
    #[serde(default)]
    pub use_hash: bool,
}

/// Validated, immutable configuration.
///
/// Every watch rule's target task is guaranteed to exist and every step has
/// been checked, so the rest of the crate never re-validates.
#[derive(Debug, Clone)]
pub struct ConfigFile {
    config: ConfigSection,
    tasks: BTreeMap<TaskName, TaskDefinition>,
    watch: BTreeMap<String, WatchRule>,
}

impl ConfigFile {
    pub(crate) fn new_unchecked(
        config: ConfigSection,
        tasks: BTreeMap<TaskName, TaskDefinition>,
        watch: BTreeMap<String, WatchRule>,
    ) -> Self {
        Self {
            config,
            tasks,
            watch,
        }
    }

    pub fn config_section(&self) -> &ConfigSection {
        &self.config
    }

    pub fn tasks(&self) -> &BTreeMap<TaskName, TaskDefinition> {
        &self.tasks
    }

    pub fn task(&self, name: &str) -> Option<&TaskDefinition> {
        self.tasks.get(name)
    }

    pub fn watch_rules(&self) -> &BTreeMap<String, WatchRule> {
        &self.watch
    }

    pub fn watch_rule(&self, name: &str) -> Option<&WatchRule> {
        self.watch.get(name)
    }
}
