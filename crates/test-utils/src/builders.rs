#![allow(dead_code)]

use std::collections::BTreeMap;

use taskwatch::config::{ConfigFile, ConfigSection, RawConfigFile, TaskConfig, WatchConfig};
use taskwatch::types::TriggerWhileRunningBehaviour;

/// Builder for `ConfigFile` to simplify test setup.
pub struct ConfigFileBuilder {
    config: RawConfigFile,
}

impl ConfigFileBuilder {
    pub fn new() -> Self {
        Self {
            config: RawConfigFile {
                config: ConfigSection::default(),
                task: BTreeMap::new(),
                watch: BTreeMap::new(),
            },
        }
    }

    /// Add a task with the given steps.
    pub fn with_task(mut self, name: &str, steps: &[&str]) -> Self {
        self.config.task.insert(
            name.to_string(),
            TaskConfig {
                steps: steps.iter().map(|s| s.to_string()).collect(),
            },
        );
        self
    }

    pub fn with_watch(mut self, name: &str, watch: WatchConfig) -> Self {
        self.config.watch.insert(name.to_string(), watch);
        self
    }

    pub fn with_behaviour(mut self, behaviour: TriggerWhileRunningBehaviour) -> Self {
        self.config.config.triggered_while_running_behaviour = behaviour;
        self
    }

    pub fn with_queue_length(mut self, len: usize) -> Self {
        self.config.config.queue_length = len;
        self
    }

    /// The unvalidated config, for tests that expect validation to fail.
    pub fn build_raw(self) -> RawConfigFile {
        self.config
    }

    pub fn build(self) -> ConfigFile {
        ConfigFile::try_from(self.config).expect("Failed to build valid config from builder")
    }
}

impl Default for ConfigFileBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Builder for `WatchConfig`.
pub struct WatchConfigBuilder {
    watch: WatchConfig,
}

impl WatchConfigBuilder {
    pub fn new(task: &str) -> Self {
        Self {
            watch: WatchConfig {
                files: vec![],
                exclude: vec![],
                task: task.to_string(),
                at_begin: false,
                debounce: None,
                use_hash: false,
            },
        }
    }

    pub fn files(mut self, pattern: &str) -> Self {
        self.watch.files.push(pattern.to_string());
        self
    }

    pub fn exclude(mut self, pattern: &str) -> Self {
        self.watch.exclude.push(pattern.to_string());
        self
    }

    pub fn at_begin(mut self, val: bool) -> Self {
        self.watch.at_begin = val;
        self
    }

    pub fn debounce(mut self, duration: &str) -> Self {
        self.watch.debounce = Some(duration.to_string());
        self
    }

    pub fn use_hash(mut self, val: bool) -> Self {
        self.watch.use_hash = val;
        self
    }

    pub fn build(self) -> WatchConfig {
        self.watch
    }
}
