// src/config/validate.rs

use std::collections::BTreeMap;

use crate::config::model::{ConfigFile, ConfigSection, RawConfigFile, TaskConfig, WatchConfig};
use crate::errors::{Result, TaskwatchError};
use crate::task::{StepCommand, TaskDefinition, WatchRule, DEFAULT_DEBOUNCE, MAX_DEBOUNCE};
use crate::types::{parse_duration, TaskName};
use crate::watch::patterns::WatchProfile;

impl TryFrom<RawConfigFile> for ConfigFile {
    type Error = TaskwatchError;

    fn try_from(raw: RawConfigFile) -> std::result::Result<Self, Self::Error> {
        ensure_has_tasks(&raw)?;
        validate_global_config(&raw.config)?;

        let tasks = resolve_tasks(&raw.task)?;
        let watch = resolve_watch_rules(&raw.watch, &tasks)?;

        Ok(ConfigFile::new_unchecked(raw.config, tasks, watch))
    }
}

fn ensure_has_tasks(cfg: &RawConfigFile) -> Result<()> {
    if cfg.task.is_empty() {
        return Err(TaskwatchError::ConfigError(
            "config must contain at least one [task.<name>] section".to_string(),
        ));
    }
    Ok(())
}

fn validate_global_config(section: &ConfigSection) -> Result<()> {
    // triggered_while_running_behaviour is strongly typed and validated
    // during deserialization.

    if section.queue_length == 0 {
        return Err(TaskwatchError::ConfigError(
            "[config].queue_length must be >= 1 (got 0)".to_string(),
        ));
    }

    Ok(())
}

fn resolve_tasks(raw: &BTreeMap<String, TaskConfig>) -> Result<BTreeMap<TaskName, TaskDefinition>> {
    let mut tasks = BTreeMap::new();

    for (name, task) in raw.iter() {
        if task.steps.is_empty() {
            return Err(TaskwatchError::ConfigError(format!(
                "task '{}' must declare at least one step",
                name
            )));
        }

        let steps = task
            .steps
            .iter()
            .enumerate()
            .map(|(idx, raw_step)| {
                StepCommand::parse(raw_step).map_err(|e| {
                    TaskwatchError::ConfigError(format!(
                        "task '{}' step {}: {}",
                        name,
                        idx + 1,
                        e
                    ))
                })
            })
            .collect::<Result<Vec<_>>>()?;

        tasks.insert(name.clone(), TaskDefinition::new(name.clone(), steps));
    }

    Ok(tasks)
}

fn resolve_watch_rules(
    raw: &BTreeMap<String, WatchConfig>,
    tasks: &BTreeMap<TaskName, TaskDefinition>,
) -> Result<BTreeMap<String, WatchRule>> {
    let mut rules = BTreeMap::new();

    for (name, watch) in raw.iter() {
        if !tasks.contains_key(&watch.task) {
            return Err(TaskwatchError::ConfigError(format!(
                "watch rule '{}' references unknown task '{}'",
                name, watch.task
            )));
        }

        if watch.files.is_empty() {
            return Err(TaskwatchError::ConfigError(format!(
                "watch rule '{}' must declare at least one pattern in `files`",
                name
            )));
        }

        let debounce = match watch.debounce.as_deref() {
            Some(s) => parse_duration(s)
                .and_then(|d| {
                    if d > MAX_DEBOUNCE {
                        Err(format!("'{}' is longer than {:?}", s, MAX_DEBOUNCE))
                    } else {
                        Ok(d)
                    }
                })
                .map_err(|e| {
                    TaskwatchError::ConfigError(format!(
                        "watch rule '{}' has invalid debounce: {}",
                        name, e
                    ))
                })?,
            None => DEFAULT_DEBOUNCE,
        };

        let rule = WatchRule {
            name: name.clone(),
            files: watch.files.clone(),
            exclude: watch.exclude.clone(),
            task: watch.task.clone(),
            at_begin: watch.at_begin,
            debounce,
            use_hash: watch.use_hash,
        };

        // Compile the globs now so a bad pattern fails at startup.
        WatchProfile::from_rule(&rule).map_err(|e| {
            TaskwatchError::ConfigError(format!("watch rule '{}': {:#}", name, e))
        })?;

        rules.insert(name.clone(), rule);
    }

    Ok(rules)
}
