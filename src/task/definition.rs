// src/task/definition.rs

//! Task and step definitions.
//!
//! A task is an ordered list of [`StepCommand`]s. Each step is one external
//! process, run through the platform shell so that the command strings in
//! `Taskwatch.toml` behave the same as when typed into a terminal.

use std::fmt;

use tokio::process::Command;

use crate::types::TaskName;

/// One external process invocation within a task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StepCommand {
    command: String,
}

impl StepCommand {
    /// Validate a raw command string and wrap it.
    ///
    /// Rejected: empty strings, NUL bytes, unbalanced single or double quotes
    /// and a dangling trailing backslash. The shell would fail on these at
    /// run time; catching them here turns them into a startup error.
    pub fn parse(raw: &str) -> Result<Self, String> {
        let command = raw.trim();
        if command.is_empty() {
            return Err("step command is empty".to_string());
        }
        if command.contains('\0') {
            return Err(format!("step command contains a NUL byte: {command:?}"));
        }
        check_quoting(command)?;

        Ok(Self {
            command: command.to_string(),
        })
    }

    pub fn as_str(&self) -> &str {
        &self.command
    }

    /// Build the process that runs this step.
    ///
    /// `sh -c <command>` on Unix, `cmd /C <command>` on Windows.
    pub fn to_command(&self) -> Command {
        if cfg!(windows) {
            let mut c = Command::new("cmd");
            c.arg("/C").arg(&self.command);
            c
        } else {
            let mut c = Command::new("sh");
            c.arg("-c").arg(&self.command);
            c
        }
    }
}

impl fmt::Display for StepCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.command)
    }
}

/// POSIX-ish quote scan: backslash escapes outside single quotes, nothing is
/// special inside single quotes.
fn check_quoting(command: &str) -> Result<(), String> {
    let mut in_single = false;
    let mut in_double = false;
    let mut chars = command.chars();

    while let Some(c) = chars.next() {
        match c {
            '\\' if !in_single => {
                if chars.next().is_none() {
                    return Err(format!(
                        "step command ends with a dangling escape: {command:?}"
                    ));
                }
            }
            '\'' if !in_double => in_single = !in_single,
            '"' if !in_single => in_double = !in_double,
            _ => {}
        }
    }

    if in_single {
        return Err(format!("unterminated single quote in step command: {command:?}"));
    }
    if in_double {
        return Err(format!("unterminated double quote in step command: {command:?}"));
    }
    Ok(())
}

/// A named, ordered sequence of steps.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskDefinition {
    name: TaskName,
    steps: Vec<StepCommand>,
}

impl TaskDefinition {
    pub fn new(name: impl Into<TaskName>, steps: Vec<StepCommand>) -> Self {
        Self {
            name: name.into(),
            steps,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn steps(&self) -> &[StepCommand] {
        &self.steps
    }
}
