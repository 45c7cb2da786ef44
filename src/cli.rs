// src/cli.rs

//! CLI argument parsing using `clap`.

use std::path::PathBuf;

use clap::{Parser, ValueEnum};

use crate::config::default_config_path;

/// Command-line arguments for `taskwatch`.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "taskwatch",
    version,
    about = "Run shell task sequences, once or whenever watched files change.",
    long_about = None
)]
pub struct CliArgs {
    /// Watch rule or task to run.
    ///
    /// A watch rule name enters watch mode; a task name runs it once.
    #[arg(value_name = "NAME", required_unless_present = "dry_run")]
    pub name: Option<String>,

    /// Path to the config file (TOML).
    ///
    /// Default: `Taskwatch.toml` in the current working directory.
    #[arg(long, value_name = "PATH", default_value_os_t = default_config_path())]
    pub config: PathBuf,

    /// Run the target task once instead of watching.
    #[arg(long)]
    pub once: bool,

    /// Logging level (error, warn, info, debug, trace).
    ///
    /// If omitted, `TASKWATCH_LOG` or a default level will be used.
    #[arg(long, value_enum, value_name = "LEVEL")]
    pub log_level: Option<LogLevel>,

    /// Parse + validate, print tasks and watch rules, but don't execute anything.
    #[arg(long)]
    pub dry_run: bool,
}

/// Log level as exposed on the CLI.
#[derive(Debug, Copy, Clone, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// Convenience wrapper around `CliArgs::parse()`.
pub fn parse() -> CliArgs {
    CliArgs::parse()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn name_is_required_unless_dry_run() {
        assert!(CliArgs::try_parse_from(["taskwatch"]).is_err());
        assert!(CliArgs::try_parse_from(["taskwatch", "--dry-run"]).is_ok());
    }

    #[test]
    fn config_defaults_to_taskwatch_toml() {
        let args = CliArgs::try_parse_from(["taskwatch", "install"]).unwrap();
        assert_eq!(args.config, PathBuf::from("Taskwatch.toml"));
        assert!(!args.once);
    }

    #[test]
    fn parses_flags() {
        let args = CliArgs::try_parse_from([
            "taskwatch",
            "--config",
            "ci/Taskwatch.toml",
            "--once",
            "--log-level",
            "debug",
            "test",
        ])
        .unwrap();

        assert_eq!(args.name.as_deref(), Some("test"));
        assert_eq!(args.config, PathBuf::from("ci/Taskwatch.toml"));
        assert!(args.once);
        assert!(matches!(args.log_level, Some(LogLevel::Debug)));
    }
}
