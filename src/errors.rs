// src/errors.rs

//! Crate-wide error aliases and helpers.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum TaskwatchError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Task not found: {0}")]
    TaskNotFound(String),

    #[error("File watch error: {0}")]
    WatchError(String),

    #[error("TOML parsing error: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl From<notify::Error> for TaskwatchError {
    fn from(err: notify::Error) -> Self {
        TaskwatchError::WatchError(err.to_string())
    }
}

pub use anyhow::Error;
pub type Result<T> = std::result::Result<T, TaskwatchError>;
