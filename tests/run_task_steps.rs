// tests/run_task_steps.rs
#![cfg(unix)]

use std::error::Error;
use std::fs;
use std::path::{Path, PathBuf};

use taskwatch::config::load_and_validate;
use taskwatch::engine::TaskOutcome;
use taskwatch::errors::TaskwatchError;
use taskwatch::run_task;
use taskwatch_test_utils::builders::ConfigFileBuilder;
use taskwatch_test_utils::{init_tracing, with_timeout};

type TestResult = Result<(), Box<dyn Error>>;

fn append_cmd(log: &Path, line: &str) -> String {
    format!("echo {} >> '{}'", line, log.display())
}

fn read_lines(log: &Path) -> Vec<String> {
    fs::read_to_string(log)
        .unwrap_or_default()
        .lines()
        .map(str::to_string)
        .collect()
}

#[tokio::test]
async fn failing_first_step_skips_the_second() -> TestResult {
    init_tracing();
    let dir = tempfile::tempdir()?;
    let log = dir.path().join("steps.log");

    let first = format!("{} && exit 3", append_cmd(&log, "test"));
    let second = append_cmd(&log, "install");
    let cfg = ConfigFileBuilder::new()
        .with_task("install", &[first.as_str(), second.as_str()])
        .build();

    let outcome = with_timeout(run_task(&cfg, "install")).await?;

    assert_eq!(outcome, TaskOutcome::Failed(3));
    assert_eq!(read_lines(&log), vec!["test"]);
    Ok(())
}

#[tokio::test]
async fn succeeding_first_step_runs_the_second_once() -> TestResult {
    init_tracing();
    let dir = tempfile::tempdir()?;
    let log = dir.path().join("steps.log");

    let first = append_cmd(&log, "test");
    let second = append_cmd(&log, "install");
    let cfg = ConfigFileBuilder::new()
        .with_task("install", &[first.as_str(), second.as_str()])
        .build();

    let outcome = with_timeout(run_task(&cfg, "install")).await?;

    assert_eq!(outcome, TaskOutcome::Success);
    assert_eq!(read_lines(&log), vec!["test", "install"]);
    Ok(())
}

#[tokio::test]
async fn unknown_task_spawns_nothing() -> TestResult {
    let cfg = ConfigFileBuilder::new().with_task("test", &["true"]).build();

    let res = run_task(&cfg, "deploy").await;
    assert!(matches!(res, Err(TaskwatchError::TaskNotFound(ref n)) if n == "deploy"));
    Ok(())
}

#[tokio::test]
async fn missing_program_fails_with_shell_status() -> TestResult {
    init_tracing();
    let cfg = ConfigFileBuilder::new()
        .with_task("broken", &["definitely-not-a-real-program-xyz"])
        .build();

    let outcome = with_timeout(run_task(&cfg, "broken")).await?;

    // `sh` reports "command not found" as 127.
    assert_eq!(outcome, TaskOutcome::Failed(127));
    Ok(())
}

#[test]
fn shipped_config_declares_test_and_install() -> TestResult {
    let manifest = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    let cfg = load_and_validate(manifest.join("Taskwatch.toml"))?;

    let test = cfg.task("test").expect("test task");
    assert_eq!(
        test.steps().iter().map(|s| s.as_str()).collect::<Vec<_>>(),
        vec!["go test -v github.com/peferron/alternate/..."]
    );

    let install = cfg.task("install").expect("install task");
    assert_eq!(
        install.steps().iter().map(|s| s.as_str()).collect::<Vec<_>>(),
        vec![
            "go test -v github.com/peferron/alternate/...",
            "go install github.com/peferron/alternate",
        ]
    );

    let rule = cfg.watch_rule("test").expect("test watch rule");
    assert_eq!(rule.task, "test");
    assert!(rule.at_begin);
    assert_eq!(rule.files, vec!["Gruntfile.js", "**/*.go"]);
    Ok(())
}
