// ABOUTME: Unix integration tests for spawning, classifying and terminating real processes
// ABOUTME: Uses `sh` scripts that mimic jetty's startup banner and failure output
#![cfg(unix)]

use marmot_server::process::{
    is_process_alive, process_command_line, spawn_and_classify, terminate_process,
};
use marmot_server::{KillOutcome, ServerError};
use std::time::Duration;
use tokio::process::Command;

fn script(body: &str) -> Command {
    let mut command = Command::new("sh");
    command.arg("-c").arg(body);
    command
}

#[tokio::test]
async fn test_started_banner_on_stderr_returns_pid() {
    let command = script("echo 'Logging initialized' >&2; echo 'oejs.Server:main: Started @42ms' >&2; exec sleep 30");
    let pid = spawn_and_classify(command, "fake jetty").await.unwrap();

    assert!(is_process_alive(pid));
    let command_line = process_command_line(pid).unwrap();
    assert!(command_line.contains("sleep"), "unexpected command line {command_line}");

    assert_eq!(
        terminate_process(pid, Duration::from_secs(5)).await,
        KillOutcome::Terminated
    );
    assert!(!is_process_alive(pid));
    assert_eq!(
        terminate_process(pid, Duration::from_millis(100)).await,
        KillOutcome::AlreadyAbsent
    );
}

#[tokio::test]
async fn test_exception_reports_startup_failure() {
    let command = script("echo 'Starting' ; echo 'java.net.BindException: Address already in use' >&2; sleep 30");
    let err = spawn_and_classify(command, "failing jetty").await.unwrap_err();

    match &err {
        ServerError::StartupFailed { output, .. } => {
            assert!(output.contains("BindException"));
        }
        other => panic!("unexpected error: {other:?}"),
    }

    let orphan = err.orphan_pid().unwrap();
    terminate_process(orphan, Duration::from_secs(5)).await;
    assert!(!is_process_alive(orphan));
}

#[tokio::test]
async fn test_exit_without_banner_is_early_exit() {
    let command = script("echo 'Error: Unable to access jarfile' >&2; exit 1");
    let err = spawn_and_classify(command, "broken java").await.unwrap_err();

    match err {
        ServerError::ExitedEarly { output, .. } => {
            assert_eq!(output, "Error: Unable to access jarfile");
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn test_missing_program_is_spawn_failure() {
    let command = Command::new("/nonexistent/marmot-java");
    let err = spawn_and_classify(command, "missing java").await.unwrap_err();
    assert!(matches!(err, ServerError::SpawnFailed { .. }));
}

#[tokio::test]
async fn test_sigterm_ignoring_process_is_killed_after_grace() {
    let command = script("trap '' TERM; echo 'Server x Started y' >&2; while true; do sleep 1; done");
    let pid = spawn_and_classify(command, "stubborn server").await.unwrap();

    let outcome = terminate_process(pid, Duration::from_millis(500)).await;
    assert_eq!(outcome, KillOutcome::Terminated);
    assert!(!is_process_alive(pid));
}
