// ABOUTME: Process control for supervised servers
// ABOUTME: Spawning with startup-output classification, graceful termination and process table lookups

use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::VecDeque;
use std::path::Path;
use std::process::Stdio;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::process::Command;
use tokio::sync::mpsc;
use tokio::time::{sleep, Instant};
use tracing::{debug, error, info, warn};

use crate::types::{ServerError, ServerResult};

static STARTED_LINE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)Server[^\r\n]+Started[^\r\n]+").expect("startup pattern is valid")
});
static QUOTED_VERSION: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"version "([^"]+)""#).expect("version pattern is valid"));
static DOTTED_VERSION: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\b((?:\d+\.){2}\d+(?:_\d+)?)\b").expect("dotted version pattern is valid")
});

const EXCEPTION_MARKER: &str = "Exception";
const MAX_CAPTURED_LINES: usize = 200;
const POLL_INTERVAL: Duration = Duration::from_millis(250);
const KILL_WAIT: Duration = Duration::from_secs(2);

/// How a server's startup ended, judged from its output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StartupOutcome {
    Started,
    Failed { output: String },
    Exited { output: String },
}

/// Fold over a server's output lines deciding whether it came up.
///
/// The first line that classifies wins; later lines are ignored. A success
/// banner beats an exception on the same line.
#[derive(Debug, Default)]
pub struct StartupClassifier {
    captured: VecDeque<String>,
    outcome: Option<StartupOutcome>,
}

impl StartupClassifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed one line; returns the outcome once one has been reached.
    pub fn feed(&mut self, line: &str) -> Option<&StartupOutcome> {
        if self.outcome.is_none() {
            if self.captured.len() == MAX_CAPTURED_LINES {
                self.captured.pop_front();
            }
            self.captured.push_back(line.to_string());

            if STARTED_LINE.is_match(line) {
                self.outcome = Some(StartupOutcome::Started);
            } else if line.contains(EXCEPTION_MARKER) {
                self.outcome = Some(StartupOutcome::Failed {
                    output: self.captured_output(),
                });
            }
        }
        self.outcome.as_ref()
    }

    /// Recent output, oldest line first.
    pub fn captured_output(&self) -> String {
        self.captured
            .iter()
            .map(String::as_str)
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Close the stream. Without a classifying line the server exited.
    pub fn finish(self) -> StartupOutcome {
        match self.outcome {
            Some(outcome) => outcome,
            None => StartupOutcome::Exited {
                output: self.captured_output(),
            },
        }
    }
}

/// Classify a complete sequence of output lines.
pub fn classify_lines<I, S>(lines: I) -> StartupOutcome
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut classifier = StartupClassifier::new();
    for line in lines {
        if classifier.feed(line.as_ref()).is_some() {
            break;
        }
    }
    classifier.finish()
}

/// Spawn `command` detached from our terminal and wait until its output says
/// whether it started.
///
/// There is no timeout: a server that never prints a verdict and never exits
/// keeps the caller waiting.
pub async fn spawn_and_classify(mut command: Command, description: &str) -> ServerResult<u32> {
    command
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped());
    #[cfg(unix)]
    command.process_group(0);

    let mut child = command.spawn().map_err(|e| ServerError::SpawnFailed {
        command: description.to_string(),
        error: e.to_string(),
    })?;

    let pid = child.id().ok_or_else(|| ServerError::SpawnFailed {
        command: description.to_string(),
        error: "process exited before its pid could be read".to_string(),
    })?;
    info!("Spawned '{}' with PID: {}", description, pid);

    let (tx, mut rx) = mpsc::unbounded_channel::<String>();
    if let Some(stdout) = child.stdout.take() {
        forward_lines(stdout, tx.clone());
    }
    if let Some(stderr) = child.stderr.take() {
        forward_lines(stderr, tx.clone());
    }
    drop(tx);

    let mut classifier = StartupClassifier::new();
    while let Some(line) = rx.recv().await {
        debug!(target: "marmot::server_output", "[{}] {}", pid, line);
        if classifier.feed(&line).is_some() {
            break;
        }
    }

    match classifier.finish() {
        StartupOutcome::Started => {
            info!("Process {} reported a successful start", pid);
            Ok(pid)
        }
        StartupOutcome::Failed { output } => {
            warn!("Process {} reported an exception during startup", pid);
            Err(ServerError::StartupFailed { pid, output })
        }
        StartupOutcome::Exited { output } => {
            match child.wait().await {
                Ok(status) => warn!("Process {} exited during startup with {}", pid, status),
                Err(e) => warn!("Process {} closed its output during startup: {}", pid, e),
            }
            Err(ServerError::ExitedEarly { pid, output })
        }
    }
}

/// Forward every line of `reader` into the channel until either side closes.
/// Bytes are decoded lossily; servers do not always speak UTF-8.
fn forward_lines<R>(reader: R, tx: mpsc::UnboundedSender<String>)
where
    R: AsyncRead + Unpin + Send + 'static,
{
    tokio::spawn(async move {
        let mut reader = BufReader::new(reader);
        let mut buffer = Vec::new();
        loop {
            buffer.clear();
            match reader.read_until(b'\n', &mut buffer).await {
                Ok(0) | Err(_) => break,
                Ok(_) => {
                    let line = String::from_utf8_lossy(&buffer)
                        .trim_end_matches(['\r', '\n'])
                        .to_string();
                    if tx.send(line).is_err() {
                        break;
                    }
                }
            }
        }
    });
}

/// Result of asking a process to go away.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KillOutcome {
    Terminated,
    AlreadyAbsent,
}

/// Whether `pid` names a live (non-zombie) process.
pub fn is_process_alive(pid: u32) -> bool {
    use sysinfo::{Pid, ProcessStatus, System};

    let mut system = System::new();
    system.refresh_processes();
    system
        .process(Pid::from_u32(pid))
        .is_some_and(|process| !matches!(process.status(), ProcessStatus::Zombie))
}

/// Command line of a live process, `None` when the pid is not running.
pub fn process_command_line(pid: u32) -> Option<String> {
    use sysinfo::{Pid, ProcessStatus, System};

    let mut system = System::new();
    system.refresh_processes();
    let process = system.process(Pid::from_u32(pid))?;
    if matches!(process.status(), ProcessStatus::Zombie) {
        return None;
    }

    let cmd = process.cmd();
    if cmd.is_empty() {
        Some(process.name().to_string())
    } else {
        Some(cmd.join(" "))
    }
}

async fn wait_for_exit(pid: u32, limit: Duration) -> bool {
    let deadline = Instant::now() + limit;
    loop {
        if !is_process_alive(pid) {
            return true;
        }
        if Instant::now() >= deadline {
            return false;
        }
        sleep(POLL_INTERVAL).await;
    }
}

/// SIGTERM, wait up to `grace`, then SIGKILL.
///
/// A process that does not exist is reported as `AlreadyAbsent`, never as
/// an error.
pub async fn terminate_process(pid: u32, grace: Duration) -> KillOutcome {
    #[cfg(unix)]
    {
        use nix::errno::Errno;
        use nix::sys::signal::{kill, Signal};
        use nix::unistd::Pid;

        let Ok(raw_pid) = i32::try_from(pid) else {
            warn!("PID {} is out of range, nothing to terminate", pid);
            return KillOutcome::AlreadyAbsent;
        };
        if raw_pid <= 0 {
            return KillOutcome::AlreadyAbsent;
        }
        let nix_pid = Pid::from_raw(raw_pid);

        match kill(nix_pid, Signal::SIGTERM) {
            Ok(()) => info!("Sent SIGTERM to process with PID: {}", pid),
            Err(Errno::ESRCH) => {
                debug!("Process {} is not running", pid);
                return KillOutcome::AlreadyAbsent;
            }
            Err(Errno::EPERM) => {
                // Someone else's process now holds this pid; ours is gone.
                warn!("Process {} belongs to another user, leaving it alone", pid);
                return KillOutcome::AlreadyAbsent;
            }
            Err(e) => {
                warn!("Failed to send SIGTERM to PID {}: {}", pid, e);
                return KillOutcome::AlreadyAbsent;
            }
        }

        if wait_for_exit(pid, grace).await {
            info!("Process {} terminated gracefully after SIGTERM", pid);
            return KillOutcome::Terminated;
        }

        warn!("Process {} did not respond to SIGTERM, sending SIGKILL", pid);
        match kill(nix_pid, Signal::SIGKILL) {
            Ok(()) => info!("Sent SIGKILL to process with PID: {}", pid),
            Err(Errno::ESRCH) => return KillOutcome::Terminated,
            Err(e) => warn!("Failed to send SIGKILL to PID {}: {}", pid, e),
        }

        if !wait_for_exit(pid, KILL_WAIT).await {
            error!("Process {} did not terminate even after SIGKILL", pid);
        }
        KillOutcome::Terminated
    }

    #[cfg(not(unix))]
    {
        use sysinfo::{Pid, System};

        let _ = grace;
        let mut system = System::new();
        system.refresh_processes();
        match system.process(Pid::from_u32(pid)) {
            Some(process) => {
                if !process.kill() {
                    warn!("Failed to kill process {}", pid);
                }
                if !wait_for_exit(pid, KILL_WAIT).await {
                    error!("Process {} did not terminate", pid);
                }
                KillOutcome::Terminated
            }
            None => KillOutcome::AlreadyAbsent,
        }
    }
}

/// Run `<java> -version` and report the version it prints.
pub async fn detect_java_version(java: &Path) -> ServerResult<String> {
    let output = Command::new(java)
        .arg("-version")
        .stdin(Stdio::null())
        .output()
        .await
        .map_err(|e| ServerError::JavaNotFound {
            reason: format!("failed to run '{}': {}", java.display(), e),
        })?;

    // `java -version` historically prints to stderr.
    let text = format!(
        "{}\n{}",
        String::from_utf8_lossy(&output.stderr),
        String::from_utf8_lossy(&output.stdout)
    );

    parse_java_version(&text).ok_or_else(|| ServerError::JavaNotFound {
        reason: format!("'{} -version' did not report a version", java.display()),
    })
}

pub fn parse_java_version(output: &str) -> Option<String> {
    QUOTED_VERSION
        .captures(output)
        .or_else(|| DOTTED_VERSION.captures(output))
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_started_banner() {
        let outcome = classify_lines([
            "2016-05-01 INFO  Logging initialized",
            "2016-05-01 INFO  oejs.Server:main: Started @1532ms",
        ]);
        assert_eq!(outcome, StartupOutcome::Started);
    }

    #[test]
    fn test_started_is_case_insensitive() {
        assert_eq!(
            classify_lines(["embedded SERVER has been STARTED on 8080"]),
            StartupOutcome::Started
        );
    }

    #[test]
    fn test_exception_captures_output() {
        let outcome = classify_lines([
            "Starting jetty",
            "java.net.BindException: Address already in use",
            "oejs.Server:main: Started @10ms",
        ]);
        assert_eq!(
            outcome,
            StartupOutcome::Failed {
                output: "Starting jetty\njava.net.BindException: Address already in use"
                    .to_string()
            }
        );
    }

    #[test]
    fn test_first_classifying_line_wins() {
        let outcome = classify_lines([
            "oejs.Server:main: Started @10ms",
            "java.lang.IllegalStateException",
        ]);
        assert_eq!(outcome, StartupOutcome::Started);
    }

    #[test]
    fn test_end_of_stream_is_exit() {
        let outcome = classify_lines(["Error: Unable to access jarfile x.jar"]);
        assert_eq!(
            outcome,
            StartupOutcome::Exited {
                output: "Error: Unable to access jarfile x.jar".to_string()
            }
        );
        assert_eq!(
            classify_lines(Vec::<String>::new()),
            StartupOutcome::Exited {
                output: String::new()
            }
        );
    }

    #[test]
    fn test_started_requires_text_around_keywords() {
        // "Started" must be followed by something on the same line.
        assert!(matches!(
            classify_lines(["Server Started"]),
            StartupOutcome::Exited { .. }
        ));
    }

    #[test]
    fn test_captured_output_is_bounded() {
        let mut classifier = StartupClassifier::new();
        for i in 0..(MAX_CAPTURED_LINES + 50) {
            assert!(classifier.feed(&format!("line {}", i)).is_none());
        }
        let output = classifier.captured_output();
        assert_eq!(output.lines().count(), MAX_CAPTURED_LINES);
        assert!(output.starts_with("line 50"));
    }

    #[test]
    fn test_parse_java_version() {
        let openjdk = "openjdk version \"17.0.8\" 2023-07-18\nOpenJDK Runtime Environment";
        assert_eq!(parse_java_version(openjdk).as_deref(), Some("17.0.8"));

        let oracle = "java version \"1.8.0_181\"\nJava(TM) SE Runtime Environment";
        assert_eq!(parse_java_version(oracle).as_deref(), Some("1.8.0_181"));

        let bare = "runtime 1.7.0_80 (build 24.80-b11)";
        assert_eq!(parse_java_version(bare).as_deref(), Some("1.7.0_80"));

        assert_eq!(parse_java_version("command not found"), None);
    }

    #[test]
    fn test_missing_process_has_no_command_line() {
        assert_eq!(process_command_line(u32::MAX - 1), None);
        assert!(!is_process_alive(u32::MAX - 1));
    }
}
