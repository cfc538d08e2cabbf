//! Shell-backed attempt executor.
//!
//! Runs one command string through `sh -c` with piped stdio and an
//! optional budget, producing a normalized [`AttemptRecord`]. This is
//! the "run one attempt" primitive: it never retries and never looks at
//! dependencies.

use async_trait::async_trait;
use chrono::Utc;
use std::process::Stdio;
use std::time::{Duration, Instant};
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::process::Command;
use tracing::debug;

use crate::domain::models::{round_millis, AttemptRecord, TIMEOUT_EXIT_CODE};
use crate::domain::ports::CommandRunner;

/// Executes commands through a POSIX shell.
#[derive(Debug, Clone)]
pub struct ShellRunner {
    shell: String,
}

impl ShellRunner {
    pub fn new() -> Self {
        Self { shell: "sh".to_string() }
    }

    /// Use a specific shell binary instead of `sh`.
    pub fn with_shell(shell: impl Into<String>) -> Self {
        Self { shell: shell.into() }
    }
}

impl Default for ShellRunner {
    fn default() -> Self {
        Self::new()
    }
}

/// Collect everything a child stream produces. After a timeout kill the
/// pipe closes, so this returns whatever partial bytes were written.
async fn drain<R: AsyncRead + Unpin>(stream: Option<R>) -> Vec<u8> {
    let mut buf = Vec::new();
    if let Some(mut stream) = stream {
        let _ = stream.read_to_end(&mut buf).await;
    }
    buf
}

#[async_trait]
impl CommandRunner for ShellRunner {
    async fn run(&self, command: &str, timeout: Option<Duration>) -> AttemptRecord {
        let started_at = Utc::now();
        let clock = Instant::now();

        let spawned = Command::new(&self.shell)
            .arg("-c")
            .arg(command)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn();

        let mut child = match spawned {
            Ok(child) => child,
            Err(err) => {
                return AttemptRecord {
                    attempt: 0,
                    started_at,
                    ended_at: Utc::now(),
                    duration_sec: round_millis(clock.elapsed().as_secs_f64()),
                    exit_code: 1,
                    stdout: String::new(),
                    stderr: String::new(),
                    error: Some(format!("failed to launch command: {err}")),
                };
            }
        };

        // Drain concurrently so pipe buffers never stall the child and
        // partial output survives a timeout kill.
        let stdout_task = tokio::spawn(drain(child.stdout.take()));
        let stderr_task = tokio::spawn(drain(child.stderr.take()));

        let (exit_code, error) = match timeout {
            Some(budget) => match tokio::time::timeout(budget, child.wait()).await {
                Ok(Ok(status)) => (status.code().unwrap_or(-1), None),
                Ok(Err(err)) => (1, Some(format!("failed to wait for command: {err}"))),
                Err(_) => {
                    let _ = child.kill().await;
                    debug!(command, budget_sec = budget.as_secs_f64(), "attempt timed out");
                    (TIMEOUT_EXIT_CODE, Some(format!("timed out after {}s", budget.as_secs_f64())))
                }
            },
            None => match child.wait().await {
                Ok(status) => (status.code().unwrap_or(-1), None),
                Err(err) => (1, Some(format!("failed to wait for command: {err}"))),
            },
        };

        let stdout_bytes = stdout_task.await.unwrap_or_default();
        let stderr_bytes = stderr_task.await.unwrap_or_default();

        AttemptRecord {
            attempt: 0,
            started_at,
            ended_at: Utc::now(),
            duration_sec: round_millis(clock.elapsed().as_secs_f64()),
            exit_code,
            stdout: String::from_utf8_lossy(&stdout_bytes).into_owned(),
            stderr: String::from_utf8_lossy(&stderr_bytes).into_owned(),
            error,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn captures_stdout_and_stderr() {
        let runner = ShellRunner::new();
        let record = runner.run("echo out; echo err >&2", None).await;
        assert_eq!(record.exit_code, 0);
        assert_eq!(record.stdout.trim(), "out");
        assert_eq!(record.stderr.trim(), "err");
        assert!(record.error.is_none());
    }

    #[tokio::test]
    async fn nonzero_exit_is_reported() {
        let runner = ShellRunner::new();
        let record = runner.run("exit 7", None).await;
        assert_eq!(record.exit_code, 7);
        assert!(!record.succeeded());
    }

    #[tokio::test]
    async fn timeout_preserves_partial_output() {
        let runner = ShellRunner::new();
        let record = runner
            .run(
                "printf partial-out; printf partial-err >&2; sleep 5",
                Some(Duration::from_millis(200)),
            )
            .await;
        assert_eq!(record.exit_code, TIMEOUT_EXIT_CODE);
        assert_eq!(record.stdout, "partial-out");
        assert_eq!(record.stderr, "partial-err");
        assert!(record.error.as_deref().unwrap().contains("timed out after 0.2s"));
    }

    #[tokio::test]
    async fn launch_failure_reports_exit_one() {
        let runner = ShellRunner::with_shell("/nonexistent/shell-binary");
        let record = runner.run("echo hi", None).await;
        assert_eq!(record.exit_code, 1);
        assert!(record.stdout.is_empty());
        assert!(record.error.as_deref().unwrap().contains("failed to launch"));
    }
}
