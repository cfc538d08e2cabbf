//! Terminal task outcomes assembled from attempt histories.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fmt;

use super::attempt::{round_millis, AttemptRecord};

/// Terminal status of a task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskStatus {
    /// The final attempt exited 0.
    Succeeded,
    /// The final attempt exited non-zero, timed out, or the worker
    /// running it crashed.
    Failed,
    /// Never executed because an ancestor failed or was itself blocked.
    Blocked,
}

impl TaskStatus {
    pub fn is_terminal_failure(self) -> bool {
        matches!(self, Self::Failed | Self::Blocked)
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Succeeded => "succeeded",
            Self::Failed => "failed",
            Self::Blocked => "blocked",
        };
        f.write_str(s)
    }
}

/// The terminal result of one task, created exactly once.
///
/// `duration_sec` sums the measured duration of every attempt; backoff
/// sleeps between attempts show up only in the mission's wall-clock
/// duration. The final attempt's exit code and output are copied to the
/// top level for quick inspection; the full history stays in
/// `attempt_log`.
#[derive(Debug, Clone, Serialize)]
pub struct TaskOutcome {
    pub id: String,
    pub status: TaskStatus,
    pub attempts: u32,
    pub started_at: Option<DateTime<Utc>>,
    pub ended_at: Option<DateTime<Utc>>,
    pub duration_sec: f64,
    pub exit_code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
    pub error: Option<String>,
    pub attempt_log: Vec<AttemptRecord>,
}

impl TaskOutcome {
    /// Build the outcome for a task that ran at least once.
    ///
    /// # Panics
    ///
    /// Panics if `attempts` is empty; the retry engine always records
    /// at least one attempt before calling this.
    pub fn from_attempts(id: impl Into<String>, attempts: Vec<AttemptRecord>) -> Self {
        let final_attempt = attempts.last().expect("at least one attempt").clone();
        let status = if final_attempt.succeeded() {
            TaskStatus::Succeeded
        } else {
            TaskStatus::Failed
        };
        let total: f64 = attempts.iter().map(|a| a.duration_sec).sum();
        Self {
            id: id.into(),
            status,
            attempts: u32::try_from(attempts.len()).unwrap_or(u32::MAX),
            started_at: attempts.first().map(|a| a.started_at),
            ended_at: Some(final_attempt.ended_at),
            duration_sec: round_millis(total),
            exit_code: Some(final_attempt.exit_code),
            stdout: final_attempt.stdout,
            stderr: final_attempt.stderr,
            error: final_attempt.error,
            attempt_log: attempts,
        }
    }

    /// Outcome for a task that never started because an ancestor failed
    /// or was blocked.
    pub fn blocked(id: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            status: TaskStatus::Blocked,
            attempts: 0,
            started_at: None,
            ended_at: None,
            duration_sec: 0.0,
            exit_code: None,
            stdout: String::new(),
            stderr: String::new(),
            error: Some(reason.into()),
            attempt_log: Vec::new(),
        }
    }

    /// Synthetic failure for a worker whose execution machinery crashed.
    /// The crash is absorbed here instead of propagating to the
    /// dispatcher loop.
    pub fn worker_crash(id: impl Into<String>, detail: impl fmt::Display) -> Self {
        Self {
            id: id.into(),
            status: TaskStatus::Failed,
            attempts: 0,
            started_at: None,
            ended_at: Some(Utc::now()),
            duration_sec: 0.0,
            exit_code: Some(1),
            stdout: String::new(),
            stderr: String::new(),
            error: Some(format!("worker crashed: {detail}")),
            attempt_log: Vec::new(),
        }
    }
}
