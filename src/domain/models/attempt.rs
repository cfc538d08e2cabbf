//! Attempt records: the normalized result of running a command once.

use chrono::{DateTime, Utc};
use serde::Serialize;

/// Exit code reported when a command exceeds its execution budget.
pub const TIMEOUT_EXIT_CODE: i32 = 124;

/// One execution attempt of a task command.
///
/// Produced by the attempt executor; the retry engine fills in the
/// 1-based `attempt` number and appends the record to the task's
/// history. Immutable after that.
#[derive(Debug, Clone, Serialize)]
pub struct AttemptRecord {
    pub attempt: u32,
    pub started_at: DateTime<Utc>,
    pub ended_at: DateTime<Utc>,
    pub duration_sec: f64,
    pub exit_code: i32,
    pub stdout: String,
    pub stderr: String,
    pub error: Option<String>,
}

impl AttemptRecord {
    pub fn succeeded(&self) -> bool {
        self.exit_code == 0
    }
}

/// Round a duration to millisecond precision for reporting.
pub fn round_millis(seconds: f64) -> f64 {
    (seconds * 1000.0).round() / 1000.0
}
