//! Error taxonomy for mission execution.

use thiserror::Error;

/// Errors that abort a mission run.
///
/// Per-task failures and blocked statuses are not errors; they are
/// recorded in the report as [`crate::domain::models::TaskOutcome`]
/// values and never stop sibling branches of the graph.
#[derive(Debug, Error)]
pub enum MissionError {
    /// The mission document is structurally invalid. Fatal before any
    /// command executes; no report is produced.
    #[error("invalid mission: {0}")]
    Spec(String),

    /// The mission document is not valid JSON.
    #[error("invalid mission JSON: {0}")]
    Parse(#[from] serde_json::Error),

    /// The mission file could not be read.
    #[error("failed to read mission file: {0}")]
    Io(#[from] std::io::Error),

    /// The scheduler can make no further progress: nothing is running
    /// and the remaining pending tasks can never become ready.
    #[error("no runnable tasks remain: {0}")]
    Scheduling(String),

    /// The run was cancelled from outside while tasks were in flight.
    #[error("mission interrupted")]
    Interrupted,
}

impl MissionError {
    /// Process exit code the CLI maps this error to.
    ///
    /// Malformed input (including an unreadable mission file) exits 2;
    /// failures once execution is underway exit 1.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Spec(_) | Self::Parse(_) | Self::Io(_) => 2,
            Self::Scheduling(_) | Self::Interrupted => 1,
        }
    }
}

pub type MissionResult<T> = Result<T, MissionError>;
