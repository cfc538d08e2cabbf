//! The process-spawning seam.
//!
//! The engine treats command execution as a black box: hand it a
//! command string and an optional budget, get back one normalized
//! [`AttemptRecord`]. The shell-backed implementation lives in
//! `infrastructure::exec`; tests substitute a scripted mock.

use async_trait::async_trait;
use std::time::Duration;

use crate::domain::models::AttemptRecord;

/// Runs one command attempt to completion.
///
/// Implementations never retry and never inspect dependencies. A
/// timeout is reported as exit code 124 with partial output preserved;
/// a launch failure as exit code 1 with an error description. The
/// `attempt` field of the returned record is left at 0 for the caller
/// to fill in.
#[async_trait]
pub trait CommandRunner: Send + Sync {
    async fn run(&self, command: &str, timeout: Option<Duration>) -> AttemptRecord;
}
