//! Retry engine: bounded attempts with exponential backoff.

use std::time::Duration;
use tokio::time::sleep;
use tracing::debug;

use crate::domain::models::{TaskOutcome, TaskSpec};
use crate::domain::ports::CommandRunner;

/// First backoff delay after a failed attempt.
pub const BASE_BACKOFF: Duration = Duration::from_millis(250);
/// Hard ceiling on the backoff delay.
pub const MAX_BACKOFF: Duration = Duration::from_secs(5);

/// Delay before retry number `attempt_index + 2`:
/// `min(5s, 250ms * 2^attempt_index)`.
pub fn backoff_delay(attempt_index: u32) -> Duration {
    let factor = 1u64.checked_shl(attempt_index).unwrap_or(u64::MAX);
    let millis = (BASE_BACKOFF.as_millis() as u64).saturating_mul(factor);
    Duration::from_millis(millis).min(MAX_BACKOFF)
}

/// Run a task to its terminal outcome: up to `retries + 1` attempts,
/// stopping at the first exit code 0, sleeping between failed attempts
/// (never after the final one). Every attempt stays in the history.
pub async fn execute_task(runner: &dyn CommandRunner, spec: &TaskSpec) -> TaskOutcome {
    let max_attempts = spec.max_attempts();
    let mut attempts = Vec::with_capacity(1);

    for index in 0..max_attempts {
        let mut record = runner.run(&spec.command, spec.timeout()).await;
        record.attempt = index + 1;
        let succeeded = record.succeeded();
        attempts.push(record);

        if succeeded {
            break;
        }
        if index + 1 < max_attempts {
            let delay = backoff_delay(index);
            debug!(task = %spec.id, attempt = index + 1, delay_ms = delay.as_millis() as u64, "attempt failed, backing off");
            sleep(delay).await;
        }
    }

    TaskOutcome::from_attempts(&spec.id, attempts)
}
