//! Sequential post-graph phases.
//!
//! Integrate and verify run one after another, each as a single task
//! through the same retry machinery the graph uses.

use tokio::sync::mpsc;

use crate::domain::models::{TaskOutcome, TaskSpec};
use crate::domain::ports::CommandRunner;
use crate::services::dispatcher::ExecutionEvent;
use crate::services::retry::execute_task;

/// Run one named phase to completion.
///
/// The phase spec is cloned and re-identified under `name` before
/// execution, so the caller's copy is never mutated and the outcome is
/// always reported under the phase name regardless of the spec's own
/// id.
pub async fn run_phase(
    runner: &dyn CommandRunner,
    name: &str,
    spec: &TaskSpec,
    events: &mpsc::Sender<ExecutionEvent>,
) -> TaskOutcome {
    let mut phase = spec.clone();
    phase.id = name.to_string();

    let _ = events.send(ExecutionEvent::PhaseStarted { name: name.to_string() }).await;
    let outcome = execute_task(runner, &phase).await;
    let _ = events
        .send(ExecutionEvent::PhaseCompleted {
            name: name.to_string(),
            status: outcome.status,
            attempts: outcome.attempts,
            duration_sec: outcome.duration_sec,
        })
        .await;
    outcome
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::models::TaskStatus;
    use crate::domain::ports::{MockBehavior, MockRunner};

    fn phase_spec(id: &str, command: &str, retries: u32) -> TaskSpec {
        TaskSpec {
            id: id.to_string(),
            command: command.to_string(),
            depends_on: Vec::new(),
            writes: Vec::new(),
            timeout_sec: None,
            retries,
        }
    }

    #[tokio::test]
    async fn outcome_is_reported_under_the_phase_name() {
        let runner = MockRunner::new();
        let spec = phase_spec("whatever-the-author-wrote", "make integrate", 0);
        let (tx, _rx) = mpsc::channel(8);

        let outcome = run_phase(&runner, "integrate", &spec, &tx).await;

        assert_eq!(outcome.id, "integrate");
        assert_eq!(outcome.status, TaskStatus::Succeeded);
        assert_eq!(spec.id, "whatever-the-author-wrote", "caller's spec stays untouched");
    }

    #[tokio::test]
    async fn phase_retries_like_a_task() {
        let runner = MockRunner::new();
        runner.script("make verify", MockBehavior::Fail { exit_code: 1 });
        runner.script("make verify", MockBehavior::Succeed { stdout: "ok".into() });
        let spec = phase_spec("verify", "make verify", 1);
        let (tx, _rx) = mpsc::channel(8);

        let outcome = run_phase(&runner, "verify", &spec, &tx).await;

        assert_eq!(outcome.status, TaskStatus::Succeeded);
        assert_eq!(outcome.attempts, 2);
    }

    #[tokio::test]
    async fn start_and_completion_events_are_emitted() {
        let runner = MockRunner::new();
        let spec = phase_spec("integrate", "true", 0);
        let (tx, mut rx) = mpsc::channel(8);

        run_phase(&runner, "integrate", &spec, &tx).await;

        assert!(matches!(
            rx.try_recv().unwrap(),
            ExecutionEvent::PhaseStarted { name } if name == "integrate"
        ));
        assert!(matches!(
            rx.try_recv().unwrap(),
            ExecutionEvent::PhaseCompleted { name, status: TaskStatus::Succeeded, .. } if name == "integrate"
        ));
    }
}
