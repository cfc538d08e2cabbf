//! The concurrent dispatch loop.
//!
//! One coordinating control flow owns all scheduling state (the five
//! disjoint id sets and the write-lock set); workers run in a
//! [`JoinSet`] and report back through task completion, never by
//! touching scheduler state. Admission is bounded by the worker-pool
//! size and by write-target mutual exclusion.

use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinSet;
use tokio::time::timeout;
use tracing::{debug, warn};

use crate::domain::errors::{MissionError, MissionResult};
use crate::domain::models::{TaskOutcome, TaskSpec, TaskStatus};
use crate::domain::ports::CommandRunner;
use crate::services::retry::execute_task;

/// How long the completion wait blocks before re-checking cancellation.
const POLL_INTERVAL: Duration = Duration::from_millis(200);

/// Reason recorded on every blocked outcome.
const BLOCKED_REASON: &str = "blocked by failed dependency";

/// Shared cancellation signal, set from outside the dispatch loop
/// (typically by a Ctrl-C handler).
#[derive(Debug, Clone, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Progress events emitted while a mission runs.
#[derive(Debug, Clone)]
pub enum ExecutionEvent {
    TaskStarted { id: String },
    TaskBlocked { id: String, reason: String },
    TaskCompleted { id: String, status: TaskStatus, attempts: u32, duration_sec: f64 },
    PhaseStarted { name: String },
    PhaseCompleted { name: String, status: TaskStatus, attempts: u32, duration_sec: f64 },
}

/// Drives a validated task map to completion.
pub struct Dispatcher {
    runner: Arc<dyn CommandRunner>,
    max_concurrency: usize,
    poll_interval: Duration,
    cancel: CancelFlag,
}

impl Dispatcher {
    pub fn new(runner: Arc<dyn CommandRunner>, max_concurrency: usize, cancel: CancelFlag) -> Self {
        Self { runner, max_concurrency, poll_interval: POLL_INTERVAL, cancel }
    }

    /// Execute every task, respecting dependency order, the concurrency
    /// bound, and write-target exclusivity.
    ///
    /// Returns one [`TaskOutcome`] per task. Task failures are recorded,
    /// not raised; only scheduling deadlock and external cancellation
    /// abort the loop.
    pub async fn dispatch(
        &self,
        tasks: &BTreeMap<String, TaskSpec>,
        events: &mpsc::Sender<ExecutionEvent>,
    ) -> MissionResult<BTreeMap<String, TaskOutcome>> {
        if self.max_concurrency == 0 {
            return Err(MissionError::Spec("max_concurrency must be an integer >= 1".into()));
        }

        let mut pending: BTreeMap<String, TaskSpec> = tasks.clone();
        let mut workers: JoinSet<(String, TaskOutcome)> = JoinSet::new();
        let mut worker_tasks: HashMap<tokio::task::Id, String> = HashMap::new();
        let mut running_writes: HashMap<String, Vec<String>> = HashMap::new();
        let mut locked_writes: HashSet<String> = HashSet::new();
        let mut succeeded: BTreeSet<String> = BTreeSet::new();
        let mut failed: BTreeSet<String> = BTreeSet::new();
        let mut blocked: BTreeSet<String> = BTreeSet::new();
        let mut results: BTreeMap<String, TaskOutcome> = BTreeMap::new();

        while !pending.is_empty() || !workers.is_empty() {
            if self.cancel.is_cancelled() {
                // Queued work is abandoned; in-flight workers are
                // aborted without being awaited (kill_on_drop reaps
                // their child processes best-effort).
                workers.shutdown().await;
                return Err(MissionError::Interrupted);
            }

            // Blocked propagation. Cascades across rounds: a task
            // blocked now makes its dependents eligible next round.
            let newly_blocked: Vec<String> = pending
                .iter()
                .filter(|(_, task)| {
                    task.depends_on
                        .iter()
                        .any(|dep| failed.contains(dep) || blocked.contains(dep))
                })
                .map(|(id, _)| id.clone())
                .collect();
            for id in newly_blocked {
                pending.remove(&id);
                results.insert(id.clone(), TaskOutcome::blocked(&id, BLOCKED_REASON));
                let _ = events
                    .send(ExecutionEvent::TaskBlocked {
                        id: id.clone(),
                        reason: BLOCKED_REASON.to_string(),
                    })
                    .await;
                blocked.insert(id);
            }

            // Readiness: every dependency succeeded. BTreeMap iteration
            // yields ascending ids, making admission deterministic.
            let ready: Vec<TaskSpec> = pending
                .values()
                .filter(|task| task.depends_on.iter().all(|dep| succeeded.contains(dep)))
                .cloned()
                .collect();

            for task in ready {
                if workers.len() >= self.max_concurrency {
                    break;
                }
                // A write conflict only defers the task to the next
                // round; it is reconsidered once the lock is released.
                if task.writes.iter().any(|w| locked_writes.contains(w)) {
                    continue;
                }

                let id = task.id.clone();
                pending.remove(&id);
                locked_writes.extend(task.writes.iter().cloned());
                running_writes.insert(id.clone(), task.writes.clone());

                let runner = Arc::clone(&self.runner);
                let handle = workers.spawn(async move {
                    let outcome = execute_task(runner.as_ref(), &task).await;
                    (task.id, outcome)
                });
                worker_tasks.insert(handle.id(), id.clone());
                debug!(task = %id, running = workers.len(), "task admitted");
                let _ = events.send(ExecutionEvent::TaskStarted { id }).await;
            }

            if workers.is_empty() {
                if pending.is_empty() {
                    break;
                }
                let stuck = pending.keys().cloned().collect::<Vec<_>>().join(", ");
                return Err(MissionError::Scheduling(stuck));
            }

            // Completion wait, bounded so cancellation is noticed
            // promptly even while everything is still running.
            let Ok(joined) = timeout(self.poll_interval, workers.join_next_with_id()).await else {
                continue;
            };
            let Some(joined) = joined else {
                continue;
            };

            let (task_id, outcome) = match joined {
                Ok((worker_id, (task_id, outcome))) => {
                    worker_tasks.remove(&worker_id);
                    (task_id, outcome)
                }
                Err(join_err) => {
                    // The execution machinery itself crashed; absorb it
                    // as a synthetic failure.
                    let task_id = worker_tasks
                        .remove(&join_err.id())
                        .unwrap_or_else(|| "unknown".to_string());
                    warn!(task = %task_id, error = %join_err, "worker crashed");
                    let outcome = TaskOutcome::worker_crash(&task_id, &join_err);
                    (task_id, outcome)
                }
            };

            if let Some(writes) = running_writes.remove(&task_id) {
                for target in &writes {
                    locked_writes.remove(target);
                }
            }

            if outcome.status == TaskStatus::Succeeded {
                succeeded.insert(task_id.clone());
            } else {
                failed.insert(task_id.clone());
            }
            let _ = events
                .send(ExecutionEvent::TaskCompleted {
                    id: task_id.clone(),
                    status: outcome.status,
                    attempts: outcome.attempts,
                    duration_sec: outcome.duration_sec,
                })
                .await;
            results.insert(task_id, outcome);
        }

        Ok(results)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ports::{MockBehavior, MockRunner};

    fn task(id: &str, command: &str, deps: &[&str], writes: &[&str]) -> (String, TaskSpec) {
        (
            id.to_string(),
            TaskSpec {
                id: id.to_string(),
                command: command.to_string(),
                depends_on: deps.iter().map(ToString::to_string).collect(),
                writes: writes.iter().map(ToString::to_string).collect(),
                timeout_sec: None,
                retries: 0,
            },
        )
    }

    fn dispatcher(runner: Arc<MockRunner>, max_concurrency: usize) -> Dispatcher {
        Dispatcher::new(runner, max_concurrency, CancelFlag::new())
    }

    async fn dispatch(
        dispatcher: &Dispatcher,
        tasks: BTreeMap<String, TaskSpec>,
    ) -> MissionResult<BTreeMap<String, TaskOutcome>> {
        let (tx, _rx) = mpsc::channel(64);
        dispatcher.dispatch(&tasks, &tx).await
    }

    #[tokio::test]
    async fn runs_independent_tasks_to_success() {
        let runner = Arc::new(MockRunner::new());
        let tasks = BTreeMap::from([task("a", "cmd-a", &[], &[]), task("b", "cmd-b", &[], &[])]);
        let results = dispatch(&dispatcher(Arc::clone(&runner), 2), tasks).await.unwrap();

        assert_eq!(results.len(), 2);
        assert!(results.values().all(|o| o.status == TaskStatus::Succeeded));
    }

    #[tokio::test]
    async fn failed_dependency_blocks_the_chain() {
        let runner = Arc::new(MockRunner::new());
        runner.script("cmd-a", MockBehavior::Fail { exit_code: 1 });
        let tasks = BTreeMap::from([
            task("a", "cmd-a", &[], &[]),
            task("b", "cmd-b", &["a"], &[]),
            task("c", "cmd-c", &["b"], &[]),
        ]);
        let results = dispatch(&dispatcher(Arc::clone(&runner), 4), tasks).await.unwrap();

        assert_eq!(results["a"].status, TaskStatus::Failed);
        assert_eq!(results["b"].status, TaskStatus::Blocked);
        assert_eq!(results["c"].status, TaskStatus::Blocked);
        assert_eq!(results["b"].attempts, 0);
        assert_eq!(runner.invocation_count("cmd-b"), 0, "blocked tasks never start");
        assert_eq!(runner.invocation_count("cmd-c"), 0);
    }

    #[tokio::test]
    async fn unsatisfiable_pending_set_is_a_scheduling_error() {
        let runner = Arc::new(MockRunner::new());
        // Bypasses validation on purpose: the dependency never exists,
        // so the task can never become ready.
        let tasks = BTreeMap::from([task("stuck", "cmd", &["ghost"], &[])]);
        let err = dispatch(&dispatcher(runner, 2), tasks).await.unwrap_err();

        match err {
            MissionError::Scheduling(stuck) => assert_eq!(stuck, "stuck"),
            other => panic!("expected scheduling error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn worker_panic_becomes_synthetic_failure() {
        let runner = Arc::new(MockRunner::new());
        runner.script("boom", MockBehavior::Panic);
        let tasks =
            BTreeMap::from([task("a", "boom", &[], &[]), task("b", "cmd-b", &["a"], &[])]);
        let results = dispatch(&dispatcher(runner, 2), tasks).await.unwrap();

        assert_eq!(results["a"].status, TaskStatus::Failed);
        assert!(results["a"].error.as_deref().unwrap().starts_with("worker crashed"));
        assert_eq!(results["b"].status, TaskStatus::Blocked);
    }

    #[tokio::test]
    async fn write_conflicts_serialize_tasks_without_dependencies() {
        let runner = Arc::new(MockRunner::new());
        runner.script(
            "slow",
            MockBehavior::Delay { duration: Duration::from_millis(100), exit_code: 0 },
        );
        let tasks = BTreeMap::from([
            task("a-slow", "slow", &[], &["logical:artifact"]),
            task("b-conflicting", "fast", &[], &["logical:artifact"]),
        ]);
        let results = dispatch(&dispatcher(Arc::clone(&runner), 4), tasks).await.unwrap();

        assert!(results.values().all(|o| o.status == TaskStatus::Succeeded));
        // Both ran despite the conflict; exclusion is exercised further
        // by the property tests.
        assert_eq!(runner.invocations().len(), 2);
    }

    #[tokio::test]
    async fn cancellation_interrupts_the_loop() {
        let runner = Arc::new(MockRunner::new());
        runner.script(
            "slow",
            MockBehavior::Delay { duration: Duration::from_secs(30), exit_code: 0 },
        );
        let cancel = CancelFlag::new();
        let dispatcher = Dispatcher::new(Arc::clone(&runner) as Arc<dyn CommandRunner>, 1, cancel.clone());
        let tasks = BTreeMap::from([task("a", "slow", &[], &[]), task("b", "fast", &["a"], &[])]);

        let canceller = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(150)).await;
            canceller.cancel();
        });

        let (tx, _rx) = mpsc::channel(64);
        let err = dispatcher.dispatch(&tasks, &tx).await.unwrap_err();
        assert!(matches!(err, MissionError::Interrupted));
        assert_eq!(runner.invocation_count("fast"), 0, "queued work is abandoned");
    }
}
