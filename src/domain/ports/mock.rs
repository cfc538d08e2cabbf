//! Scripted [`CommandRunner`] for deterministic tests.

use async_trait::async_trait;
use chrono::Utc;
use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;
use std::time::{Duration, Instant};

use super::command_runner::CommandRunner;
use crate::domain::models::{round_millis, AttemptRecord};

/// What the mock should do when a given command is run.
#[derive(Debug, Clone)]
pub enum MockBehavior {
    /// Exit 0 with the given stdout.
    Succeed { stdout: String },
    /// Exit with the given non-zero code.
    Fail { exit_code: i32 },
    /// Sleep, then exit with the given code. Used to hold a worker slot
    /// open while the dispatcher makes admission decisions.
    Delay { duration: Duration, exit_code: i32 },
    /// Panic inside the worker, simulating a crash of the execution
    /// machinery itself.
    Panic,
}

impl Default for MockBehavior {
    fn default() -> Self {
        Self::Succeed { stdout: String::new() }
    }
}

/// Command runner that replays scripted behaviors per command string.
///
/// Behaviors queue up per command; each invocation consumes one entry,
/// falling back to [`MockBehavior::default`] when the queue is empty.
/// Every invocation is recorded for later assertions.
#[derive(Default)]
pub struct MockRunner {
    scripts: Mutex<HashMap<String, VecDeque<MockBehavior>>>,
    invocations: Mutex<Vec<String>>,
}

impl MockRunner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a behavior for the next invocation of `command`.
    pub fn script(&self, command: &str, behavior: MockBehavior) {
        self.scripts
            .lock()
            .expect("mock scripts lock")
            .entry(command.to_string())
            .or_default()
            .push_back(behavior);
    }

    /// All commands run so far, in invocation order.
    pub fn invocations(&self) -> Vec<String> {
        self.invocations.lock().expect("mock invocations lock").clone()
    }

    /// How many times `command` was run.
    pub fn invocation_count(&self, command: &str) -> usize {
        self.invocations
            .lock()
            .expect("mock invocations lock")
            .iter()
            .filter(|c| c.as_str() == command)
            .count()
    }

    fn next_behavior(&self, command: &str) -> MockBehavior {
        self.scripts
            .lock()
            .expect("mock scripts lock")
            .get_mut(command)
            .and_then(VecDeque::pop_front)
            .unwrap_or_default()
    }
}

#[async_trait]
impl CommandRunner for MockRunner {
    async fn run(&self, command: &str, _timeout: Option<Duration>) -> AttemptRecord {
        self.invocations.lock().expect("mock invocations lock").push(command.to_string());

        let started_at = Utc::now();
        let clock = Instant::now();
        let (exit_code, stdout) = match self.next_behavior(command) {
            MockBehavior::Succeed { stdout } => (0, stdout),
            MockBehavior::Fail { exit_code } => (exit_code, String::new()),
            MockBehavior::Delay { duration, exit_code } => {
                tokio::time::sleep(duration).await;
                (exit_code, String::new())
            }
            MockBehavior::Panic => panic!("scripted worker crash for command: {command}"),
        };

        AttemptRecord {
            attempt: 0,
            started_at,
            ended_at: Utc::now(),
            duration_sec: round_millis(clock.elapsed().as_secs_f64()),
            exit_code,
            stdout,
            stderr: String::new(),
            error: None,
        }
    }
}
