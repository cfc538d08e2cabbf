//! The top-level mission pipeline: load, validate, dispatch, run the
//! sequential phases, and assemble the report.

use std::path::Path;
use std::sync::Arc;
use std::time::Instant;

use chrono::Utc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::info;

use crate::domain::errors::MissionResult;
use crate::domain::models::{
    round_millis, MissionDocument, MissionMeta, MissionReport, MissionStatus, TaskStatus,
};
use crate::domain::ports::CommandRunner;
use crate::infrastructure::{ProjectConfig, ShellRunner};
use crate::services::dispatcher::{CancelFlag, Dispatcher, ExecutionEvent};
use crate::services::phase_runner::run_phase;
use crate::services::validator::validate_mission;

/// Run the mission at `path` against the local shell with no project
/// configuration overlay.
pub async fn run_mission(path: &Path, quiet: bool) -> MissionResult<MissionReport> {
    run_mission_with(
        Arc::new(ShellRunner::new()),
        path,
        quiet,
        CancelFlag::new(),
        &ProjectConfig::default(),
    )
    .await
}

/// Full-control mission entry point.
///
/// Reads and validates the mission document, dispatches the task graph,
/// runs integrate and verify sequentially (skipped entirely when any
/// task failed or was blocked, and verify additionally when integrate
/// failed), and returns the assembled report. Errors here mean the
/// mission never produced a report; task failures are inside it.
pub async fn run_mission_with(
    runner: Arc<dyn CommandRunner>,
    path: &Path,
    quiet: bool,
    cancel: CancelFlag,
    config: &ProjectConfig,
) -> MissionResult<MissionReport> {
    let raw = std::fs::read_to_string(path)?;
    let document: MissionDocument = serde_json::from_str(&raw)?;
    let plan = validate_mission(&document, config)?;
    info!(
        path = %path.display(),
        mode = %plan.mode,
        max_concurrency = plan.max_concurrency,
        tasks = plan.tasks.len(),
        "mission validated"
    );

    let started_at = Utc::now();
    let started = Instant::now();

    let (events, receiver) = mpsc::channel(256);
    let printer = spawn_progress_printer(receiver, quiet);

    let dispatcher = Dispatcher::new(Arc::clone(&runner), plan.max_concurrency, cancel.clone());
    let tasks = match dispatcher.dispatch(&plan.tasks, &events).await {
        Ok(results) => results,
        Err(err) => {
            drop(events);
            let _ = printer.await;
            return Err(err);
        }
    };

    let mut failed_or_blocked: Vec<String> = tasks
        .iter()
        .filter(|(_, outcome)| outcome.status.is_terminal_failure())
        .map(|(id, _)| id.clone())
        .collect();

    let mut integrate = None;
    let mut verify = None;
    if failed_or_blocked.is_empty() {
        let integrate_failed = if let Some(spec) = &plan.integrate {
            let outcome = run_phase(runner.as_ref(), "integrate", spec, &events).await;
            let failed = outcome.status != TaskStatus::Succeeded;
            if failed {
                failed_or_blocked.push("integrate".to_string());
            }
            integrate = Some(outcome);
            failed
        } else {
            false
        };
        if !integrate_failed {
            if let Some(spec) = &plan.verify {
                let outcome = run_phase(runner.as_ref(), "verify", spec, &events).await;
                if outcome.status != TaskStatus::Succeeded {
                    failed_or_blocked.push("verify".to_string());
                }
                verify = Some(outcome);
            }
        }
    }

    drop(events);
    let _ = printer.await;

    let status = if failed_or_blocked.is_empty() {
        MissionStatus::Succeeded
    } else {
        MissionStatus::Failed
    };
    Ok(MissionReport {
        mission: MissionMeta {
            path: path.display().to_string(),
            mode: plan.mode,
            objective: plan.objective,
            max_concurrency: plan.max_concurrency,
        },
        status,
        started_at,
        ended_at: Utc::now(),
        duration_sec: round_millis(started.elapsed().as_secs_f64()),
        failed_or_blocked,
        tasks,
        integrate,
        verify,
    })
}

/// Drains execution events, echoing progress lines to stdout unless
/// quiet. The drain runs even when quiet so senders never back up.
fn spawn_progress_printer(
    mut receiver: mpsc::Receiver<ExecutionEvent>,
    quiet: bool,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        while let Some(event) = receiver.recv().await {
            if quiet {
                continue;
            }
            match event {
                ExecutionEvent::TaskStarted { id } => println!("[start] {id}"),
                ExecutionEvent::TaskBlocked { id, reason } => println!("[blocked] {id}: {reason}"),
                ExecutionEvent::TaskCompleted { id, status, attempts, duration_sec } => {
                    println!("[done] {id} status={status} attempts={attempts} duration={duration_sec}s");
                }
                ExecutionEvent::PhaseStarted { name } => println!("[phase:start] {name}"),
                ExecutionEvent::PhaseCompleted { name, status, attempts, duration_sec } => {
                    println!(
                        "[phase:done] {name} status={status} attempts={attempts} duration={duration_sec}s"
                    );
                }
            }
        }
    })
}
