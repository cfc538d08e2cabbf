//! Implementation of the `vanguard status` command.

use anyhow::Result;
use clap::Args;
use std::path::PathBuf;

use crate::cli::lifecycle::MissionLifecycle;
use crate::cli::output::{output, CommandOutput};

#[derive(Args, Debug)]
pub struct StatusArgs {}

#[derive(Debug, serde::Serialize)]
pub struct StatusOutput {
    pub active: bool,
    pub pid: Option<i32>,
    pub stale_pid: bool,
    pub report: Option<PathBuf>,
}

impl CommandOutput for StatusOutput {
    fn to_human(&self) -> String {
        let mut lines = Vec::new();
        match (self.active, self.pid) {
            (true, Some(pid)) => lines.push(format!("active mission pid={pid}")),
            (false, Some(pid)) => {
                lines.push(format!("stale pid file (pid {pid} is not running)"));
            }
            _ => lines.push("no active mission".to_string()),
        }
        if let Some(report) = &self.report {
            lines.push(format!("last report: {}", report.display()));
        }
        lines.join("\n")
    }
}

pub async fn execute(_args: StatusArgs, json_mode: bool) -> Result<i32> {
    let lifecycle = MissionLifecycle::in_current_dir()?;

    let pid = lifecycle.read_active_pid();
    let active = pid.is_some_and(MissionLifecycle::is_process_alive);
    let report_path = lifecycle.report_dir().join("active-report.json");
    let report = report_path.exists().then_some(report_path);

    let result = StatusOutput {
        active,
        pid,
        stale_pid: pid.is_some() && !active,
        report,
    };
    output(&result, json_mode);
    Ok(0)
}
