//! Implementation of the `vanguard run` command.

use anyhow::{Context, Result};
use clap::Args;
use std::fs;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::warn;

use crate::cli::output::{output, CommandOutput};
use crate::domain::models::MissionReport;
use crate::infrastructure::{ConfigLoader, ShellRunner};
use crate::services::{run_mission_with, CancelFlag};

#[derive(Args, Debug)]
pub struct RunArgs {
    /// Path to the mission JSON file
    pub mission: PathBuf,

    /// Output report JSON path
    #[arg(long, default_value = "vanguard-report.json")]
    pub report: PathBuf,

    /// Suppress progress logs
    #[arg(long)]
    pub quiet: bool,
}

#[derive(Debug, serde::Serialize)]
pub struct RunOutput {
    #[serde(flatten)]
    pub report: MissionReport,
    #[serde(skip)]
    pub report_path: PathBuf,
}

impl CommandOutput for RunOutput {
    fn to_human(&self) -> String {
        format!(
            "status: {}\nduration_sec: {}\nreport: {}",
            self.report.status,
            self.report.duration_sec,
            self.report_path.display()
        )
    }

    fn to_json(&self) -> serde_json::Value {
        serde_json::to_value(&self.report).unwrap_or_default()
    }
}

pub async fn execute(args: RunArgs, json_mode: bool) -> Result<i32> {
    if !args.mission.exists() {
        println!("mission file not found: {}", args.mission.display());
        return Ok(2);
    }

    let config = ConfigLoader::load()?;
    let cancel = CancelFlag::new();
    let handler = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("interrupt received, cancelling mission");
            handler.cancel();
        }
    });

    // Progress lines would corrupt JSON output, so json implies quiet.
    let quiet = args.quiet || json_mode;
    let runner = Arc::new(ShellRunner::new());
    let report = match run_mission_with(runner, &args.mission, quiet, cancel, &config).await {
        Ok(report) => report,
        Err(err) => {
            println!("mission error: {err}");
            return Ok(err.exit_code());
        }
    };

    if let Some(parent) = args.report.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)
                .with_context(|| format!("failed to create {}", parent.display()))?;
        }
    }
    let body = serde_json::to_string_pretty(&report).context("failed to serialize report")?;
    fs::write(&args.report, format!("{body}\n"))
        .with_context(|| format!("failed to write {}", args.report.display()))?;

    let exit_code = report.exit_code();
    let result = RunOutput { report, report_path: args.report };
    output(&result, json_mode);
    Ok(exit_code)
}
