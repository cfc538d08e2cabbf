//! Implementation of the `vanguard start` command.
//!
//! Launches `vanguard run` as a detached child with its output
//! redirected to the project log, and records the child PID so cancel
//! and status can find it.

use anyhow::{Context, Result};
use clap::Args;
use std::fs::OpenOptions;
use std::path::PathBuf;
use std::process::{Command, Stdio};

use crate::cli::lifecycle::MissionLifecycle;
use crate::cli::output::{output, CommandOutput};

#[derive(Args, Debug)]
pub struct StartArgs {
    /// Path to the mission JSON file
    pub mission: PathBuf,

    /// Output report JSON path (defaults to the project report directory)
    #[arg(long)]
    pub report: Option<PathBuf>,

    /// Suppress progress logs in the mission log
    #[arg(long)]
    pub quiet: bool,
}

#[derive(Debug, serde::Serialize)]
pub struct StartOutput {
    pub pid: u32,
    pub log: PathBuf,
    pub report: PathBuf,
}

impl CommandOutput for StartOutput {
    fn to_human(&self) -> String {
        format!(
            "started mission pid={}\nlog={}\nreport={}",
            self.pid,
            self.log.display(),
            self.report.display()
        )
    }
}

pub async fn execute(args: StartArgs, json_mode: bool) -> Result<i32> {
    let lifecycle = MissionLifecycle::in_current_dir()?;
    lifecycle.ensure_dirs()?;

    if let Some(pid) = lifecycle.read_active_pid() {
        if MissionLifecycle::is_process_alive(pid) {
            println!("an active mission is already running (pid: {pid})");
            return Ok(1);
        }
    }

    let report = args.report.unwrap_or_else(|| lifecycle.report_dir().join("active-report.json"));
    let log = lifecycle.log_dir().join("active.log");
    let log_file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log)
        .with_context(|| format!("failed to open {}", log.display()))?;
    let log_err = log_file.try_clone().context("failed to clone log handle")?;

    let exe = std::env::current_exe().context("failed to resolve own executable")?;
    let mut command = Command::new(exe);
    command
        .arg("run")
        .arg(&args.mission)
        .arg("--report")
        .arg(&report)
        .stdin(Stdio::null())
        .stdout(log_file)
        .stderr(log_err);
    if args.quiet {
        command.arg("--quiet");
    }

    let child = command.spawn().context("failed to launch background mission")?;
    lifecycle.record_pid(child.id())?;

    let result = StartOutput { pid: child.id(), log, report };
    output(&result, json_mode);
    Ok(0)
}
