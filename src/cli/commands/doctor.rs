//! Implementation of the `vanguard doctor` command.

use anyhow::Result;
use clap::Args;
use std::process::{Command, Stdio};

use crate::cli::lifecycle::MissionLifecycle;
use crate::cli::output::{output, CommandOutput};
use crate::infrastructure::config::{ConfigLoader, CONFIG_FILE};

#[derive(Args, Debug)]
pub struct DoctorArgs {}

#[derive(Debug, serde::Serialize)]
pub struct DoctorOutput {
    pub shell_available: bool,
    pub workspace_initialized: bool,
    pub config_valid: bool,
    pub problems: Vec<String>,
}

impl CommandOutput for DoctorOutput {
    fn to_human(&self) -> String {
        if self.problems.is_empty() {
            let mut lines = vec!["ok: required dependencies found".to_string()];
            if !self.workspace_initialized {
                lines.push("note: workspace not initialized (run `vanguard init`)".to_string());
            }
            lines.join("\n")
        } else {
            self.problems.clone().join("\n")
        }
    }
}

fn shell_available() -> bool {
    Command::new("sh")
        .args(["-c", "exit 0"])
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .map(|status| status.success())
        .unwrap_or(false)
}

pub async fn execute(_args: DoctorArgs, json_mode: bool) -> Result<i32> {
    let lifecycle = MissionLifecycle::in_current_dir()?;
    let mut problems = Vec::new();

    let shell = shell_available();
    if !shell {
        problems.push("missing dependency: sh".to_string());
    }

    let workspace_initialized = lifecycle.root().exists();

    // A missing config file is fine; an unreadable one is a problem.
    let config_valid = match ConfigLoader::load() {
        Ok(_) => true,
        Err(err) => {
            problems.push(format!("invalid {CONFIG_FILE}: {err:#}"));
            false
        }
    };

    let exit_code = i32::from(!problems.is_empty());
    let result = DoctorOutput {
        shell_available: shell,
        workspace_initialized,
        config_valid,
        problems,
    };
    output(&result, json_mode);
    Ok(exit_code)
}
