//! Implementation of the `vanguard cancel` command.

use anyhow::Result;
use clap::Args;

use crate::cli::lifecycle::MissionLifecycle;
use crate::cli::output::{output, CommandOutput};

#[derive(Args, Debug)]
pub struct CancelArgs {}

#[derive(Debug, serde::Serialize)]
pub struct CancelOutput {
    pub pid: Option<i32>,
    pub stopped: bool,
    pub message: String,
}

impl CommandOutput for CancelOutput {
    fn to_human(&self) -> String {
        self.message.clone()
    }
}

pub async fn execute(_args: CancelArgs, json_mode: bool) -> Result<i32> {
    let lifecycle = MissionLifecycle::in_current_dir()?;

    let Some(pid) = lifecycle.read_active_pid() else {
        let result = CancelOutput {
            pid: None,
            stopped: false,
            message: "no active mission pid found".to_string(),
        };
        output(&result, json_mode);
        return Ok(0);
    };

    let result = if MissionLifecycle::is_process_alive(pid) {
        MissionLifecycle::terminate(pid).await;
        CancelOutput {
            pid: Some(pid),
            stopped: true,
            message: format!("stopped mission pid={pid}"),
        }
    } else {
        CancelOutput {
            pid: Some(pid),
            stopped: false,
            message: "process not running; cleaned stale pid".to_string(),
        }
    };

    lifecycle.clear_pid()?;
    output(&result, json_mode);
    Ok(0)
}
