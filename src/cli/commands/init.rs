//! Implementation of the `vanguard init` command.

use anyhow::{Context, Result};
use clap::Args;
use std::fs;
use std::path::PathBuf;

use crate::cli::lifecycle::MissionLifecycle;
use crate::cli::output::{output, CommandOutput};
use crate::infrastructure::config::{ProjectConfig, CONFIG_FILE};

#[derive(Args, Debug)]
pub struct InitArgs {
    /// Target directory (defaults to current directory)
    #[arg(default_value = ".")]
    pub path: PathBuf,
}

#[derive(Debug, serde::Serialize)]
pub struct InitOutput {
    pub root: PathBuf,
    pub directories_created: Vec<String>,
    pub config_written: bool,
}

impl CommandOutput for InitOutput {
    fn to_human(&self) -> String {
        let mut lines = vec![format!("initialized: {}", self.root.display())];
        for dir in &self.directories_created {
            lines.push(format!("  created {dir}"));
        }
        if self.config_written {
            lines.push(format!("  wrote {CONFIG_FILE}"));
        }
        lines.join("\n")
    }
}

pub async fn execute(args: InitArgs, json_mode: bool) -> Result<i32> {
    let target = if args.path.is_absolute() {
        args.path
    } else {
        std::env::current_dir().context("failed to resolve current directory")?.join(args.path)
    };

    let lifecycle = MissionLifecycle::at(target.join(crate::infrastructure::config::PROJECT_DIR));
    let mut directories_created = Vec::new();
    for dir in [
        lifecycle.state_dir(),
        lifecycle.mission_dir(),
        lifecycle.report_dir(),
        lifecycle.log_dir(),
    ] {
        if !dir.exists() {
            directories_created.push(
                dir.strip_prefix(&target).unwrap_or(&dir).to_string_lossy().into_owned(),
            );
        }
    }
    lifecycle.ensure_dirs()?;

    // An existing configuration is never overwritten.
    let config_path = lifecycle.root().join(CONFIG_FILE);
    let config_written = if config_path.exists() {
        false
    } else {
        let template = serde_json::to_string_pretty(&ProjectConfig::init_template())
            .context("failed to serialize default configuration")?;
        fs::write(&config_path, format!("{template}\n"))
            .with_context(|| format!("failed to write {}", config_path.display()))?;
        true
    };

    let result = InitOutput {
        root: lifecycle.root().clone(),
        directories_created,
        config_written,
    };
    output(&result, json_mode);
    Ok(0)
}
