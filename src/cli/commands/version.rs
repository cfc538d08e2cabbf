//! Implementation of the `vanguard version` command.

use anyhow::Result;
use clap::Args;

use crate::cli::output::{output, CommandOutput};

#[derive(Args, Debug)]
pub struct VersionArgs {}

#[derive(Debug, serde::Serialize)]
pub struct VersionOutput {
    pub name: &'static str,
    pub version: &'static str,
}

impl CommandOutput for VersionOutput {
    fn to_human(&self) -> String {
        self.version.to_string()
    }
}

pub async fn execute(_args: VersionArgs, json_mode: bool) -> Result<i32> {
    let result = VersionOutput {
        name: env!("CARGO_PKG_NAME"),
        version: env!("CARGO_PKG_VERSION"),
    };
    output(&result, json_mode);
    Ok(0)
}
