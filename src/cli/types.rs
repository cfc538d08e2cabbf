//! CLI type definitions.
//!
//! Clap command structures defining the `vanguard` interface.

use clap::{Parser, Subcommand};

use crate::cli::commands::cancel::CancelArgs;
use crate::cli::commands::doctor::DoctorArgs;
use crate::cli::commands::init::InitArgs;
use crate::cli::commands::run::RunArgs;
use crate::cli::commands::start::StartArgs;
use crate::cli::commands::status::StatusArgs;
use crate::cli::commands::version::VersionArgs;

#[derive(Parser)]
#[command(name = "vanguard")]
#[command(about = "Vanguard - dependency-aware parallel mission orchestrator", long_about = None)]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Output in JSON format
    #[arg(short, long, global = true)]
    pub json: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Initialize the project workspace and default configuration
    Init(InitArgs),

    /// Run a mission in the foreground and write its report
    Run(RunArgs),

    /// Launch a mission in the background
    Start(StartArgs),

    /// Stop the active background mission
    Cancel(CancelArgs),

    /// Show whether a background mission is active
    Status(StatusArgs),

    /// Check local dependencies and workspace health
    Doctor(DoctorArgs),

    /// Print the crate version
    Version(VersionArgs),
}
