//! CLI layer: argument parsing, command dispatch, and output rendering.

pub mod commands;
pub mod lifecycle;
pub mod output;
pub mod types;

pub use output::{output, CommandOutput};
pub use types::{Cli, Commands};
