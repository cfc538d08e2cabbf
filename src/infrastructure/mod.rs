//! Infrastructure layer: process execution and configuration.

pub mod config;
pub mod exec;

pub use config::{ConfigLoader, ProjectConfig};
pub use exec::ShellRunner;
