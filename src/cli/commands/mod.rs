//! CLI command implementations.

pub mod cancel;
pub mod doctor;
pub mod init;
pub mod run;
pub mod start;
pub mod status;
pub mod version;
