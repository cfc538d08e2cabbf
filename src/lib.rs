//! Vanguard: a dependency-aware parallel mission orchestrator.
//!
//! A mission is a JSON document describing shell tasks, their
//! dependencies, the write targets they must hold exclusively, and
//! optional sequential integrate and verify phases. Vanguard validates
//! the document, rejects cycles, dispatches the task graph with bounded
//! concurrency and per-target write locks, retries failures with
//! exponential backoff, and emits a structured report.
//!
//! The crate is layered: `domain` holds pure models, ports, and the
//! error taxonomy; `services` holds validation, scheduling, and the
//! mission pipeline; `infrastructure` holds process execution and
//! configuration; `cli` holds the command surface.

pub mod cli;
pub mod domain;
pub mod infrastructure;
pub mod services;

pub use domain::errors::{MissionError, MissionResult};
pub use domain::models::{MissionReport, TaskOutcome, TaskStatus};
pub use services::{run_mission, run_mission_with, CancelFlag};
