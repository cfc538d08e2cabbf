//! Domain models: mission documents, task specs, attempts, outcomes,
//! and the final report.

pub mod attempt;
pub mod mission;
pub mod outcome;
pub mod report;
pub mod task;

pub use attempt::{round_millis, AttemptRecord, TIMEOUT_EXIT_CODE};
pub use mission::{ExecutionMode, MissionDocument, ModeDefaults, PhaseDocument, TaskDocument};
pub use outcome::{TaskOutcome, TaskStatus};
pub use report::{MissionMeta, MissionReport, MissionStatus};
pub use task::{normalize_write_target, TaskSpec, LOGICAL_PREFIX};
