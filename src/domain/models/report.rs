//! The structured execution report produced at the end of a run.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;

use super::mission::ExecutionMode;
use super::outcome::TaskOutcome;

/// Overall mission verdict.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MissionStatus {
    Succeeded,
    Failed,
}

impl fmt::Display for MissionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Succeeded => f.write_str("succeeded"),
            Self::Failed => f.write_str("failed"),
        }
    }
}

/// Mission metadata echoed into the report.
#[derive(Debug, Clone, Serialize)]
pub struct MissionMeta {
    pub path: String,
    pub mode: ExecutionMode,
    pub objective: Option<String>,
    pub max_concurrency: usize,
}

/// One immutable report per run. Task outcomes are keyed by id in a
/// `BTreeMap` so serialization is always in ascending id order.
#[derive(Debug, Clone, Serialize)]
pub struct MissionReport {
    pub mission: MissionMeta,
    pub status: MissionStatus,
    pub started_at: DateTime<Utc>,
    pub ended_at: DateTime<Utc>,
    pub duration_sec: f64,
    pub failed_or_blocked: Vec<String>,
    pub tasks: BTreeMap<String, TaskOutcome>,
    pub integrate: Option<TaskOutcome>,
    pub verify: Option<TaskOutcome>,
}

impl MissionReport {
    pub fn succeeded(&self) -> bool {
        self.status == MissionStatus::Succeeded
    }

    /// Process exit code for this report: 0 on success, 1 otherwise.
    pub fn exit_code(&self) -> i32 {
        i32::from(!self.succeeded())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::models::outcome::TaskOutcome;

    fn report(failed_or_blocked: Vec<String>) -> MissionReport {
        let status = if failed_or_blocked.is_empty() {
            MissionStatus::Succeeded
        } else {
            MissionStatus::Failed
        };
        MissionReport {
            mission: MissionMeta {
                path: "mission.json".into(),
                mode: ExecutionMode::Balanced,
                objective: None,
                max_concurrency: 4,
            },
            status,
            started_at: Utc::now(),
            ended_at: Utc::now(),
            duration_sec: 0.1,
            failed_or_blocked,
            tasks: BTreeMap::new(),
            integrate: None,
            verify: None,
        }
    }

    #[test]
    fn empty_failed_list_means_success() {
        let r = report(vec![]);
        assert!(r.succeeded());
        assert_eq!(r.exit_code(), 0);
    }

    #[test]
    fn any_failed_entry_fails_the_mission() {
        let r = report(vec!["verify".into()]);
        assert!(!r.succeeded());
        assert_eq!(r.exit_code(), 1);
    }

    #[test]
    fn tasks_serialize_in_ascending_id_order() {
        let mut r = report(vec![]);
        for id in ["zeta", "alpha", "mid"] {
            r.tasks.insert(id.into(), TaskOutcome::blocked(id, "n/a"));
        }
        let json = serde_json::to_string(&r).unwrap();
        let alpha = json.find("\"alpha\"").unwrap();
        let mid = json.find("\"mid\"").unwrap();
        let zeta = json.find("\"zeta\"").unwrap();
        assert!(alpha < mid && mid < zeta);
    }

    #[test]
    fn absent_phases_serialize_as_null() {
        let value = serde_json::to_value(report(vec![])).unwrap();
        assert!(value["integrate"].is_null());
        assert!(value["verify"].is_null());
        assert_eq!(value["status"], "succeeded");
        assert_eq!(value["mission"]["mode"], "balanced");
    }
}
