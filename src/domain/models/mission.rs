//! Raw mission document shapes and execution mode presets.
//!
//! The structures here mirror the mission JSON one-to-one and are
//! deliberately permissive (optional fields, wide integer types). The
//! validator in `services::validator` turns them into the typed,
//! invariant-checked [`super::task::TaskSpec`] map.

use serde::Deserialize;
use std::fmt;
use std::str::FromStr;

/// Top-level mission document as written by the user.
///
/// Task entries stay as raw JSON values here; the validator decodes
/// them one at a time so a shape error can name the offending task
/// instead of surfacing as a document-wide parse failure.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct MissionDocument {
    pub mode: Option<String>,
    pub max_concurrency: Option<i64>,
    pub default_timeout_sec: Option<f64>,
    pub default_retries: Option<i64>,
    pub objective: Option<String>,
    pub tasks: Option<Vec<serde_json::Value>>,
    pub integrate: Option<PhaseDocument>,
    pub verify: Option<PhaseDocument>,
}

/// One task entry in the mission document.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TaskDocument {
    pub id: Option<String>,
    pub command: Option<String>,
    #[serde(default)]
    pub depends_on: Vec<String>,
    #[serde(default)]
    pub writes: Vec<String>,
    pub timeout_sec: Option<f64>,
    pub retries: Option<i64>,
}

/// An optional integrate/verify phase entry.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PhaseDocument {
    pub command: Option<String>,
    pub timeout_sec: Option<f64>,
    pub retries: Option<i64>,
}

/// Named execution presets selecting default concurrency and retries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExecutionMode {
    /// High concurrency, no retries.
    Fast,
    /// The default: moderate concurrency, one retry.
    Balanced,
    /// Low concurrency, at least one retry.
    Strict,
}

/// Preset values an [`ExecutionMode`] contributes when the mission
/// document leaves them out.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ModeDefaults {
    pub max_concurrency: usize,
    pub default_retries: u32,
}

impl ExecutionMode {
    pub fn defaults(self) -> ModeDefaults {
        match self {
            Self::Fast => ModeDefaults { max_concurrency: 6, default_retries: 0 },
            Self::Balanced => ModeDefaults { max_concurrency: 4, default_retries: 1 },
            Self::Strict => ModeDefaults { max_concurrency: 3, default_retries: 1 },
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Fast => "fast",
            Self::Balanced => "balanced",
            Self::Strict => "strict",
        }
    }
}

impl Default for ExecutionMode {
    fn default() -> Self {
        Self::Balanced
    }
}

impl fmt::Display for ExecutionMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ExecutionMode {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "fast" => Ok(Self::Fast),
            "balanced" => Ok(Self::Balanced),
            "strict" => Ok(Self::Strict),
            _ => Err(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mode_preset_table() {
        assert_eq!(ExecutionMode::Fast.defaults().max_concurrency, 6);
        assert_eq!(ExecutionMode::Fast.defaults().default_retries, 0);
        assert_eq!(ExecutionMode::Balanced.defaults().max_concurrency, 4);
        assert_eq!(ExecutionMode::Balanced.defaults().default_retries, 1);
        assert_eq!(ExecutionMode::Strict.defaults().max_concurrency, 3);
        assert_eq!(ExecutionMode::Strict.defaults().default_retries, 1);
    }

    #[test]
    fn mode_round_trips_through_str() {
        for mode in [ExecutionMode::Fast, ExecutionMode::Balanced, ExecutionMode::Strict] {
            assert_eq!(mode.as_str().parse::<ExecutionMode>(), Ok(mode));
        }
        assert!("turbo".parse::<ExecutionMode>().is_err());
    }

    #[test]
    fn document_tolerates_missing_fields() {
        let doc: MissionDocument =
            serde_json::from_str(r#"{"tasks": [{"id": "a", "command": "echo hi"}]}"#).unwrap();
        assert!(doc.mode.is_none());
        let task: TaskDocument = serde_json::from_value(doc.tasks.unwrap()[0].clone()).unwrap();
        assert!(task.depends_on.is_empty());
        assert!(task.writes.is_empty());
        assert!(task.timeout_sec.is_none());
    }

    #[test]
    fn document_accepts_fractional_timeout() {
        let doc: MissionDocument = serde_json::from_str(
            r#"{"tasks": [{"id": "a", "command": "echo hi", "timeout_sec": 1.0}]}"#,
        )
        .unwrap();
        let task: TaskDocument = serde_json::from_value(doc.tasks.unwrap()[0].clone()).unwrap();
        assert_eq!(task.timeout_sec, Some(1.0));
    }
}
