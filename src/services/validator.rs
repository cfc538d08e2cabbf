//! Mission document validation.
//!
//! Turns a raw [`MissionDocument`] into a [`MissionPlan`]: a typed,
//! invariant-checked task map plus the resolved execution settings.
//! Pure and side-effect free; the first structural violation aborts
//! with a [`MissionError::Spec`] naming the offending task.

use std::collections::BTreeMap;
use tracing::debug;

use crate::domain::errors::{MissionError, MissionResult};
use crate::domain::models::{
    normalize_write_target, ExecutionMode, MissionDocument, PhaseDocument, TaskDocument, TaskSpec,
};
use crate::infrastructure::config::ProjectConfig;
use crate::services::dependency_graph::ensure_acyclic;

/// A fully validated mission, ready for the dispatcher.
#[derive(Debug, Clone)]
pub struct MissionPlan {
    pub mode: ExecutionMode,
    pub objective: Option<String>,
    pub max_concurrency: usize,
    pub tasks: BTreeMap<String, TaskSpec>,
    pub integrate: Option<TaskSpec>,
    pub verify: Option<TaskSpec>,
}

/// Validate a mission document against project defaults.
///
/// Fallback order for each setting: mission document value, then
/// project config value, then the execution-mode preset.
pub fn validate_mission(
    document: &MissionDocument,
    config: &ProjectConfig,
) -> MissionResult<MissionPlan> {
    let mode_name = document
        .mode
        .clone()
        .or_else(|| config.default_mode.clone())
        .unwrap_or_else(|| ExecutionMode::default().as_str().to_string());
    let mode: ExecutionMode = mode_name
        .parse()
        .map_err(|()| MissionError::Spec("mode must be one of: fast, balanced, strict".into()))?;
    let presets = mode.defaults();

    let max_concurrency = match document.max_concurrency {
        Some(n) if n >= 1 => usize::try_from(n).unwrap_or(usize::MAX),
        Some(_) => {
            return Err(MissionError::Spec("max_concurrency must be an integer >= 1".into()))
        }
        None => config.max_concurrency.unwrap_or(presets.max_concurrency),
    };

    let default_timeout = match document.default_timeout_sec {
        Some(t) if t > 0.0 && t.is_finite() => Some(t),
        Some(_) => {
            return Err(MissionError::Spec("default_timeout_sec must be a positive number".into()))
        }
        None => config.default_timeout_sec,
    };

    let default_retries = match document.default_retries {
        Some(r) if r >= 0 => u32::try_from(r).unwrap_or(u32::MAX),
        Some(_) => {
            return Err(MissionError::Spec("default_retries must be an integer >= 0".into()))
        }
        None => config.default_retries.unwrap_or(presets.default_retries),
    };

    let raw_tasks = document
        .tasks
        .as_deref()
        .filter(|tasks| !tasks.is_empty())
        .ok_or_else(|| MissionError::Spec("mission.tasks must be a non-empty list".into()))?;

    let mut tasks: BTreeMap<String, TaskSpec> = BTreeMap::new();
    for value in raw_tasks {
        let raw = decode_task(value)?;
        let spec = validate_task(&raw, default_timeout, default_retries)?;
        if tasks.contains_key(&spec.id) {
            return Err(MissionError::Spec(format!("duplicate task id: {}", spec.id)));
        }
        tasks.insert(spec.id.clone(), spec);
    }

    for task in tasks.values() {
        for dep in &task.depends_on {
            if !tasks.contains_key(dep) {
                return Err(MissionError::Spec(format!(
                    "task '{}' depends on unknown task '{dep}'",
                    task.id
                )));
            }
        }
    }

    ensure_acyclic(&tasks)?;

    let integrate = validate_phase(document.integrate.as_ref(), "integrate", default_timeout)?;
    let verify = validate_phase(document.verify.as_ref(), "verify", default_timeout)?;

    debug!(mode = %mode, max_concurrency, tasks = tasks.len(), "mission validated");

    Ok(MissionPlan {
        mode,
        objective: document.objective.clone(),
        max_concurrency,
        tasks,
        integrate,
        verify,
    })
}

/// Decode one raw task entry, naming the task when its shape is wrong
/// (a string where a list belongs, a non-object entry, and so on).
fn decode_task(value: &serde_json::Value) -> MissionResult<TaskDocument> {
    serde_json::from_value(value.clone()).map_err(|err| {
        match value.get("id").and_then(serde_json::Value::as_str) {
            Some(id) => {
                MissionError::Spec(format!("invalid task entry for task '{id}': {err}"))
            }
            None => MissionError::Spec(format!("each task entry must be an object: {err}")),
        }
    })
}

fn validate_task(
    raw: &TaskDocument,
    default_timeout: Option<f64>,
    default_retries: u32,
) -> MissionResult<TaskSpec> {
    let id = raw
        .id
        .as_deref()
        .filter(|id| !id.is_empty())
        .ok_or_else(|| MissionError::Spec("task.id must be a non-empty string".into()))?
        .to_string();

    let command = raw
        .command
        .as_deref()
        .filter(|c| !c.trim().is_empty())
        .ok_or_else(|| MissionError::Spec(format!("task.command is required for task: {id}")))?
        .to_string();

    for target in &raw.writes {
        if target.trim().is_empty() {
            return Err(MissionError::Spec(format!(
                "task.writes entries must be non-empty strings: {id}"
            )));
        }
    }

    let timeout_sec = match raw.timeout_sec {
        Some(t) if t > 0.0 && t.is_finite() => Some(t),
        Some(_) => {
            return Err(MissionError::Spec(format!(
                "task.timeout_sec must be a positive number: {id}"
            )))
        }
        None => default_timeout,
    };

    let retries = match raw.retries {
        Some(r) if r >= 0 => u32::try_from(r).unwrap_or(u32::MAX),
        Some(_) => {
            return Err(MissionError::Spec(format!("task.retries must be an integer >= 0: {id}")))
        }
        None => default_retries,
    };

    Ok(TaskSpec {
        id,
        command,
        depends_on: raw.depends_on.clone(),
        writes: raw.writes.iter().map(|w| normalize_write_target(w)).collect(),
        timeout_sec,
        retries,
    })
}

fn validate_phase(
    raw: Option<&PhaseDocument>,
    name: &str,
    default_timeout: Option<f64>,
) -> MissionResult<Option<TaskSpec>> {
    let Some(raw) = raw else {
        return Ok(None);
    };

    let command = raw
        .command
        .as_deref()
        .filter(|c| !c.trim().is_empty())
        .ok_or_else(|| MissionError::Spec(format!("{name}.command must be a non-empty string")))?
        .to_string();

    let timeout_sec = match raw.timeout_sec {
        Some(t) if t > 0.0 && t.is_finite() => Some(t),
        Some(_) => {
            return Err(MissionError::Spec(format!(
                "{name}.timeout_sec must be a positive number"
            )))
        }
        None => default_timeout,
    };

    let retries = match raw.retries {
        Some(r) if r >= 0 => u32::try_from(r).unwrap_or(u32::MAX),
        Some(_) => {
            return Err(MissionError::Spec(format!("{name}.retries must be an integer >= 0")))
        }
        None => 0,
    };

    Ok(Some(TaskSpec {
        id: name.to_string(),
        command,
        depends_on: Vec::new(),
        writes: Vec::new(),
        timeout_sec,
        retries,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn document(json: &str) -> MissionDocument {
        serde_json::from_str(json).expect("valid JSON")
    }

    fn validate(json: &str) -> MissionResult<MissionPlan> {
        validate_mission(&document(json), &ProjectConfig::default())
    }

    #[test]
    fn minimal_mission_uses_balanced_presets() {
        let plan = validate(r#"{"tasks": [{"id": "a", "command": "echo hi"}]}"#).unwrap();
        assert_eq!(plan.mode, ExecutionMode::Balanced);
        assert_eq!(plan.max_concurrency, 4);
        let task = &plan.tasks["a"];
        assert_eq!(task.retries, 1);
        assert!(task.timeout_sec.is_none());
    }

    #[test]
    fn unknown_mode_is_rejected() {
        let err = validate(r#"{"mode": "turbo", "tasks": [{"id": "a", "command": "x"}]}"#)
            .unwrap_err();
        assert!(err.to_string().contains("mode must be one of"));
    }

    #[test]
    fn empty_task_list_is_rejected() {
        let err = validate(r#"{"tasks": []}"#).unwrap_err();
        assert!(err.to_string().contains("non-empty list"));
    }

    #[test]
    fn duplicate_task_ids_are_rejected() {
        let err = validate(
            r#"{"tasks": [{"id": "a", "command": "x"}, {"id": "a", "command": "y"}]}"#,
        )
        .unwrap_err();
        assert!(err.to_string().contains("duplicate task id: a"));
    }

    #[test]
    fn missing_command_names_the_task() {
        let err = validate(r#"{"tasks": [{"id": "a", "command": "  "}]}"#).unwrap_err();
        assert!(err.to_string().contains("task.command is required for task: a"));
    }

    #[test]
    fn unknown_dependency_names_both_tasks() {
        let err = validate(
            r#"{"tasks": [{"id": "a", "command": "x", "depends_on": ["ghost"]}]}"#,
        )
        .unwrap_err();
        assert!(err.to_string().contains("task 'a' depends on unknown task 'ghost'"));
    }

    #[test]
    fn wrong_typed_depends_on_names_the_task() {
        let err = validate(
            r#"{"tasks": [{"id": "a", "command": "x", "depends_on": "b"}]}"#,
        )
        .unwrap_err();
        assert!(matches!(err, MissionError::Spec(_)), "shape errors are spec errors");
        assert!(err.to_string().contains("invalid task entry for task 'a'"));
        assert_eq!(err.exit_code(), 2);
    }

    #[test]
    fn wrong_typed_writes_names_the_task() {
        let err = validate(
            r#"{"tasks": [{"id": "a", "command": "x", "writes": 42}]}"#,
        )
        .unwrap_err();
        assert!(err.to_string().contains("invalid task entry for task 'a'"));
    }

    #[test]
    fn non_object_task_entry_is_rejected() {
        let err = validate(r#"{"tasks": ["nope"]}"#).unwrap_err();
        assert!(err.to_string().contains("each task entry must be an object"));
    }

    #[test]
    fn fractional_timeout_is_accepted() {
        let plan =
            validate(r#"{"tasks": [{"id": "a", "command": "x", "timeout_sec": 1.0}]}"#).unwrap();
        assert_eq!(plan.tasks["a"].timeout_sec, Some(1.0));
        assert_eq!(plan.tasks["a"].timeout(), Some(std::time::Duration::from_secs(1)));
    }

    #[test]
    fn non_positive_timeout_is_rejected() {
        let err = validate(r#"{"tasks": [{"id": "a", "command": "x", "timeout_sec": 0}]}"#)
            .unwrap_err();
        assert!(err.to_string().contains("task.timeout_sec must be a positive number: a"));
    }

    #[test]
    fn negative_retries_are_rejected() {
        let err = validate(r#"{"tasks": [{"id": "a", "command": "x", "retries": -1}]}"#)
            .unwrap_err();
        assert!(err.to_string().contains("task.retries must be an integer >= 0: a"));
    }

    #[test]
    fn mission_defaults_flow_into_tasks() {
        let plan = validate(
            r#"{
                "mode": "fast",
                "default_timeout_sec": 2.5,
                "default_retries": 3,
                "tasks": [
                    {"id": "a", "command": "x"},
                    {"id": "b", "command": "y", "timeout_sec": 9, "retries": 0}
                ]
            }"#,
        )
        .unwrap();
        assert_eq!(plan.max_concurrency, 6);
        assert_eq!(plan.tasks["a"].timeout_sec, Some(2.5));
        assert_eq!(plan.tasks["a"].retries, 3);
        assert_eq!(plan.tasks["b"].timeout_sec, Some(9.0));
        assert_eq!(plan.tasks["b"].retries, 0);
    }

    #[test]
    fn config_fills_gaps_between_mission_and_presets() {
        let config = ProjectConfig {
            default_mode: Some("strict".into()),
            max_concurrency: Some(2),
            default_timeout_sec: Some(60.0),
            default_retries: None,
        };
        let plan = validate_mission(
            &document(r#"{"tasks": [{"id": "a", "command": "x"}]}"#),
            &config,
        )
        .unwrap();
        assert_eq!(plan.mode, ExecutionMode::Strict);
        assert_eq!(plan.max_concurrency, 2);
        assert_eq!(plan.tasks["a"].timeout_sec, Some(60.0));
        assert_eq!(plan.tasks["a"].retries, 1, "strict preset retries");
    }

    #[test]
    fn write_targets_are_normalized() {
        let plan = validate(
            r#"{"tasks": [{"id": "a", "command": "x", "writes": [" logical:db ", "/tmp/x/../y"]}]}"#,
        )
        .unwrap();
        assert_eq!(plan.tasks["a"].writes, vec!["logical:db", "/tmp/y"]);
    }

    #[test]
    fn phase_defaults_to_zero_retries() {
        let plan = validate(
            r#"{
                "default_retries": 5,
                "tasks": [{"id": "a", "command": "x"}],
                "integrate": {"command": "make integrate"},
                "verify": {"command": "make verify", "retries": 2}
            }"#,
        )
        .unwrap();
        let integrate = plan.integrate.unwrap();
        assert_eq!(integrate.id, "integrate");
        assert_eq!(integrate.retries, 0, "phases ignore default_retries");
        assert_eq!(plan.verify.unwrap().retries, 2);
    }

    #[test]
    fn phase_without_command_is_rejected() {
        let err = validate(
            r#"{"tasks": [{"id": "a", "command": "x"}], "verify": {"timeout_sec": 5}}"#,
        )
        .unwrap_err();
        assert!(err.to_string().contains("verify.command must be a non-empty string"));
    }
}
