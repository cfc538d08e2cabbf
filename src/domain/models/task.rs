//! Validated task specifications and write-target normalization.

use std::path::{Component, Path, PathBuf};
use std::time::Duration;

/// Prefix marking a write target as a logical token rather than a
/// filesystem path. Logical targets are compared verbatim.
pub const LOGICAL_PREFIX: &str = "logical:";

/// A single validated unit of work.
///
/// Immutable once produced by the validator; the dispatcher and retry
/// engine only read it. `writes` holds normalized targets so two
/// spellings of the same path compare equal.
#[derive(Debug, Clone, PartialEq)]
pub struct TaskSpec {
    pub id: String,
    pub command: String,
    pub depends_on: Vec<String>,
    pub writes: Vec<String>,
    pub timeout_sec: Option<f64>,
    pub retries: u32,
}

impl TaskSpec {
    /// The per-attempt execution budget, if one was configured.
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_sec.map(Duration::from_secs_f64)
    }

    /// Total attempts the retry engine may make for this task.
    pub fn max_attempts(&self) -> u32 {
        self.retries + 1
    }
}

/// Normalize a write target so that different spellings of the same
/// resource compare equal.
///
/// `logical:`-prefixed tokens pass through untouched. Anything else is
/// treated as a filesystem path: `~` is expanded, the path is made
/// absolute against the current directory, and symlinks are resolved
/// when the path exists. Idempotent: normalizing an already-normalized
/// target is a no-op.
pub fn normalize_write_target(target: &str) -> String {
    let cleaned = target.trim();
    if cleaned.starts_with(LOGICAL_PREFIX) {
        return cleaned.to_string();
    }

    let expanded = expand_home(cleaned);
    let absolute = if expanded.is_absolute() {
        expanded
    } else {
        std::env::current_dir()
            .map(|cwd| cwd.join(&expanded))
            .unwrap_or(expanded)
    };

    match std::fs::canonicalize(&absolute) {
        Ok(resolved) => resolved.display().to_string(),
        Err(_) => lexical_normalize(&absolute).display().to_string(),
    }
}

fn expand_home(path: &str) -> PathBuf {
    let Some(home) = std::env::var_os("HOME") else {
        return PathBuf::from(path);
    };
    if path == "~" {
        return PathBuf::from(home);
    }
    match path.strip_prefix("~/") {
        Some(rest) => Path::new(&home).join(rest),
        None => PathBuf::from(path),
    }
}

/// Resolve `.` and `..` components without touching the filesystem.
/// Used when the target does not exist yet and cannot be canonicalized.
fn lexical_normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                out.pop();
            }
            other => out.push(other),
        }
    }
    out
}
