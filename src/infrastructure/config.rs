//! Project-local configuration.
//!
//! `vanguard init` writes `.vanguard/config.json`; the loader merges
//! programmatic defaults, that file, and `VANGUARD_*` environment
//! variables. Values here act as fallbacks between a mission document's
//! own fields and the execution-mode presets.

use anyhow::{Context, Result};
use figment::providers::{Env, Format, Json, Serialized};
use figment::Figment;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Directory holding all project-local state.
pub const PROJECT_DIR: &str = ".vanguard";
/// Config file name inside [`PROJECT_DIR`].
pub const CONFIG_FILE: &str = "config.json";

/// Project defaults applied when a mission document omits a field.
///
/// All fields are optional: with no config file and no environment
/// overrides the engine behaves exactly as if only the mission document
/// and mode presets existed.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProjectConfig {
    pub default_mode: Option<String>,
    pub max_concurrency: Option<usize>,
    pub default_timeout_sec: Option<f64>,
    pub default_retries: Option<u32>,
}

impl ProjectConfig {
    /// The values `vanguard init` seeds a fresh project with.
    pub fn init_template() -> Self {
        Self {
            default_mode: Some("balanced".to_string()),
            max_concurrency: Some(4),
            default_timeout_sec: Some(300.0),
            default_retries: Some(1),
        }
    }
}

/// Loader merging defaults, the project file, and environment
/// variables, in ascending precedence.
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration relative to the current directory.
    pub fn load() -> Result<ProjectConfig> {
        Self::load_from(Path::new(PROJECT_DIR).join(CONFIG_FILE))
    }

    /// Load configuration from a specific config file path.
    pub fn load_from(path: impl AsRef<Path>) -> Result<ProjectConfig> {
        let config: ProjectConfig = Figment::new()
            .merge(Serialized::defaults(ProjectConfig::default()))
            .merge(Json::file(path.as_ref()))
            .merge(Env::prefixed("VANGUARD_"))
            .extract()
            .context("failed to load project configuration")?;
        Self::validate(&config)?;
        Ok(config)
    }

    fn validate(config: &ProjectConfig) -> Result<()> {
        if let Some(mode) = &config.default_mode {
            anyhow::ensure!(
                matches!(mode.as_str(), "fast" | "balanced" | "strict"),
                "default_mode must be one of: fast, balanced, strict (got {mode})"
            );
        }
        if let Some(limit) = config.max_concurrency {
            anyhow::ensure!(limit >= 1, "max_concurrency must be >= 1 (got {limit})");
        }
        if let Some(timeout) = config.default_timeout_sec {
            anyhow::ensure!(
                timeout > 0.0,
                "default_timeout_sec must be positive (got {timeout})"
            );
        }
        Ok(())
    }
}
