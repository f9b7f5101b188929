//! Tool configuration
//!
//! Settings come from `HPC_DOCTOR_*` environment variables; CLI flags
//! override them per invocation.

use anyhow::Result;
use serde::Deserialize;
use std::path::PathBuf;

/// Environment-driven settings
#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    /// Shape threshold file (`HPC_DOCTOR_SHAPES_FILE`)
    #[serde(default)]
    pub shapes_file: Option<PathBuf>,

    /// Recommendation template file (`HPC_DOCTOR_RECOMMENDATIONS_FILE`);
    /// when unset the engine's standard search path applies
    #[serde(default)]
    pub recommendations_file: Option<PathBuf>,

    /// Results file the diagnostic run persists to
    #[serde(default = "default_results_file")]
    pub results_file: PathBuf,
}

fn default_results_file() -> PathBuf {
    PathBuf::from("/var/log/hpc-doctor/results.json")
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            shapes_file: None,
            recommendations_file: None,
            results_file: default_results_file(),
        }
    }
}

impl Settings {
    /// Load settings from the environment
    pub fn load() -> Result<Self> {
        let config = config::Config::builder()
            .add_source(config::Environment::with_prefix("HPC_DOCTOR"))
            .build()?;

        Ok(config.try_deserialize().unwrap_or_default())
    }
}
