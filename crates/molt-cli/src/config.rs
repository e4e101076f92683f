//! Configuration file for the molt binary.
//!
//! ```toml
//! [lifecycle]
//! trap_signals = true
//! restart_failure_code = 1
//! executable = "/usr/local/bin/molt"
//! ```
//!
//! `MOLT_*` environment variables override values from the file.

use anyhow::{Context, Result};
use molt_lifecycle::LifecycleConfig;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Main configuration struct
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    /// Lifecycle controller settings
    pub lifecycle: LifecycleConfig,
}

impl Config {
    /// Load configuration from `path` if given, then apply environment overrides.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => Config::default(),
        };
        config.lifecycle = config.lifecycle.merge_env();
        Ok(config)
    }

    fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {:?}", path))?;
        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {:?}", path))?;
        tracing::info!("Loaded configuration from {:?}", path);
        Ok(config)
    }
}
