//! Controller configuration.
//!
//! # Environment Variables
//!
//! - `MOLT_TRAP_SIGNALS`: `false`/`0`/`no`/`off` disables the signal watcher. Default: enabled
//! - `MOLT_RESTART_FAILURE_CODE`: exit code used when re-exec fails. Default: `1`
//! - `MOLT_EXECUTABLE`: re-exec this path instead of the current executable

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tracing::{debug, warn};

const DEFAULT_RESTART_FAILURE_CODE: i32 = 1;

/// Settings for a [`Lifecycle`](crate::Lifecycle).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LifecycleConfig {
    /// Dispatch on `SIGINT` and `SIGTERM`.
    pub trap_signals: bool,
    /// Exit code when the process image cannot be replaced. Never `0`.
    pub restart_failure_code: i32,
    /// Re-exec target overriding the current executable.
    pub executable: Option<PathBuf>,
}

impl Default for LifecycleConfig {
    fn default() -> Self {
        Self {
            trap_signals: true,
            restart_failure_code: DEFAULT_RESTART_FAILURE_CODE,
            executable: None,
        }
    }
}

impl LifecycleConfig {
    /// Load configuration from `MOLT_*` environment variables over the defaults.
    pub fn from_env() -> Self {
        Self::default().merge_env()
    }

    /// Override fields with any `MOLT_*` environment variables that are set.
    pub fn merge_env(mut self) -> Self {
        if let Ok(value) = std::env::var("MOLT_TRAP_SIGNALS") {
            self.trap_signals = !matches!(
                value.trim().to_ascii_lowercase().as_str(),
                "0" | "false" | "no" | "off"
            );
        }

        if let Ok(value) = std::env::var("MOLT_RESTART_FAILURE_CODE") {
            match value.trim().parse() {
                Ok(code) => self.restart_failure_code = code,
                Err(_) => warn!(
                    value = %value,
                    "Ignoring unparseable MOLT_RESTART_FAILURE_CODE"
                ),
            }
        }

        if let Some(executable) = std::env::var_os("MOLT_EXECUTABLE") {
            if !executable.is_empty() {
                self.executable = Some(PathBuf::from(executable));
            }
        }

        debug!(config = ?self, "Lifecycle configuration loaded");
        self
    }

    /// The failure exit code, coerced to non-zero.
    pub fn effective_failure_code(&self) -> i32 {
        if self.restart_failure_code == 0 {
            DEFAULT_RESTART_FAILURE_CODE
        } else {
            self.restart_failure_code
        }
    }
}
