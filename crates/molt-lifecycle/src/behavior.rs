//! End-of-life behavior selection.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// What the process does when a lifecycle trigger fires.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Behavior {
    /// Leave the process to its normal exit path.
    #[default]
    None,
    /// End the process immediately with the configured exit code.
    Terminate,
    /// Replace the process image with a fresh instance of the same program.
    Restart,
}

impl Behavior {
    pub(crate) fn to_u8(self) -> u8 {
        match self {
            Behavior::None => 0,
            Behavior::Terminate => 1,
            Behavior::Restart => 2,
        }
    }

    pub(crate) fn from_u8(value: u8) -> Self {
        match value {
            1 => Behavior::Terminate,
            2 => Behavior::Restart,
            _ => Behavior::None,
        }
    }

    /// Stable lowercase name, also used as the `action` log field.
    pub fn as_str(&self) -> &'static str {
        match self {
            Behavior::None => "none",
            Behavior::Terminate => "terminate",
            Behavior::Restart => "restart",
        }
    }
}

impl fmt::Display for Behavior {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Returned when a string names no known [`Behavior`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown lifecycle behavior: {0:?} (expected none, terminate or restart)")]
pub struct ParseBehaviorError(pub String);

impl FromStr for Behavior {
    type Err = ParseBehaviorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "none" => Ok(Behavior::None),
            "terminate" => Ok(Behavior::Terminate),
            "restart" => Ok(Behavior::Restart),
            _ => Err(ParseBehaviorError(s.to_string())),
        }
    }
}
