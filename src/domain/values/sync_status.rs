use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SyncStatus {
    Success,
    Partial,
    Error,
}

impl SyncStatus {
    /// Status of a run that got past fetch and parse.
    pub fn from_error_count(errors: usize) -> Self {
        if errors == 0 {
            SyncStatus::Success
        } else {
            SyncStatus::Partial
        }
    }
}

impl fmt::Display for SyncStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SyncStatus::Success => write!(f, "success"),
            SyncStatus::Partial => write!(f, "partial"),
            SyncStatus::Error => write!(f, "error"),
        }
    }
}

impl FromStr for SyncStatus {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "success" => Ok(SyncStatus::Success),
            "partial" => Ok(SyncStatus::Partial),
            "error" => Ok(SyncStatus::Error),
            _ => Err(format!("Unknown sync status: {s}")),
        }
    }
}

/// What triggered a sync run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SyncType {
    Manual,
    Auto,
    Import,
}

impl fmt::Display for SyncType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SyncType::Manual => write!(f, "manual"),
            SyncType::Auto => write!(f, "auto"),
            SyncType::Import => write!(f, "import"),
        }
    }
}

impl FromStr for SyncType {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "manual" => Ok(SyncType::Manual),
            "auto" => Ok(SyncType::Auto),
            "import" => Ok(SyncType::Import),
            _ => Err(format!("Unknown sync type: {s}")),
        }
    }
}
