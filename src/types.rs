use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Lifecycle status of one tracked operation (execute or destroy).
///
/// Serialised in the shared store as `NONE`, `IN_PROGRESS`, `COMPLETED`,
/// `ERROR`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ExecutionStatus {
    #[default]
    None,
    InProgress,
    Completed,
    Error,
}

impl ExecutionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExecutionStatus::None => "NONE",
            ExecutionStatus::InProgress => "IN_PROGRESS",
            ExecutionStatus::Completed => "COMPLETED",
            ExecutionStatus::Error => "ERROR",
        }
    }
}

impl fmt::Display for ExecutionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ExecutionStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "NONE" => Ok(ExecutionStatus::None),
            "IN_PROGRESS" => Ok(ExecutionStatus::InProgress),
            "COMPLETED" => Ok(ExecutionStatus::Completed),
            "ERROR" => Ok(ExecutionStatus::Error),
            other => Err(format!(
                "invalid execution status: {other} (expected NONE, IN_PROGRESS, COMPLETED or ERROR)"
            )),
        }
    }
}

/// Which status field of the execution state record an operation targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusKind {
    Execute,
    Destroy,
}

impl StatusKind {
    /// Field name inside the persisted JSON record.
    pub fn field_name(&self) -> &'static str {
        match self {
            StatusKind::Execute => "executeStatus",
            StatusKind::Destroy => "destroyStatus",
        }
    }
}

impl fmt::Display for StatusKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.field_name())
    }
}
