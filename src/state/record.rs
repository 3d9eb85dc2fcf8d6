// src/state/record.rs

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

use crate::errors::Result;
use crate::types::{ExecutionStatus, StatusKind};

/// Stable per-entity token; the key of the entity's state record.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ExecutionIdentity(String);

impl ExecutionIdentity {
    /// Fresh random 128-bit identity, 32 lowercase hex chars.
    pub fn generate() -> Self {
        Self(Uuid::new_v4().simple().to_string())
    }

    pub fn from_existing(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ExecutionIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Execution state persisted under an [`ExecutionIdentity`].
///
/// Unknown fields written by other tools are carried through `extra` so a
/// read-modify-write never drops them.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecutionStateRecord {
    #[serde(default)]
    pub execute_status: ExecutionStatus,

    #[serde(default)]
    pub destroy_status: ExecutionStatus,

    #[serde(default)]
    pub working_directory: Option<String>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl ExecutionStateRecord {
    pub fn status(&self, kind: StatusKind) -> ExecutionStatus {
        match kind {
            StatusKind::Execute => self.execute_status,
            StatusKind::Destroy => self.destroy_status,
        }
    }

    pub fn set_status(&mut self, kind: StatusKind, status: ExecutionStatus) {
        match kind {
            StatusKind::Execute => self.execute_status = status,
            StatusKind::Destroy => self.destroy_status = status,
        }
    }

    /// Recorded working directory, treating an empty string as unset.
    pub fn working_directory(&self) -> Option<&str> {
        self.working_directory.as_deref().filter(|d| !d.is_empty())
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn from_json(text: &str) -> Result<Self> {
        Ok(serde_json::from_str(text)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generated_identity_is_hex_128_bit() {
        let id = ExecutionIdentity::generate();
        assert_eq!(id.as_str().len(), 32);
        assert!(id.as_str().chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
        assert_ne!(id, ExecutionIdentity::generate());
    }

    #[test]
    fn fresh_record_json_shape() {
        let json = ExecutionStateRecord::default().to_json().unwrap();
        assert_eq!(
            json,
            r#"{"executeStatus":"NONE","destroyStatus":"NONE","workingDirectory":null}"#
        );
    }

    #[test]
    fn unknown_fields_survive_round_trip() {
        let text = r#"{"executeStatus":"COMPLETED","destroyStatus":"NONE","workingDirectory":"/m","owner":"ops"}"#;
        let mut record = ExecutionStateRecord::from_json(text).unwrap();
        record.set_status(StatusKind::Destroy, ExecutionStatus::InProgress);

        let back = ExecutionStateRecord::from_json(&record.to_json().unwrap()).unwrap();
        assert_eq!(back, record);
        assert_eq!(back.extra.get("owner"), Some(&Value::from("ops")));
        assert_eq!(back.status(StatusKind::Execute), ExecutionStatus::Completed);
    }

    #[test]
    fn empty_working_directory_reads_as_unset() {
        let record = ExecutionStateRecord {
            working_directory: Some(String::new()),
            ..Default::default()
        };
        assert_eq!(record.working_directory(), None);
    }
}
