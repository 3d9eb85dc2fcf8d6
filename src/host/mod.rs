// src/host/mod.rs

//! Capabilities the host runtime provides to the driver.
//!
//! The driver never talks to a concrete sandbox API. It receives a
//! [`HostApi`] implementation and uses it for progress messages, entity
//! attributes and the shared key-value record store.
//!
//! - [`memory::MemoryHost`] keeps everything in process (tests, dry runs).
//! - [`file::FileHost`] persists a JSON document on disk (the CLI).

use std::collections::BTreeMap;

use crate::errors::Result;

pub mod file;
pub mod memory;

pub use file::FileHost;
pub use memory::MemoryHost;

/// One `key -> value` pair written to the store or an entity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyValue {
    pub key: String,
    pub value: String,
}

impl KeyValue {
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }
}

/// Host runtime operations, all scoped by the sandbox/reservation id.
///
/// Every call may fail with [`crate::errors::DriverError::Transport`] when
/// the backing service is unreachable. Implementations do not retry.
pub trait HostApi: Send + Sync {
    /// Best-effort operator-facing progress message.
    fn send_progress(&self, scope_id: &str, message: &str) -> Result<()>;

    /// Read one attribute of an entity. `None` when it has no value.
    fn get_attribute(&self, scope_id: &str, entity: &str, name: &str) -> Result<Option<String>>;

    fn set_attributes(&self, scope_id: &str, entity: &str, attrs: &[KeyValue]) -> Result<()>;

    /// All records of a scope, `record key -> JSON text`.
    fn get_records(&self, scope_id: &str) -> Result<BTreeMap<String, String>>;

    /// Insert or fully replace the given records.
    fn set_records(&self, scope_id: &str, records: &[KeyValue]) -> Result<()>;
}
