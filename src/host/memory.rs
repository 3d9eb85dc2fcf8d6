// src/host/memory.rs

use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex};

use tracing::debug;

use super::{HostApi, KeyValue};
use crate::errors::{DriverError, Result};

#[derive(Debug, Default)]
struct Inner {
    records: HashMap<String, BTreeMap<String, String>>,
    attributes: HashMap<(String, String), BTreeMap<String, String>>,
    progress: Vec<String>,
    offline: bool,
}

/// In-process host. Clones share state, so a test can keep one handle for
/// inspection while the driver uses another.
#[derive(Debug, Clone, Default)]
pub struct MemoryHost {
    inner: Arc<Mutex<Inner>>,
}

impl MemoryHost {
    pub fn new() -> Self {
        Self::default()
    }

    /// Simulate the store being unreachable: every call fails with
    /// `DriverError::Transport` while set.
    pub fn set_offline(&self, offline: bool) {
        self.inner.lock().unwrap().offline = offline;
    }

    /// Delete a record behind the driver's back.
    pub fn remove_record(&self, scope_id: &str, key: &str) {
        let mut inner = self.inner.lock().unwrap();
        if let Some(scope) = inner.records.get_mut(scope_id) {
            scope.remove(key);
        }
    }

    pub fn record(&self, scope_id: &str, key: &str) -> Option<String> {
        let inner = self.inner.lock().unwrap();
        inner.records.get(scope_id).and_then(|s| s.get(key).cloned())
    }

    pub fn attribute(&self, scope_id: &str, entity: &str, name: &str) -> Option<String> {
        let inner = self.inner.lock().unwrap();
        inner
            .attributes
            .get(&(scope_id.to_string(), entity.to_string()))
            .and_then(|a| a.get(name).cloned())
    }

    pub fn set_attribute(&self, scope_id: &str, entity: &str, name: &str, value: &str) {
        let mut inner = self.inner.lock().unwrap();
        inner
            .attributes
            .entry((scope_id.to_string(), entity.to_string()))
            .or_default()
            .insert(name.to_string(), value.to_string());
    }

    pub fn progress_messages(&self) -> Vec<String> {
        self.inner.lock().unwrap().progress.clone()
    }

    fn with_online<T>(&self, f: impl FnOnce(&mut Inner) -> T) -> Result<T> {
        let mut inner = self.inner.lock().unwrap();
        if inner.offline {
            return Err(DriverError::transport("memory host is offline"));
        }
        Ok(f(&mut inner))
    }
}

impl HostApi for MemoryHost {
    fn send_progress(&self, scope_id: &str, message: &str) -> Result<()> {
        debug!(scope = %scope_id, %message, "progress");
        self.with_online(|inner| inner.progress.push(message.to_string()))
    }

    fn get_attribute(&self, scope_id: &str, entity: &str, name: &str) -> Result<Option<String>> {
        self.with_online(|inner| {
            inner
                .attributes
                .get(&(scope_id.to_string(), entity.to_string()))
                .and_then(|a| a.get(name).cloned())
                .filter(|v| !v.is_empty())
        })
    }

    fn set_attributes(&self, scope_id: &str, entity: &str, attrs: &[KeyValue]) -> Result<()> {
        self.with_online(|inner| {
            let entry = inner
                .attributes
                .entry((scope_id.to_string(), entity.to_string()))
                .or_default();
            for kv in attrs {
                entry.insert(kv.key.clone(), kv.value.clone());
            }
        })
    }

    fn get_records(&self, scope_id: &str) -> Result<BTreeMap<String, String>> {
        self.with_online(|inner| inner.records.get(scope_id).cloned().unwrap_or_default())
    }

    fn set_records(&self, scope_id: &str, records: &[KeyValue]) -> Result<()> {
        self.with_online(|inner| {
            let scope = inner.records.entry(scope_id.to_string()).or_default();
            for kv in records {
                scope.insert(kv.key.clone(), kv.value.clone());
            }
        })
    }
}
