// src/host/file.rs

//! File-backed host used by the CLI.
//!
//! All scopes live in one JSON document. A write takes the store lock
//! (`<store>.lock`, created with create-new semantics), reads the whole
//! document, applies its change and writes it back through a unique temp
//! file. Reads never take the lock; they always see a complete document.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use super::{HostApi, KeyValue};
use crate::errors::{DriverError, Result};
use crate::fs::FileSystem;

#[derive(Debug, Default, Serialize, Deserialize)]
struct StoreDocument {
    #[serde(default)]
    scopes: BTreeMap<String, ScopeData>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct ScopeData {
    #[serde(default)]
    records: BTreeMap<String, String>,
    /// entity name -> attribute name -> value
    #[serde(default)]
    attributes: BTreeMap<String, BTreeMap<String, String>>,
}

const LOCK_RETRY: Duration = Duration::from_millis(5);
pub const DEFAULT_LOCK_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Clone)]
pub struct FileHost {
    fs: Arc<dyn FileSystem>,
    path: PathBuf,
    lock_path: PathBuf,
    lock_timeout: Duration,
}

impl FileHost {
    pub fn new(fs: Arc<dyn FileSystem>, path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let mut lock_path = path.clone().into_os_string();
        lock_path.push(".lock");
        Self {
            fs,
            path,
            lock_path: PathBuf::from(lock_path),
            lock_timeout: DEFAULT_LOCK_TIMEOUT,
        }
    }

    /// How long a write waits for another writer before giving up.
    pub fn with_lock_timeout(mut self, timeout: Duration) -> Self {
        self.lock_timeout = timeout;
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn lock_path(&self) -> &Path {
        &self.lock_path
    }

    fn lock(&self) -> Result<StoreLock<'_>> {
        let started = Instant::now();
        let holder = format!("pid={}", std::process::id());
        loop {
            if self
                .fs
                .create_new(&self.lock_path, holder.as_bytes())
                .map_err(DriverError::transport)?
            {
                return Ok(StoreLock {
                    fs: &*self.fs,
                    path: &self.lock_path,
                });
            }
            if started.elapsed() >= self.lock_timeout {
                return Err(DriverError::Transport(format!(
                    "store {:?} is locked by another writer (remove {:?} if stale)",
                    self.path, self.lock_path
                )));
            }
            std::thread::sleep(LOCK_RETRY);
        }
    }

    fn load(&self) -> Result<StoreDocument> {
        if !self.fs.exists(&self.path) {
            return Ok(StoreDocument::default());
        }
        let text = self
            .fs
            .read_to_string(&self.path)
            .map_err(DriverError::transport)?;
        serde_json::from_str(&text).map_err(|e| {
            DriverError::Transport(format!("store document {:?} is corrupt: {e}", self.path))
        })
    }

    fn save(&self, doc: &StoreDocument) -> Result<()> {
        let bytes = serde_json::to_vec_pretty(doc)?;
        self.fs
            .write(&self.path, &bytes)
            .map_err(DriverError::transport)?;
        debug!(path = ?self.path, "store document written");
        Ok(())
    }

    fn update(&self, scope_id: &str, f: impl FnOnce(&mut ScopeData)) -> Result<()> {
        let _lock = self.lock()?;
        let mut doc = self.load()?;
        f(doc.scopes.entry(scope_id.to_string()).or_default());
        self.save(&doc)
    }
}

/// Held for one load-change-save cycle.
struct StoreLock<'a> {
    fs: &'a dyn FileSystem,
    path: &'a Path,
}

impl Drop for StoreLock<'_> {
    fn drop(&mut self) {
        if let Err(e) = self.fs.remove(self.path) {
            warn!(path = ?self.path, error = %e, "failed to release store lock");
        }
    }
}

impl HostApi for FileHost {
    fn send_progress(&self, scope_id: &str, message: &str) -> Result<()> {
        info!(scope = %scope_id, "{message}");
        Ok(())
    }

    fn get_attribute(&self, scope_id: &str, entity: &str, name: &str) -> Result<Option<String>> {
        let doc = self.load()?;
        Ok(doc
            .scopes
            .get(scope_id)
            .and_then(|s| s.attributes.get(entity))
            .and_then(|a| a.get(name))
            .filter(|v| !v.is_empty())
            .cloned())
    }

    fn set_attributes(&self, scope_id: &str, entity: &str, attrs: &[KeyValue]) -> Result<()> {
        self.update(scope_id, |scope| {
            let entry = scope.attributes.entry(entity.to_string()).or_default();
            for kv in attrs {
                entry.insert(kv.key.clone(), kv.value.clone());
            }
        })
    }

    fn get_records(&self, scope_id: &str) -> Result<BTreeMap<String, String>> {
        let mut doc = self.load()?;
        Ok(doc
            .scopes
            .remove(scope_id)
            .map(|s| s.records)
            .unwrap_or_default())
    }

    fn set_records(&self, scope_id: &str, records: &[KeyValue]) -> Result<()> {
        self.update(scope_id, |scope| {
            for kv in records {
                scope.records.insert(kv.key.clone(), kv.value.clone());
            }
        })
    }
}
