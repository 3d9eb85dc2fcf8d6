// src/exec/lock.rs

//! Advisory lock on a Terraform working directory.
//!
//! Two mutating requests for the same entity must not run Terraform in the
//! same module directory at once. The lock is a marker file created with
//! create-new semantics; the holder removes it on drop.

use std::fs::OpenOptions;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::errors::{DriverError, Result};

pub const LOCK_FILE_NAME: &str = ".tfdriver.lock";

#[derive(Debug)]
pub struct WorkdirLock {
    path: PathBuf,
}

impl WorkdirLock {
    /// Take the lock or fail immediately if another run holds it.
    pub fn acquire(working_dir: &Path, holder: &str) -> Result<Self> {
        let path = working_dir.join(LOCK_FILE_NAME);
        let mut file = match OpenOptions::new().write(true).create_new(true).open(&path) {
            Ok(f) => f,
            Err(e) if e.kind() == ErrorKind::AlreadyExists => {
                return Err(DriverError::Locked(format!(
                    "working directory {} is locked by another run (remove {:?} if stale)",
                    working_dir.display(),
                    path
                )));
            }
            Err(e) => return Err(e.into()),
        };
        writeln!(file, "{holder} pid={}", std::process::id())?;
        debug!(path = ?path, %holder, "working directory locked");
        Ok(Self { path })
    }
}

impl Drop for WorkdirLock {
    fn drop(&mut self) {
        if let Err(e) = std::fs::remove_file(&self.path) {
            warn!(path = ?self.path, error = %e, "failed to release working directory lock");
        }
    }
}
