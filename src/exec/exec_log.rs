// src/exec/exec_log.rs

//! Per-request execution log: the full captured output of each Terraform
//! invocation, tagged with the command it belongs to.
//!
//! The sink is created per request and handed to the runner explicitly.

use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use chrono::{DateTime, Local};
use tracing::debug;

use crate::errors::Result;

pub const PLAN_TAG: &str = "PLAN";
pub const DESTROY_TAG: &str = "DESTROY";

const BANNER: &str = "-------------------------------------------------";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecLogEntry {
    pub timestamp: DateTime<Local>,
    pub tag: String,
    pub output: String,
}

/// Append-only destination for [`ExecLogEntry`]s.
pub trait ExecLogSink: Send + Sync {
    fn record(&self, tag: &str, output: &str) -> Result<()>;
}

/// Writes entries to `<dir>/<scope>/TF_EXEC_LOG_<dd_mm_yy-HH_MM_SS>.log`.
#[derive(Debug)]
pub struct FileExecLog {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl FileExecLog {
    pub fn create(log_dir: &Path, scope_id: &str) -> Result<Self> {
        let dir = log_dir.join(scope_id);
        fs::create_dir_all(&dir)?;
        let stamp = Local::now().format("%d_%m_%y-%H_%M_%S");
        let path = dir.join(format!("TF_EXEC_LOG_{stamp}.log"));
        debug!(path = ?path, "execution log opened");
        Ok(Self {
            path,
            write_lock: Mutex::new(()),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl ExecLogSink for FileExecLog {
    fn record(&self, tag: &str, output: &str) -> Result<()> {
        let _guard = self.write_lock.lock().unwrap_or_else(|e| e.into_inner());
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        let now = Local::now().format("%Y-%m-%d %H:%M:%S");
        writeln!(file, "{now} {BANNER}=< {tag} START >={BANNER}")?;
        file.write_all(output.as_bytes())?;
        if !output.ends_with('\n') {
            writeln!(file)?;
        }
        writeln!(file, "{now} {BANNER}=< {tag} END >={BANNER}")?;
        Ok(())
    }
}

/// Keeps entries in memory. Clones share the same entry list.
#[derive(Debug, Clone, Default)]
pub struct MemoryExecLog {
    entries: Arc<Mutex<Vec<ExecLogEntry>>>,
}

impl MemoryExecLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entries(&self) -> Vec<ExecLogEntry> {
        self.entries.lock().unwrap().clone()
    }

    pub fn tags(&self) -> Vec<String> {
        self.entries().into_iter().map(|e| e.tag).collect()
    }
}

impl ExecLogSink for MemoryExecLog {
    fn record(&self, tag: &str, output: &str) -> Result<()> {
        self.entries.lock().unwrap().push(ExecLogEntry {
            timestamp: Local::now(),
            tag: tag.to_string(),
            output: output.to_string(),
        });
        Ok(())
    }
}
