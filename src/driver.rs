// src/driver.rs

//! Operations the host runtime invokes: `run`, `plan`, `destroy`,
//! `show_state` and `status`.
//!
//! Each operation composes the state store with the Terraform runner and
//! owns the status bookkeeping around the runner's process work.

use std::path::Path;

use serde::Serialize;
use tracing::{info, warn};

use crate::config::{ConfigFile, ServiceConfig};
use crate::errors::{DriverError, Result};
use crate::exec::{ExecLogSink, ProcessBackend, TerraformRunner, WorkdirLock};
use crate::fs::FileSystem;
use crate::host::HostApi;
use crate::state::{ExecutionStateRecord, ExecutionStateStore};
use crate::types::{ExecutionStatus, StatusKind};

pub const STATE_FALLBACK: &str = "Could not retrieve deployment state.";

/// What the host hands over with every request.
#[derive(Debug, Clone)]
pub struct RequestContext {
    pub scope_id: String,
    pub service: ServiceConfig,
}

impl RequestContext {
    pub fn new(scope_id: impl Into<String>, service: ServiceConfig) -> Self {
        Self {
            scope_id: scope_id.into(),
            service,
        }
    }

    pub fn from_config(cfg: &ConfigFile) -> Self {
        Self::new(cfg.session.scope_id.clone(), cfg.service.clone())
    }
}

/// Result of the `status` query.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatusReport {
    pub identity: Option<String>,
    pub record: Option<ExecutionStateRecord>,
}

/// Request-scoped driver. Build one per host request and drop it after.
pub struct TerraformDriver<'a> {
    ctx: &'a RequestContext,
    host: &'a dyn HostApi,
    backend: &'a dyn ProcessBackend,
    exec_log: &'a dyn ExecLogSink,
    fs: &'a dyn FileSystem,
}

impl<'a> TerraformDriver<'a> {
    pub fn new(
        ctx: &'a RequestContext,
        host: &'a dyn HostApi,
        backend: &'a dyn ProcessBackend,
        exec_log: &'a dyn ExecLogSink,
        fs: &'a dyn FileSystem,
    ) -> Self {
        Self {
            ctx,
            host,
            backend,
            exec_log,
            fs,
        }
    }

    /// init, plan, apply the saved plan, then publish outputs.
    ///
    /// Returns the apply output.
    pub async fn run(&self) -> Result<String> {
        self.progress("Running terraform with auto approve..");
        let store = self.open_store()?;
        let _lock = self.lock(&store)?;

        store.set_status(StatusKind::Execute, ExecutionStatus::InProgress)?;
        let runner = self.runner(&store);
        let result = async {
            runner.init().await?;
            runner.plan().await?;
            let applied = runner.apply().await?;
            runner.parse_and_save_outputs().await?;
            Ok::<_, DriverError>(applied)
        }
        .await;
        finish(&store, StatusKind::Execute, result)
    }

    /// init then plan; the plan file is left for a later apply.
    pub async fn plan(&self) -> Result<String> {
        self.progress("Generating terraform plan..");
        let store = self.open_store()?;
        let _lock = self.lock(&store)?;

        let runner = self.runner(&store);
        runner.init().await?;
        runner.plan().await
    }

    pub async fn destroy(&self) -> Result<String> {
        self.progress("Destroying terraform deployment..");
        let store = self.open_store()?;
        let _lock = self.lock(&store)?;

        store.set_status(StatusKind::Destroy, ExecutionStatus::InProgress)?;
        let result = self.runner(&store).destroy().await;
        finish(&store, StatusKind::Destroy, result)
    }

    /// Contents of `terraform.tfstate`, or a fixed message when unreadable.
    pub fn show_state(&self) -> String {
        self.progress("Getting current Terraform Deployment state..");
        let path = self.ctx.service.state_file();
        match self.fs.read_to_string(&path) {
            Ok(text) => text,
            Err(e) => {
                warn!(path = ?path, error = %e, "terraform state not readable");
                STATE_FALLBACK.to_string()
            }
        }
    }

    /// Identity and record of the entity, without assigning either.
    pub fn status(&self) -> Result<StatusReport> {
        let found = ExecutionStateStore::peek(self.host, &self.ctx.scope_id, &self.ctx.service)?;
        Ok(match found {
            Some((identity, record)) => StatusReport {
                identity: Some(identity.to_string()),
                record: Some(record),
            },
            None => StatusReport {
                identity: None,
                record: None,
            },
        })
    }

    fn open_store(&self) -> Result<ExecutionStateStore<'a>> {
        let module_path = self.ctx.service.module_path.to_string_lossy();
        ExecutionStateStore::open(
            self.host,
            &self.ctx.scope_id,
            &self.ctx.service,
            Some(module_path.as_ref()),
        )
    }

    fn lock(&self, store: &ExecutionStateStore<'_>) -> Result<WorkdirLock> {
        WorkdirLock::acquire(
            Path::new(store.working_directory()),
            store.identity().as_str(),
        )
    }

    fn runner(&self, store: &ExecutionStateStore<'_>) -> TerraformRunner<'a> {
        TerraformRunner::new(
            self.host,
            self.backend,
            self.exec_log,
            &self.ctx.scope_id,
            &self.ctx.service,
            store.working_directory(),
        )
    }

    fn progress(&self, message: &str) {
        if let Err(e) = self.host.send_progress(&self.ctx.scope_id, message) {
            warn!(error = %e, %message, "progress message not delivered");
        }
    }
}

/// Record COMPLETED or ERROR for `kind` and hand back the step's result.
///
/// A failed status write after a failed step is logged; the step's error is
/// what the caller sees.
fn finish(
    store: &ExecutionStateStore<'_>,
    kind: StatusKind,
    result: Result<String>,
) -> Result<String> {
    match result {
        Ok(output) => {
            store.set_status(kind, ExecutionStatus::Completed)?;
            info!(identity = %store.identity(), field = %kind, "terraform step completed");
            Ok(output)
        }
        Err(e) => {
            if let Err(status_err) = store.set_status(kind, ExecutionStatus::Error) {
                warn!(identity = %store.identity(), error = %status_err, "could not record ERROR status");
            }
            Err(e)
        }
    }
}
