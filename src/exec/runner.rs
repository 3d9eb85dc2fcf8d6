// src/exec/runner.rs

//! Terraform lifecycle commands for one entity.
//!
//! The runner builds the argument list for each subcommand, executes it
//! through a [`ProcessBackend`], logs captured output and turns failures
//! into `DriverError::Execution`. It never reads or writes status fields;
//! that bookkeeping belongs to the caller.

use std::path::{Path, PathBuf};

use serde_json::Value;
use tracing::{error, info, warn};

use crate::config::ServiceConfig;
use crate::errors::{DriverError, Result};
use crate::host::{HostApi, KeyValue};

use super::backend::{CommandInvocation, ProcessBackend};
use super::exec_log::{DESTROY_TAG, ExecLogSink, PLAN_TAG};

pub const PLAN_FILE: &str = "planfile";

/// Request-scoped Terraform runner.
pub struct TerraformRunner<'a> {
    host: &'a dyn HostApi,
    backend: &'a dyn ProcessBackend,
    exec_log: &'a dyn ExecLogSink,
    scope_id: &'a str,
    service: &'a ServiceConfig,
    working_dir: PathBuf,
    executable: PathBuf,
}

impl<'a> TerraformRunner<'a> {
    pub fn new(
        host: &'a dyn HostApi,
        backend: &'a dyn ProcessBackend,
        exec_log: &'a dyn ExecLogSink,
        scope_id: &'a str,
        service: &'a ServiceConfig,
        working_dir: impl Into<PathBuf>,
    ) -> Self {
        let working_dir = working_dir.into();
        let executable = service.executable_in(&working_dir);
        Self {
            host,
            backend,
            exec_log,
            scope_id,
            service,
            working_dir,
            executable,
        }
    }

    pub fn working_dir(&self) -> &Path {
        &self.working_dir
    }

    pub async fn init(&self) -> Result<String> {
        info!(service = %self.service.name, "performing terraform init");
        self.progress("Performing Terraform Init...");
        self.run_command(&["init"]).await
    }

    /// `plan [-var k=v]... -out planfile`, logged under `PLAN`.
    pub async fn plan(&self) -> Result<String> {
        info!(service = %self.service.name, "running terraform plan");
        self.progress("Generating Terraform Plan...");
        let args = plan_args(&self.service.input_vars());
        let output = self.run_command(&args).await?;
        self.exec_log.record(PLAN_TAG, &output)?;
        Ok(output)
    }

    /// Applies the saved plan file, never a fresh plan.
    pub async fn apply(&self) -> Result<String> {
        info!(service = %self.service.name, "running terraform apply");
        self.progress("Executing Terraform Apply with auto approve...");
        let output = self
            .run_command(&["apply", "--auto-approve", "-no-color", PLAN_FILE])
            .await?;
        // Apply output is filed under the PLAN tag.
        self.exec_log.record(PLAN_TAG, &output)?;
        Ok(output)
    }

    pub async fn destroy(&self) -> Result<String> {
        info!(service = %self.service.name, "performing terraform destroy");
        self.progress("Performing Terraform Destroy...");
        let output = self
            .run_command(&["destroy", "-auto-approve", "-no-color"])
            .await?;
        self.exec_log.record(DESTROY_TAG, &output)?;
        Ok(output)
    }

    /// Read `output -json`, flatten to `name=value,...` and store it on the
    /// `<model>.Terraform Output` attribute. Returns the stored string.
    pub async fn parse_and_save_outputs(&self) -> Result<String> {
        info!(service = %self.service.name, "running 'terraform output -json'");
        match self.save_outputs().await {
            Ok(flat) => Ok(flat),
            Err(e) => {
                error!(service = %self.service.name, error = %e, "error occurred while trying to parse terraform outputs");
                Err(e)
            }
        }
    }

    async fn save_outputs(&self) -> Result<String> {
        let raw = self.run_command(&["output", "-json"]).await?;
        let flat = flatten_outputs(&raw)?;
        self.host.set_attributes(
            self.scope_id,
            &self.service.name,
            &[KeyValue::new(self.service.output_attribute(), flat.clone())],
        )?;
        Ok(flat)
    }

    /// Run the binary once with `args` in the working directory.
    pub async fn run_command<S: AsRef<str>>(&self, args: &[S]) -> Result<String> {
        let invocation = CommandInvocation {
            program: self.executable.clone(),
            args: args.iter().map(|a| a.as_ref().to_string()).collect(),
            cwd: self.working_dir.clone(),
        };
        let subcommand = invocation.subcommand().to_string();
        let message = format!(
            "Error during Terraform {subcommand}. For more information please look at the logs."
        );

        let result = match self.backend.run(&invocation).await {
            Ok(result) => result,
            Err(e) => {
                let cause = format!("{e:#}");
                error!(%subcommand, error = %cause, "error running terraform");
                return Err(DriverError::execution(message, None));
            }
        };

        if !result.success() {
            error!(
                %subcommand,
                exit_code = ?result.exit_code,
                output = %result.output,
                "error occurred while trying to execute terraform"
            );
            return Err(DriverError::execution(message, Some(result.output)));
        }

        Ok(result.output)
    }

    fn progress(&self, message: &str) {
        if let Err(e) = self.host.send_progress(self.scope_id, message) {
            warn!(error = %e, %message, "progress message not delivered");
        }
    }
}

fn plan_args(inputs: &[String]) -> Vec<String> {
    let mut args = vec!["plan".to_string()];
    for input in inputs {
        args.push("-var".to_string());
        args.push(input.clone());
    }
    args.push("-out".to_string());
    args.push(PLAN_FILE.to_string());
    args
}

/// `{"ip":{"value":"1.2.3.4"},"port":{"value":8080}}` -> `ip=1.2.3.4,port=8080`.
///
/// Strings are rendered bare, everything else as compact JSON. Pair order
/// follows the document.
pub fn flatten_outputs(raw: &str) -> Result<String> {
    let doc: Value = serde_json::from_str(raw)?;
    let outputs = doc.as_object().ok_or_else(|| {
        DriverError::Other(anyhow::anyhow!(
            "terraform output is not a JSON object"
        ))
    })?;

    let mut pairs = Vec::with_capacity(outputs.len());
    for (name, entry) in outputs {
        let value = entry.get("value").ok_or_else(|| {
            DriverError::Other(anyhow::anyhow!("terraform output '{name}' has no value"))
        })?;
        let rendered = match value {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        };
        pairs.push(format!("{name}={rendered}"));
    }
    Ok(pairs.join(","))
}
