// src/lib.rs

pub mod cli;
pub mod config;
pub mod driver;
pub mod errors;
pub mod exec;
pub mod fs;
pub mod host;
pub mod logging;
pub mod state;
pub mod types;

use std::sync::Arc;

use tracing::debug;

use crate::cli::{CliArgs, Command};
use crate::config::load_and_validate;
use crate::driver::{RequestContext, TerraformDriver};
use crate::errors::Result;
use crate::exec::{FileExecLog, TokioProcessBackend};
use crate::fs::RealFileSystem;
use crate::host::FileHost;

/// High-level entry point used by `main.rs`.
///
/// Wires config, the file-backed host, the real process backend and a
/// fresh execution log into a driver, runs one command and returns the
/// text to print.
pub async fn run(args: CliArgs) -> Result<String> {
    let cfg = load_and_validate(&args.config)?;
    let ctx = RequestContext::from_config(&cfg);

    let fs = Arc::new(RealFileSystem);
    let host = FileHost::new(fs.clone(), cfg.store.path.clone());
    let backend = TokioProcessBackend;
    let exec_log = FileExecLog::create(&cfg.log.dir, &ctx.scope_id)?;
    debug!(store = ?host.path(), exec_log = ?exec_log.path(), "driver wired");

    let driver = TerraformDriver::new(&ctx, &host, &backend, &exec_log, &*fs);

    match args.command {
        Command::Run => driver.run().await,
        Command::Plan => driver.plan().await,
        Command::Destroy => driver.destroy().await,
        Command::ShowState => Ok(driver.show_state()),
        Command::Status => Ok(serde_json::to_string_pretty(&driver.status()?)?),
    }
}
