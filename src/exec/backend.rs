// src/exec/backend.rs

//! Pluggable process backend.
//!
//! [`TerraformRunner`](super::TerraformRunner) never spawns processes
//! itself; it hands a [`CommandInvocation`] to a `ProcessBackend`.
//!
//! - [`TokioProcessBackend`] is the production implementation and spawns
//!   the real binary via [`super::process::run_captured`].
//! - Tests provide their own backend that records invocations and replays
//!   scripted output without touching the OS.

use std::future::Future;
use std::path::PathBuf;
use std::pin::Pin;

use anyhow::Result;

use super::process::run_captured;

/// One fully built command line: program, ordered args, working directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandInvocation {
    pub program: PathBuf,
    pub args: Vec<String>,
    pub cwd: PathBuf,
}

impl CommandInvocation {
    /// First argument, i.e. the Terraform subcommand.
    pub fn subcommand(&self) -> &str {
        self.args.first().map(String::as_str).unwrap_or("")
    }
}

/// Result of a process that ran to completion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessOutput {
    /// `None` when the process was terminated by a signal.
    pub exit_code: Option<i32>,
    /// Combined stdout+stderr, decoded lossily as UTF-8.
    pub output: String,
}

impl ProcessOutput {
    pub fn success(&self) -> bool {
        self.exit_code == Some(0)
    }
}

/// Trait abstracting how invocations are executed.
///
/// `Err` means the process could not be run at all (missing binary,
/// permissions); a nonzero exit is still `Ok` with the exit code set.
pub trait ProcessBackend: Send + Sync {
    fn run<'a>(
        &'a self,
        invocation: &'a CommandInvocation,
    ) -> Pin<Box<dyn Future<Output = Result<ProcessOutput>> + Send + 'a>>;
}

/// Real backend used in production.
#[derive(Debug, Clone, Default)]
pub struct TokioProcessBackend;

impl ProcessBackend for TokioProcessBackend {
    fn run<'a>(
        &'a self,
        invocation: &'a CommandInvocation,
    ) -> Pin<Box<dyn Future<Output = Result<ProcessOutput>> + Send + 'a>> {
        Box::pin(run_captured(invocation))
    }
}
