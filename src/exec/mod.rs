// src/exec/mod.rs

//! Process execution layer.
//!
//! - [`backend`] provides the `ProcessBackend` trait and the production
//!   `TokioProcessBackend`; tests swap in a fake.
//! - [`process`] spawns one process and captures merged stdout/stderr.
//! - [`runner`] maps Terraform lifecycle commands onto invocations.
//! - [`exec_log`] is the per-request execution log sink.
//! - [`lock`] is the advisory lock on a module directory.

pub mod backend;
pub mod exec_log;
pub mod lock;
pub mod process;
pub mod runner;

pub use backend::{CommandInvocation, ProcessBackend, ProcessOutput, TokioProcessBackend};
pub use exec_log::{ExecLogEntry, ExecLogSink, FileExecLog, MemoryExecLog};
pub use lock::WorkdirLock;
pub use runner::{TerraformRunner, flatten_outputs};
