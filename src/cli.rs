// src/cli.rs

//! CLI argument parsing using `clap`.

use clap::{Parser, Subcommand, ValueEnum};

/// Command-line arguments for `tfdriver`.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "tfdriver",
    version,
    about = "Drive Terraform for a managed service and track its execution state.",
    long_about = None
)]
pub struct CliArgs {
    /// Path to the config file (TOML).
    #[arg(long, value_name = "PATH", default_value = "tfdriver.toml", global = true)]
    pub config: String,

    /// Logging level (error, warn, info, debug, trace).
    ///
    /// If omitted, `TFDRIVER_LOG` or a default level will be used.
    #[arg(long, value_enum, value_name = "LEVEL", global = true)]
    pub log_level: Option<LogLevel>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Subcommand)]
pub enum Command {
    /// init, plan and apply, then store the outputs on the service.
    Run,
    /// init and plan only; leaves a plan file for a later apply.
    Plan,
    /// Destroy the deployment.
    Destroy,
    /// Print the local terraform.tfstate.
    ShowState,
    /// Print the service's execution identity and state record as JSON.
    Status,
}

/// Log level as exposed on the CLI.
#[derive(Debug, Copy, Clone, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// Convenience wrapper around `CliArgs::parse()`.
pub fn parse() -> CliArgs {
    CliArgs::parse()
}
