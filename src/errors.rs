// src/errors.rs

//! Crate-wide error type and helpers.
//!
//! Every failure is one `DriverError`; callers that need to branch on the
//! broad category use [`DriverError::kind`] instead of matching variants.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum DriverError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("TOML parsing error: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    /// The provisioning binary exited nonzero or could not be launched.
    #[error("{message}")]
    Execution {
        message: String,
        /// Combined stdout+stderr of the failed invocation, if it ran at all.
        output: Option<String>,
    },

    /// Another run holds the entity's working directory.
    #[error("{0}")]
    Locked(String),

    #[error("Missing execution state: {0}")]
    MissingState(String),

    #[error("Store error: {0}")]
    Transport(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Broad category of a [`DriverError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    MissingState,
    ExecutionFailed,
    Locked,
    Transport,
    Config,
    Other,
}

impl DriverError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            DriverError::MissingState(_) => ErrorKind::MissingState,
            DriverError::Execution { .. } => ErrorKind::ExecutionFailed,
            DriverError::Locked(_) => ErrorKind::Locked,
            DriverError::Transport(_) => ErrorKind::Transport,
            DriverError::ConfigError(_) | DriverError::TomlError(_) => ErrorKind::Config,
            DriverError::IoError(_) | DriverError::JsonError(_) | DriverError::Other(_) => {
                ErrorKind::Other
            }
        }
    }

    /// Captured tool output carried by an execution failure.
    pub fn captured_output(&self) -> Option<&str> {
        match self {
            DriverError::Execution { output, .. } => output.as_deref(),
            _ => None,
        }
    }

    pub(crate) fn execution(message: impl Into<String>, output: Option<String>) -> Self {
        DriverError::Execution {
            message: message.into(),
            output,
        }
    }

    pub(crate) fn transport(err: impl std::fmt::Display) -> Self {
        DriverError::Transport(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, DriverError>;
