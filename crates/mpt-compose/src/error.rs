//! Compose driver error types.

use std::path::PathBuf;
use thiserror::Error;

/// Result type for compose operations.
pub type ComposeResult<T> = Result<T, ComposeError>;

/// Errors from the descriptor model and the container runtime driver.
#[derive(Debug, Error)]
pub enum ComposeError {
    #[error("no container runtime found: install Docker with the compose plugin, or docker-compose")]
    RuntimeNotFound,

    #[error("compose file not found: {0}")]
    FileNotFound(PathBuf),

    #[error("invalid compose file: {0}")]
    Invalid(String),

    #[error("unknown service: {0}")]
    UnknownService(String),

    #[error("invalid port mapping: {0}")]
    InvalidPort(String),

    #[error("command failed: {message}")]
    CommandFailed {
        message: String,
        stderr: Option<String>,
        exit_code: Option<i32>,
    },

    #[error("command timed out after {0} seconds")]
    Timeout(u64),

    #[error("service {0} did not reach the Up state")]
    ServiceNotUp(String),

    #[error("YAML parse error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl ComposeError {
    /// Create a command failure with captured output.
    pub fn command_failed(
        message: impl Into<String>,
        stderr: Option<String>,
        exit_code: Option<i32>,
    ) -> Self {
        Self::CommandFailed {
            message: message.into(),
            stderr,
            exit_code,
        }
    }

    /// Stderr captured from a failed command, if any.
    pub fn captured_stderr(&self) -> Option<&str> {
        match self {
            Self::CommandFailed { stderr, .. } => stderr.as_deref(),
            _ => None,
        }
    }
}
