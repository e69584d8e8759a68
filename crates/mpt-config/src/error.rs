//! Configuration error types.

use std::path::PathBuf;
use thiserror::Error;

/// Result type for configuration operations.
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Errors raised while loading or validating configuration.
///
/// Variants that describe key material never embed the offending value;
/// only template placeholder text is safe to echo back.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{var} is empty")]
    EmptyValue { var: String },

    #[error("{var}: key #{index} is empty (stray comma?)")]
    EmptyKey { var: String, index: usize },

    #[error("{var}: key #{index} contains whitespace; keys must be comma-separated with no spaces")]
    KeyWhitespace { var: String, index: usize },

    #[error("{var}: key #{index} contains a comma; list each key as its own element")]
    KeySeparator { var: String, index: usize },

    #[error("{var} still holds the template placeholder '{value}'; set a real API key")]
    Placeholder { var: String, value: String },

    #[error("{var} holds {count} keys but this provider takes a single key")]
    SingleKeyExpected { var: String, count: usize },

    #[error("env file not found: {0}")]
    EnvFileNotFound(PathBuf),

    #[error("env file template not found: {0}")]
    TemplateNotFound(PathBuf),

    #[error("malformed env file line {line} (expected KEY=VALUE)")]
    MalformedEnvLine { line: usize },

    #[error("settings file not found: {0}")]
    SettingsNotFound(PathBuf),

    #[error("failed to parse {path}: {source}")]
    SettingsParse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl ConfigError {
    /// Create an empty-key error for one list element.
    pub fn empty_key(var: impl Into<String>, index: usize) -> Self {
        Self::EmptyKey { var: var.into(), index }
    }

    /// Create a whitespace error for one list element.
    pub fn key_whitespace(var: impl Into<String>, index: usize) -> Self {
        Self::KeyWhitespace { var: var.into(), index }
    }

    /// Create a placeholder error, echoing the template text.
    pub fn placeholder(var: impl Into<String>, value: impl Into<String>) -> Self {
        Self::Placeholder { var: var.into(), value: value.into() }
    }
}
