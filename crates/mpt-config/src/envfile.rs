//! Env file handling.
//!
//! Both containers read the same env file at the stack root. The deploy
//! flow bootstraps it from `env.example` on first run and refuses to start
//! the stack while it still carries template placeholder values.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use tracing::info;

use crate::credentials::is_placeholder;
use crate::error::{ConfigError, ConfigResult};

/// Default env file name at the stack root.
pub const ENV_FILE: &str = ".env";
/// Template shipped with the stack.
pub const ENV_TEMPLATE: &str = "env.example";

/// Outcome of [`EnvFile::bootstrap`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Bootstrap {
    /// The file was already present.
    Existing,
    /// The file was created from the template and still needs editing.
    Created,
}

/// A parsed env file.
#[derive(Debug, Clone)]
pub struct EnvFile {
    path: PathBuf,
    vars: BTreeMap<String, String>,
}

impl EnvFile {
    /// Ensure the env file exists, copying the template when it is missing.
    pub fn bootstrap(path: impl AsRef<Path>, template: impl AsRef<Path>) -> ConfigResult<Bootstrap> {
        let path = path.as_ref();
        if path.is_file() {
            return Ok(Bootstrap::Existing);
        }
        let template = template.as_ref();
        if !template.is_file() {
            return Err(ConfigError::TemplateNotFound(template.to_path_buf()));
        }
        fs::copy(template, path)?;
        info!(path = %path.display(), "created env file from template");
        Ok(Bootstrap::Created)
    }

    /// Load and parse an env file.
    pub fn load(path: impl AsRef<Path>) -> ConfigResult<Self> {
        let path = path.as_ref();
        if !path.is_file() {
            return Err(ConfigError::EnvFileNotFound(path.to_path_buf()));
        }
        let raw = fs::read_to_string(path)?;
        Ok(Self {
            path: path.to_path_buf(),
            vars: parse(&raw)?,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Value for `var`, if present.
    pub fn get(&self, var: &str) -> Option<&str> {
        self.vars.get(var).map(String::as_str)
    }

    /// Variables from `required` that are absent or empty.
    pub fn missing<'a>(&self, required: impl IntoIterator<Item = &'a str>) -> Vec<&'a str> {
        required
            .into_iter()
            .filter(|var| self.get(var).is_none_or(str::is_empty))
            .collect()
    }

    /// Variables from `required` still carrying template placeholder text.
    ///
    /// List-valued variables are flagged if any element is a placeholder.
    pub fn placeholders<'a>(&self, required: impl IntoIterator<Item = &'a str>) -> Vec<&'a str> {
        required
            .into_iter()
            .filter(|var| {
                self.get(var)
                    .is_some_and(|value| value.split(',').any(is_placeholder))
            })
            .collect()
    }
}

/// Parse `KEY=VALUE` lines. Blank lines and `#` comments are skipped; one
/// level of matching quotes around a value is stripped.
fn parse(raw: &str) -> ConfigResult<BTreeMap<String, String>> {
    let mut vars = BTreeMap::new();
    for (number, line) in raw.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let Some((key, value)) = line.split_once('=') else {
            return Err(ConfigError::MalformedEnvLine { line: number + 1 });
        };
        let key = key.trim();
        if key.is_empty() {
            return Err(ConfigError::MalformedEnvLine { line: number + 1 });
        }
        vars.insert(key.to_string(), unquote(value.trim()).to_string());
    }
    Ok(vars)
}

fn unquote(value: &str) -> &str {
    let bytes = value.as_bytes();
    if bytes.len() >= 2 {
        let (first, last) = (bytes[0], bytes[bytes.len() - 1]);
        if first == last && (first == b'"' || first == b'\'') {
            return &value[1..value.len() - 1];
        }
    }
    value
}
