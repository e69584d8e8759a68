//! Provider credential sets.
//!
//! Each external provider is credentialed through one environment variable
//! holding either a single API key or a comma-separated list of keys. Values
//! resolve from the process environment first and fall back to the settings
//! file; resolution happens once at startup and the resulting sets are
//! immutable afterwards.

use std::fmt;

use tracing::debug;

use crate::error::{ConfigError, ConfigResult};
use crate::settings::{KeyMaterial, Settings};

const PLACEHOLDER_PREFIX: &str = "your_";
const PLACEHOLDER_SUFFIX: &str = "_here";

/// Credentialed external services.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Provider {
    Pexels,
    Pixabay,
    OpenAi,
}

impl Provider {
    /// Every provider the stack is credentialed against.
    pub const ALL: [Provider; 3] = [Provider::Pexels, Provider::Pixabay, Provider::OpenAi];

    /// Environment variable carrying this provider's key material.
    pub fn env_var(&self) -> &'static str {
        match self {
            Provider::Pexels => "PEXELS_API_KEYS",
            Provider::Pixabay => "PIXABAY_API_KEYS",
            Provider::OpenAi => "OPENAI_API_KEY",
        }
    }

    /// Whether the variable may hold a comma-separated list of keys.
    pub fn accepts_list(&self) -> bool {
        matches!(self, Provider::Pexels | Provider::Pixabay)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Provider::Pexels => "Pexels",
            Provider::Pixabay => "Pixabay",
            Provider::OpenAi => "OpenAI",
        }
    }
}

impl fmt::Display for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Where a credential set was resolved from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeySource {
    Environment,
    SettingsFile,
}

impl fmt::Display for KeySource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KeySource::Environment => write!(f, "environment"),
            KeySource::SettingsFile => write!(f, "config.toml"),
        }
    }
}

/// A single API key. `Display` and `Debug` render the masked form only.
#[derive(Clone, PartialEq, Eq)]
pub struct ApiKey(String);

impl ApiKey {
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    /// Expose the raw key for runtime injection.
    pub fn expose(&self) -> &str {
        &self.0
    }

    /// Masked rendering: the first and last four characters survive, the
    /// middle is starred out. Keys of eight characters or fewer collapse
    /// to `***` entirely.
    pub fn masked(&self) -> String {
        let len = self.0.chars().count();
        if len > 8 {
            let head: String = self.0.chars().take(4).collect();
            let tail: String = self.0.chars().skip(len - 4).collect();
            format!("{head}{}{tail}", "*".repeat(len - 8))
        } else {
            "***".to_string()
        }
    }
}

impl fmt::Display for ApiKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.masked())
    }
}

impl fmt::Debug for ApiKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ApiKey({})", self.masked())
    }
}

/// Whether a value is template placeholder text rather than a real key.
pub fn is_placeholder(value: &str) -> bool {
    let lower = value.to_ascii_lowercase();
    lower.starts_with(PLACEHOLDER_PREFIX) && lower.ends_with(PLACEHOLDER_SUFFIX)
}

fn validate_element(var: &str, index: usize, element: &str) -> ConfigResult<ApiKey> {
    if element.is_empty() {
        return Err(ConfigError::empty_key(var, index));
    }
    if element.chars().any(char::is_whitespace) {
        return Err(ConfigError::key_whitespace(var, index));
    }
    if element.contains(',') {
        return Err(ConfigError::KeySeparator { var: var.to_string(), index });
    }
    if is_placeholder(element) {
        return Err(ConfigError::placeholder(var, element));
    }
    Ok(ApiKey::new(element))
}

/// Parse a raw variable value into an ordered key list.
///
/// Enforces the credential contract: comma-separated, no whitespace in or
/// around elements, no empty elements, no template placeholders.
pub fn parse_key_list(var: &str, raw: &str) -> ConfigResult<Vec<ApiKey>> {
    if raw.is_empty() {
        return Err(ConfigError::EmptyValue { var: var.to_string() });
    }
    raw.split(',')
        .enumerate()
        .map(|(index, element)| validate_element(var, index, element))
        .collect()
}

/// An ordered, immutable set of keys for one provider.
#[derive(Debug, Clone)]
pub struct CredentialSet {
    provider: Provider,
    keys: Vec<ApiKey>,
    source: KeySource,
}

impl CredentialSet {
    fn from_keys(provider: Provider, keys: Vec<ApiKey>, source: KeySource) -> ConfigResult<Self> {
        if keys.len() > 1 && !provider.accepts_list() {
            return Err(ConfigError::SingleKeyExpected {
                var: provider.env_var().to_string(),
                count: keys.len(),
            });
        }
        Ok(Self { provider, keys, source })
    }

    /// Parse an environment variable value into a credential set.
    pub fn from_env_value(provider: Provider, raw: &str) -> ConfigResult<Self> {
        let keys = parse_key_list(provider.env_var(), raw)?;
        Self::from_keys(provider, keys, KeySource::Environment)
    }

    /// Parse settings-file key material into a credential set.
    pub fn from_settings(provider: Provider, material: &KeyMaterial) -> ConfigResult<Self> {
        let var = provider.env_var();
        let keys = match material {
            KeyMaterial::Joined(raw) => parse_key_list(var, raw)?,
            KeyMaterial::List(values) => values
                .iter()
                .enumerate()
                .map(|(index, element)| validate_element(var, index, element))
                .collect::<ConfigResult<_>>()?,
        };
        Self::from_keys(provider, keys, KeySource::SettingsFile)
    }

    /// Resolve a provider's credentials: environment first, settings file
    /// as fallback. `Ok(None)` means no key material is configured anywhere.
    pub fn resolve(provider: Provider, settings: &Settings) -> ConfigResult<Option<Self>> {
        if let Ok(raw) = std::env::var(provider.env_var()) {
            if !raw.is_empty() {
                let set = Self::from_env_value(provider, &raw)?;
                debug!(provider = %provider, keys = set.len(), "credentials resolved from environment");
                return Ok(Some(set));
            }
        }
        match settings.key_material(provider) {
            Some(material) if !material.is_empty() => {
                let set = Self::from_settings(provider, &material)?;
                debug!(provider = %provider, keys = set.len(), "credentials resolved from settings file");
                Ok(Some(set))
            }
            _ => Ok(None),
        }
    }

    pub fn provider(&self) -> Provider {
        self.provider
    }

    pub fn source(&self) -> KeySource {
        self.source
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    pub fn keys(&self) -> &[ApiKey] {
        &self.keys
    }

    /// Masked one-line summary, e.g. `abcd********wxyz (+2 more)`.
    pub fn masked_summary(&self) -> String {
        match self.keys.split_first() {
            Some((first, rest)) if rest.is_empty() => first.masked(),
            Some((first, rest)) => format!("{} (+{} more)", first.masked(), rest.len()),
            None => "(none)".to_string(),
        }
    }
}
