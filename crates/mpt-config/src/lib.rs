//! Credential and settings contract for the MPT deployment stack.
//!
//! The web UI and API containers consume one shared env file and an
//! optional `config.toml` at the stack root. This crate owns that contract:
//!
//! - Provider credential sets (single key or comma-separated list)
//! - Environment-over-settings precedence, resolved once at startup
//! - Env file bootstrap and template placeholder detection
//! - Masked key rendering for logs and console output

pub mod credentials;
pub mod envfile;
pub mod error;
pub mod settings;

// Re-export common types
pub use credentials::{is_placeholder, parse_key_list, ApiKey, CredentialSet, KeySource, Provider};
pub use envfile::{Bootstrap, EnvFile, ENV_FILE, ENV_TEMPLATE};
pub use error::{ConfigError, ConfigResult};
pub use settings::{KeyMaterial, Settings, SETTINGS_FILE, SETTINGS_TEMPLATE};
