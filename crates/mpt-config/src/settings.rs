//! Application settings file (`config.toml`).
//!
//! The settings file lives at the stack root next to the deployment
//! descriptor. It is bootstrapped from `config.example.toml` when missing,
//! tolerates a UTF-8 BOM, and may be clobbered into a directory by a
//! misconfigured bind mount, in which case the directory is removed and the
//! template restored.

use std::fs;
use std::path::Path;

use serde::Deserialize;
use tracing::{info, warn};

use crate::credentials::Provider;
use crate::error::{ConfigError, ConfigResult};

/// Settings file name at the stack root.
pub const SETTINGS_FILE: &str = "config.toml";
/// Template shipped with the stack.
pub const SETTINGS_TEMPLATE: &str = "config.example.toml";

fn default_log_level() -> String {
    "DEBUG".to_string()
}

fn default_listen_host() -> String {
    "0.0.0.0".to_string()
}

fn default_listen_port() -> u16 {
    8080
}

fn default_project_name() -> String {
    "MoneyPrinterTurbo".to_string()
}

fn default_project_version() -> String {
    "1.2.6".to_string()
}

/// Key material in the settings file: either a single comma-separated
/// string or an explicit array of keys.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum KeyMaterial {
    Joined(String),
    List(Vec<String>),
}

impl KeyMaterial {
    pub fn is_empty(&self) -> bool {
        match self {
            KeyMaterial::Joined(raw) => raw.is_empty(),
            KeyMaterial::List(values) => values.is_empty(),
        }
    }
}

/// `[app]` table: provider key material.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppSection {
    #[serde(default)]
    pub pexels_api_keys: Option<KeyMaterial>,
    #[serde(default)]
    pub pixabay_api_keys: Option<KeyMaterial>,
    #[serde(default)]
    pub openai_api_key: Option<String>,
}

/// `[ui]` table.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UiSection {
    #[serde(default)]
    pub hide_log: bool,
}

/// Parsed settings file. Unknown keys are ignored so the deploy tool stays
/// compatible with settings written for newer application versions.
#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    #[serde(default = "default_log_level")]
    pub log_level: String,
    #[serde(default = "default_listen_host")]
    pub listen_host: String,
    #[serde(default = "default_listen_port")]
    pub listen_port: u16,
    #[serde(default = "default_project_name")]
    pub project_name: String,
    #[serde(default = "default_project_version")]
    pub project_version: String,
    #[serde(default)]
    pub app: AppSection,
    #[serde(default)]
    pub ui: UiSection,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            listen_host: default_listen_host(),
            listen_port: default_listen_port(),
            project_name: default_project_name(),
            project_version: default_project_version(),
            app: AppSection::default(),
            ui: UiSection::default(),
        }
    }
}

impl Settings {
    /// Load settings from the stack root, bootstrapping from the template
    /// when the file is missing.
    pub fn load(stack_dir: impl AsRef<Path>) -> ConfigResult<Self> {
        let stack_dir = stack_dir.as_ref();
        let path = stack_dir.join(SETTINGS_FILE);
        let template = stack_dir.join(SETTINGS_TEMPLATE);

        // A bind mount against a missing host file materializes the
        // settings path as a directory.
        if path.is_dir() {
            warn!(path = %path.display(), "settings path is a directory, removing it");
            fs::remove_dir_all(&path)?;
        }

        if !path.is_file() {
            if !template.is_file() {
                return Err(ConfigError::SettingsNotFound(path));
            }
            fs::copy(&template, &path)?;
            info!("created {SETTINGS_FILE} from {SETTINGS_TEMPLATE}");
        }

        Self::from_path(&path)
    }

    /// Parse one settings file, tolerating a UTF-8 BOM.
    pub fn from_path(path: impl AsRef<Path>) -> ConfigResult<Self> {
        let path = path.as_ref();
        let raw = fs::read_to_string(path)?;
        let raw = raw.strip_prefix('\u{feff}').unwrap_or(&raw);
        toml::from_str(raw).map_err(|source| ConfigError::SettingsParse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Key material configured for `provider`, if any.
    pub fn key_material(&self, provider: Provider) -> Option<KeyMaterial> {
        match provider {
            Provider::Pexels => self.app.pexels_api_keys.clone(),
            Provider::Pixabay => self.app.pixabay_api_keys.clone(),
            Provider::OpenAi => self.app.openai_api_key.clone().map(KeyMaterial::Joined),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn parses_full_settings() {
        let raw = r#"
            log_level = "INFO"
            listen_host = "127.0.0.1"
            listen_port = 9090
            project_name = "MoneyPrinterTurbo"
            project_version = "1.2.6"

            [app]
            pexels_api_keys = ["aaaa1111bbbb", "cccc2222dddd"]
            pixabay_api_keys = "eeee3333ffff"
            openai_api_key = "sk-test-4444gggg"

            [ui]
            hide_log = true
        "#;
        let settings: Settings = toml::from_str(raw).unwrap();
        assert_eq!(settings.log_level, "INFO");
        assert_eq!(settings.listen_port, 9090);
        assert_eq!(
            settings.app.pexels_api_keys,
            Some(KeyMaterial::List(vec![
                "aaaa1111bbbb".to_string(),
                "cccc2222dddd".to_string()
            ]))
        );
        assert_eq!(
            settings.app.pixabay_api_keys,
            Some(KeyMaterial::Joined("eeee3333ffff".to_string()))
        );
        assert!(settings.ui.hide_log);
    }

    #[test]
    fn applies_defaults_for_missing_keys() {
        let settings: Settings = toml::from_str("").unwrap();
        assert_eq!(settings.log_level, "DEBUG");
        assert_eq!(settings.listen_host, "0.0.0.0");
        assert_eq!(settings.listen_port, 8080);
        assert_eq!(settings.project_name, "MoneyPrinterTurbo");
        assert!(settings.app.openai_api_key.is_none());
        assert!(!settings.ui.hide_log);
    }

    #[test]
    fn ignores_unknown_keys() {
        let raw = r#"
            hide_config = true

            [azure]
            speech_key = "irrelevant"
        "#;
        let settings: Settings = toml::from_str(raw).unwrap();
        assert_eq!(settings.project_name, "MoneyPrinterTurbo");
    }

    #[test]
    fn strips_utf8_bom() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(SETTINGS_FILE);
        fs::write(&path, "\u{feff}listen_port = 8081\n").unwrap();
        let settings = Settings::from_path(&path).unwrap();
        assert_eq!(settings.listen_port, 8081);
    }

    #[test]
    fn bootstraps_from_template_when_missing() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join(SETTINGS_TEMPLATE), "listen_port = 8082\n").unwrap();
        let settings = Settings::load(dir.path()).unwrap();
        assert_eq!(settings.listen_port, 8082);
        assert!(dir.path().join(SETTINGS_FILE).is_file());
    }

    #[test]
    fn replaces_directory_left_by_bad_bind_mount() {
        let dir = TempDir::new().unwrap();
        fs::create_dir(dir.path().join(SETTINGS_FILE)).unwrap();
        fs::write(dir.path().join(SETTINGS_TEMPLATE), "listen_port = 8083\n").unwrap();
        let settings = Settings::load(dir.path()).unwrap();
        assert_eq!(settings.listen_port, 8083);
        assert!(dir.path().join(SETTINGS_FILE).is_file());
    }

    #[test]
    fn errors_when_file_and_template_both_missing() {
        let dir = TempDir::new().unwrap();
        let err = Settings::load(dir.path()).unwrap_err();
        assert!(matches!(err, ConfigError::SettingsNotFound(_)));
    }

    #[test]
    fn existing_file_wins_over_template() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join(SETTINGS_FILE), "listen_port = 1111\n").unwrap();
        fs::write(dir.path().join(SETTINGS_TEMPLATE), "listen_port = 2222\n").unwrap();
        let settings = Settings::load(dir.path()).unwrap();
        assert_eq!(settings.listen_port, 1111);
    }
}
