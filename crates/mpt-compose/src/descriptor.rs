//! Deployment descriptor model.
//!
//! The compose file is static operator-authored input. This module parses
//! it into typed services for validation, container name resolution, and
//! published port lookup. Keys the deploy tool does not act on are ignored.

use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;
use std::str::FromStr;

use serde::Deserialize;
use url::Url;

use crate::error::{ComposeError, ComposeResult};

/// Default compose file name at the stack root.
pub const COMPOSE_FILE: &str = "docker-compose.yml";

/// One `[host:]container` port publication.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PortMapping {
    /// Port published on the host, if any.
    pub published: Option<u16>,
    /// Port inside the container.
    pub target: u16,
}

impl FromStr for PortMapping {
    type Err = ComposeError;

    /// Parse the short port syntax: `8080`, `8080:8080`, or
    /// `127.0.0.1:8080:8080`, with an optional `/protocol` suffix.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || ComposeError::InvalidPort(s.to_string());
        let base = s.split('/').next().unwrap_or(s);
        let parts: Vec<&str> = base.split(':').collect();
        match parts.as_slice() {
            [target] => Ok(Self {
                published: None,
                target: target.parse().map_err(|_| invalid())?,
            }),
            [published, target] => Ok(Self {
                published: Some(published.parse().map_err(|_| invalid())?),
                target: target.parse().map_err(|_| invalid())?,
            }),
            [_host_ip, published, target] => Ok(Self {
                published: Some(published.parse().map_err(|_| invalid())?),
                target: target.parse().map_err(|_| invalid())?,
            }),
            _ => Err(invalid()),
        }
    }
}

impl fmt::Display for PortMapping {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.published {
            Some(published) => write!(f, "{published}:{}", self.target),
            None => write!(f, "{}", self.target),
        }
    }
}

/// `build:` key, either a bare context string or a table.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum BuildSpec {
    Context(String),
    Detailed {
        context: String,
        #[serde(default)]
        dockerfile: Option<String>,
    },
}

impl BuildSpec {
    pub fn context(&self) -> &str {
        match self {
            BuildSpec::Context(context) => context,
            BuildSpec::Detailed { context, .. } => context,
        }
    }
}

/// `env_file:` key, a single path or a list of paths.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum EnvFileRef {
    Single(String),
    Many(Vec<String>),
}

impl EnvFileRef {
    pub fn paths(&self) -> Vec<&str> {
        match self {
            EnvFileRef::Single(path) => vec![path.as_str()],
            EnvFileRef::Many(paths) => paths.iter().map(String::as_str).collect(),
        }
    }
}

/// `command:` key, a shell string or an argv list.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum CommandSpec {
    Shell(String),
    Argv(Vec<String>),
}

/// `depends_on:` key, a list of names or a map with conditions.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum DependsOn {
    List(Vec<String>),
    Map(BTreeMap<String, serde_yaml::Value>),
}

impl DependsOn {
    pub fn names(&self) -> Vec<&str> {
        match self {
            DependsOn::List(names) => names.iter().map(String::as_str).collect(),
            DependsOn::Map(map) => map.keys().map(String::as_str).collect(),
        }
    }
}

/// One service definition.
#[derive(Debug, Clone, Deserialize)]
pub struct Service {
    #[serde(default)]
    pub container_name: Option<String>,
    #[serde(default)]
    pub build: Option<BuildSpec>,
    #[serde(default)]
    pub image: Option<String>,
    #[serde(default)]
    pub ports: Vec<String>,
    #[serde(default)]
    pub volumes: Vec<String>,
    #[serde(default)]
    pub env_file: Option<EnvFileRef>,
    #[serde(default)]
    pub restart: Option<String>,
    #[serde(default)]
    pub command: Option<CommandSpec>,
    #[serde(default)]
    pub depends_on: Option<DependsOn>,
}

impl Service {
    /// Parsed port mappings, failing on the first malformed entry.
    pub fn port_mappings(&self) -> ComposeResult<Vec<PortMapping>> {
        self.ports.iter().map(|p| p.parse()).collect()
    }

    /// First host-published port, if any.
    pub fn published_port(&self) -> Option<u16> {
        self.ports
            .iter()
            .filter_map(|p| p.parse::<PortMapping>().ok())
            .find_map(|mapping| mapping.published)
    }

    /// Container name: the explicit `container_name` or the
    /// `<project>-<service>-1` runtime convention.
    pub fn resolved_container_name(&self, project: &str, service: &str) -> String {
        self.container_name
            .clone()
            .unwrap_or_else(|| format!("{project}-{service}-1"))
    }
}

/// Parsed compose file.
#[derive(Debug, Clone, Deserialize)]
pub struct ComposeFile {
    #[serde(default)]
    pub name: Option<String>,
    pub services: BTreeMap<String, Service>,
}

impl ComposeFile {
    /// Load and parse a compose file.
    pub fn load(path: impl AsRef<Path>) -> ComposeResult<Self> {
        let path = path.as_ref();
        if !path.is_file() {
            return Err(ComposeError::FileNotFound(path.to_path_buf()));
        }
        let raw = std::fs::read_to_string(path)?;
        Self::parse(&raw)
    }

    /// Parse a compose document from YAML text.
    pub fn parse(raw: &str) -> ComposeResult<Self> {
        Ok(serde_yaml::from_str(raw)?)
    }

    /// Look up a service by name.
    pub fn service(&self, name: &str) -> ComposeResult<&Service> {
        self.services
            .get(name)
            .ok_or_else(|| ComposeError::UnknownService(name.to_string()))
    }

    /// Service names in stable order.
    pub fn service_names(&self) -> Vec<String> {
        self.services.keys().cloned().collect()
    }

    /// Container name for a service under the given project.
    pub fn container_name(&self, project: &str, service: &str) -> ComposeResult<String> {
        Ok(self.service(service)?.resolved_container_name(project, service))
    }

    /// Project name: the explicit `name:` key or the stack directory name,
    /// lowercased the way the runtime normalizes it.
    pub fn project_name(&self, stack_dir: &Path) -> String {
        self.name
            .clone()
            .or_else(|| {
                stack_dir
                    .file_name()
                    .map(|name| name.to_string_lossy().into_owned())
            })
            .unwrap_or_else(|| "default".to_string())
            .to_lowercase()
    }

    /// Base URL for a service published on localhost, if it exposes one.
    pub fn service_url(&self, name: &str) -> ComposeResult<Option<Url>> {
        let service = self.service(name)?;
        Ok(service
            .published_port()
            .and_then(|port| Url::parse(&format!("http://localhost:{port}")).ok()))
    }

    /// Structural validation: each service declares a build context or an
    /// image, ports parse, dependencies exist, and referenced env files are
    /// present under `stack_dir`.
    pub fn validate(&self, stack_dir: &Path) -> ComposeResult<()> {
        if self.services.is_empty() {
            return Err(ComposeError::Invalid("no services defined".to_string()));
        }
        for (name, service) in &self.services {
            if service.build.is_none() && service.image.is_none() {
                return Err(ComposeError::Invalid(format!(
                    "service {name} declares neither build nor image"
                )));
            }
            service.port_mappings()?;
            if let Some(env_file) = &service.env_file {
                for rel in env_file.paths() {
                    if !stack_dir.join(rel).is_file() {
                        return Err(ComposeError::Invalid(format!(
                            "service {name} references missing env file {rel}"
                        )));
                    }
                }
            }
            if let Some(depends_on) = &service.depends_on {
                for dep in depends_on.names() {
                    if !self.services.contains_key(dep) {
                        return Err(ComposeError::Invalid(format!(
                            "service {name} depends on unknown service {dep}"
                        )));
                    }
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    const STACK_YAML: &str = r#"
services:
  webui:
    build:
      context: .
      dockerfile: Dockerfile
    container_name: moneyprinterturbo-webui
    ports:
      - "8501:8501"
    env_file:
      - .env
    volumes:
      - ./:/MoneyPrinterTurbo
    restart: unless-stopped
    depends_on:
      - api
  api:
    build: .
    container_name: moneyprinterturbo-api
    ports:
      - "8080:8080"
    env_file:
      - .env
    restart: unless-stopped
    command: ["python3", "main.py"]
"#;

    #[test]
    fn parses_the_stack_descriptor() {
        let compose = ComposeFile::parse(STACK_YAML).unwrap();
        assert_eq!(compose.service_names(), ["api", "webui"]);

        let webui = compose.service("webui").unwrap();
        assert_eq!(
            webui.container_name.as_deref(),
            Some("moneyprinterturbo-webui")
        );
        assert_eq!(webui.published_port(), Some(8501));
        assert_eq!(webui.restart.as_deref(), Some("unless-stopped"));
        assert_eq!(webui.env_file.as_ref().unwrap().paths(), [".env"]);

        let api = compose.service("api").unwrap();
        assert_eq!(api.published_port(), Some(8080));
        assert!(matches!(api.command, Some(CommandSpec::Argv(_))));
    }

    #[test]
    fn unknown_service_is_an_error() {
        let compose = ComposeFile::parse(STACK_YAML).unwrap();
        let err = compose.service("worker").unwrap_err();
        assert!(matches!(err, ComposeError::UnknownService(name) if name == "worker"));
    }

    #[test]
    fn port_mapping_short_syntax() {
        assert_eq!(
            "8501:8501".parse::<PortMapping>().unwrap(),
            PortMapping { published: Some(8501), target: 8501 }
        );
        assert_eq!(
            "9000".parse::<PortMapping>().unwrap(),
            PortMapping { published: None, target: 9000 }
        );
        assert_eq!(
            "127.0.0.1:8080:8080".parse::<PortMapping>().unwrap(),
            PortMapping { published: Some(8080), target: 8080 }
        );
        assert_eq!(
            "8080:8080/tcp".parse::<PortMapping>().unwrap(),
            PortMapping { published: Some(8080), target: 8080 }
        );
        assert!("not-a-port".parse::<PortMapping>().is_err());
        assert!("1:2:3:4".parse::<PortMapping>().is_err());
    }

    #[test]
    fn container_name_falls_back_to_runtime_convention() {
        let compose = ComposeFile::parse("services:\n  api:\n    image: mpt\n").unwrap();
        assert_eq!(
            compose.container_name("moneyprinterturbo", "api").unwrap(),
            "moneyprinterturbo-api-1"
        );
    }

    #[test]
    fn explicit_container_name_wins() {
        let compose = ComposeFile::parse(STACK_YAML).unwrap();
        assert_eq!(
            compose.container_name("anything", "api").unwrap(),
            "moneyprinterturbo-api"
        );
    }

    #[test]
    fn project_name_prefers_descriptor_key() {
        let compose =
            ComposeFile::parse("name: MoneyPrinter\nservices:\n  api:\n    image: mpt\n").unwrap();
        assert_eq!(
            compose.project_name(Path::new("/srv/stack")),
            "moneyprinter"
        );
    }

    #[test]
    fn project_name_falls_back_to_directory() {
        let compose = ComposeFile::parse("services:\n  api:\n    image: mpt\n").unwrap();
        assert_eq!(
            compose.project_name(Path::new("/srv/MoneyPrinterTurbo")),
            "moneyprinterturbo"
        );
    }

    #[test]
    fn service_url_uses_published_port() {
        let compose = ComposeFile::parse(STACK_YAML).unwrap();
        let url = compose.service_url("webui").unwrap().unwrap();
        assert_eq!(url.as_str(), "http://localhost:8501/");
    }

    #[test]
    fn validate_accepts_the_stack() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join(".env"), "OPENAI_API_KEY=sk-test-123456\n").unwrap();
        let compose = ComposeFile::parse(STACK_YAML).unwrap();
        compose.validate(dir.path()).unwrap();
    }

    #[test]
    fn validate_rejects_missing_env_file() {
        let dir = TempDir::new().unwrap();
        let compose = ComposeFile::parse(STACK_YAML).unwrap();
        let err = compose.validate(dir.path()).unwrap_err();
        assert!(matches!(err, ComposeError::Invalid(msg) if msg.contains(".env")));
    }

    #[test]
    fn validate_rejects_service_without_build_or_image() {
        let dir = TempDir::new().unwrap();
        let compose = ComposeFile::parse("services:\n  api:\n    restart: always\n").unwrap();
        let err = compose.validate(dir.path()).unwrap_err();
        assert!(matches!(err, ComposeError::Invalid(msg) if msg.contains("api")));
    }

    #[test]
    fn validate_rejects_unknown_dependency() {
        let dir = TempDir::new().unwrap();
        let compose = ComposeFile::parse(
            "services:\n  webui:\n    image: mpt\n    depends_on:\n      - ghost\n",
        )
        .unwrap();
        let err = compose.validate(dir.path()).unwrap_err();
        assert!(matches!(err, ComposeError::Invalid(msg) if msg.contains("ghost")));
    }

    #[test]
    fn depends_on_map_form_parses() {
        let compose = ComposeFile::parse(
            "services:\n  api:\n    image: mpt\n  webui:\n    image: mpt\n    depends_on:\n      api:\n        condition: service_started\n",
        )
        .unwrap();
        let webui = compose.service("webui").unwrap();
        assert_eq!(webui.depends_on.as_ref().unwrap().names(), ["api"]);
    }

    #[test]
    fn missing_compose_file_is_an_error() {
        let dir = TempDir::new().unwrap();
        let err = ComposeFile::load(dir.path().join(COMPOSE_FILE)).unwrap_err();
        assert!(matches!(err, ComposeError::FileNotFound(_)));
    }
}
