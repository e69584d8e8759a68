//! Service status model and `ps` output parsing.
//!
//! The two runtime flavors report status differently: the plugin emits
//! machine-readable JSON (one object per line on current releases, a single
//! array on older ones), while the standalone tool prints a human table.
//! Both parse into the same [`ServiceStatus`] shape.

use std::fmt;

use serde::Deserialize;

use crate::error::ComposeResult;

/// Container state as reported by the runtime.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ServiceState {
    Up,
    Restarting,
    Exited,
    Created,
    Paused,
    Dead,
    Unknown(String),
}

impl ServiceState {
    /// Parse a state string from either flavor. The plugin reports
    /// lowercase words (`running`, `exited`); the standalone tool reports
    /// human text (`Up 5 seconds`, `Exit 1`).
    pub fn parse(raw: &str) -> Self {
        let lower = raw.trim().to_ascii_lowercase();
        if lower.starts_with("up") || lower.starts_with("running") {
            ServiceState::Up
        } else if lower.starts_with("restarting") {
            ServiceState::Restarting
        } else if lower.starts_with("exit") {
            ServiceState::Exited
        } else if lower.starts_with("created") {
            ServiceState::Created
        } else if lower.starts_with("paused") {
            ServiceState::Paused
        } else if lower.starts_with("dead") {
            ServiceState::Dead
        } else {
            ServiceState::Unknown(raw.trim().to_string())
        }
    }

    pub fn is_up(&self) -> bool {
        matches!(self, ServiceState::Up)
    }

    pub fn as_str(&self) -> &str {
        match self {
            ServiceState::Up => "up",
            ServiceState::Restarting => "restarting",
            ServiceState::Exited => "exited",
            ServiceState::Created => "created",
            ServiceState::Paused => "paused",
            ServiceState::Dead => "dead",
            ServiceState::Unknown(raw) => raw,
        }
    }
}

impl fmt::Display for ServiceState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Status of one service's container.
#[derive(Debug, Clone)]
pub struct ServiceStatus {
    /// Compose service name.
    pub service: String,
    /// Container name.
    pub container: String,
    /// Parsed state.
    pub state: ServiceState,
    /// Raw status text for display, e.g. `Up 10 seconds (healthy)`.
    pub detail: String,
}

impl ServiceStatus {
    pub fn is_up(&self) -> bool {
        self.state.is_up()
    }

    fn not_listed(service: &str, container: &str) -> Self {
        Self {
            service: service.to_string(),
            container: container.to_string(),
            state: ServiceState::Unknown("not listed".to_string()),
            detail: "not listed".to_string(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct PsEntry {
    #[serde(rename = "Service", default)]
    service: String,
    #[serde(rename = "Name", default)]
    name: String,
    #[serde(rename = "State", default)]
    state: String,
    #[serde(rename = "Status", default)]
    status: String,
}

impl From<PsEntry> for ServiceStatus {
    fn from(entry: PsEntry) -> Self {
        let state_text = if entry.state.is_empty() { &entry.status } else { &entry.state };
        let state = ServiceState::parse(state_text);
        let detail = if entry.status.is_empty() { entry.state.clone() } else { entry.status.clone() };
        Self {
            service: entry.service,
            container: entry.name,
            state,
            detail,
        }
    }
}

/// Parse plugin-flavor `ps --format json` output.
pub fn parse_ps_json(raw: &str) -> ComposeResult<Vec<ServiceStatus>> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Ok(Vec::new());
    }
    let entries: Vec<PsEntry> = if trimmed.starts_with('[') {
        serde_json::from_str(trimmed)?
    } else {
        trimmed
            .lines()
            .filter(|line| !line.trim().is_empty())
            .map(serde_json::from_str)
            .collect::<Result<_, _>>()?
    };
    Ok(entries.into_iter().map(ServiceStatus::from).collect())
}

/// Parse standalone-flavor plain-text `ps` output for known containers.
///
/// Column boundaries in the table are not stable across versions, so each
/// row is matched by container name and scanned for a state keyword, the
/// same signal the classic deploy script grepped for.
pub fn parse_ps_table(raw: &str, containers: &[(String, String)]) -> Vec<ServiceStatus> {
    containers
        .iter()
        .map(|(service, container)| {
            let row = raw.lines().find_map(|line| {
                line.trim_start()
                    .strip_prefix(container.as_str())
                    // Exact name only; `api` must not match `api-backup`.
                    .filter(|rest| rest.is_empty() || rest.starts_with(char::is_whitespace))
            });
            match row {
                Some(rest) => {
                    let rest = rest.trim();
                    ServiceStatus {
                        service: service.clone(),
                        container: container.clone(),
                        state: scan_state(rest),
                        detail: rest.to_string(),
                    }
                }
                None => ServiceStatus::not_listed(service, container),
            }
        })
        .collect()
}

fn scan_state(rest: &str) -> ServiceState {
    let words: Vec<&str> = rest.split_whitespace().collect();
    if words.iter().any(|word| *word == "Up") {
        ServiceState::Up
    } else if words.iter().any(|word| word.starts_with("Exit")) {
        ServiceState::Exited
    } else if words.iter().any(|word| *word == "Restarting") {
        ServiceState::Restarting
    } else if words.iter().any(|word| *word == "Paused") {
        ServiceState::Paused
    } else {
        ServiceState::Unknown(rest.to_string())
    }
}
