//! High-level stack operations.
//!
//! [`StackDriver`] binds a located runtime to one compose file and wraps
//! the handful of operations the deploy flow needs: build, detached start,
//! teardown, status, log tailing, startup polling, and in-container
//! environment inspection.

use std::path::PathBuf;
use std::time::Duration;

use tokio::time::Instant;
use tracing::debug;

use crate::descriptor::ComposeFile;
use crate::error::{ComposeError, ComposeResult};
use crate::runtime::{CommandOutput, ComposeCli, ComposeCommand, ComposeRunner};
use crate::status::{parse_ps_json, parse_ps_table, ServiceStatus};

/// Poll interval while waiting for services to come up.
const POLL_INTERVAL: Duration = Duration::from_secs(2);

/// Driver for one deployed stack.
#[derive(Debug, Clone)]
pub struct StackDriver {
    runner: ComposeRunner,
    file: PathBuf,
    project: String,
    /// `(service, container)` pairs from the descriptor, used to read the
    /// standalone flavor's plain-text status table.
    services: Vec<(String, String)>,
}

impl StackDriver {
    /// Bind a driver to a compose file and its services.
    pub fn new(
        cli: ComposeCli,
        file: impl Into<PathBuf>,
        project: impl Into<String>,
        compose: &ComposeFile,
    ) -> Self {
        let project = project.into();
        let services = compose
            .services
            .iter()
            .map(|(name, service)| {
                (name.clone(), service.resolved_container_name(&project, name))
            })
            .collect();
        Self {
            runner: ComposeRunner::new(cli),
            file: file.into(),
            project,
            services,
        }
    }

    /// Set a time budget applied to every wrapped invocation.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.runner = self.runner.with_timeout(timeout);
        self
    }

    pub fn project(&self) -> &str {
        &self.project
    }

    /// Container name bound to a service, if the service exists.
    pub fn container_for(&self, service: &str) -> Option<&str> {
        self.services
            .iter()
            .find(|(name, _)| name == service)
            .map(|(_, container)| container.as_str())
    }

    fn invocation(&self, subcommand: &str) -> ComposeCommand {
        ComposeCommand::new(&self.file, subcommand).project(self.project.as_str())
    }

    /// Build all service images, streaming build output to the operator.
    pub async fn build(&self) -> ComposeResult<()> {
        self.runner.run_streamed(&self.invocation("build")).await
    }

    /// Start the stack detached, streaming creation output.
    pub async fn up_detached(&self) -> ComposeResult<()> {
        self.runner
            .run_streamed(&self.invocation("up").arg("-d"))
            .await
    }

    /// Stop and remove the stack, streaming teardown output.
    pub async fn down(&self) -> ComposeResult<()> {
        self.runner.run_streamed(&self.invocation("down")).await
    }

    /// Status of every container in the stack, stopped ones included.
    pub async fn ps(&self) -> ComposeResult<Vec<ServiceStatus>> {
        if self.runner.cli().flavor().supports_json_ps() {
            let output = self
                .runner
                .run(&self.invocation("ps").args(["-a", "--format", "json"]))
                .await?;
            log_runtime_chatter("ps", &output);
            parse_ps_json(&output.stdout)
        } else {
            let output = self.runner.run(&self.invocation("ps")).await?;
            log_runtime_chatter("ps", &output);
            Ok(parse_ps_table(&output.stdout, &self.services))
        }
    }

    /// Poll until every named service reports Up, or the budget lapses.
    ///
    /// # Errors
    ///
    /// Returns [`ComposeError::ServiceNotUp`] naming the first service
    /// still not up when the budget lapses.
    pub async fn await_up(
        &self,
        services: &[String],
        budget: Duration,
    ) -> ComposeResult<Vec<ServiceStatus>> {
        let deadline = Instant::now() + budget;
        loop {
            let statuses = self.ps().await?;
            let down = services.iter().find(|name| {
                !statuses
                    .iter()
                    .any(|status| status.service == **name && status.is_up())
            });
            match down {
                None => return Ok(statuses),
                Some(name) => {
                    let now = Instant::now();
                    if now >= deadline {
                        return Err(ComposeError::ServiceNotUp(name.clone()));
                    }
                    debug!(service = %name, "service not up yet, polling again");
                    tokio::time::sleep(POLL_INTERVAL.min(deadline - now)).await;
                }
            }
        }
    }

    /// Tail logs to the operator's terminal.
    pub async fn logs(&self, service: Option<&str>, tail: u32) -> ComposeResult<()> {
        let mut invocation = self
            .invocation("logs")
            .arg("--tail")
            .arg(tail.to_string());
        if let Some(service) = service {
            invocation = invocation.arg(service);
        }
        self.runner.run_streamed(&invocation).await
    }

    /// Capture recent logs, for the failure report after a bad startup.
    pub async fn logs_captured(&self, service: Option<&str>, tail: u32) -> ComposeResult<String> {
        let mut invocation = self
            .invocation("logs")
            .arg("--no-color")
            .arg("--tail")
            .arg(tail.to_string());
        if let Some(service) = service {
            invocation = invocation.arg(service);
        }
        let output = self.runner.run(&invocation).await?;
        log_runtime_chatter("logs", &output);
        Ok(output.stdout)
    }

    /// Environment listing of a running service's container, via
    /// `exec -T <service> env`.
    pub async fn service_env(&self, service: &str) -> ComposeResult<Vec<(String, String)>> {
        let output = self
            .runner
            .run(&self.invocation("exec").args(["-T", service, "env"]))
            .await?;
        log_runtime_chatter("exec", &output);
        Ok(parse_env_listing(&output.stdout))
    }
}

/// Compose writes progress and warnings to stderr even on success; keep
/// that visible at debug level.
fn log_runtime_chatter(subcommand: &str, output: &CommandOutput) {
    let chatter = output.stderr.trim_end();
    if !chatter.is_empty() {
        debug!(subcommand, stderr = %chatter, "compose wrote to stderr");
    }
}

/// Parse `env(1)` output into pairs, skipping anything that is not
/// `KEY=VALUE` (multi-line values print continuation lines without `=`).
fn parse_env_listing(raw: &str) -> Vec<(String, String)> {
    raw.lines()
        .filter_map(|line| line.split_once('='))
        .map(|(key, value)| (key.to_string(), value.to_string()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runtime::ComposeFlavor;

    fn stack_driver() -> StackDriver {
        let compose = ComposeFile::parse(
            "services:\n  api:\n    image: mpt\n    container_name: moneyprinterturbo-api\n  webui:\n    image: mpt\n",
        )
        .unwrap();
        StackDriver::new(
            ComposeCli::with_program("/usr/bin/docker", ComposeFlavor::DockerPlugin),
            "docker-compose.yml",
            "moneyprinterturbo",
            &compose,
        )
    }

    #[test]
    fn binds_container_names_from_descriptor() {
        let driver = stack_driver();
        assert_eq!(driver.container_for("api"), Some("moneyprinterturbo-api"));
        assert_eq!(
            driver.container_for("webui"),
            Some("moneyprinterturbo-webui-1")
        );
        assert_eq!(driver.container_for("ghost"), None);
    }

    #[test]
    fn env_listing_parses_pairs_and_skips_continuations() {
        let raw = "PATH=/usr/bin\nOPENAI_API_KEY=sk-test-123456\nMULTILINE first\nHOME=/root\n";
        let env = parse_env_listing(raw);
        assert_eq!(env.len(), 3);
        assert!(env
            .iter()
            .any(|(k, v)| k == "OPENAI_API_KEY" && v == "sk-test-123456"));
    }

    #[tokio::test]
    async fn await_up_surfaces_runtime_errors() {
        let compose = ComposeFile::parse("services:\n  api:\n    image: mpt\n").unwrap();
        let driver = StackDriver::new(
            ComposeCli::with_program("/nonexistent/compose-binary", ComposeFlavor::Standalone),
            "docker-compose.yml",
            "mpt",
            &compose,
        );
        let err = driver
            .await_up(&["api".to_string()], Duration::from_millis(10))
            .await
            .unwrap_err();
        // The runtime itself is unreachable, which surfaces before the poll loop retries.
        assert!(matches!(err, ComposeError::Io(_)));
    }
}
