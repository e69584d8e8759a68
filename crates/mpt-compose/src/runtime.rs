//! Container runtime discovery and invocation.
//!
//! Locates a compose-capable runtime on PATH (the `docker compose` plugin
//! preferred, standalone `docker-compose` as fallback), builds invocations
//! through a typed builder, and runs them with captured or inherited output.

use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;

use tokio::process::Command;
use tracing::{debug, warn};

use crate::error::{ComposeError, ComposeResult};

/// How the compose CLI is spelled on this host.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ComposeFlavor {
    /// `docker compose` (v2 plugin).
    DockerPlugin,
    /// Standalone `docker-compose` (v1).
    Standalone,
}

impl ComposeFlavor {
    /// Whether `ps --format json` is available.
    pub fn supports_json_ps(&self) -> bool {
        matches!(self, ComposeFlavor::DockerPlugin)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ComposeFlavor::DockerPlugin => "docker compose plugin",
            ComposeFlavor::Standalone => "docker-compose",
        }
    }
}

impl std::fmt::Display for ComposeFlavor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A located container runtime.
#[derive(Debug, Clone)]
pub struct ComposeCli {
    program: PathBuf,
    flavor: ComposeFlavor,
}

impl ComposeCli {
    /// Locate a usable compose runtime on PATH.
    ///
    /// The plugin is probed with `docker compose version` because a bare
    /// `docker` install does not imply the plugin is present.
    ///
    /// # Errors
    ///
    /// Returns [`ComposeError::RuntimeNotFound`] when neither flavor works.
    pub async fn detect() -> ComposeResult<Self> {
        if let Ok(docker) = which::which("docker") {
            if plugin_responds(&docker).await {
                debug!(program = %docker.display(), "using docker compose plugin");
                return Ok(Self {
                    program: docker,
                    flavor: ComposeFlavor::DockerPlugin,
                });
            }
            warn!("docker found but the compose plugin did not respond");
        }
        if let Ok(standalone) = which::which("docker-compose") {
            debug!(program = %standalone.display(), "using standalone docker-compose");
            return Ok(Self {
                program: standalone,
                flavor: ComposeFlavor::Standalone,
            });
        }
        Err(ComposeError::RuntimeNotFound)
    }

    /// Construct with an explicit program and flavor.
    pub fn with_program(program: impl Into<PathBuf>, flavor: ComposeFlavor) -> Self {
        Self {
            program: program.into(),
            flavor,
        }
    }

    pub fn program(&self) -> &Path {
        &self.program
    }

    pub fn flavor(&self) -> ComposeFlavor {
        self.flavor
    }

    /// Leading argv before the compose arguments: `compose` for the plugin,
    /// nothing for the standalone binary.
    fn prefix(&self) -> &'static [&'static str] {
        match self.flavor {
            ComposeFlavor::DockerPlugin => &["compose"],
            ComposeFlavor::Standalone => &[],
        }
    }
}

async fn plugin_responds(docker: &Path) -> bool {
    Command::new(docker)
        .args(["compose", "version"])
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .await
        .map(|status| status.success())
        .unwrap_or(false)
}

/// Builder for one compose invocation.
#[derive(Debug, Clone)]
pub struct ComposeCommand {
    file: PathBuf,
    project: Option<String>,
    subcommand: String,
    args: Vec<String>,
}

impl ComposeCommand {
    pub fn new(file: impl Into<PathBuf>, subcommand: impl Into<String>) -> Self {
        Self {
            file: file.into(),
            project: None,
            subcommand: subcommand.into(),
            args: Vec::new(),
        }
    }

    /// Set the project name (`-p`).
    pub fn project(mut self, name: impl Into<String>) -> Self {
        self.project = Some(name.into());
        self
    }

    /// Append one argument after the subcommand.
    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    /// Append several arguments after the subcommand.
    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    pub fn subcommand(&self) -> &str {
        &self.subcommand
    }

    /// Final argv, excluding the program and flavor prefix.
    pub fn build_args(&self) -> Vec<String> {
        let mut args = vec!["-f".to_string(), self.file.to_string_lossy().into_owned()];
        if let Some(project) = &self.project {
            args.push("-p".to_string());
            args.push(project.clone());
        }
        args.push(self.subcommand.clone());
        args.extend(self.args.iter().cloned());
        args
    }
}

/// Captured output of one invocation.
#[derive(Debug, Clone)]
pub struct CommandOutput {
    pub stdout: String,
    pub stderr: String,
}

/// Runs compose invocations against a located runtime.
#[derive(Debug, Clone)]
pub struct ComposeRunner {
    cli: ComposeCli,
    timeout: Option<Duration>,
}

impl ComposeRunner {
    pub fn new(cli: ComposeCli) -> Self {
        Self { cli, timeout: None }
    }

    /// Set a time budget; a child still running at expiry is killed.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn cli(&self) -> &ComposeCli {
        &self.cli
    }

    fn command(&self, invocation: &ComposeCommand) -> Command {
        let mut command = Command::new(self.cli.program());
        command.args(self.cli.prefix());
        command.args(invocation.build_args());
        // kill_on_drop so a timed-out child does not outlive the call
        command.kill_on_drop(true);
        command
    }

    /// Run with captured output. Non-zero exit is an error carrying the
    /// captured stderr.
    pub async fn run(&self, invocation: &ComposeCommand) -> ComposeResult<CommandOutput> {
        let mut command = self.command(invocation);
        command
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        debug!(subcommand = invocation.subcommand(), "running compose command");

        let output = match self.timeout {
            Some(budget) => tokio::time::timeout(budget, command.output())
                .await
                .map_err(|_| ComposeError::Timeout(budget.as_secs()))??,
            None => command.output().await?,
        };

        let stdout = String::from_utf8_lossy(&output.stdout).into_owned();
        let stderr = String::from_utf8_lossy(&output.stderr).into_owned();
        if !output.status.success() {
            return Err(ComposeError::command_failed(
                format!(
                    "compose {} exited with non-zero status",
                    invocation.subcommand()
                ),
                Some(stderr),
                output.status.code(),
            ));
        }
        Ok(CommandOutput { stdout, stderr })
    }

    /// Run with inherited stdio for operator-facing phases such as builds
    /// and log tailing.
    pub async fn run_streamed(&self, invocation: &ComposeCommand) -> ComposeResult<()> {
        let mut command = self.command(invocation);
        command
            .stdin(Stdio::null())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit());
        debug!(subcommand = invocation.subcommand(), "streaming compose command");

        let status = match self.timeout {
            Some(budget) => tokio::time::timeout(budget, command.status())
                .await
                .map_err(|_| ComposeError::Timeout(budget.as_secs()))??,
            None => command.status().await?,
        };

        if !status.success() {
            return Err(ComposeError::command_failed(
                format!(
                    "compose {} exited with non-zero status",
                    invocation.subcommand()
                ),
                None,
                status.code(),
            ));
        }
        Ok(())
    }
}
