//! Command implementations.

pub mod check;
pub mod deploy;
pub mod down;
pub mod logs;
pub mod status;

use std::path::PathBuf;

use mpt_compose::{ComposeCli, ComposeFile, StackDriver};

use crate::cli::Args;
use crate::console::Console;

/// Resolved invocation context shared by every command.
#[derive(Debug)]
pub struct Context {
    /// Stack root: where the compose file, env file, and settings live.
    pub stack_dir: PathBuf,
    /// Compose file path.
    pub compose_path: PathBuf,
    /// Env file path.
    pub env_path: PathBuf,
    /// Explicit project name override.
    pub project: Option<String>,
    /// Console renderer.
    pub console: Console,
}

impl Context {
    pub fn from_args(args: &Args) -> anyhow::Result<Self> {
        let stack_dir = match &args.chdir {
            Some(dir) => dir.clone(),
            None => std::env::current_dir()?,
        };
        Ok(Self {
            compose_path: stack_dir.join(&args.file),
            env_path: stack_dir.join(&args.env_file),
            project: args.project.clone(),
            console: Console::new(args.no_color),
            stack_dir,
        })
    }

    /// Project name: the `-p` override, the descriptor's `name:` key, or
    /// the stack directory name.
    pub fn project_name(&self, compose: &ComposeFile) -> String {
        self.project
            .clone()
            .unwrap_or_else(|| compose.project_name(&self.stack_dir))
    }

    /// Load the descriptor and bind a driver to it.
    pub async fn driver(&self) -> anyhow::Result<(ComposeFile, StackDriver)> {
        let cli = ComposeCli::detect().await?;
        let compose = ComposeFile::load(&self.compose_path)?;
        let project = self.project_name(&compose);
        let driver = StackDriver::new(cli, &self.compose_path, project, &compose);
        Ok((compose, driver))
    }
}
