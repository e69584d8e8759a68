//! Command-line interface definitions.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Deploy and verify the MoneyPrinterTurbo container stack.
#[derive(Parser, Debug)]
#[command(name = "mptctl", version, about, long_about = None)]
pub struct Args {
    /// Stack directory (where the compose file and env file live)
    #[arg(short = 'C', long, visible_alias = "directory")]
    pub chdir: Option<PathBuf>,

    /// Compose file, relative to the stack directory
    #[arg(short = 'f', long, default_value = "docker-compose.yml")]
    pub file: PathBuf,

    /// Env file consumed by the stack, relative to the stack directory
    #[arg(long, default_value = ".env")]
    pub env_file: PathBuf,

    /// Compose project name (defaults to the descriptor's name, then the
    /// stack directory name)
    #[arg(short = 'p', long)]
    pub project: Option<String>,

    /// Enable debug logging
    #[arg(short = 'd', long)]
    pub debug: bool,

    /// Enable verbose (trace-level) logging
    #[arg(short = 'v', long)]
    pub verbose: bool,

    /// Disable colored output
    #[arg(long)]
    pub no_color: bool,

    #[command(subcommand)]
    pub command: Cmd,
}

/// Operator commands.
#[derive(Subcommand, Debug)]
pub enum Cmd {
    /// Build, start, and verify the stack
    Deploy {
        /// Seconds to wait for services to report Up
        #[arg(long, default_value_t = 10)]
        wait_secs: u64,

        /// Skip the image build step
        #[arg(long)]
        no_build: bool,
    },
    /// Pre-flight checks: runtime, env file, credentials, descriptor
    Check,
    /// Show service status
    Status,
    /// Tail service logs
    Logs {
        /// Limit output to one service
        service: Option<String>,

        /// Number of trailing lines per container
        #[arg(long, default_value_t = 100)]
        tail: u32,
    },
    /// Stop and remove the stack
    Down,
}
