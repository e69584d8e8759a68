//! Operator CLI for the MoneyPrinterTurbo container stack.
//!
//! Replaces the hand-run deploy ritual: pre-flight checks, env file
//! bootstrap, credential validation, image build, detached startup, status
//! verification, an in-container credential spot-check, and the access URL
//! report.

pub mod cli;
pub mod commands;
pub mod console;

pub use cli::{Args, Cmd};

use std::process::ExitCode;

use tracing::debug;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

/// Initialize tracing and dispatch the selected command.
pub async fn run(args: Args) -> anyhow::Result<ExitCode> {
    dotenvy::dotenv().ok();
    init_tracing(&args);
    debug!(command = ?args.command, "dispatching");

    let ctx = commands::Context::from_args(&args)?;
    match &args.command {
        Cmd::Deploy { wait_secs, no_build } => {
            commands::deploy::run(&ctx, *wait_secs, *no_build).await
        }
        Cmd::Check => commands::check::run(&ctx).await,
        Cmd::Status => commands::status::run(&ctx).await,
        Cmd::Logs { service, tail } => {
            commands::logs::run(&ctx, service.as_deref(), *tail).await
        }
        Cmd::Down => commands::down::run(&ctx).await,
    }
}

/// Diagnostics go to stderr so the console report on stdout stays clean.
/// `RUST_LOG` wins over the `-d`/`-v` flags; `LOG_FORMAT=json` switches to
/// structured output.
fn init_tracing(args: &Args) {
    let default_level = if args.verbose {
        "trace"
    } else if args.debug {
        "debug"
    } else {
        "warn"
    };
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_level));

    let use_json = std::env::var("LOG_FORMAT")
        .map(|v| v.eq_ignore_ascii_case("json"))
        .unwrap_or(false);

    if use_json {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_writer(std::io::stderr),
            )
            .init();
    } else {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(
                tracing_subscriber::fmt::layer()
                    .with_target(true)
                    .with_ansi(!args.no_color)
                    .with_writer(std::io::stderr),
            )
            .init();
    }
}
