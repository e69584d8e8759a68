//! Deployment CLI binary.

use std::process::ExitCode;

use clap::Parser;

use mptctl::Args;

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();
    match mptctl::run(args).await {
        Ok(code) => code,
        Err(err) => {
            eprintln!("error: {err:#}");
            ExitCode::FAILURE
        }
    }
}
