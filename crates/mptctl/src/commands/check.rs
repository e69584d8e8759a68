//! `check`: pre-flight verification without touching the stack.
//!
//! Reports the container runtime, the env file, the settings file, each
//! provider's resolved credentials (masked), and the descriptor. Exits
//! non-zero when anything the deploy flow would abort on is broken.

use std::process::ExitCode;

use mpt_compose::{ComposeCli, ComposeFile};
use mpt_config::{CredentialSet, EnvFile, Provider, Settings};

use super::Context;

pub async fn run(ctx: &Context) -> anyhow::Result<ExitCode> {
    let console = &ctx.console;
    let mut failed = false;

    console.heading("Environment check");

    // Container runtime.
    match ComposeCli::detect().await {
        Ok(cli) => console.ok(&format!(
            "container runtime: {} ({})",
            cli.program().display(),
            cli.flavor()
        )),
        Err(err) => {
            console.fail(&err.to_string());
            failed = true;
        }
    }

    // Env file. A missing file is only a warning: keys may come from the
    // process environment instead.
    let env_file = match EnvFile::load(&ctx.env_path) {
        Ok(env_file) => {
            console.ok(&format!("env file: {}", ctx.env_path.display()));
            Some(env_file)
        }
        Err(err) => {
            console.warn(&format!("env file: {err}"));
            None
        }
    };
    if let Some(env_file) = &env_file {
        let required = Provider::ALL.iter().map(Provider::env_var);
        for var in env_file.placeholders(required) {
            console.fail(&format!(
                "{var}: template placeholder in {}",
                ctx.env_path.display()
            ));
            failed = true;
        }
    }

    // Settings file, optional with defaults.
    let settings = match Settings::load(&ctx.stack_dir) {
        Ok(settings) => {
            console.ok(&format!(
                "settings: {} v{} (listen {}:{})",
                settings.project_name,
                settings.project_version,
                settings.listen_host,
                settings.listen_port
            ));
            settings
        }
        Err(err) => {
            console.warn(&format!("settings: {err}; using defaults"));
            Settings::default()
        }
    };

    // Credentials, environment over settings. The env file is loaded into
    // the process environment first, without overriding variables the
    // operator exported directly.
    let _ = dotenvy::from_path(&ctx.env_path);
    for provider in Provider::ALL {
        let var = provider.env_var();
        match CredentialSet::resolve(provider, &settings) {
            Ok(Some(set)) => console.ok(&format!(
                "{var}: {} [{}]",
                set.masked_summary(),
                set.source()
            )),
            Ok(None) => {
                console.fail(&format!("{var}: not set"));
                failed = true;
            }
            Err(err) => {
                console.fail(&err.to_string());
                failed = true;
            }
        }
    }

    // Descriptor.
    match ComposeFile::load(&ctx.compose_path)
        .and_then(|compose| compose.validate(&ctx.stack_dir).map(|()| compose))
    {
        Ok(compose) => console.ok(&format!(
            "descriptor: {} services ({})",
            compose.services.len(),
            compose.service_names().join(", ")
        )),
        Err(err) => {
            console.fail(&format!("descriptor: {err}"));
            failed = true;
        }
    }

    Ok(if failed {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    })
}
