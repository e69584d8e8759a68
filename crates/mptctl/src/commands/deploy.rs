//! `deploy`: build, start, and verify the stack.
//!
//! The pipeline runs the same steps an operator would by hand: runtime
//! pre-flight, env file bootstrap and credential validation, descriptor
//! validation, image build, detached start, startup polling, an
//! in-container credential spot-check, and finally the access URLs.
//! Every failing step stops the run with instructions; variables merely
//! absent from the env file only warn, since the application can fall
//! back to its settings file.

use std::process::ExitCode;
use std::time::Duration;

use mpt_compose::{ComposeCli, ComposeFile, StackDriver};
use mpt_config::{Bootstrap, EnvFile, Provider, ENV_TEMPLATE};

use super::Context;

/// Log lines shown per container when startup verification fails.
const FAILURE_LOG_TAIL: u32 = 50;

/// Conventional service names in the stack descriptor.
const WEBUI_SERVICE: &str = "webui";
const API_SERVICE: &str = "api";

pub async fn run(ctx: &Context, wait_secs: u64, no_build: bool) -> anyhow::Result<ExitCode> {
    let console = &ctx.console;
    console.heading("Deploying MoneyPrinterTurbo");

    // Runtime pre-flight.
    let cli = match ComposeCli::detect().await {
        Ok(cli) => {
            console.ok(&format!(
                "container runtime: {} ({})",
                cli.program().display(),
                cli.flavor()
            ));
            cli
        }
        Err(err) => {
            console.fail(&err.to_string());
            console.line("Install Docker Desktop (or the docker-compose binary) and re-run.");
            return Ok(ExitCode::FAILURE);
        }
    };

    // Env file bootstrap. A freshly created file only holds template
    // placeholders, so the run stops for the operator to fill it in.
    let template = ctx.stack_dir.join(ENV_TEMPLATE);
    match EnvFile::bootstrap(&ctx.env_path, &template) {
        Ok(Bootstrap::Existing) => {}
        Ok(Bootstrap::Created) => {
            console.warn(&format!(
                "created {} from {ENV_TEMPLATE}",
                ctx.env_path.display()
            ));
            console.line("Edit it, set your API keys, then re-run deploy:");
            for provider in Provider::ALL {
                console.line(&format!("  {}", provider.env_var()));
            }
            return Ok(ExitCode::FAILURE);
        }
        Err(err) => {
            console.fail(&err.to_string());
            return Ok(ExitCode::FAILURE);
        }
    }

    let env_file = EnvFile::load(&ctx.env_path)?;
    let required: Vec<&'static str> = Provider::ALL.iter().map(Provider::env_var).collect();

    match env_gate(&env_file, &required) {
        EnvGate::Blocked(placeholders) => {
            console.fail("env file still contains template placeholders:");
            for var in &placeholders {
                console.line(&format!("  {var}"));
            }
            console.line(&format!(
                "Edit {} and set real API keys.",
                ctx.env_path.display()
            ));
            return Ok(ExitCode::FAILURE);
        }
        EnvGate::Degraded(missing) => {
            // Not fatal: the application can fall back to config.toml.
            for var in &missing {
                console.warn(&format!("{var} not set in {}", ctx.env_path.display()));
            }
        }
        EnvGate::Ready => console.ok("env file: credentials present"),
    }

    // Descriptor validation.
    let compose = ComposeFile::load(&ctx.compose_path)?;
    if let Err(err) = compose.validate(&ctx.stack_dir) {
        console.fail(&err.to_string());
        return Ok(ExitCode::FAILURE);
    }
    console.ok(&format!(
        "descriptor: {} ({} services)",
        ctx.compose_path.display(),
        compose.services.len()
    ));

    let project = ctx.project_name(&compose);
    let driver = StackDriver::new(cli, &ctx.compose_path, project, &compose);

    // Build and start.
    if no_build {
        console.step("skipping image build");
    } else {
        console.step("building images");
        if let Err(err) = driver.build().await {
            console.fail(&err.to_string());
            return Ok(ExitCode::FAILURE);
        }
    }
    console.step("starting services");
    if let Err(err) = driver.up_detached().await {
        console.fail(&err.to_string());
        return Ok(ExitCode::FAILURE);
    }

    // Startup verification.
    console.step(&format!("waiting up to {wait_secs}s for services"));
    let service_names = compose.service_names();
    match driver
        .await_up(&service_names, Duration::from_secs(wait_secs))
        .await
    {
        Ok(statuses) => {
            for status in &statuses {
                console.ok(&format!(
                    "{} ({}): {}",
                    status.service, status.container, status.detail
                ));
            }
        }
        Err(err) => {
            console.fail(&err.to_string());
            if let Some(stderr) = err.captured_stderr() {
                for line in stderr.lines() {
                    console.line(line);
                }
            }
            console.line("Recent logs:");
            if let Ok(logs) = driver.logs_captured(None, FAILURE_LOG_TAIL).await {
                for line in logs.lines() {
                    console.line(line);
                }
            }
            return Ok(ExitCode::FAILURE);
        }
    }

    // Credential spot-check inside each container. Warnings only; the
    // stack is already up and the operator may be injecting keys another
    // way.
    for service in &service_names {
        match driver.service_env(service).await {
            Ok(env) => {
                let absent: Vec<&str> = required
                    .iter()
                    .copied()
                    .filter(|var| !env.iter().any(|(key, _)| key == var))
                    .collect();
                if absent.is_empty() {
                    console.ok(&format!("{service}: credentials visible in container"));
                } else {
                    for var in absent {
                        console.warn(&format!("{service}: {var} not in container environment"));
                    }
                }
            }
            Err(err) => {
                console.warn(&format!("{service}: could not inspect environment: {err}"));
            }
        }
    }

    console.heading("Stack is up");
    for (label, url) in access_urls(&compose) {
        console.line(&format!("{label:<9} {url}"));
    }
    Ok(ExitCode::SUCCESS)
}

/// Verdict on the env file's credential variables.
///
/// Surviving template placeholders block the deployment. Variables merely
/// absent only degrade it: the containers resolve keys from config.toml
/// as fallback, so the run continues with warnings.
#[derive(Debug, PartialEq, Eq)]
enum EnvGate {
    Blocked(Vec<&'static str>),
    Degraded(Vec<&'static str>),
    Ready,
}

fn env_gate(env_file: &EnvFile, required: &[&'static str]) -> EnvGate {
    let placeholders = env_file.placeholders(required.iter().copied());
    if !placeholders.is_empty() {
        return EnvGate::Blocked(placeholders);
    }
    let missing = env_file.missing(required.iter().copied());
    if missing.is_empty() {
        EnvGate::Ready
    } else {
        EnvGate::Degraded(missing)
    }
}

/// Access URLs for the operator report, derived from published ports.
fn access_urls(compose: &ComposeFile) -> Vec<(String, String)> {
    let mut urls = Vec::new();
    if let Ok(Some(url)) = compose.service_url(WEBUI_SERVICE) {
        urls.push(("Web UI:".to_string(), url.to_string()));
    }
    if let Ok(Some(url)) = compose.service_url(API_SERVICE) {
        urls.push(("API:".to_string(), url.to_string()));
        if let Ok(docs) = url.join("docs") {
            urls.push(("API docs:".to_string(), docs.to_string()));
        }
    }
    // Anything published outside the conventional pair still gets listed.
    for (name, service) in &compose.services {
        if name == WEBUI_SERVICE || name == API_SERVICE {
            continue;
        }
        if let Some(port) = service.published_port() {
            urls.push((format!("{name}:"), format!("http://localhost:{port}/")));
        }
    }
    urls
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn access_urls_cover_both_conventional_services() {
        let compose = ComposeFile::parse(
            "services:\n  webui:\n    image: mpt\n    ports: [\"8501:8501\"]\n  api:\n    image: mpt\n    ports: [\"8080:8080\"]\n",
        )
        .unwrap();
        let urls = access_urls(&compose);
        assert_eq!(
            urls,
            [
                ("Web UI:".to_string(), "http://localhost:8501/".to_string()),
                ("API:".to_string(), "http://localhost:8080/".to_string()),
                ("API docs:".to_string(), "http://localhost:8080/docs".to_string()),
            ]
        );
    }

    #[test]
    fn access_urls_skip_unpublished_services() {
        let compose = ComposeFile::parse(
            "services:\n  api:\n    image: mpt\n  worker:\n    image: mpt\n",
        )
        .unwrap();
        assert!(access_urls(&compose).is_empty());
    }

    #[test]
    fn access_urls_list_extra_published_services() {
        let compose = ComposeFile::parse(
            "services:\n  api:\n    image: mpt\n    ports: [\"8080:8080\"]\n  redis:\n    image: redis\n    ports: [\"6379:6379\"]\n",
        )
        .unwrap();
        let urls = access_urls(&compose);
        assert!(urls
            .iter()
            .any(|(label, url)| label == "redis:" && url == "http://localhost:6379/"));
    }

    fn env_fixture(contents: &str) -> (tempfile::TempDir, EnvFile) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(".env");
        std::fs::write(&path, contents).unwrap();
        let env_file = EnvFile::load(&path).unwrap();
        (dir, env_file)
    }

    #[test]
    fn gate_blocks_on_surviving_placeholders() {
        let (_dir, env_file) = env_fixture(
            "PEXELS_API_KEYS=your_pexels_api_key_here\n\
             PIXABAY_API_KEYS=real-key-123456\n\
             OPENAI_API_KEY=sk-real-123456\n",
        );
        let required: Vec<&'static str> = Provider::ALL.iter().map(Provider::env_var).collect();
        assert_eq!(
            env_gate(&env_file, &required),
            EnvGate::Blocked(vec!["PEXELS_API_KEYS"])
        );
    }

    #[test]
    fn gate_only_degrades_on_missing_values() {
        // Absent variables warn but do not block: config.toml can still
        // supply them inside the containers.
        let (_dir, env_file) = env_fixture("PEXELS_API_KEYS=real-key-123456\n");
        let required = [Provider::Pexels.env_var(), Provider::OpenAi.env_var()];
        assert_eq!(
            env_gate(&env_file, &required),
            EnvGate::Degraded(vec!["OPENAI_API_KEY"])
        );
    }

    #[test]
    fn gate_passes_fully_populated_env_file() {
        let (_dir, env_file) = env_fixture(
            "PEXELS_API_KEYS=real-key-123456\n\
             PIXABAY_API_KEYS=real-key-234567\n\
             OPENAI_API_KEY=sk-real-345678\n",
        );
        let required: Vec<&'static str> = Provider::ALL.iter().map(Provider::env_var).collect();
        assert_eq!(env_gate(&env_file, &required), EnvGate::Ready);
    }

    #[test]
    fn gate_reports_placeholders_before_missing() {
        // A file both incomplete and placeholder-ridden blocks outright.
        let (_dir, env_file) = env_fixture("PEXELS_API_KEYS=your_pexels_api_key_here\n");
        let required = [Provider::Pexels.env_var(), Provider::OpenAi.env_var()];
        assert_eq!(
            env_gate(&env_file, &required),
            EnvGate::Blocked(vec!["PEXELS_API_KEYS"])
        );
    }
}
