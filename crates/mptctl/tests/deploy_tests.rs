//! Deployment pre-flight integration tests.
//!
//! These exercise the full pre-flight path (env file bootstrap, credential
//! checks, descriptor validation, settings fallback) against a throwaway
//! stack directory. Tests that need a live container runtime are ignored
//! by default.

use std::fs;

use tempfile::TempDir;

use mpt_compose::{ComposeCli, ComposeFile};
use mpt_config::{Bootstrap, CredentialSet, EnvFile, Provider, Settings};

/// Lay out a minimal stack directory: descriptor, env template, settings
/// template.
fn stack_fixture() -> TempDir {
    let dir = TempDir::new().unwrap();
    fs::write(
        dir.path().join("docker-compose.yml"),
        r#"services:
  webui:
    build: .
    container_name: moneyprinterturbo-webui
    ports:
      - "8501:8501"
    env_file:
      - .env
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
"#,
    )
    .unwrap();
    fs::write(
        dir.path().join("env.example"),
        "PEXELS_API_KEYS=your_pexels_api_key_here\n\
         PIXABAY_API_KEYS=your_pixabay_api_key_here\n\
         OPENAI_API_KEY=your_openai_api_key_here\n",
    )
    .unwrap();
    fs::write(
        dir.path().join("config.example.toml"),
        "listen_port = 8080\n\n[app]\npexels_api_keys = []\n",
    )
    .unwrap();
    dir
}

/// First run: the env file is created from the template and still holds
/// placeholders, so deployment must not proceed.
#[test]
fn first_run_bootstraps_env_file_and_blocks_on_placeholders() {
    let dir = stack_fixture();
    let env_path = dir.path().join(".env");

    let outcome = EnvFile::bootstrap(&env_path, dir.path().join("env.example")).unwrap();
    assert_eq!(outcome, Bootstrap::Created);

    let env_file = EnvFile::load(&env_path).unwrap();
    let required: Vec<&str> = Provider::ALL.iter().map(Provider::env_var).collect();
    let flagged = env_file.placeholders(required.iter().copied());
    assert_eq!(flagged.len(), 3);
}

/// Second run with real keys: placeholders gone, the descriptor validates,
/// and the access ports resolve.
#[test]
fn edited_env_file_passes_pre_flight() {
    let dir = stack_fixture();
    let env_path = dir.path().join(".env");
    fs::write(
        &env_path,
        "PEXELS_API_KEYS=pexels-key-111111,pexels-key-222222\n\
         PIXABAY_API_KEYS=pixabay-key-333333\n\
         OPENAI_API_KEY=sk-openai-444444\n",
    )
    .unwrap();

    let env_file = EnvFile::load(&env_path).unwrap();
    let required: Vec<&str> = Provider::ALL.iter().map(Provider::env_var).collect();
    assert!(env_file.placeholders(required.iter().copied()).is_empty());
    assert!(env_file.missing(required.iter().copied()).is_empty());

    let compose = ComposeFile::load(dir.path().join("docker-compose.yml")).unwrap();
    compose.validate(dir.path()).unwrap();
    assert_eq!(
        compose.service("webui").unwrap().published_port(),
        Some(8501)
    );
    assert_eq!(compose.service("api").unwrap().published_port(), Some(8080));
}

/// The settings file supplies key material when the environment does not.
#[test]
fn settings_fallback_supplies_credentials() {
    let dir = stack_fixture();
    fs::write(
        dir.path().join("config.toml"),
        "[app]\npexels_api_keys = [\"file-key-111111\", \"file-key-222222\"]\n",
    )
    .unwrap();

    let settings = Settings::load(dir.path()).unwrap();
    let material = settings.key_material(Provider::Pexels).unwrap();
    let set = CredentialSet::from_settings(Provider::Pexels, &material).unwrap();
    assert_eq!(set.len(), 2);
    // Only the masked form ever reaches the console.
    assert!(!set.masked_summary().contains("file-key-111111"));
}

/// Live runtime detection.
#[tokio::test]
#[ignore = "requires docker or docker-compose on PATH"]
async fn detects_container_runtime() {
    let cli = ComposeCli::detect().await.unwrap();
    println!("runtime: {} ({})", cli.program().display(), cli.flavor());
}
