//! `logs`: tail service logs.

use std::process::ExitCode;

use super::Context;

pub async fn run(ctx: &Context, service: Option<&str>, tail: u32) -> anyhow::Result<ExitCode> {
    let (compose, driver) = ctx.driver().await?;
    if let Some(name) = service {
        // Validate the name before handing it to the runtime.
        compose.service(name)?;
    }
    driver.logs(service, tail).await?;
    Ok(ExitCode::SUCCESS)
}
