//! `status`: render service status.

use std::process::ExitCode;

use super::Context;

pub async fn run(ctx: &Context) -> anyhow::Result<ExitCode> {
    let (_, driver) = ctx.driver().await?;
    let statuses = driver.ps().await?;
    if statuses.is_empty() {
        ctx.console.warn("no containers found (is the stack up?)");
        return Ok(ExitCode::SUCCESS);
    }

    let service_width = statuses.iter().map(|s| s.service.len()).max().unwrap_or(0);
    let container_width = statuses
        .iter()
        .map(|s| s.container.len())
        .max()
        .unwrap_or(0);
    for status in &statuses {
        let line = format!(
            "{:<service_width$}  {:<container_width$}  [{}] {}",
            status.service,
            status.container,
            ctx.console.state(&status.state),
            status.detail
        );
        if status.is_up() {
            ctx.console.ok(&line);
        } else {
            ctx.console.warn(&line);
        }
    }
    Ok(ExitCode::SUCCESS)
}
