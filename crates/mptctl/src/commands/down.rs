//! `down`: stop and remove the stack.

use std::process::ExitCode;

use super::Context;

pub async fn run(ctx: &Context) -> anyhow::Result<ExitCode> {
    let (_, driver) = ctx.driver().await?;
    ctx.console.step("stopping the stack");
    driver.down().await?;
    ctx.console.ok("stack removed");
    Ok(ExitCode::SUCCESS)
}
