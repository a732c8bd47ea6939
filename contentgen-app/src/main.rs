use std::process::ExitCode;

use anyhow::Context;
use clap::Parser;
use contentgen_app::cli::Cli;
use contentgen_app::{AppContext, commands, logging};
use contentgen_core::AppConfig;
use tracing::debug;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    match run(cli).await {
        Ok(code) => code,
        Err(e) => {
            eprintln!("error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> anyhow::Result<ExitCode> {
    let config = AppConfig::load(cli.config.as_deref()).context("failed to load configuration")?;
    logging::init(&config.general)?;
    debug!(provider = %config.llm.provider, templates = %config.templates.path.display(), "configuration loaded");

    let ctx = AppContext::new(config);
    commands::dispatch(cli.command, ctx).await
}
