mod app;
mod cli;
mod commands;

#[cfg(test)]
mod tests;

use std::process::ExitCode;

use anyhow::Result;
use clap::Parser;
use scout_types::config::ScoutConfig;
use tracing_subscriber::EnvFilter;

use crate::app::ScoutApp;
use crate::cli::Cli;

fn main() -> Result<ExitCode> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = cli.resolve_config()?;

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;
    runtime.block_on(run(cli, config))
}

async fn run(cli: Cli, config: ScoutConfig) -> Result<ExitCode> {
    let mut app = ScoutApp::new(config).await?;
    if cli.validate {
        let ok = app.validate_credentials().await;
        return Ok(if ok { ExitCode::SUCCESS } else { ExitCode::FAILURE });
    }
    app.open_session(cli.session.as_deref()).await?;
    app.run().await?;
    Ok(ExitCode::SUCCESS)
}
