//! arty - Artifactory CI plugin
//!
//! Runs one action (copy, delete, set-prop, upload, docker-promote) against
//! JFrog Artifactory and exits non-zero when it fails.

mod cli;
mod output;
mod secrets;

use std::process::ExitCode;

use anyhow::{Context, Result};
use arty_actions::Plugin;
use clap::Parser;
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use cli::Cli;
use secrets::SecretSources;

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    // Initialize rustls crypto provider (required for rustls 0.23+)
    let _ = rustls::crypto::aws_lc_rs::default_provider().install_default();

    let cli = Cli::parse();
    init_tracing(&cli.connection.log_level);

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            output::error(&format!("{:#}", err));
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<()> {
    info!(version = env!("CARGO_PKG_VERSION"), "Artifactory plugin");

    let config = cli.config(&SecretSources::new());
    let mut plugin = Plugin::new(config, cli.actions());

    plugin.validate().context("invalid plugin configuration")?;

    let action = plugin.config().action.clone();
    plugin
        .exec()
        .await
        .with_context(|| format!("{} action failed", action))?;

    output::success(&format!("{} action completed", action));
    Ok(())
}

/// Initialize tracing on stderr from the configured level
fn init_tracing(level: &str) {
    let filter = EnvFilter::try_new(level).unwrap_or_else(|_| {
        output::warning(&format!("invalid log level '{}', using info", level));
        EnvFilter::new("info")
    });

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
        .with(filter)
        .init();
}
