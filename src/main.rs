mod cli;
mod commands;
mod error;
mod records;

use crate::cli::{Cli, Command};
use crate::error::{ErrorKind, Result};
use clap::Parser;
use exn::ResultExt;
use mapgen_config::Config;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.log_level());
    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("Error: {err:?}");
            ExitCode::FAILURE
        },
    }
}

/// Logs go to stderr so `inspect` and friends can be piped.
fn init_tracing(level: Option<&str>) {
    let filter = match level {
        Some(level) => EnvFilter::new(level),
        None => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
    };
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

async fn run(cli: Cli) -> Result<()> {
    let load = || {
        let config = Config::load(cli.config.as_deref()).or_raise(|| ErrorKind::Config)?;
        tracing::debug!(?config, "Loaded configuration");
        Ok::<_, error::Error>(config)
    };
    match cli.command {
        Command::Generate { input, no_index, ping } => {
            commands::generate(&load()?, input.as_deref(), !no_index, ping).await
        },
        Command::Index { ping } => commands::index(&load()?, ping).await,
        Command::Ping { index_url } => commands::ping(&load()?, index_url).await,
        // Works on any file, no configuration needed.
        Command::Inspect { file } => commands::inspect(&file).await,
    }
}
