//! `gitwatch <directory> [--delayed]`

mod args;

use anyhow::Result;
use clap::CommandFactory;
use gitwatch_autocommit::GitWatch;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use crate::args::Cli;

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();

    let Some(config) = Cli::parse_args().into_config() else {
        Cli::command().print_help()?;
        return Ok(());
    };

    if !config.directory.path.is_dir() {
        error!("The provided path is not a directory.");
        return Ok(());
    }

    let watch = GitWatch::new(config)?;

    let shutdown = CancellationToken::new();
    let on_signal = shutdown.clone();
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => on_signal.cancel(),
            Err(e) => error!("Failed to listen for Ctrl-C: {e}"),
        }
    });

    let exit = watch.run(shutdown).await?;
    info!("Stopped: {exit:?}");
    Ok(())
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}
