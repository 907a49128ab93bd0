//! Miniflux Indexer
//!
//! Entry point for the long-running indexer. Keeps the search vectors of
//! miniflux entries up to date until interrupted.

use std::process::ExitCode;

use clap::Parser;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

use miniflux_indexer::signal::cancel_on_shutdown_signal;
use miniflux_indexer::{build_info, logging, Cli, Command, Dependencies, IndexingError, StartArgs};
use miniflux_indexer_shared::BuildInfo;

#[tokio::main]
async fn main() -> ExitCode {
    // A missing .env file is fine
    dotenv::dotenv().ok();

    let cli = Cli::parse();
    let build_info = build_info::current("miniflux-indexer");

    if cli.version {
        println!("{build_info}");
        return ExitCode::SUCCESS;
    }

    if let Err(e) = logging::init(cli.log_level, cli.log_format, &build_info) {
        eprintln!("{e}");
        return ExitCode::FAILURE;
    }

    let result = match cli.command {
        Some(Command::Start(args)) => start(args, build_info).await,
        None => Err(IndexingError::config(
            "no command given, run `miniflux-indexer start`",
        )),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(error = %e, "Indexer stopped with an error");
            ExitCode::FAILURE
        }
    }
}

async fn start(args: StartArgs, build_info: BuildInfo) -> Result<(), IndexingError> {
    info!(
        version = %build_info.version,
        commit_id = build_info.commit_id.as_deref().unwrap_or("unknown"),
        environment = %build_info.environment,
        "Starting miniflux indexer"
    );

    let cancel = CancellationToken::new();
    tokio::spawn(cancel_on_shutdown_signal(cancel.clone()));

    let dependencies = Dependencies::new(&args, build_info).await?;
    let result = dependencies.orchestrator.run(cancel).await;
    dependencies.close().await;
    result?;

    info!("Miniflux indexer stopped");
    Ok(())
}
