//! Miniflux Entry Loader
//!
//! Bulk-loads newline-delimited JSON entries into the miniflux `entries`
//! table, e.g. to seed a database for the indexer.

use std::process::ExitCode;

use clap::Parser;
use tokio::io::BufReader;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

use miniflux_indexer::signal::cancel_on_shutdown_signal;
use miniflux_indexer::{build_info, logging, IndexingError, LoaderCli};
use miniflux_indexer_repository::postgres::redact_url;
use miniflux_indexer_repository::{import_entries, PgEntrySource, StoreConnectOptions};

#[tokio::main]
async fn main() -> ExitCode {
    dotenv::dotenv().ok();

    let cli = LoaderCli::parse();
    let build_info = build_info::current("miniflux-entry-loader");
    if let Err(e) = logging::init(cli.log_level, cli.log_format, &build_info) {
        eprintln!("{e}");
        return ExitCode::FAILURE;
    }

    match load(&cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(error = %e, "Entry import failed");
            ExitCode::FAILURE
        }
    }
}

async fn load(cli: &LoaderCli) -> Result<(), IndexingError> {
    let file = tokio::fs::File::open(&cli.input_file).await?;
    let reader = BufReader::new(file);

    info!(
        input_file = %cli.input_file.display(),
        database = %redact_url(&cli.database_url),
        "Loading entries"
    );

    let source = PgEntrySource::connect(&cli.database_url, &StoreConnectOptions::default()).await?;

    let cancel = CancellationToken::new();
    tokio::spawn(cancel_on_shutdown_signal(cancel.clone()));

    let result = import_entries(reader, &source, &cancel).await;
    source.close().await;

    let imported = result?;
    info!(imported, "Finished loading entries");
    Ok(())
}
