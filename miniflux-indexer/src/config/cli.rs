//! Command line and environment configuration.

use std::path::PathBuf;
use std::time::Duration;

use clap::{Args, Parser, Subcommand};
use tracing::Level;

use crate::logging::{parse_level, LogFormat};
use miniflux_indexer_pipeline::config::{default_workers, DEFAULT_BATCH_SIZE};
use miniflux_indexer_pipeline::PipelineConfig;

#[derive(Parser, Debug)]
#[command(name = "miniflux-indexer")]
#[command(about = "Full-text indexer for miniflux entries", long_about = None)]
#[command(disable_version_flag = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Command>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = "LOG_LEVEL", default_value = "info", value_parser = parse_level, global = true)]
    pub log_level: Level,

    /// Log format
    #[arg(long, env = "LOG_FORMAT", value_enum, default_value_t = LogFormat::Auto, global = true)]
    pub log_format: LogFormat,

    /// Print build information and exit
    #[arg(short = 'V', long)]
    pub version: bool,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run the indexer until interrupted
    Start(StartArgs),
}

#[derive(Args, Debug, Clone)]
pub struct StartArgs {
    /// Metadata store holding the index_info table
    #[arg(long = "database-url", visible_alias = "metadata-store-url", env = "DATABASE_URL")]
    pub database_url: String,

    /// Source store holding the entries table
    #[arg(
        long = "miniflux-database-url",
        visible_alias = "source-store-url",
        env = "MINIFLUX_DATABASE_URL"
    )]
    pub miniflux_database_url: String,

    /// Ignore existing completion records and rescan from the first entry
    #[arg(long, env = "INDEXER_REINDEX")]
    pub reindex: bool,

    /// Sleep after an empty or partial batch (e.g. 500ms, 30s, 5m)
    #[arg(long, env = "INDEXER_SCAN_INTERVAL", default_value = "30s", value_parser = parse_duration)]
    pub scan_interval: Duration,

    /// Rows per scan query
    #[arg(long, env = "INDEXER_BATCH_SIZE", default_value_t = DEFAULT_BATCH_SIZE)]
    pub batch_size: usize,

    /// Number of workers [default: available parallelism]
    #[arg(long, env = "INDEXER_WORKERS")]
    pub workers: Option<usize>,

    /// Deadline for processing one entry
    #[arg(long, env = "INDEXER_ENTRY_TIMEOUT", default_value = "3s", value_parser = parse_duration)]
    pub entry_timeout: Duration,

    /// Extra segmentation dictionary loaded by every worker
    #[arg(long, env = "INDEXER_USER_DICTIONARY")]
    pub user_dictionary: Option<PathBuf>,
}

impl StartArgs {
    /// Pipeline configuration described by these arguments.
    pub fn pipeline_config(&self) -> PipelineConfig {
        PipelineConfig::default()
            .with_reindex(self.reindex)
            .with_scan_interval(self.scan_interval)
            .with_batch_size(self.batch_size)
            .with_workers(self.workers.unwrap_or_else(default_workers))
            .with_entry_timeout(self.entry_timeout)
    }
}

/// Command line of the bulk entry loader.
#[derive(Parser, Debug)]
#[command(name = "miniflux-entry-loader")]
#[command(about = "Load newline-delimited JSON entries into the miniflux entries table", long_about = None)]
pub struct LoaderCli {
    /// Source store holding the entries table
    #[arg(long, env = "DATABASE_URL")]
    pub database_url: String,

    /// Input file with one {"id", "title", "content"} object per line
    #[arg(long)]
    pub input_file: PathBuf,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = "LOG_LEVEL", default_value = "info", value_parser = parse_level)]
    pub log_level: Level,

    /// Log format
    #[arg(long, env = "LOG_FORMAT", value_enum, default_value_t = LogFormat::Auto)]
    pub log_format: LogFormat,
}

/// Parse a duration such as `250ms`, `30s`, `5m`, `1h` or bare seconds.
pub fn parse_duration(value: &str) -> Result<Duration, String> {
    let value = value.trim();
    let (number, unit) = match value.find(|c: char| !c.is_ascii_digit()) {
        Some(split) => value.split_at(split),
        None => (value, "s"),
    };

    let amount: u64 = number
        .parse()
        .map_err(|_| format!("invalid duration '{value}'"))?;

    let duration = match unit {
        "ms" => Duration::from_millis(amount),
        "s" => Duration::from_secs(amount),
        "m" => Duration::from_secs(amount.saturating_mul(60)),
        "h" => Duration::from_secs(amount.saturating_mul(3600)),
        other => return Err(format!("invalid duration unit '{other}' in '{value}'")),
    };
    Ok(duration)
}
