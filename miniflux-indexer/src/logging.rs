//! Logger set-up for the indexer binaries.

use std::io::IsTerminal;

use clap::ValueEnum;
use tracing::{warn, Level};
use tracing_subscriber::filter::Directive;
use tracing_subscriber::EnvFilter;

use crate::IndexingError;
use miniflux_indexer_shared::BuildInfo;

/// Directive keeping database driver logs quiet unless `RUST_LOG` asks
/// for more.
const SQLX_DIRECTIVE: &str = "sqlx=warn";

/// Output format of log lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    /// `human` for development builds, `json` otherwise.
    Auto,
    Human,
    Json,
}

impl LogFormat {
    /// Concrete format for the running build.
    pub fn resolve(self, build_info: &BuildInfo) -> Self {
        match self {
            Self::Auto if build_info.is_dev() => Self::Human,
            Self::Auto => Self::Json,
            other => other,
        }
    }
}

/// Parse a log level name (`trace`, `debug`, `info`, `warn`, `error`).
pub fn parse_level(value: &str) -> Result<Level, String> {
    match value.trim().to_ascii_lowercase().as_str() {
        "trace" => Ok(Level::TRACE),
        "debug" => Ok(Level::DEBUG),
        "info" => Ok(Level::INFO),
        "warn" | "warning" => Ok(Level::WARN),
        "error" => Ok(Level::ERROR),
        other => Err(format!(
            "invalid log level '{other}', expected one of trace, debug, info, warn, error"
        )),
    }
}

/// Build the event filter.
///
/// `level` applies to every target, database driver logs are capped at
/// `warn`, and `env_directives` (the `RUST_LOG` syntax) are layered on top.
///
/// # Returns
///
/// The filter and every directive that could not be parsed.
pub fn build_filter(level: Level, env_directives: Option<&str>) -> (EnvFilter, Vec<String>) {
    let base = format!("{},{}", level.to_string().to_ascii_lowercase(), SQLX_DIRECTIVE);
    let mut filter = EnvFilter::new(base);
    let mut rejected = Vec::new();

    let directives = env_directives
        .into_iter()
        .flat_map(|raw| raw.split(','))
        .map(str::trim)
        .filter(|directive| !directive.is_empty());

    for directive in directives {
        match directive.parse::<Directive>() {
            Ok(parsed) => filter = filter.add_directive(parsed),
            Err(_) => rejected.push(directive.to_string()),
        }
    }

    (filter, rejected)
}

/// Install the global logger.
///
/// Must be called once, before anything logs. Colour is only used when
/// stdout is a terminal.
pub fn init(level: Level, format: LogFormat, build_info: &BuildInfo) -> Result<(), IndexingError> {
    let env_directives = std::env::var("RUST_LOG").ok();
    let (filter, rejected) = build_filter(level, env_directives.as_deref());

    let installed = match format.resolve(build_info) {
        LogFormat::Json => tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .with_target(true)
            .try_init(),
        _ => tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(true)
            .with_ansi(std::io::stdout().is_terminal())
            .try_init(),
    };
    installed.map_err(|e| IndexingError::config(format!("failed to install logger: {e}")))?;

    for directive in rejected {
        warn!(directive = %directive, "Ignoring invalid RUST_LOG directive");
    }
    Ok(())
}
