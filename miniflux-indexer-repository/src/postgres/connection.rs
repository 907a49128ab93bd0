//! Connection pool set-up shared by both PostgreSQL stores.

use std::str::FromStr;
use std::time::Duration;

use sqlx::postgres::{PgConnectOptions, PgPool, PgPoolOptions};
use sqlx::Connection;
use tracing::{debug, info};
use url::Url;

use crate::errors::StoreError;

/// Default deadline for connecting and pinging a store at start-up.
const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(3);

/// Default maximum number of pooled connections per store.
const DEFAULT_MAX_CONNECTIONS: u32 = 10;

/// Options for connecting to a store.
#[derive(Debug, Clone)]
pub struct StoreConnectOptions {
    /// Deadline for establishing the pool and answering the initial ping.
    pub connect_timeout: Duration,
    /// Maximum number of pooled connections.
    pub max_connections: u32,
}

impl Default for StoreConnectOptions {
    fn default() -> Self {
        Self {
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
            max_connections: DEFAULT_MAX_CONNECTIONS,
        }
    }
}

impl StoreConnectOptions {
    /// Size the pool for the given number of concurrent workers.
    ///
    /// Every worker may hold one connection, plus one for the scanner.
    pub fn for_workers(workers: usize) -> Self {
        let wanted = u32::try_from(workers.saturating_add(1)).unwrap_or(u32::MAX);
        Self {
            max_connections: wanted.max(DEFAULT_MAX_CONNECTIONS),
            ..Self::default()
        }
    }

    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }
}

/// Open a connection pool and verify the store answers a ping.
///
/// # Arguments
///
/// * `url` - PostgreSQL connection URL
/// * `options` - Pool sizing and start-up deadline
///
/// # Returns
///
/// * `Ok(PgPool)` - A connected pool
/// * `Err(StoreError::ConnectionError)` - If the URL is invalid, the store is
///   unreachable, or the deadline expires
pub async fn connect_pool(url: &str, options: &StoreConnectOptions) -> Result<PgPool, StoreError> {
    let redacted = redact_url(url);
    let connect_options =
        PgConnectOptions::from_str(url).map_err(|e| StoreError::connection(e.to_string()))?;

    debug!(url = %redacted, "Connecting to store");

    let connect = async {
        let pool = PgPoolOptions::new()
            .max_connections(options.max_connections)
            .acquire_timeout(options.connect_timeout)
            .connect_with(connect_options)
            .await
            .map_err(|e| StoreError::connection(e.to_string()))?;

        let mut conn = pool
            .acquire()
            .await
            .map_err(|e| StoreError::connection(e.to_string()))?;
        conn.ping()
            .await
            .map_err(|e| StoreError::connection(e.to_string()))?;
        drop(conn);

        Ok::<_, StoreError>(pool)
    };

    let pool = tokio::time::timeout(options.connect_timeout, connect)
        .await
        .map_err(|_| {
            StoreError::connection(format!(
                "timed out after {:?} connecting to {}",
                options.connect_timeout, redacted
            ))
        })??;

    info!(
        url = %redacted,
        max_connections = options.max_connections,
        "Connected to store"
    );

    Ok(pool)
}

/// Replace the password of a connection URL so it can be logged.
pub fn redact_url(url: &str) -> String {
    match Url::parse(url) {
        Ok(mut parsed) => {
            if parsed.password().is_some() {
                // set_password only fails for cannot-be-a-base URLs
                let _ = parsed.set_password(Some("xxxxx"));
            }
            parsed.to_string()
        }
        Err(_) => "<unparseable url>".to_string(),
    }
}
