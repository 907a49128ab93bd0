//! PostgreSQL source store.

use async_trait::async_trait;
use futures::TryStreamExt;
use sqlx::postgres::{PgPool, PgRow};
use sqlx::Row;
use tracing::{debug, instrument, warn};

use super::connection::{connect_pool, StoreConnectOptions};
use super::queries;
use crate::errors::StoreError;
use crate::interfaces::{EntryBatch, EntryImporter, EntrySource};
use miniflux_indexer_shared::{DocumentTokens, Entry};

/// Source store backed by the miniflux `entries` table.
///
/// # Example
///
/// ```ignore
/// let source = PgEntrySource::connect(url, &StoreConnectOptions::default()).await?;
/// let batch = source.fetch_entries_after(0, 100).await?;
/// ```
#[derive(Clone)]
pub struct PgEntrySource {
    pool: PgPool,
}

impl PgEntrySource {
    /// Connect to the source store.
    pub async fn connect(url: &str, options: &StoreConnectOptions) -> Result<Self, StoreError> {
        let pool = connect_pool(url, options).await?;
        Ok(Self { pool })
    }

    /// Wrap an existing pool.
    pub fn from_pool(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Close the underlying pool.
    pub async fn close(&self) {
        self.pool.close().await;
    }
}

/// Upper bound on the rows pre-allocated for one batch.
const PREALLOCATED_ROWS: usize = 1024;

fn decode_entry(id: i64, row: &PgRow) -> Result<Entry, sqlx::Error> {
    Ok(Entry {
        id,
        title: row.try_get("title")?,
        content: row.try_get("content")?,
    })
}

#[async_trait]
impl EntrySource for PgEntrySource {
    /// Rows whose title or content fail to decode are logged and returned as
    /// skipped ids; they do not fail the batch. A row without a readable id
    /// fails the whole query.
    #[instrument(skip(self))]
    async fn fetch_entries_after(
        &self,
        after_id: i64,
        limit: usize,
    ) -> Result<EntryBatch, StoreError> {
        let limit_param = i64::try_from(limit).unwrap_or(i64::MAX);
        let mut rows = sqlx::query(queries::SELECT_ENTRIES_AFTER)
            .bind(after_id)
            .bind(limit_param)
            .fetch(&self.pool);

        let mut batch = EntryBatch::new(
            Vec::with_capacity(limit.min(PREALLOCATED_ROWS)),
            Vec::new(),
        );
        while let Some(row) = rows
            .try_next()
            .await
            .map_err(|e| StoreError::query(e.to_string()))?
        {
            let id: i64 = row
                .try_get("id")
                .map_err(|e| StoreError::serialization(format!("entry id: {e}")))?;

            match decode_entry(id, &row) {
                Ok(entry) => {
                    debug!(entry_id = id, "Entry loaded");
                    batch.entries.push(entry);
                }
                Err(e) => {
                    warn!(entry_id = id, error = %e, "Skipping entry row that failed to decode");
                    batch.skipped.push(id);
                }
            }
        }

        Ok(batch)
    }

    async fn update_document_vector(
        &self,
        entry_id: i64,
        tokens: &DocumentTokens,
    ) -> Result<(), StoreError> {
        sqlx::query(queries::UPDATE_DOCUMENT_VECTORS)
            .bind(&tokens.title)
            .bind(&tokens.content)
            .bind(entry_id)
            .execute(&self.pool)
            .await
            .map_err(|e| StoreError::write(e.to_string()))?;

        debug!(entry_id, "Updated document vectors");
        Ok(())
    }
}

#[async_trait]
impl EntryImporter for PgEntrySource {
    async fn insert_entry(&self, entry: &Entry) -> Result<(), StoreError> {
        sqlx::query(queries::INSERT_ENTRY)
            .bind(entry.id)
            .bind(&entry.title)
            .bind(&entry.content)
            .execute(&self.pool)
            .await
            .map_err(|e| StoreError::write(e.to_string()))?;
        Ok(())
    }
}
