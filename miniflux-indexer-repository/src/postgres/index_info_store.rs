//! PostgreSQL metadata store.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::PgPool;
use sqlx::types::Json;
use sqlx::Row;
use tracing::{debug, info};

use super::connection::{connect_pool, StoreConnectOptions};
use super::queries;
use crate::errors::StoreError;
use crate::interfaces::IndexInfoStore;
use miniflux_indexer_shared::{IndexInfo, IndexMeta};

/// Completion record store backed by the `index_info` table.
#[derive(Clone)]
pub struct PgIndexInfoStore {
    pool: PgPool,
}

impl PgIndexInfoStore {
    /// Connect to the metadata store.
    pub async fn connect(url: &str, options: &StoreConnectOptions) -> Result<Self, StoreError> {
        let pool = connect_pool(url, options).await?;
        Ok(Self { pool })
    }

    /// Wrap an existing pool.
    pub fn from_pool(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Create the `index_info` table if it is missing.
    pub async fn ensure_schema(&self) -> Result<(), StoreError> {
        sqlx::query(queries::CREATE_INDEX_INFO_TABLE)
            .execute(&self.pool)
            .await
            .map_err(|e| StoreError::schema(e.to_string()))?;

        info!("index_info table ready");
        Ok(())
    }

    pub async fn close(&self) {
        self.pool.close().await;
    }
}

#[async_trait]
impl IndexInfoStore for PgIndexInfoStore {
    async fn max_indexed_id(&self) -> Result<Option<i64>, StoreError> {
        sqlx::query_scalar::<_, Option<i64>>(queries::SELECT_MAX_INDEXED_ID)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| StoreError::query(e.to_string()))
    }

    async fn upsert_index_info(
        &self,
        entry_id: i64,
        language: &str,
        meta: &IndexMeta,
    ) -> Result<(), StoreError> {
        sqlx::query(queries::UPSERT_INDEX_INFO)
            .bind(entry_id)
            .bind(language)
            .bind(Json(meta))
            .execute(&self.pool)
            .await
            .map_err(|e| StoreError::write(e.to_string()))?;

        debug!(entry_id, language, "Upserted index info");
        Ok(())
    }

    async fn get_index_info(&self, entry_id: i64) -> Result<Option<IndexInfo>, StoreError> {
        let row = sqlx::query(queries::SELECT_INDEX_INFO)
            .bind(entry_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| StoreError::query(e.to_string()))?;

        let Some(row) = row else {
            return Ok(None);
        };

        let decode = |e: sqlx::Error| StoreError::serialization(e.to_string());
        let indexed_at: DateTime<Utc> = row.try_get("indexed_at").map_err(decode)?;
        let Json(meta): Json<IndexMeta> = row.try_get("meta").map_err(decode)?;

        Ok(Some(IndexInfo {
            id: row.try_get("id").map_err(decode)?,
            indexed_at,
            language: row.try_get("language").map_err(decode)?,
            meta,
        }))
    }
}
