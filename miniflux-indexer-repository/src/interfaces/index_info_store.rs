//! Completion record store trait definition.

use async_trait::async_trait;

use crate::errors::StoreError;
use miniflux_indexer_shared::{IndexInfo, IndexMeta};

/// Abstract interface over the metadata store holding completion records.
#[async_trait]
pub trait IndexInfoStore: Send + Sync {
    /// Highest entry id with a completion record.
    ///
    /// # Returns
    ///
    /// * `Ok(None)` - If no record exists yet
    /// * `Ok(Some(id))` - The maximum recorded id
    /// * `Err(StoreError)` - If the query fails
    async fn max_indexed_id(&self) -> Result<Option<i64>, StoreError>;

    /// Insert or overwrite the completion record for `entry_id`.
    ///
    /// Concurrent calls for the same id must not conflict; the last write
    /// wins and exactly one record remains.
    ///
    /// # Arguments
    ///
    /// * `entry_id` - Entry the record belongs to
    /// * `language` - Detected language code
    /// * `meta` - Metadata stored with the record
    async fn upsert_index_info(
        &self,
        entry_id: i64,
        language: &str,
        meta: &IndexMeta,
    ) -> Result<(), StoreError>;

    /// Fetch the completion record for `entry_id`, if any.
    async fn get_index_info(&self, entry_id: i64) -> Result<Option<IndexInfo>, StoreError>;
}
