//! Source store trait definitions.

use async_trait::async_trait;

use crate::errors::StoreError;
use miniflux_indexer_shared::{DocumentTokens, Entry};

/// One page of an id-ordered scan.
///
/// Rows whose id was read but whose columns could not be decoded are kept
/// as `skipped` ids, so a caller can still move its cursor past them.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EntryBatch {
    /// Decoded entries in ascending id order.
    pub entries: Vec<Entry>,
    /// Ids of rows that failed to decode.
    pub skipped: Vec<i64>,
}

impl EntryBatch {
    pub fn new(entries: Vec<Entry>, skipped: Vec<i64>) -> Self {
        Self { entries, skipped }
    }

    /// Number of rows the query returned, decoded or not.
    pub fn rows(&self) -> usize {
        self.entries.len() + self.skipped.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows() == 0
    }

    /// Highest id among all returned rows.
    pub fn last_id(&self) -> Option<i64> {
        self.entries
            .iter()
            .map(|entry| entry.id)
            .chain(self.skipped.iter().copied())
            .max()
    }
}

impl From<Vec<Entry>> for EntryBatch {
    fn from(entries: Vec<Entry>) -> Self {
        Self::new(entries, Vec::new())
    }
}

/// Abstract interface over the store holding feed entries.
///
/// # Thread Safety
///
/// Implementations are shared by the scanner and every worker, so they must
/// be `Send + Sync` and must not rely on application-level locking for
/// per-row correctness.
#[async_trait]
pub trait EntrySource: Send + Sync {
    /// Fetch up to `limit` entries with `id > after_id`, ordered by id.
    ///
    /// # Arguments
    ///
    /// * `after_id` - Exclusive lower bound on entry ids
    /// * `limit` - Maximum number of entries to return
    ///
    /// # Returns
    ///
    /// * `Ok(EntryBatch)` - At most `limit` rows in ascending id order,
    ///   possibly empty
    /// * `Err(StoreError)` - If the query fails
    async fn fetch_entries_after(&self, after_id: i64, limit: usize)
        -> Result<EntryBatch, StoreError>;

    /// Replace the search vector of an entry.
    ///
    /// Title tokens carry a higher weight than content tokens. Writing the
    /// same tokens twice leaves the entry unchanged, so the call is safe to
    /// repeat.
    ///
    /// # Arguments
    ///
    /// * `entry_id` - Entry to update
    /// * `tokens` - Whitespace-joined title and content tokens
    async fn update_document_vector(
        &self,
        entry_id: i64,
        tokens: &DocumentTokens,
    ) -> Result<(), StoreError>;
}

/// Sink used by the bulk loader to insert entries into the source store.
#[async_trait]
pub trait EntryImporter: Send + Sync {
    /// Insert a single entry.
    async fn insert_entry(&self, entry: &Entry) -> Result<(), StoreError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_batch_counts_skipped_rows() {
        let batch = EntryBatch::new(
            vec![Entry::new(3, "a", "b"), Entry::new(9, "c", "d")],
            vec![4, 12],
        );
        assert_eq!(batch.rows(), 4);
        assert_eq!(batch.last_id(), Some(12));

        let only_skipped = EntryBatch::new(Vec::new(), vec![20, 21]);
        assert!(!only_skipped.is_empty());
        assert_eq!(only_skipped.last_id(), Some(21));

        assert!(EntryBatch::default().is_empty());
        assert_eq!(EntryBatch::default().last_id(), None);
    }
}
