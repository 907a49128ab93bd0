//! In-memory store implementations.
//!
//! Used by the pipeline tests and for running the indexer without a
//! database. Both stores mirror the PostgreSQL semantics: ordered id scans,
//! per-id last-write-wins upserts, and repeatable vector writes.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::Mutex;

use crate::errors::StoreError;
use crate::interfaces::{EntryBatch, EntryImporter, EntrySource, IndexInfoStore};
use miniflux_indexer_shared::{DocumentTokens, Entry, IndexInfo, IndexMeta};

#[derive(Debug, Clone)]
struct StoredEntry {
    entry: Entry,
    document_vector: Option<DocumentTokens>,
}

/// In-memory source store.
#[derive(Debug, Default)]
pub struct InMemoryEntrySource {
    entries: Mutex<BTreeMap<i64, StoredEntry>>,
    fail_queries: AtomicBool,
    fail_writes: AtomicBool,
    queries: AtomicUsize,
    vector_writes: AtomicUsize,
}

impl InMemoryEntrySource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store pre-populated with `entries`.
    pub fn with_entries(entries: impl IntoIterator<Item = Entry>) -> Self {
        let map = entries
            .into_iter()
            .map(|entry| {
                (
                    entry.id,
                    StoredEntry {
                        entry,
                        document_vector: None,
                    },
                )
            })
            .collect();
        Self {
            entries: Mutex::new(map),
            ..Self::default()
        }
    }

    /// Make every subsequent scan query fail.
    pub fn set_fail_queries(&self, fail: bool) {
        self.fail_queries.store(fail, Ordering::SeqCst);
    }

    /// Make every subsequent vector write fail.
    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    /// Number of scan queries issued so far.
    pub fn query_count(&self) -> usize {
        self.queries.load(Ordering::SeqCst)
    }

    /// Number of successful vector writes so far.
    pub fn vector_write_count(&self) -> usize {
        self.vector_writes.load(Ordering::SeqCst)
    }

    /// Current search vector of an entry.
    pub async fn document_vector(&self, entry_id: i64) -> Option<DocumentTokens> {
        self.entries
            .lock()
            .await
            .get(&entry_id)
            .and_then(|stored| stored.document_vector.clone())
    }

    pub async fn len(&self) -> usize {
        self.entries.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.lock().await.is_empty()
    }
}

#[async_trait]
impl EntrySource for InMemoryEntrySource {
    async fn fetch_entries_after(
        &self,
        after_id: i64,
        limit: usize,
    ) -> Result<EntryBatch, StoreError> {
        self.queries.fetch_add(1, Ordering::SeqCst);
        if self.fail_queries.load(Ordering::SeqCst) {
            return Err(StoreError::query("injected query failure"));
        }

        let entries = self.entries.lock().await;
        let page: Vec<Entry> = entries
            .range(after_id.saturating_add(1)..)
            .take(limit)
            .map(|(_, stored)| stored.entry.clone())
            .collect();
        Ok(page.into())
    }

    async fn update_document_vector(
        &self,
        entry_id: i64,
        tokens: &DocumentTokens,
    ) -> Result<(), StoreError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(StoreError::write("injected write failure"));
        }

        // UPDATE on a missing row affects nothing and is not an error
        if let Some(stored) = self.entries.lock().await.get_mut(&entry_id) {
            stored.document_vector = Some(tokens.clone());
        }
        self.vector_writes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

#[async_trait]
impl EntryImporter for InMemoryEntrySource {
    async fn insert_entry(&self, entry: &Entry) -> Result<(), StoreError> {
        let mut entries = self.entries.lock().await;
        if entries.contains_key(&entry.id) {
            return Err(StoreError::write(format!(
                "duplicate key value violates unique constraint: id={}",
                entry.id
            )));
        }
        entries.insert(
            entry.id,
            StoredEntry {
                entry: entry.clone(),
                document_vector: None,
            },
        );
        Ok(())
    }
}

/// In-memory completion record store.
#[derive(Debug, Default)]
pub struct InMemoryIndexInfoStore {
    records: Mutex<BTreeMap<i64, IndexInfo>>,
    fail_writes: AtomicBool,
    fail_queries: AtomicBool,
    upserts: AtomicUsize,
}

impl InMemoryIndexInfoStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent upsert fail.
    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    /// Make the watermark query fail.
    pub fn set_fail_queries(&self, fail: bool) {
        self.fail_queries.store(fail, Ordering::SeqCst);
    }

    /// Number of successful upserts so far, including overwrites.
    pub fn upsert_count(&self) -> usize {
        self.upserts.load(Ordering::SeqCst)
    }

    /// Snapshot of all records ordered by id.
    pub async fn records(&self) -> Vec<IndexInfo> {
        self.records.lock().await.values().cloned().collect()
    }
}

#[async_trait]
impl IndexInfoStore for InMemoryIndexInfoStore {
    async fn max_indexed_id(&self) -> Result<Option<i64>, StoreError> {
        if self.fail_queries.load(Ordering::SeqCst) {
            return Err(StoreError::query("injected query failure"));
        }
        Ok(self.records.lock().await.keys().next_back().copied())
    }

    async fn upsert_index_info(
        &self,
        entry_id: i64,
        language: &str,
        meta: &IndexMeta,
    ) -> Result<(), StoreError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(StoreError::write("injected write failure"));
        }

        self.records.lock().await.insert(
            entry_id,
            IndexInfo {
                id: entry_id,
                indexed_at: Utc::now(),
                language: language.to_string(),
                meta: meta.clone(),
            },
        );
        self.upserts.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn get_index_info(&self, entry_id: i64) -> Result<Option<IndexInfo>, StoreError> {
        Ok(self.records.lock().await.get(&entry_id).cloned())
    }
}
