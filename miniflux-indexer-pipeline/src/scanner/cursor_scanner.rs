//! Resumable id-cursor scanner.
//!
//! The watermark is the highest entry id this scanner has seen. It advances
//! as rows are taken from a batch, not when they are indexed, so a crash can
//! leave entries below the watermark without a completion record. Those are
//! only picked up again by a reindex run.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, warn};

use crate::config::PipelineConfig;
use crate::errors::PipelineError;
use miniflux_indexer_repository::{EntryBatch, EntrySource, IndexInfoStore};
use miniflux_indexer_shared::Entry;

/// Deadline for reading the starting watermark.
pub const WATERMARK_QUERY_TIMEOUT: Duration = Duration::from_secs(3);

/// State of the scan loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanState {
    /// Query the next batch right away.
    ScanningBatch,
    /// Sleep for the scan interval, or until cancellation.
    IdleWaiting,
}

impl ScanState {
    /// State following a batch of `count` rows.
    ///
    /// A full batch means more rows are likely pending.
    pub fn after_batch(count: usize, batch_size: usize) -> Self {
        if count >= batch_size {
            Self::ScanningBatch
        } else {
            Self::IdleWaiting
        }
    }
}

/// Scanner that pushes unindexed entries into the worker queue.
pub struct CursorScanner {
    source: Arc<dyn EntrySource>,
    index_info: Arc<dyn IndexInfoStore>,
    reindex: bool,
    batch_size: usize,
    scan_interval: Duration,
}

impl CursorScanner {
    pub fn new(
        source: Arc<dyn EntrySource>,
        index_info: Arc<dyn IndexInfoStore>,
        config: &PipelineConfig,
    ) -> Self {
        Self {
            source,
            index_info,
            reindex: config.reindex,
            batch_size: config.batch_size,
            scan_interval: config.scan_interval,
        }
    }

    /// Watermark the scan starts from.
    ///
    /// # Returns
    ///
    /// * `Ok(0)` - When reindexing, or when no completion record exists
    /// * `Ok(id)` - The highest recorded entry id
    /// * `Err(PipelineError::StartupFailure)` - If the metadata store cannot
    ///   be read within [`WATERMARK_QUERY_TIMEOUT`]
    pub async fn initial_watermark(&self) -> Result<i64, PipelineError> {
        if self.reindex {
            info!("Reindex requested, scanning from the first entry");
            return Ok(0);
        }

        let max_id = tokio::time::timeout(WATERMARK_QUERY_TIMEOUT, self.index_info.max_indexed_id())
            .await
            .map_err(|e| PipelineError::startup("reading watermark", e))?
            .map_err(|e| PipelineError::startup("reading watermark", e))?;

        Ok(max_id.unwrap_or(0))
    }

    /// Scan until `cancel` fires.
    ///
    /// Each entry is pushed into `sink`; a full queue suspends the scan.
    /// Query errors are logged and handled like an empty batch. The only
    /// error returned is a startup failure while reading the watermark.
    ///
    /// # Arguments
    ///
    /// * `sink` - Producer side of the worker queue
    /// * `cancel` - Shared cancellation signal
    #[instrument(skip(self, sink, cancel), fields(reindex = self.reindex, batch_size = self.batch_size))]
    pub async fn run(
        &self,
        sink: mpsc::Sender<Entry>,
        cancel: CancellationToken,
    ) -> Result<(), PipelineError> {
        let mut watermark = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Ok(()),
            watermark = self.initial_watermark() => watermark?,
        };

        info!(watermark, "Starting entry scan");

        let mut state = ScanState::ScanningBatch;
        loop {
            state = match state {
                ScanState::ScanningBatch => {
                    let batch = tokio::select! {
                        biased;
                        _ = cancel.cancelled() => break,
                        result = self.source.fetch_entries_after(watermark, self.batch_size) => result,
                    };

                    let batch = match batch {
                        Ok(batch) => batch,
                        Err(e) => {
                            let err = PipelineError::BatchQueryFailure(e);
                            warn!(watermark, error = %err, "Entry scan failed, retrying after interval");
                            EntryBatch::default()
                        }
                    };

                    let count = batch.rows();
                    let last_id = batch.last_id();
                    if !batch.skipped.is_empty() {
                        warn!(skipped = ?batch.skipped, "Passing over entries that failed to decode");
                    }

                    for entry in batch.entries {
                        watermark = watermark.max(entry.id);

                        tokio::select! {
                            biased;
                            _ = cancel.cancelled() => {
                                debug!(watermark, "Scanner cancelled during send");
                                return Ok(());
                            }
                            sent = sink.send(entry) => {
                                if sent.is_err() {
                                    warn!(watermark, "Worker queue closed, stopping scan");
                                    return Ok(());
                                }
                            }
                        }
                    }

                    // Undecodable rows still move the cursor
                    if let Some(last_id) = last_id {
                        watermark = watermark.max(last_id);
                    }

                    debug!(count, watermark, "Scanned batch");
                    ScanState::after_batch(count, self.batch_size)
                }
                ScanState::IdleWaiting => {
                    tokio::select! {
                        biased;
                        _ = cancel.cancelled() => break,
                        _ = tokio::time::sleep(self.scan_interval) => ScanState::ScanningBatch,
                    }
                }
            };
        }

        info!(watermark, "Entry scan stopped");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use miniflux_indexer_repository::{InMemoryEntrySource, InMemoryIndexInfoStore, StoreError};
    use miniflux_indexer_shared::{DocumentTokens, IndexMeta};
    use tokio::task::JoinHandle;
    use tokio::time::Instant;

    /// Source that records when each scan query was issued.
    struct RecordingSource {
        inner: InMemoryEntrySource,
        queried_at: std::sync::Mutex<Vec<Instant>>,
    }

    impl RecordingSource {
        fn new(entries: Vec<Entry>) -> Self {
            Self {
                inner: InMemoryEntrySource::with_entries(entries),
                queried_at: std::sync::Mutex::new(Vec::new()),
            }
        }

        fn offsets(&self, start: Instant) -> Vec<Duration> {
            self.queried_at
                .lock()
                .unwrap()
                .iter()
                .map(|at| at.duration_since(start))
                .collect()
        }
    }

    #[async_trait]
    impl EntrySource for RecordingSource {
        async fn fetch_entries_after(
            &self,
            after_id: i64,
            limit: usize,
        ) -> Result<EntryBatch, StoreError> {
            self.queried_at.lock().unwrap().push(Instant::now());
            self.inner.fetch_entries_after(after_id, limit).await
        }

        async fn update_document_vector(
            &self,
            entry_id: i64,
            tokens: &DocumentTokens,
        ) -> Result<(), StoreError> {
            self.inner.update_document_vector(entry_id, tokens).await
        }
    }

    /// Source that reports some rows as undecodable.
    struct UndecodableSource {
        inner: InMemoryEntrySource,
        undecodable: Vec<i64>,
    }

    #[async_trait]
    impl EntrySource for UndecodableSource {
        async fn fetch_entries_after(
            &self,
            after_id: i64,
            limit: usize,
        ) -> Result<EntryBatch, StoreError> {
            let batch = self.inner.fetch_entries_after(after_id, limit).await?;
            let (skipped, decoded): (Vec<Entry>, Vec<Entry>) = batch
                .entries
                .into_iter()
                .partition(|entry| self.undecodable.contains(&entry.id));
            Ok(EntryBatch::new(
                decoded,
                skipped.into_iter().map(|entry| entry.id).collect(),
            ))
        }

        async fn update_document_vector(
            &self,
            entry_id: i64,
            tokens: &DocumentTokens,
        ) -> Result<(), StoreError> {
            self.inner.update_document_vector(entry_id, tokens).await
        }
    }

    fn entries(ids: impl IntoIterator<Item = i64>) -> Vec<Entry> {
        ids.into_iter()
            .map(|id| Entry::new(id, format!("title {id}"), format!("content {id}")))
            .collect()
    }

    fn config(batch_size: usize) -> PipelineConfig {
        PipelineConfig::default()
            .with_batch_size(batch_size)
            .with_scan_interval(Duration::from_secs(30))
    }

    fn spawn_scanner(
        scanner: CursorScanner,
        sink: mpsc::Sender<Entry>,
        cancel: &CancellationToken,
    ) -> JoinHandle<Result<(), PipelineError>> {
        let cancel = cancel.clone();
        tokio::spawn(async move { scanner.run(sink, cancel).await })
    }

    fn drain(rx: &mut mpsc::Receiver<Entry>) -> Vec<i64> {
        let mut ids = Vec::new();
        while let Ok(entry) = rx.try_recv() {
            ids.push(entry.id);
        }
        ids
    }

    #[test]
    fn test_state_after_batch() {
        assert_eq!(ScanState::after_batch(2, 2), ScanState::ScanningBatch);
        assert_eq!(ScanState::after_batch(1, 2), ScanState::IdleWaiting);
        assert_eq!(ScanState::after_batch(0, 2), ScanState::IdleWaiting);
    }

    #[tokio::test(start_paused = true)]
    async fn test_full_batch_continues_without_sleep() {
        let start = Instant::now();
        let source = Arc::new(RecordingSource::new(entries(1..=5)));
        let scanner = CursorScanner::new(
            source.clone(),
            Arc::new(InMemoryIndexInfoStore::new()),
            &config(2),
        );
        let (tx, mut rx) = mpsc::channel(10);
        let cancel = CancellationToken::new();

        let handle = spawn_scanner(scanner, tx, &cancel);
        tokio::time::sleep(Duration::from_secs(45)).await;
        cancel.cancel();
        handle.await.unwrap().unwrap();

        // [1,2] and [3,4] are full, [5] is partial, then one interval
        assert_eq!(
            source.offsets(start),
            vec![
                Duration::ZERO,
                Duration::ZERO,
                Duration::ZERO,
                Duration::from_secs(30),
            ]
        );
        assert_eq!(drain(&mut rx), vec![1, 2, 3, 4, 5]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_resume_skips_recorded_entries() {
        let source = Arc::new(InMemoryEntrySource::with_entries(entries(1..=6)));
        let index_info = Arc::new(InMemoryIndexInfoStore::new());
        index_info
            .upsert_index_info(4, "zh", &IndexMeta::new())
            .await
            .unwrap();
        let scanner = CursorScanner::new(source, index_info, &config(10));
        assert_eq!(scanner.initial_watermark().await.unwrap(), 4);

        let (tx, mut rx) = mpsc::channel(20);
        let cancel = CancellationToken::new();
        let handle = spawn_scanner(scanner, tx, &cancel);
        tokio::time::sleep(Duration::from_secs(1)).await;
        cancel.cancel();
        handle.await.unwrap().unwrap();

        assert_eq!(drain(&mut rx), vec![5, 6]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_reindex_starts_from_zero() {
        let source = Arc::new(InMemoryEntrySource::with_entries(entries(1..=3)));
        let index_info = Arc::new(InMemoryIndexInfoStore::new());
        for id in 1..=3 {
            index_info
                .upsert_index_info(id, "en", &IndexMeta::new())
                .await
                .unwrap();
        }
        let scanner = CursorScanner::new(source, index_info, &config(10).with_reindex(true));
        assert_eq!(scanner.initial_watermark().await.unwrap(), 0);

        let (tx, mut rx) = mpsc::channel(20);
        let cancel = CancellationToken::new();
        let handle = spawn_scanner(scanner, tx, &cancel);
        tokio::time::sleep(Duration::from_secs(1)).await;
        cancel.cancel();
        handle.await.unwrap().unwrap();

        assert_eq!(drain(&mut rx), vec![1, 2, 3]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_query_error_waits_for_interval() {
        let source = Arc::new(InMemoryEntrySource::with_entries(entries(1..=3)));
        source.set_fail_queries(true);
        let scanner = CursorScanner::new(
            source.clone(),
            Arc::new(InMemoryIndexInfoStore::new()),
            &config(10),
        );
        let (tx, _rx) = mpsc::channel(20);
        let cancel = CancellationToken::new();

        let handle = spawn_scanner(scanner, tx, &cancel);
        tokio::time::sleep(Duration::from_secs(65)).await;

        // Queries at 0s, 30s and 60s; the scanner is still running
        assert_eq!(source.query_count(), 3);
        assert!(!handle.is_finished());

        cancel.cancel();
        assert!(handle.await.unwrap().is_ok());
    }

    #[tokio::test]
    async fn test_unreadable_watermark_is_startup_failure() {
        let index_info = Arc::new(InMemoryIndexInfoStore::new());
        index_info.set_fail_queries(true);
        let scanner = CursorScanner::new(
            Arc::new(InMemoryEntrySource::new()),
            index_info,
            &config(10),
        );
        let (tx, _rx) = mpsc::channel(1);

        let err = scanner
            .run(tx, CancellationToken::new())
            .await
            .unwrap_err();

        assert!(matches!(err, PipelineError::StartupFailure { .. }));
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_interrupts_idle_wait() {
        let scanner = CursorScanner::new(
            Arc::new(InMemoryEntrySource::new()),
            Arc::new(InMemoryIndexInfoStore::new()),
            &config(10).with_scan_interval(Duration::from_secs(3600)),
        );
        let (tx, _rx) = mpsc::channel(1);
        let cancel = CancellationToken::new();

        let handle = spawn_scanner(scanner, tx, &cancel);
        tokio::time::sleep(Duration::from_secs(1)).await;
        cancel.cancel();

        let result = tokio::time::timeout(Duration::from_secs(1), handle).await;
        assert!(result.is_ok(), "scanner did not stop while idle");
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_interrupts_full_queue() {
        let source = Arc::new(InMemoryEntrySource::with_entries(entries(1..=5)));
        let scanner = CursorScanner::new(
            source,
            Arc::new(InMemoryIndexInfoStore::new()),
            &config(10),
        );
        let (tx, mut rx) = mpsc::channel(1);
        let cancel = CancellationToken::new();

        let handle = spawn_scanner(scanner, tx, &cancel);
        tokio::time::sleep(Duration::from_secs(1)).await;
        assert!(!handle.is_finished());
        cancel.cancel();

        let result = tokio::time::timeout(Duration::from_secs(1), handle).await;
        assert!(result.is_ok(), "scanner did not stop while blocked on the queue");
        assert_eq!(drain(&mut rx), vec![1]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_undecodable_rows_advance_watermark() {
        let source = Arc::new(UndecodableSource {
            inner: InMemoryEntrySource::with_entries(entries(1..=6)),
            undecodable: vec![1, 2, 3, 4],
        });
        let scanner = CursorScanner::new(
            source.clone(),
            Arc::new(InMemoryIndexInfoStore::new()),
            &config(2),
        );
        let (tx, mut rx) = mpsc::channel(10);
        let cancel = CancellationToken::new();

        let handle = spawn_scanner(scanner, tx, &cancel);
        tokio::time::sleep(Duration::from_secs(1)).await;
        cancel.cancel();
        handle.await.unwrap().unwrap();

        // [1,2] and [3,4] count as full batches even though nothing decoded
        assert_eq!(source.inner.query_count(), 4);
        assert_eq!(drain(&mut rx), vec![5, 6]);
    }
}
