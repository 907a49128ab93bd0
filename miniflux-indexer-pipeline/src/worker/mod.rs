//! Worker module for the indexer pipeline.
//!
//! Workers pull entries from the shared queue, process them with their own
//! tokenizer and hand the result to the writer.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, Mutex};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, trace};

use crate::errors::PipelineError;
use crate::processor::{TextProcessor, Tokenizer};
use crate::writer::IndexWriter;
use miniflux_indexer_shared::Entry;

/// Consumer side of the worker queue, shared by every worker.
pub type SharedReceiver = Arc<Mutex<mpsc::Receiver<Entry>>>;

/// One member of the worker pool.
///
/// The tokenizer is built once per worker and reused for every entry.
pub struct IndexWorker {
    worker_id: usize,
    tokenizer: Arc<dyn Tokenizer>,
    processor: TextProcessor,
    writer: Arc<IndexWriter>,
    entry_timeout: Duration,
}

impl IndexWorker {
    pub fn new(
        worker_id: usize,
        tokenizer: Arc<dyn Tokenizer>,
        writer: Arc<IndexWriter>,
        entry_timeout: Duration,
    ) -> Self {
        Self {
            worker_id,
            tokenizer,
            processor: TextProcessor::new(),
            writer,
            entry_timeout,
        }
    }

    /// Process queue items until `cancel` fires or the queue closes.
    ///
    /// Entries still queued at cancellation are dropped. An entry already
    /// being processed runs to completion or to its deadline.
    pub async fn run(self, rx: SharedReceiver, cancel: CancellationToken) {
        trace!(worker_id = self.worker_id, "Index worker starting");
        let mut indexed = 0usize;
        let mut failed = 0usize;

        loop {
            let next = {
                let mut rx_guard = rx.lock().await;
                tokio::select! {
                    biased;
                    _ = cancel.cancelled() => {
                        trace!(worker_id = self.worker_id, "Index worker cancelled");
                        break;
                    }
                    entry = rx_guard.recv() => entry
                }
            };

            let Some(entry) = next else {
                trace!(worker_id = self.worker_id, "Worker queue closed");
                break;
            };

            let entry_id = entry.id;
            match self.index_entry(entry).await {
                Ok(()) => indexed += 1,
                Err(e) => {
                    failed += 1;
                    error!(
                        entry_id,
                        worker_id = self.worker_id,
                        error = %e,
                        "Failed to index entry"
                    );
                }
            }
        }

        debug!(worker_id = self.worker_id, indexed, failed, "Index worker finished");
    }

    /// Process and persist one entry under the per-entry deadline.
    pub async fn index_entry(&self, entry: Entry) -> Result<(), PipelineError> {
        let entry_id = entry.id;
        tokio::time::timeout(self.entry_timeout, self.process_and_write(entry))
            .await
            .map_err(|_| PipelineError::DeadlineExceeded {
                entry_id,
                timeout: self.entry_timeout,
            })?
    }

    async fn process_and_write(&self, entry: Entry) -> Result<(), PipelineError> {
        let entry_id = entry.id;
        let processor = self.processor;
        let tokenizer = self.tokenizer.clone();

        // Segmentation is CPU-bound
        let processed =
            tokio::task::spawn_blocking(move || processor.process(&entry, tokenizer.as_ref()))
                .await
                .map_err(|e| PipelineError::processing(entry_id, e))?;

        self.writer.write(&processed).await
    }
}
