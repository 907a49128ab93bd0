//! Orchestrator module for the indexer pipeline.
//!
//! Coordinates the scanner, the worker pool and the writer.

use std::sync::Arc;
use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, instrument};

use crate::config::PipelineConfig;
use crate::errors::PipelineError;
use crate::processor::{Tokenizer, TokenizerFactory};
use crate::scanner::CursorScanner;
use crate::worker::IndexWorker;
use crate::writer::IndexWriter;
use miniflux_indexer_repository::{EntrySource, IndexInfoStore};
use miniflux_indexer_shared::{BuildInfo, Entry};

/// Orchestrator that runs the indexing pipeline.
///
/// The orchestrator:
/// - Builds one tokenizer per worker before anything is scanned
/// - Owns the bounded queue between the scanner and the workers
/// - Propagates the caller's cancellation to every component
/// - Waits for every worker before returning
pub struct Orchestrator {
    source: Arc<dyn EntrySource>,
    index_info: Arc<dyn IndexInfoStore>,
    tokenizer_factory: Arc<dyn TokenizerFactory>,
    build_info: BuildInfo,
    config: PipelineConfig,
}

impl Orchestrator {
    /// Create a new orchestrator.
    ///
    /// # Arguments
    ///
    /// * `source` - Store holding the entries to index
    /// * `index_info` - Store holding completion records
    /// * `tokenizer_factory` - Builds one tokenizer per worker
    /// * `build_info` - Version recorded with every completion record
    /// * `config` - Pipeline configuration
    pub fn new(
        source: Arc<dyn EntrySource>,
        index_info: Arc<dyn IndexInfoStore>,
        tokenizer_factory: Arc<dyn TokenizerFactory>,
        build_info: BuildInfo,
        config: PipelineConfig,
    ) -> Self {
        Self {
            source,
            index_info,
            tokenizer_factory,
            build_info,
            config,
        }
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Run the pipeline until `cancel` fires.
    ///
    /// # Returns
    ///
    /// * `Ok(())` - After cancellation, once every worker has exited
    /// * `Err(PipelineError)` - If the configuration is invalid or the
    ///   pipeline cannot start; nothing is left running in that case
    #[instrument(skip(self, cancel), fields(workers = self.config.workers, batch_size = self.config.batch_size))]
    pub async fn run(&self, cancel: CancellationToken) -> Result<(), PipelineError> {
        self.config.validate()?;

        info!(version = %self.build_info.version, "Starting indexer pipeline");

        let tokenizers = self.build_tokenizers().await?;

        let (tx, rx) = mpsc::channel::<Entry>(self.config.queue_capacity());
        let rx = Arc::new(Mutex::new(rx));

        let writer = Arc::new(IndexWriter::new(
            self.source.clone(),
            self.index_info.clone(),
            self.build_info.clone(),
        ));

        // Workers also stop when the scanner fails to start
        let workers_cancel = cancel.child_token();
        let mut workers = JoinSet::new();
        for (worker_id, tokenizer) in tokenizers.into_iter().enumerate() {
            let worker = IndexWorker::new(
                worker_id,
                tokenizer,
                writer.clone(),
                self.config.entry_timeout,
            );
            workers.spawn(worker.run(rx.clone(), workers_cancel.clone()));
        }

        let scanner = CursorScanner::new(self.source.clone(), self.index_info.clone(), &self.config);
        let result = scanner.run(tx, cancel.clone()).await;

        workers_cancel.cancel();
        while let Some(joined) = workers.join_next().await {
            if let Err(e) = joined {
                error!(error = %e, "Index worker panicked");
            }
        }

        match &result {
            Ok(()) => info!("Indexer pipeline shutdown complete"),
            Err(e) => error!(error = %e, "Indexer pipeline failed"),
        }
        result
    }

    /// Build one tokenizer per worker.
    ///
    /// Dictionary loading is CPU-bound, so it runs on the blocking pool.
    async fn build_tokenizers(&self) -> Result<Vec<Arc<dyn Tokenizer>>, PipelineError> {
        let factory = self.tokenizer_factory.clone();
        let workers = self.config.workers;

        let tokenizers = tokio::task::spawn_blocking(move || {
            (0..workers)
                .map(|_| factory.build())
                .collect::<Result<Vec<_>, _>>()
        })
        .await
        .map_err(|e| PipelineError::startup("building tokenizers", e))??;

        info!(count = tokenizers.len(), "Built tokenizers");
        Ok(tokenizers)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    use miniflux_indexer_repository::{InMemoryEntrySource, InMemoryIndexInfoStore};

    struct CharTokenizer;

    impl Tokenizer for CharTokenizer {
        fn segment<'a>(&self, text: &'a str) -> Vec<&'a str> {
            text.char_indices()
                .filter(|(_, c)| !c.is_whitespace())
                .map(|(i, c)| &text[i..i + c.len_utf8()])
                .collect()
        }
    }

    /// Factory counting how many tokenizers it built.
    #[derive(Default)]
    struct CountingFactory {
        built: AtomicUsize,
        fail: bool,
    }

    impl TokenizerFactory for CountingFactory {
        fn build(&self) -> Result<Arc<dyn Tokenizer>, PipelineError> {
            if self.fail {
                return Err(PipelineError::startup(
                    "loading user dictionary",
                    "bad dictionary line",
                ));
            }
            self.built.fetch_add(1, Ordering::SeqCst);
            Ok(Arc::new(CharTokenizer))
        }
    }

    fn orchestrator(
        source: Arc<InMemoryEntrySource>,
        index_info: Arc<InMemoryIndexInfoStore>,
        factory: Arc<CountingFactory>,
        config: PipelineConfig,
    ) -> Orchestrator {
        Orchestrator::new(
            source,
            index_info,
            factory,
            BuildInfo::new("miniflux-indexer", "0.1.0"),
            config,
        )
    }

    #[tokio::test]
    async fn test_builds_one_tokenizer_per_worker() {
        let factory = Arc::new(CountingFactory::default());
        let orchestrator = orchestrator(
            Arc::new(InMemoryEntrySource::new()),
            Arc::new(InMemoryIndexInfoStore::new()),
            factory.clone(),
            PipelineConfig::default().with_workers(3),
        );

        let cancel = CancellationToken::new();
        cancel.cancel();
        orchestrator.run(cancel).await.unwrap();

        assert_eq!(factory.built.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_tokenizer_failure_is_startup_failure() {
        let factory = Arc::new(CountingFactory {
            fail: true,
            ..Default::default()
        });
        let orchestrator = orchestrator(
            Arc::new(InMemoryEntrySource::new()),
            Arc::new(InMemoryIndexInfoStore::new()),
            factory,
            PipelineConfig::default().with_workers(2),
        );

        let err = orchestrator.run(CancellationToken::new()).await.unwrap_err();
        assert!(err.is_fatal());
    }

    #[tokio::test]
    async fn test_invalid_config_is_rejected() {
        let orchestrator = orchestrator(
            Arc::new(InMemoryEntrySource::new()),
            Arc::new(InMemoryIndexInfoStore::new()),
            Arc::new(CountingFactory::default()),
            PipelineConfig::default().with_batch_size(0),
        );

        let err = orchestrator.run(CancellationToken::new()).await.unwrap_err();
        assert!(matches!(err, PipelineError::ConfigError(_)));
    }

    #[tokio::test]
    async fn test_oversized_batch_is_rejected_before_queue_creation() {
        let factory = Arc::new(CountingFactory::default());
        let orchestrator = orchestrator(
            Arc::new(InMemoryEntrySource::new()),
            Arc::new(InMemoryIndexInfoStore::new()),
            factory.clone(),
            PipelineConfig::default().with_batch_size(usize::MAX / 2),
        );

        let err = orchestrator.run(CancellationToken::new()).await.unwrap_err();
        assert!(matches!(err, PipelineError::ConfigError(_)));
        assert_eq!(factory.built.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_unreadable_watermark_stops_workers() {
        let index_info = Arc::new(InMemoryIndexInfoStore::new());
        index_info.set_fail_queries(true);
        let orchestrator = orchestrator(
            Arc::new(InMemoryEntrySource::new()),
            index_info,
            Arc::new(CountingFactory::default()),
            PipelineConfig::default().with_workers(2),
        );

        // Returns instead of hanging on idle workers
        let result = tokio::time::timeout(
            Duration::from_secs(5),
            orchestrator.run(CancellationToken::new()),
        )
        .await
        .unwrap();
        assert!(matches!(result, Err(PipelineError::StartupFailure { .. })));
    }

    #[tokio::test]
    async fn test_indexes_entries_until_cancelled() {
        let source = Arc::new(InMemoryEntrySource::with_entries([
            Entry::new(1, "你好", "你好世界"),
            Entry::new(2, "Hello", "The quick brown fox jumps over the lazy dog."),
        ]));
        let index_info = Arc::new(InMemoryIndexInfoStore::new());
        let orchestrator = orchestrator(
            source.clone(),
            index_info.clone(),
            Arc::new(CountingFactory::default()),
            PipelineConfig::default().with_workers(2).with_batch_size(10),
        );

        let cancel = CancellationToken::new();
        let run = tokio::spawn({
            let cancel = cancel.clone();
            async move { orchestrator.run(cancel).await }
        });

        for _ in 0..100 {
            if index_info.records().await.len() == 2 {
                break;
            }
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
        cancel.cancel();
        run.await.unwrap().unwrap();

        let records = index_info.records().await;
        assert_eq!(records.len(), 2);
        assert_eq!(source.vector_write_count(), 1);
    }
}
