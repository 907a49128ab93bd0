//! End-to-end pipeline tests over the in-memory stores.

use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::Duration;

use miniflux_indexer_pipeline::processor::JiebaTokenizerFactory;
use miniflux_indexer_pipeline::{Orchestrator, PipelineConfig};
use miniflux_indexer_repository::{
    EntryImporter, InMemoryEntrySource, InMemoryIndexInfoStore,
};
use miniflux_indexer_shared::{BuildInfo, Entry};
use tokio_util::sync::CancellationToken;

const MANDARIN: &str = "<p>今天天气很好，我们一起去公园散步吧。</p>";
const ENGLISH: &str = "<p>The quick brown fox jumps over the lazy dog near the river bank.</p>";

fn entry(id: i64) -> Entry {
    if id % 2 == 0 {
        Entry::new(id, "你好", MANDARIN)
    } else {
        Entry::new(id, "Hello", ENGLISH)
    }
}

fn config() -> PipelineConfig {
    PipelineConfig::default()
        .with_workers(4)
        .with_batch_size(8)
        .with_scan_interval(Duration::from_millis(50))
        .with_entry_timeout(Duration::from_secs(10))
}

fn orchestrator(
    source: &Arc<InMemoryEntrySource>,
    index_info: &Arc<InMemoryIndexInfoStore>,
    config: PipelineConfig,
) -> Orchestrator {
    Orchestrator::new(
        source.clone(),
        index_info.clone(),
        Arc::new(JiebaTokenizerFactory::new()),
        BuildInfo::new("miniflux-indexer", "0.1.0"),
        config,
    )
}

/// Run until the store has seen `upserts` completion writes, then cancel.
async fn run_until(orchestrator: Orchestrator, index_info: &InMemoryIndexInfoStore, upserts: usize) {
    let cancel = CancellationToken::new();
    let handle = tokio::spawn({
        let cancel = cancel.clone();
        async move { orchestrator.run(cancel).await }
    });

    for _ in 0..500 {
        if index_info.upsert_count() >= upserts {
            break;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    cancel.cancel();

    handle.await.unwrap().unwrap();
    assert_eq!(index_info.upsert_count(), upserts);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_workers_record_each_entry_once() {
    let source = Arc::new(InMemoryEntrySource::with_entries((1..=100).map(entry)));
    let index_info = Arc::new(InMemoryIndexInfoStore::new());

    run_until(orchestrator(&source, &index_info, config()), &index_info, 100).await;

    let records = index_info.records().await;
    let ids: BTreeSet<i64> = records.iter().map(|r| r.id).collect();
    assert_eq!(records.len(), 100);
    assert_eq!(ids, (1..=100).collect::<BTreeSet<_>>());

    for record in &records {
        let expected = if record.id % 2 == 0 { "zh" } else { "en" };
        assert_eq!(record.language, expected, "entry {}", record.id);
    }

    // Only Mandarin entries get a vector
    assert_eq!(source.vector_write_count(), 50);
    assert!(source.document_vector(2).await.is_some());
    assert!(source.document_vector(1).await.is_none());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_mandarin_entry_is_segmented() {
    let source = Arc::new(InMemoryEntrySource::with_entries([Entry::new(
        1, "你好", "你好世界",
    )]));
    let index_info = Arc::new(InMemoryIndexInfoStore::new());

    run_until(orchestrator(&source, &index_info, config()), &index_info, 1).await;

    let vector = source.document_vector(1).await.unwrap();
    assert!(!vector.title.is_empty());
    assert!(!vector.content.is_empty());
    assert_eq!(index_info.records().await[0].language, "zh");
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_restart_resumes_and_reindex_rescans() {
    let source = Arc::new(InMemoryEntrySource::with_entries((1..=10).map(entry)));
    let index_info = Arc::new(InMemoryIndexInfoStore::new());

    run_until(orchestrator(&source, &index_info, config()), &index_info, 10).await;

    for id in 11..=15 {
        source.insert_entry(&entry(id)).await.unwrap();
    }

    // Only the new entries are processed after a restart
    run_until(orchestrator(&source, &index_info, config()), &index_info, 15).await;
    assert_eq!(index_info.records().await.len(), 15);

    // A reindex run processes everything again without duplicating records
    run_until(
        orchestrator(&source, &index_info, config().with_reindex(true)),
        &index_info,
        30,
    )
    .await;
    assert_eq!(index_info.records().await.len(), 15);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_cancel_returns_without_draining_queue() {
    let source = Arc::new(InMemoryEntrySource::with_entries((1..=2000).map(entry)));
    let index_info = Arc::new(InMemoryIndexInfoStore::new());
    let orchestrator = orchestrator(
        &source,
        &index_info,
        config()
            .with_workers(1)
            .with_batch_size(500)
            .with_scan_interval(Duration::from_secs(3600)),
    );

    let cancel = CancellationToken::new();
    let handle = tokio::spawn({
        let cancel = cancel.clone();
        async move { orchestrator.run(cancel).await }
    });

    while index_info.upsert_count() == 0 {
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    cancel.cancel();

    let result = tokio::time::timeout(Duration::from_secs(10), handle).await;
    assert!(result.is_ok(), "pipeline did not stop after cancellation");
    assert!(index_info.upsert_count() < 2000);
}
