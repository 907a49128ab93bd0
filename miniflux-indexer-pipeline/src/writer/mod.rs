//! Writer module for the indexer pipeline.
//!
//! Persists processing results: the weighted search vector on the source
//! entry, then the completion record in the metadata store.

use std::sync::Arc;
use tracing::{debug, instrument};

use crate::errors::PipelineError;
use crate::processor::ProcessedEntry;
use miniflux_indexer_repository::{EntrySource, IndexInfoStore};
use miniflux_indexer_shared::{BuildInfo, DocumentTokens, IndexMeta};

/// Metadata key holding the indexer version that produced a record.
pub const META_INDEXER_VERSION: &str = "indexer_version";
/// Metadata key holding the number of title tokens.
pub const META_TITLE_TOKENS: &str = "title_tokens";
/// Metadata key holding the number of content tokens.
pub const META_CONTENT_TOKENS: &str = "content_tokens";

/// Writer shared by every worker.
///
/// Both writes are safe to repeat, so an entry delivered twice ends in the
/// same state as one delivered once.
pub struct IndexWriter {
    source: Arc<dyn EntrySource>,
    index_info: Arc<dyn IndexInfoStore>,
    build_info: BuildInfo,
}

impl IndexWriter {
    pub fn new(
        source: Arc<dyn EntrySource>,
        index_info: Arc<dyn IndexInfoStore>,
        build_info: BuildInfo,
    ) -> Self {
        Self {
            source,
            index_info,
            build_info,
        }
    }

    /// Persist one processed entry.
    ///
    /// The vector write, when there are tokens, happens before the completion
    /// upsert. If it fails the upsert is skipped and the entry stays
    /// unrecorded.
    #[instrument(skip(self, processed), fields(entry_id = processed.entry_id, language = %processed.language))]
    pub async fn write(&self, processed: &ProcessedEntry) -> Result<(), PipelineError> {
        if let Some(tokens) = &processed.tokens {
            self.write_document_vector(processed.entry_id, tokens).await?;
        }

        let meta = self.completion_meta(processed.tokens.as_ref());
        self.upsert_completion(processed.entry_id, &processed.language, &meta)
            .await
    }

    /// Replace the weighted search vector of an entry.
    pub async fn write_document_vector(
        &self,
        entry_id: i64,
        tokens: &DocumentTokens,
    ) -> Result<(), PipelineError> {
        self.source
            .update_document_vector(entry_id, tokens)
            .await
            .map_err(|e| PipelineError::write(entry_id, e))?;

        debug!(
            entry_id,
            title_tokens = tokens.title_token_count(),
            content_tokens = tokens.content_token_count(),
            "Updated document vector"
        );
        Ok(())
    }

    /// Insert or overwrite the completion record of an entry.
    pub async fn upsert_completion(
        &self,
        entry_id: i64,
        language: &str,
        meta: &IndexMeta,
    ) -> Result<(), PipelineError> {
        self.index_info
            .upsert_index_info(entry_id, language, meta)
            .await
            .map_err(|e| PipelineError::write(entry_id, e))?;

        debug!(entry_id, language, "Recorded completion");
        Ok(())
    }

    fn completion_meta(&self, tokens: Option<&DocumentTokens>) -> IndexMeta {
        let meta = IndexMeta::new().with(META_INDEXER_VERSION, self.build_info.version.clone());
        match tokens {
            Some(tokens) => meta
                .with(META_TITLE_TOKENS, tokens.title_token_count())
                .with(META_CONTENT_TOKENS, tokens.content_token_count()),
            None => meta,
        }
    }
}
