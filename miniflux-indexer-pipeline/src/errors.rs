//! Error types for the indexer pipeline.
//!
//! Only [`PipelineError::StartupFailure`] ever leaves the pipeline. Batch and
//! entry failures are logged where they happen and the loop continues.

use std::time::Duration;

use miniflux_indexer_repository::StoreError;
use thiserror::Error;

/// Boxed cause for failures that do not come from a store.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Errors that can occur in the indexer pipeline.
#[derive(Error, Debug)]
pub enum PipelineError {
    /// The pipeline could not be started (store unreachable, watermark
    /// unreadable, tokenizer could not be built).
    #[error("Startup failure: {context}: {source}")]
    StartupFailure {
        context: String,
        #[source]
        source: BoxError,
    },

    /// A scan query failed; the scanner treats it as an empty batch.
    #[error("Batch query failure: {0}")]
    BatchQueryFailure(#[source] StoreError),

    /// Text extraction, detection or segmentation failed for an entry.
    #[error("Processing failure for entry {entry_id}: {source}")]
    ProcessingFailure {
        entry_id: i64,
        #[source]
        source: BoxError,
    },

    /// A vector write or completion upsert failed for an entry.
    #[error("Write failure for entry {entry_id}: {source}")]
    WriteFailure {
        entry_id: i64,
        #[source]
        source: StoreError,
    },

    /// Processing an entry took longer than the per-entry deadline.
    #[error("Entry {entry_id} exceeded its {timeout:?} deadline")]
    DeadlineExceeded { entry_id: i64, timeout: Duration },

    /// Invalid pipeline configuration.
    #[error("Configuration error: {0}")]
    ConfigError(String),
}

impl PipelineError {
    /// Create a startup failure.
    pub fn startup(context: impl Into<String>, source: impl Into<BoxError>) -> Self {
        Self::StartupFailure {
            context: context.into(),
            source: source.into(),
        }
    }

    /// Create a processing failure.
    pub fn processing(entry_id: i64, source: impl Into<BoxError>) -> Self {
        Self::ProcessingFailure {
            entry_id,
            source: source.into(),
        }
    }

    /// Create a write failure.
    pub fn write(entry_id: i64, source: StoreError) -> Self {
        Self::WriteFailure { entry_id, source }
    }

    /// Create a configuration error.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::ConfigError(msg.into())
    }

    /// Entry the failure is scoped to, if any.
    pub fn entry_id(&self) -> Option<i64> {
        match self {
            Self::ProcessingFailure { entry_id, .. }
            | Self::WriteFailure { entry_id, .. }
            | Self::DeadlineExceeded { entry_id, .. } => Some(*entry_id),
            _ => None,
        }
    }

    /// Whether this failure aborts the pipeline rather than a single entry
    /// or batch.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::StartupFailure { .. } | Self::ConfigError(_))
    }
}
