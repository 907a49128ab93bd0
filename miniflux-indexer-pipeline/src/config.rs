//! Configuration for the indexing pipeline.

use std::num::NonZeroUsize;
use std::time::Duration;

use crate::errors::PipelineError;

/// Default sleep after an empty or partial batch.
pub const DEFAULT_SCAN_INTERVAL: Duration = Duration::from_secs(30);

/// Default number of rows per scan query.
pub const DEFAULT_BATCH_SIZE: usize = 100;

/// Largest accepted number of rows per scan query.
pub const MAX_BATCH_SIZE: usize = 10_000;

/// Default deadline for processing one entry.
pub const DEFAULT_ENTRY_TIMEOUT: Duration = Duration::from_secs(3);

/// Configuration for the indexing pipeline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineConfig {
    /// Ignore existing completion records and rescan from id 0.
    pub reindex: bool,
    /// Sleep after an empty or partial batch.
    pub scan_interval: Duration,
    /// Rows per scan query; the queue holds twice this many entries.
    pub batch_size: usize,
    /// Number of workers.
    pub workers: usize,
    /// Deadline for processing one entry.
    pub entry_timeout: Duration,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            reindex: false,
            scan_interval: DEFAULT_SCAN_INTERVAL,
            batch_size: DEFAULT_BATCH_SIZE,
            workers: default_workers(),
            entry_timeout: DEFAULT_ENTRY_TIMEOUT,
        }
    }
}

impl PipelineConfig {
    pub fn with_reindex(mut self, reindex: bool) -> Self {
        self.reindex = reindex;
        self
    }

    pub fn with_scan_interval(mut self, scan_interval: Duration) -> Self {
        self.scan_interval = scan_interval;
        self
    }

    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size;
        self
    }

    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers;
        self
    }

    pub fn with_entry_timeout(mut self, entry_timeout: Duration) -> Self {
        self.entry_timeout = entry_timeout;
        self
    }

    /// Capacity of the queue between the scanner and the workers.
    pub fn queue_capacity(&self) -> usize {
        self.batch_size.saturating_mul(2).max(1)
    }

    /// Check the configuration before anything is started.
    pub fn validate(&self) -> Result<(), PipelineError> {
        if self.batch_size == 0 {
            return Err(PipelineError::config("batch size must be at least 1"));
        }
        if self.batch_size > MAX_BATCH_SIZE {
            return Err(PipelineError::config(format!(
                "batch size must be at most {MAX_BATCH_SIZE}, got {}",
                self.batch_size
            )));
        }
        if self.workers == 0 {
            return Err(PipelineError::config("worker count must be at least 1"));
        }
        if self.scan_interval.is_zero() {
            return Err(PipelineError::config("scan interval must be positive"));
        }
        if self.entry_timeout.is_zero() {
            return Err(PipelineError::config("entry timeout must be positive"));
        }
        Ok(())
    }
}

/// Number of workers when none is configured: the available parallelism.
pub fn default_workers() -> usize {
    std::thread::available_parallelism()
        .map(NonZeroUsize::get)
        .unwrap_or(1)
}
