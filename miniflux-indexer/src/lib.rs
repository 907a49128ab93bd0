//! # Miniflux Indexer
//!
//! Main library for the miniflux entry indexer.
//!
//! This crate provides the command line, logging set-up and dependency
//! wiring for the `miniflux-indexer` and `miniflux-entry-loader` binaries.

pub mod build_info;
pub mod config;
pub mod logging;
pub mod signal;

pub use config::{Cli, Command, Dependencies, LoaderCli, StartArgs};

use thiserror::Error;

/// Errors that can occur during indexer initialization or execution.
#[derive(Error, Debug)]
pub enum IndexingError {
    /// Configuration error.
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// Pipeline error.
    #[error("Pipeline error: {0}")]
    PipelineError(#[from] miniflux_indexer_pipeline::PipelineError),

    /// Store error.
    #[error("Store error: {0}")]
    StoreError(#[from] miniflux_indexer_repository::StoreError),

    /// IO error.
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

impl IndexingError {
    /// Create a configuration error.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::ConfigError(msg.into())
    }
}
