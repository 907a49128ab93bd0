//! # Miniflux Indexer Pipeline
//!
//! This crate provides the pipeline that keeps miniflux entries indexed for
//! full-text search.
//!
//! ## Architecture
//!
//! ```text
//! CursorScanner → bounded queue (2 × batch size) → IndexWorker × N
//!                                                   ├─ TextProcessor
//!                                                   └─ IndexWriter
//! ```
//!
//! 1. **Scanner**: Reads entries above the watermark in id-ordered batches
//! 2. **Processor**: Extracts readable text, detects the language, and
//!    segments Mandarin text
//! 3. **Writer**: Updates the search vector and upserts the completion record
//! 4. **Orchestrator**: Owns the queue and the worker pool, and propagates
//!    one cancellation signal to every component

pub mod config;
pub mod errors;
pub mod orchestrator;
pub mod processor;
pub mod scanner;
pub mod worker;
pub mod writer;

pub use config::PipelineConfig;
pub use errors::PipelineError;
pub use orchestrator::Orchestrator;
