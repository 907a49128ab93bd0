//! # Miniflux Indexer Repository
//!
//! This crate provides the store interfaces used by the indexing pipeline,
//! a PostgreSQL implementation of them, an in-memory implementation for
//! tests and local runs, and the bulk entry importer.

pub mod errors;
pub mod import;
pub mod interfaces;
pub mod memory;
pub mod postgres;

pub use errors::StoreError;
pub use import::import_entries;
pub use interfaces::{EntryBatch, EntryImporter, EntrySource, IndexInfoStore};
pub use memory::{InMemoryEntrySource, InMemoryIndexInfoStore};
pub use postgres::{PgEntrySource, PgIndexInfoStore, StoreConnectOptions};
