//! Interface definitions for the indexer stores.
//!
//! The pipeline only depends on these traits, so backends can be swapped
//! for in-memory fakes in tests.

mod entry_source;
mod index_info_store;

pub use entry_source::{EntryBatch, EntryImporter, EntrySource};
pub use index_info_store::IndexInfoStore;
