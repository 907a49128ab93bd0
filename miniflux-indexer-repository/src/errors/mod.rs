//! Error types for the indexer repository.

mod store_error;

pub use store_error::StoreError;
