//! PostgreSQL implementation of the indexer stores.
//!
//! The metadata store (`index_info`) and the source store (`entries`) are
//! independent connection pools; they may point at the same database.

mod connection;
mod entry_source;
mod index_info_store;
mod queries;

pub use connection::{connect_pool, redact_url, StoreConnectOptions};
pub use entry_source::PgEntrySource;
pub use index_info_store::PgIndexInfoStore;
