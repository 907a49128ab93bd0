//! # Miniflux Indexer Shared
//!
//! Plain data types passed between the repository, the pipeline and the
//! indexer binary. Nothing in this crate performs I/O.

mod build_info;
mod entry;
mod index_info;

pub use build_info::BuildInfo;
pub use entry::{DocumentTokens, Entry};
pub use index_info::{IndexInfo, IndexMeta};
