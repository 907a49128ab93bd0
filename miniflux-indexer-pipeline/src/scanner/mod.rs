//! Scanner module for the indexer pipeline.
//!
//! Reads entries above the watermark in id order and feeds them into the
//! bounded queue.

mod cursor_scanner;

pub use cursor_scanner::{CursorScanner, ScanState, WATERMARK_QUERY_TIMEOUT};
