//! Processor module for the indexer pipeline.
//!
//! Turns a raw entry into its language code and, for Mandarin text, the
//! segmented title and body. Nothing here performs I/O.

mod extract;
mod language;
mod text_processor;
mod tokenizer;

pub use extract::extract_readable_text;
pub use language::{
    detect_language, iso639_1, is_tokenizable, language_code, TOKENIZABLE_LANGUAGE, UNKNOWN_LANGUAGE,
};
pub use text_processor::{ProcessedEntry, TextProcessor};
pub use tokenizer::{JiebaTokenizer, JiebaTokenizerFactory, Tokenizer, TokenizerFactory};
