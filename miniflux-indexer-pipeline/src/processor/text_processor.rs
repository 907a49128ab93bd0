use miniflux_indexer_shared::{DocumentTokens, Entry};
use tracing::debug;

use super::extract::extract_readable_text;
use super::language::{detect_language, is_tokenizable, language_code};
use super::tokenizer::Tokenizer;

/// Result of processing one entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessedEntry {
    pub entry_id: i64,
    /// ISO 639-1 code, or `unknown`.
    pub language: String,
    /// Segmented title and body; present only for the tokenizable language.
    pub tokens: Option<DocumentTokens>,
}

impl ProcessedEntry {
    pub fn is_tokenized(&self) -> bool {
        self.tokens.is_some()
    }
}

/// Stateless entry processor.
///
/// The tokenizer is passed per call so that each worker keeps its own
/// instance.
#[derive(Debug, Clone, Copy, Default)]
pub struct TextProcessor;

impl TextProcessor {
    pub fn new() -> Self {
        Self
    }

    /// Extract, detect and, for Mandarin, segment one entry.
    ///
    /// # Arguments
    ///
    /// * `entry` - The entry snapshot to process
    /// * `tokenizer` - The calling worker's tokenizer
    ///
    /// # Returns
    ///
    /// The detected language and, when it is tokenizable, the title and body
    /// segmented independently.
    pub fn process(&self, entry: &Entry, tokenizer: &dyn Tokenizer) -> ProcessedEntry {
        let body = extract_readable_text(&entry.content);
        let detected = detect_language(&body);
        let language = language_code(detected);

        let tokens = if is_tokenizable(detected) {
            let title = tokenizer.segment(&entry.title);
            let content = tokenizer.segment(&body);
            Some(DocumentTokens::from_tokens(title, content))
        } else {
            None
        };

        debug!(
            entry_id = entry.id,
            language,
            body_chars = body.chars().count(),
            tokenized = tokens.is_some(),
            "Processed entry"
        );

        ProcessedEntry {
            entry_id: entry.id,
            language: language.to_string(),
            tokens,
        }
    }
}
