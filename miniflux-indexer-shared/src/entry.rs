//! Source entries and the token strings derived from them.

use serde::{Deserialize, Serialize};

/// A feed entry as stored in the source database.
///
/// Entries are read-only snapshots; the indexer only ever writes the
/// derived search vector back to the source store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entry {
    /// Primary key of the entry in the source store.
    pub id: i64,
    /// Entry title, plain text.
    pub title: String,
    /// Entry body, usually HTML.
    pub content: String,
}

impl Entry {
    /// Create a new entry snapshot.
    pub fn new(id: i64, title: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            id,
            title: title.into(),
            content: content.into(),
        }
    }
}

/// Whitespace-joined segmentation output for one entry.
///
/// Title tokens are weighted higher than content tokens when the search
/// vector is built.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DocumentTokens {
    /// Segmented title, tokens separated by a single space.
    pub title: String,
    /// Segmented readable body, tokens separated by a single space.
    pub content: String,
}

impl DocumentTokens {
    /// Join two token sequences into their whitespace-separated form.
    ///
    /// Emission order and duplicates are preserved.
    pub fn from_tokens<'a>(
        title: impl IntoIterator<Item = &'a str>,
        content: impl IntoIterator<Item = &'a str>,
    ) -> Self {
        Self {
            title: title.into_iter().collect::<Vec<_>>().join(" "),
            content: content.into_iter().collect::<Vec<_>>().join(" "),
        }
    }

    /// Number of title tokens.
    pub fn title_token_count(&self) -> usize {
        self.title.split_whitespace().count()
    }

    /// Number of content tokens.
    pub fn content_token_count(&self) -> usize {
        self.content.split_whitespace().count()
    }
}
