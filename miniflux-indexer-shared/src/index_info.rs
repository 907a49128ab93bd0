//! Completion records.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Durable marker that an entry has been fully processed.
///
/// At most one record exists per entry id. Its presence means the entry was
/// either tokenized and vectorized, or classified as a language that is not
/// segmented.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexInfo {
    /// Entry id this record belongs to.
    pub id: i64,
    /// Time of the last write of this record.
    pub indexed_at: DateTime<Utc>,
    /// Detected language code.
    pub language: String,
    /// Free-form metadata about the indexing run.
    pub meta: IndexMeta,
}

/// Extensible key-value metadata stored alongside a completion record.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct IndexMeta(Map<String, Value>);

impl IndexMeta {
    /// Create empty metadata.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a key, replacing any previous value.
    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.0.insert(key.into(), value.into());
        self
    }

    /// Look up a key.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_meta_serializes_as_plain_object() {
        let meta = IndexMeta::new()
            .with("indexer_version", "0.1.0")
            .with("title_tokens", 3);
        let json = serde_json::to_string(&meta).unwrap();
        assert_eq!(json, r#"{"indexer_version":"0.1.0","title_tokens":3}"#);
    }

    #[test]
    fn test_meta_with_replaces_existing_key() {
        let meta = IndexMeta::new().with("k", 1).with("k", 2);
        assert_eq!(meta.get("k"), Some(&Value::from(2)));
    }
}
