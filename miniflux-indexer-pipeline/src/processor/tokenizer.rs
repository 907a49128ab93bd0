//! Word segmentation for Mandarin text built on `jieba-rs`.

use std::io::Cursor;
use std::path::Path;
use std::sync::Arc;

use jieba_rs::Jieba;
use tracing::info;

use crate::errors::PipelineError;

/// Splits text into word tokens.
///
/// Segmentation must be deterministic: the same input and dictionary always
/// produce the same tokens in the same order.
pub trait Tokenizer: Send + Sync {
    /// Segment `text`, keeping emission order and duplicates.
    fn segment<'a>(&self, text: &'a str) -> Vec<&'a str>;
}

/// Builds one tokenizer per worker.
///
/// Construction loads a full dictionary and is expensive, so workers build
/// their tokenizer once and reuse it for every entry.
pub trait TokenizerFactory: Send + Sync {
    fn build(&self) -> Result<Arc<dyn Tokenizer>, PipelineError>;
}

/// Tokenizer backed by the jieba segmenter in accurate mode with HMM.
pub struct JiebaTokenizer {
    jieba: Jieba,
}

impl JiebaTokenizer {
    /// Create a tokenizer with the bundled dictionary.
    pub fn new() -> Self {
        Self {
            jieba: Jieba::new(),
        }
    }

    /// Create a tokenizer with the bundled dictionary extended by
    /// `user_dictionary` (jieba dictionary format, one `word [freq] [tag]`
    /// per line).
    pub fn with_user_dictionary(user_dictionary: &[u8]) -> Result<Self, PipelineError> {
        let mut jieba = Jieba::new();
        jieba
            .load_dict(&mut Cursor::new(user_dictionary))
            .map_err(|e| PipelineError::startup("loading user dictionary", e.to_string()))?;
        Ok(Self { jieba })
    }
}

impl Default for JiebaTokenizer {
    fn default() -> Self {
        Self::new()
    }
}

impl Tokenizer for JiebaTokenizer {
    fn segment<'a>(&self, text: &'a str) -> Vec<&'a str> {
        self.jieba
            .cut(text, true)
            .into_iter()
            .filter(|token| !token.trim().is_empty())
            .collect()
    }
}

/// Factory for [`JiebaTokenizer`]s sharing one optional user dictionary.
#[derive(Clone, Default)]
pub struct JiebaTokenizerFactory {
    user_dictionary: Option<Arc<[u8]>>,
}

impl JiebaTokenizerFactory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Read a user dictionary file once; every built tokenizer loads it.
    pub fn with_user_dictionary_file(path: &Path) -> Result<Self, PipelineError> {
        let bytes = std::fs::read(path).map_err(|e| {
            PipelineError::startup(format!("reading user dictionary {}", path.display()), e)
        })?;
        info!(path = %path.display(), bytes = bytes.len(), "Loaded user dictionary");
        Ok(Self {
            user_dictionary: Some(Arc::from(bytes)),
        })
    }

    /// Use an in-memory user dictionary.
    pub fn with_user_dictionary(dictionary: impl Into<Arc<[u8]>>) -> Self {
        Self {
            user_dictionary: Some(dictionary.into()),
        }
    }
}

impl TokenizerFactory for JiebaTokenizerFactory {
    fn build(&self) -> Result<Arc<dyn Tokenizer>, PipelineError> {
        let tokenizer = match &self.user_dictionary {
            Some(dictionary) => JiebaTokenizer::with_user_dictionary(dictionary)?,
            None => JiebaTokenizer::new(),
        };
        Ok(Arc::new(tokenizer))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_segments_mandarin() {
        let tokenizer = JiebaTokenizer::new();
        let tokens = tokenizer.segment("我们中出了一个叛徒");
        assert!(tokens.len() > 1);
        assert_eq!(tokens.concat(), "我们中出了一个叛徒");
    }

    #[test]
    fn test_drops_whitespace_tokens() {
        let tokenizer = JiebaTokenizer::new();
        let tokens = tokenizer.segment("你好 世界");
        assert!(tokens.iter().all(|t| !t.trim().is_empty()));
        assert_eq!(tokens.concat(), "你好世界");
    }

    #[test]
    fn test_segmentation_is_deterministic() {
        let first = JiebaTokenizer::new();
        let second = JiebaTokenizer::new();
        let text = "南京市长江大桥欢迎您。南京市长江大桥欢迎您。";
        assert_eq!(first.segment(text), second.segment(text));
        assert_eq!(first.segment(text), first.segment(text));
    }

    #[test]
    fn test_user_dictionary_keeps_custom_word() {
        let factory = JiebaTokenizerFactory::with_user_dictionary(
            "小清新阅读器 100000 n\n".as_bytes().to_vec(),
        );
        let tokenizer = factory.build().unwrap();
        let tokens = tokenizer.segment("我喜欢小清新阅读器");
        assert!(tokens.contains(&"小清新阅读器"));
    }

    #[test]
    fn test_missing_user_dictionary_is_startup_failure() {
        let result =
            JiebaTokenizerFactory::with_user_dictionary_file(Path::new("/nonexistent/dict.txt"));
        assert!(matches!(
            result,
            Err(PipelineError::StartupFailure { .. })
        ));
    }
}
