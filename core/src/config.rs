use crate::error::{IndexError, Result};
use crate::tokenizer::Tokenizer;
use serde::{Deserialize, Serialize};
use std::path::Path;

pub const DEFAULT_LIMIT: usize = 10;

fn default_limit() -> usize {
    DEFAULT_LIMIT
}

/// Build-time settings for an [`Index`](crate::Index).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexConfig {
    /// Replaces the default stop-word list when set.
    #[serde(default)]
    pub stop_words: Option<Vec<String>>,
    /// Bulk builds skip files that yield no terms instead of failing.
    #[serde(default)]
    pub skip_empty_documents: bool,
    #[serde(default = "default_limit")]
    pub default_limit: usize,
}

impl Default for IndexConfig {
    fn default() -> Self {
        Self { stop_words: None, skip_empty_documents: false, default_limit: DEFAULT_LIMIT }
    }
}

impl IndexConfig {
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|e| IndexError::io(path, e))?;
        Self::from_json_str(&raw)
    }

    pub fn from_json_str(raw: &str) -> Result<Self> {
        serde_json::from_str(raw).map_err(|e| IndexError::Config(e.to_string()))
    }

    pub fn tokenizer(&self) -> Tokenizer {
        match &self.stop_words {
            Some(words) => Tokenizer::with_stop_words(words),
            None => Tokenizer::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_object_uses_defaults() {
        let cfg = IndexConfig::from_json_str("{}").unwrap();
        assert!(cfg.stop_words.is_none());
        assert!(!cfg.skip_empty_documents);
        assert_eq!(cfg.default_limit, 10);
        assert!(cfg.tokenizer().is_stop_word("the"));
    }

    #[test]
    fn custom_stop_words_replace_defaults() {
        let cfg = IndexConfig::from_json_str(r#"{"stop_words": ["Foo"], "default_limit": 3}"#).unwrap();
        let tok = cfg.tokenizer();
        assert!(tok.is_stop_word("foo"));
        assert!(!tok.is_stop_word("the"));
        assert_eq!(cfg.default_limit, 3);
    }

    #[test]
    fn malformed_json_is_config_error() {
        let err = IndexConfig::from_json_str("{ nope").unwrap_err();
        assert!(matches!(err, IndexError::Config(_)));
    }
}
