//! Search configuration.
//!
//! Settings are read from an optional TOML file; every field has a default
//! matching the dashboard's behaviour (5 results, at most 20, unigrams,
//! lemmatized titles).
//!
//! ```toml
//! default_top_k = 5
//! max_top_k = 20
//! min_ngram = 1
//! max_ngram = 1
//! use_lemma = true
//! max_corpus_size = 50000
//! lexicon_path = "lexicon/en.toml"
//! ```

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::vectorize::NgramRange;
use crate::{DEFAULT_TOP_K, MAX_TOP_K};

/// Errors that can occur while loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Cannot read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Malformed config file: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Result type for configuration operations.
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Configuration for title search.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    /// Number of results when the caller does not ask for a count
    pub default_top_k: usize,

    /// Upper bound on the number of results a caller may request
    pub max_top_k: usize,

    /// Shortest n-gram used as a vocabulary unit
    pub min_ngram: usize,

    /// Longest n-gram used as a vocabulary unit
    pub max_ngram: usize,

    /// Whether titles are lemmatized before vectorization
    pub use_lemma: bool,

    /// Largest corpus accepted at load time
    pub max_corpus_size: Option<usize>,

    /// Lexicon file for the rule-based language model (built-in when unset)
    pub lexicon_path: Option<PathBuf>,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            default_top_k: DEFAULT_TOP_K,
            max_top_k: MAX_TOP_K,
            min_ngram: 1,
            max_ngram: 1,
            use_lemma: true,
            max_corpus_size: None,
            lexicon_path: None,
        }
    }
}

impl SearchConfig {
    /// Load and validate configuration from a TOML file.
    pub fn from_file(path: impl AsRef<Path>) -> ConfigResult<Self> {
        let raw = std::fs::read_to_string(path)?;
        Self::from_toml(&raw)
    }

    /// Parse and validate configuration from a TOML string.
    pub fn from_toml(raw: &str) -> ConfigResult<Self> {
        let config: SearchConfig = toml::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    /// Check the settings for internal consistency.
    pub fn validate(&self) -> ConfigResult<()> {
        if self.max_top_k == 0 {
            return Err(ConfigError::Invalid("max_top_k must be at least 1".to_string()));
        }
        if self.default_top_k == 0 || self.default_top_k > self.max_top_k {
            return Err(ConfigError::Invalid(format!(
                "default_top_k {} outside 1-{}",
                self.default_top_k, self.max_top_k
            )));
        }
        self.ngram_range()?;
        if self.max_corpus_size == Some(0) {
            return Err(ConfigError::Invalid("max_corpus_size must be at least 1".to_string()));
        }
        Ok(())
    }

    pub fn ngram_range(&self) -> ConfigResult<NgramRange> {
        NgramRange::new(self.min_ngram, self.max_ngram).map_err(|e| ConfigError::Invalid(e.to_string()))
    }

    /// Clamp a requested result count to `[1, max_top_k]`.
    pub fn clamp_top_k(&self, requested: Option<usize>) -> usize {
        requested
            .unwrap_or(self.default_top_k)
            .clamp(1, self.max_top_k)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let config = SearchConfig::default();
        assert_eq!(config.default_top_k, 5);
        assert_eq!(config.max_top_k, 20);
        assert_eq!(config.ngram_range().unwrap(), NgramRange::unigrams());
        assert!(config.use_lemma);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let config = SearchConfig::from_toml("max_ngram = 2\nuse_lemma = false").unwrap();
        assert_eq!(config.max_ngram, 2);
        assert!(!config.use_lemma);
        assert_eq!(config.default_top_k, 5);
    }

    #[test]
    fn test_invalid_values_rejected() {
        assert!(matches!(
            SearchConfig::from_toml("default_top_k = 30"),
            Err(ConfigError::Invalid(_))
        ));
        assert!(matches!(
            SearchConfig::from_toml("min_ngram = 3\nmax_ngram = 2"),
            Err(ConfigError::Invalid(_))
        ));
        assert!(matches!(
            SearchConfig::from_toml("max_top_k = \"many\""),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn test_clamp_top_k() {
        let config = SearchConfig::default();
        assert_eq!(config.clamp_top_k(None), 5);
        assert_eq!(config.clamp_top_k(Some(0)), 1);
        assert_eq!(config.clamp_top_k(Some(50)), 20);
        assert_eq!(config.clamp_top_k(Some(7)), 7);
    }

    #[test]
    fn test_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "default_top_k = 10\nmax_corpus_size = 1000").unwrap();
        let config = SearchConfig::from_file(file.path()).unwrap();
        assert_eq!(config.default_top_k, 10);
        assert_eq!(config.max_corpus_size, Some(1000));

        assert!(matches!(
            SearchConfig::from_file("/nonexistent/search.toml"),
            Err(ConfigError::Io(_))
        ));
    }
}
