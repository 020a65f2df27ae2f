//! Title normalization.
//!
//! Converts raw title text into the cleaned token string used for
//! vectorization: lowercase, stop words and punctuation removed, and content
//! tokens optionally replaced by their lemma.

use thiserror::Error;

use crate::language::{LanguageError, LanguageModel};
use crate::models::Title;

/// Errors that can occur during normalization.
#[derive(Debug, Error)]
pub enum NormalizeError {
    /// The language model could not be used
    #[error("Language model unavailable: {0}")]
    ModelUnavailable(String),

    /// The language model failed while tagging
    #[error("Tagging failed: {0}")]
    Tagging(String),
}

impl From<LanguageError> for NormalizeError {
    fn from(err: LanguageError) -> Self {
        match err {
            LanguageError::ModelUnavailable(msg) => NormalizeError::ModelUnavailable(msg),
            LanguageError::Other(msg) => NormalizeError::Tagging(msg),
        }
    }
}

/// Result type for normalization.
pub type NormalizeResult<T> = Result<T, NormalizeError>;

/// Text normalizer backed by a language model.
pub struct Normalizer<M: LanguageModel> {
    model: M,
}

impl<M: LanguageModel> Normalizer<M> {
    pub fn new(model: M) -> Self {
        Self { model }
    }

    pub fn model(&self) -> &M {
        &self.model
    }

    /// Normalize raw text into space-separated content tokens.
    ///
    /// Empty input yields an empty string. When `use_lemma` is set each
    /// surviving token is replaced by its lemma.
    ///
    /// # Errors
    /// Returns `NormalizeError` if the language model fails; no partial
    /// output is produced.
    pub fn normalize(&self, raw_text: &str, use_lemma: bool) -> NormalizeResult<String> {
        let lower = raw_text.to_lowercase();
        let tokens = self.model.tokenize_and_tag(&lower)?;

        let cleaned = tokens
            .iter()
            .filter(|token| token.is_content())
            .map(|token| {
                if use_lemma {
                    token.lemma.trim()
                } else {
                    token.surface.trim()
                }
            })
            .filter(|form| !form.is_empty())
            .collect::<Vec<_>>()
            .join(" ");

        Ok(cleaned)
    }

    /// Normalize and keep both forms together.
    pub fn normalize_title(&self, raw_text: &str, use_lemma: bool) -> NormalizeResult<Title> {
        let normalized = self.normalize(raw_text, use_lemma)?;
        Ok(Title::new(raw_text, normalized))
    }
}
