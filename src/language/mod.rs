//! Linguistic annotation abstraction and implementations.
//!
//! This module defines the interface for tokenizing text and tagging each token
//! as a stop word, punctuation, or content, together with its lemma. The text
//! normalizer depends only on this trait, so any conforming implementation
//! (rule-based, statistical, or ML-based) can be swapped in.

pub mod rule_based;

use thiserror::Error;

pub use rule_based::RuleBasedModel;

/// Errors that can occur during linguistic annotation.
#[derive(Debug, Error)]
pub enum LanguageError {
    /// The annotation resource could not be loaded or is not ready
    #[error("Language model unavailable: {0}")]
    ModelUnavailable(String),

    /// Other unexpected errors
    #[error("Unexpected language model error: {0}")]
    Other(String),
}

/// Result type for language model operations.
pub type LanguageResult<T> = Result<T, LanguageError>;

/// A token produced by a language model, with its annotations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaggedToken {
    /// Token text as it appears in the input
    pub surface: String,

    /// Canonical dictionary form (equal to `surface` when unknown)
    pub lemma: String,

    /// Whether the token is a stop word
    pub is_stop: bool,

    /// Whether the token consists only of punctuation
    pub is_punct: bool,
}

impl TaggedToken {
    /// True for tokens that survive stop-word and punctuation filtering.
    pub fn is_content(&self) -> bool {
        !self.is_stop && !self.is_punct
    }
}

/// Trait for linguistic annotation providers.
///
/// Implementors split text into tokens and tag each one. The trait is
/// synchronous: annotation is CPU-bound and runs once per query.
///
/// # Example Usage
/// ```ignore
/// let model = RuleBasedModel::english();
/// let tokens = model.tokenize_and_tag("exercise for knee pain")?;
/// assert!(tokens[1].is_stop);
/// ```
pub trait LanguageModel: Send + Sync {
    /// Tokenize the given text and tag every token.
    ///
    /// # Errors
    /// Returns `LanguageError::ModelUnavailable` if the model resource is not
    /// usable.
    fn tokenize_and_tag(&self, text: &str) -> LanguageResult<Vec<TaggedToken>>;

    /// Get the model name/identifier for this provider.
    fn name(&self) -> &str;
}

impl<M: LanguageModel + ?Sized> LanguageModel for Box<M> {
    fn tokenize_and_tag(&self, text: &str) -> LanguageResult<Vec<TaggedToken>> {
        (**self).tokenize_and_tag(text)
    }

    fn name(&self) -> &str {
        (**self).name()
    }
}

impl<M: LanguageModel + ?Sized> LanguageModel for std::sync::Arc<M> {
    fn tokenize_and_tag(&self, text: &str) -> LanguageResult<Vec<TaggedToken>> {
        (**self).tokenize_and_tag(text)
    }

    fn name(&self) -> &str {
        (**self).name()
    }
}
