//! TF-IDF vector space construction.
//!
//! Builds a term-frequency / inverse-document-frequency space over a small set
//! of documents, with word n-grams as vocabulary units. Weights follow the
//! common smoothed formulation: `idf = ln((1 + n) / (1 + df)) + 1`, raw counts
//! for term frequency, and L2-normalized rows.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use once_cell::sync::Lazy;
use regex::Regex;
use thiserror::Error;

/// Runs of two or more word characters.
static WORD_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\b\w\w+\b").expect("word pattern is valid"));

/// Errors raised while configuring the vectorizer.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum VectorizeError {
    #[error("Invalid n-gram range: min={min}, max={max} (expected 1 <= min <= max)")]
    InvalidNgramRange { min: usize, max: usize },
}

/// Inclusive range of n-gram lengths used as vocabulary units.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NgramRange {
    min: usize,
    max: usize,
}

impl NgramRange {
    /// Validate and build an n-gram range.
    ///
    /// # Errors
    /// Returns `VectorizeError::InvalidNgramRange` if either bound is zero or
    /// `min > max`.
    pub fn new(min: usize, max: usize) -> Result<Self, VectorizeError> {
        if min < 1 || max < 1 || min > max {
            return Err(VectorizeError::InvalidNgramRange { min, max });
        }
        Ok(Self { min, max })
    }

    pub fn unigrams() -> Self {
        Self { min: 1, max: 1 }
    }

    pub fn min(&self) -> usize {
        self.min
    }

    pub fn max(&self) -> usize {
        self.max
    }
}

impl Default for NgramRange {
    fn default() -> Self {
        Self::unigrams()
    }
}

/// Sparse vector as `(term_id, weight)` pairs sorted by term id.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SparseVector {
    entries: Vec<(usize, f64)>,
}

impl SparseVector {
    fn from_map(weights: BTreeMap<usize, f64>) -> Self {
        Self {
            entries: weights.into_iter().filter(|(_, w)| *w != 0.0).collect(),
        }
    }

    pub fn entries(&self) -> &[(usize, f64)] {
        &self.entries
    }

    pub fn is_zero(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn norm(&self) -> f64 {
        self.entries.iter().map(|(_, w)| w * w).sum::<f64>().sqrt()
    }

    pub fn dot(&self, other: &SparseVector) -> f64 {
        let (mut i, mut j) = (0, 0);
        let mut sum = 0.0;
        while i < self.entries.len() && j < other.entries.len() {
            let (a_id, a_w) = self.entries[i];
            let (b_id, b_w) = other.entries[j];
            match a_id.cmp(&b_id) {
                std::cmp::Ordering::Less => i += 1,
                std::cmp::Ordering::Greater => j += 1,
                std::cmp::Ordering::Equal => {
                    sum += a_w * b_w;
                    i += 1;
                    j += 1;
                }
            }
        }
        sum
    }
}

/// Compute cosine similarity between two sparse vectors.
///
/// Returns 0 when either vector is all-zero. The result is clamped to
/// `[0, 1]`, which holds for non-negative TF-IDF weights up to rounding.
pub fn cosine_similarity(a: &SparseVector, b: &SparseVector) -> f64 {
    let norm_a = a.norm();
    let norm_b = b.norm();
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    (a.dot(b) / (norm_a * norm_b)).clamp(0.0, 1.0)
}

/// Split a document into lowercase word tokens.
pub fn tokenize(text: &str) -> Vec<String> {
    let lower = text.to_lowercase();
    WORD_RE
        .find_iter(&lower)
        .map(|m| m.as_str().to_string())
        .collect()
}

/// Contiguous word n-grams of every length in `range`, joined by a space.
pub fn word_ngrams(tokens: &[String], range: NgramRange) -> Vec<String> {
    let mut grams = Vec::new();
    for n in range.min..=range.max {
        if n > tokens.len() {
            break;
        }
        grams.extend(tokens.windows(n).map(|window| window.join(" ")));
    }
    grams
}

/// A vocabulary and its idf weights, fitted on a set of documents.
#[derive(Debug, Clone)]
pub struct TfidfVectorizer {
    ngram_range: NgramRange,
    vocabulary: HashMap<String, usize>,
    idf: Vec<f64>,
}

impl TfidfVectorizer {
    pub fn new(ngram_range: NgramRange) -> Self {
        Self {
            ngram_range,
            vocabulary: HashMap::new(),
            idf: Vec::new(),
        }
    }

    pub fn vocabulary_size(&self) -> usize {
        self.vocabulary.len()
    }

    /// Fit the vocabulary on `docs` and return one vector per document.
    ///
    /// Term ids are assigned in sorted term order so the output does not
    /// depend on hash iteration. A document with no vocabulary units yields a
    /// zero vector.
    pub fn fit_transform(&mut self, docs: &[&str]) -> Vec<SparseVector> {
        let doc_grams: Vec<Vec<String>> = docs
            .iter()
            .map(|doc| word_ngrams(&tokenize(doc), self.ngram_range))
            .collect();

        let terms: BTreeSet<&str> = doc_grams
            .iter()
            .flat_map(|grams| grams.iter().map(String::as_str))
            .collect();
        self.vocabulary = terms
            .into_iter()
            .enumerate()
            .map(|(id, term)| (term.to_string(), id))
            .collect();

        let mut doc_freq = vec![0usize; self.vocabulary.len()];
        let counts: Vec<BTreeMap<usize, f64>> = doc_grams
            .iter()
            .map(|grams| {
                let mut tf: BTreeMap<usize, f64> = BTreeMap::new();
                for gram in grams {
                    if let Some(&id) = self.vocabulary.get(gram) {
                        *tf.entry(id).or_insert(0.0) += 1.0;
                    }
                }
                for id in tf.keys() {
                    doc_freq[*id] += 1;
                }
                tf
            })
            .collect();

        let n_docs = docs.len() as f64;
        self.idf = doc_freq
            .iter()
            .map(|&df| ((1.0 + n_docs) / (1.0 + df as f64)).ln() + 1.0)
            .collect();

        counts
            .into_iter()
            .map(|mut tf| {
                for (id, weight) in tf.iter_mut() {
                    *weight *= self.idf[*id];
                }
                let norm = tf.values().map(|w| w * w).sum::<f64>().sqrt();
                if norm > 0.0 {
                    for weight in tf.values_mut() {
                        *weight /= norm;
                    }
                }
                SparseVector::from_map(tf)
            })
            .collect()
    }
}
