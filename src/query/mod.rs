//! Query processing and ranking module.
//!
//! This module scores a query against the corpus titles, assembles the ranked
//! result table, and coordinates the normalizer and corpus for a full search.
//!
//! # Usage
//!
//! ```rust,no_run
//! use evidence_search::corpus::{Corpus, JsonFileCorpusProvider};
//! use evidence_search::language::RuleBasedModel;
//! use evidence_search::normalize::Normalizer;
//! use evidence_search::query::{SearchQuery, TitleSearchEngine};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let provider = JsonFileCorpusProvider::from_file("corpus.json").await?;
//! let corpus = Corpus::load(&provider, None).await?;
//! let engine = TitleSearchEngine::new(Normalizer::new(RuleBasedModel::english()), corpus);
//!
//! let query = SearchQuery::new("exercise for knee osteoarthritis".to_string(), Some(5), None);
//! for row in engine.search(&query)? {
//!     println!("{} ({}) - PEDro {}", row.title, row.region, row.quality_score);
//! }
//! # Ok(())
//! # }
//! ```
//!
//! Ranking is two-stage: the top K rows are chosen by similarity, then that
//! subset is reordered by quality score. A highly similar low-quality study
//! can therefore appear below a less similar high-quality one.

use std::borrow::Borrow;
use std::collections::HashSet;
use std::time::Instant;

use thiserror::Error;
use tracing::debug;

use crate::corpus::Corpus;
use crate::language::LanguageModel;
use crate::models::{CorpusRecord, RankedTitle};
use crate::normalize::{NormalizeError, Normalizer};
use crate::vectorize::{cosine_similarity, NgramRange, TfidfVectorizer, VectorizeError};
use crate::DEFAULT_TOP_K;

/// Errors that can occur during query processing.
#[derive(Debug, Error)]
pub enum QueryError {
    /// Query normalization failed
    #[error("Normalization error: {0}")]
    Normalization(#[from] NormalizeError),

    /// Similarity requested against zero corpus records
    #[error("Cannot rank against an empty corpus")]
    EmptyCorpus,

    /// Invalid n-gram bounds
    #[error("Invalid n-gram range: min={min}, max={max} (expected 1 <= min <= max)")]
    InvalidNgramRange { min: usize, max: usize },
}

impl From<VectorizeError> for QueryError {
    fn from(err: VectorizeError) -> Self {
        match err {
            VectorizeError::InvalidNgramRange { min, max } => QueryError::InvalidNgramRange { min, max },
        }
    }
}

/// Result type for query operations.
pub type QueryResult<T> = Result<T, QueryError>;

/// Search query parameters.
#[derive(Debug, Clone)]
pub struct SearchQuery {
    /// The raw query text (will be normalized)
    pub query: String,

    /// Maximum number of results to return, clamped to the corpus size
    pub top_k: usize,

    /// N-gram window for vectorization
    pub ngram_range: NgramRange,

    /// Whether to lemmatize the query
    pub use_lemma: bool,

    /// Optional body-region filter applied before ranking
    pub region: Option<String>,
}

impl SearchQuery {
    /// Create a new search query with unigrams and lemmatization.
    ///
    /// # Arguments
    /// * `query` - The search query text
    /// * `top_k` - Maximum number of results to return (default: 5)
    /// * `region` - Optional region filter
    pub fn new(query: String, top_k: Option<usize>, region: Option<String>) -> Self {
        Self {
            query,
            top_k: top_k.unwrap_or(DEFAULT_TOP_K),
            ngram_range: NgramRange::unigrams(),
            use_lemma: true,
            region,
        }
    }

    pub fn with_ngram_range(mut self, ngram_range: NgramRange) -> Self {
        self.ngram_range = ngram_range;
        self
    }

    pub fn with_lemma(mut self, use_lemma: bool) -> Self {
        self.use_lemma = use_lemma;
        self
    }
}

/// Score a normalized query against normalized corpus titles.
///
/// One TF-IDF space is fitted over the query and every corpus title; the
/// result holds the cosine similarity of the query to each title, aligned
/// with `corpus_titles`. An empty query scores 0 everywhere.
///
/// # Errors
/// `InvalidNgramRange` for bad bounds (checked first), `EmptyCorpus` when
/// `corpus_titles` is empty.
pub fn rank(
    query_title: &str,
    corpus_titles: &[&str],
    min_ngram: usize,
    max_ngram: usize,
) -> QueryResult<Vec<f64>> {
    let range = NgramRange::new(min_ngram, max_ngram)?;
    rank_with_range(query_title, corpus_titles, range)
}

fn rank_with_range(query_title: &str, corpus_titles: &[&str], range: NgramRange) -> QueryResult<Vec<f64>> {
    if corpus_titles.is_empty() {
        return Err(QueryError::EmptyCorpus);
    }

    let mut docs = Vec::with_capacity(corpus_titles.len() + 1);
    docs.push(query_title);
    docs.extend_from_slice(corpus_titles);

    let mut vectorizer = TfidfVectorizer::new(range);
    let vectors = vectorizer.fit_transform(&docs);
    let (query_vector, corpus_vectors) = vectors.split_first().ok_or(QueryError::EmptyCorpus)?;

    Ok(corpus_vectors
        .iter()
        .map(|v| cosine_similarity(query_vector, v))
        .collect())
}

/// Assemble the ranked result table.
///
/// 1. Stable sort by similarity, descending; equal scores keep corpus order.
/// 2. Keep the top `top_k`, clamped to `[1, records.len()]`.
/// 3. Stable sort that subset by quality score, descending (absent = 0).
/// 4. Drop exact duplicate rows (title, region, quality).
///
/// `records` and `similarities` must be aligned; extra entries on either side
/// are ignored.
pub fn assemble<R: Borrow<CorpusRecord>>(
    records: &[R],
    similarities: &[f64],
    top_k: usize,
) -> Vec<RankedTitle> {
    let n = records.len().min(similarities.len());
    if n == 0 {
        return Vec::new();
    }

    let mut order: Vec<usize> = (0..n).collect();
    order.sort_by(|&a, &b| {
        similarities[b]
            .partial_cmp(&similarities[a])
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    order.truncate(top_k.clamp(1, n));

    let mut rows: Vec<RankedTitle> = order
        .into_iter()
        .map(|i| RankedTitle::new(records[i].borrow(), similarities[i]))
        .collect();
    rows.sort_by(|a, b| b.quality_score.cmp(&a.quality_score));

    dedup_rows(rows)
}

/// Remove rows whose (title, region, quality) repeats an earlier row.
///
/// Quality is compared as stored, so an absent score and a score of 0 are
/// different rows even though both display as 0.
pub fn dedup_rows(rows: Vec<RankedTitle>) -> Vec<RankedTitle> {
    let mut seen: HashSet<(String, String, Option<u8>)> = HashSet::new();
    rows.into_iter()
        .filter(|row| {
            let (title, region, quality) = row.dedup_key();
            seen.insert((title.to_string(), region.to_string(), quality))
        })
        .collect()
}

/// Title search over an in-memory corpus.
///
/// The normalizer and corpus are explicit construction state; the engine holds
/// no mutable state, and each query fits its own private vector space.
pub struct TitleSearchEngine<M: LanguageModel> {
    normalizer: Normalizer<M>,
    corpus: Corpus,
}

impl<M: LanguageModel> TitleSearchEngine<M> {
    pub fn new(normalizer: Normalizer<M>, corpus: Corpus) -> Self {
        Self { normalizer, corpus }
    }

    pub fn corpus(&self) -> &Corpus {
        &self.corpus
    }

    pub fn normalizer(&self) -> &Normalizer<M> {
        &self.normalizer
    }

    /// Similarity of a raw query to every corpus record, in corpus order.
    pub fn score_corpus(
        &self,
        raw_query: &str,
        use_lemma: bool,
        ngram_range: NgramRange,
    ) -> QueryResult<Vec<f64>> {
        let normalized = self.normalizer.normalize(raw_query, use_lemma)?;
        rank_with_range(&normalized, &self.corpus.titles(), ngram_range)
    }

    /// Execute a search query and return the ranked result table.
    ///
    /// # Errors
    /// Returns `QueryError::EmptyCorpus` if the corpus holds no records, or
    /// `QueryError::Normalization` if the language model fails.
    pub fn search(&self, query: &SearchQuery) -> QueryResult<Vec<RankedTitle>> {
        let start = Instant::now();

        if self.corpus.is_empty() {
            return Err(QueryError::EmptyCorpus);
        }

        let normalized = self.normalizer.normalize(&query.query, query.use_lemma)?;
        if normalized.is_empty() {
            debug!("Query {:?} normalized to nothing; all similarities are 0", query.query);
        }

        let records: Vec<&CorpusRecord> = match &query.region {
            Some(region) => self.corpus.filter_region(region),
            None => self.corpus.records().iter().collect(),
        };
        if records.is_empty() {
            debug!("No corpus records in region {:?}", query.region);
            return Ok(Vec::new());
        }

        let titles: Vec<&str> = records.iter().map(|r| r.normalized_title.as_str()).collect();
        let similarities = rank_with_range(&normalized, &titles, query.ngram_range)?;
        let results = assemble(&records, &similarities, query.top_k);

        debug!(
            query = %query.query,
            normalized = %normalized,
            candidates = records.len(),
            returned = results.len(),
            elapsed_ms = start.elapsed().as_secs_f64() * 1000.0,
            "search completed"
        );
        Ok(results)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::corpus::tests::record;
    use crate::language::{LanguageError, LanguageResult, RuleBasedModel, TaggedToken};

    struct UnavailableModel;

    impl LanguageModel for UnavailableModel {
        fn tokenize_and_tag(&self, _text: &str) -> LanguageResult<Vec<TaggedToken>> {
            Err(LanguageError::ModelUnavailable("not loaded".to_string()))
        }

        fn name(&self) -> &str {
            "unavailable"
        }
    }

    fn knee_corpus() -> Vec<CorpusRecord> {
        vec![
            record("exercise therapy for knee pain", "OA Joelho", Some(6)),
            record("acupuncture for shoulder pain", "Dor no ombro", Some(8)),
            record("exercise therapy for knee pain", "OA Joelho", Some(6)),
        ]
    }

    fn engine(records: Vec<CorpusRecord>) -> TitleSearchEngine<RuleBasedModel> {
        TitleSearchEngine::new(
            Normalizer::new(RuleBasedModel::english()),
            Corpus::new(records).unwrap(),
        )
    }

    #[test]
    fn test_search_query_defaults() {
        let query = SearchQuery::new("knee".to_string(), None, None);
        assert_eq!(query.top_k, 5);
        assert_eq!(query.ngram_range, NgramRange::unigrams());
        assert!(query.use_lemma);
        assert!(query.region.is_none());
    }

    #[test]
    fn test_rank_self_similarity() {
        let titles = ["exercise therapy knee pain", "acupuncture shoulder pain"];
        let scores = rank("exercise therapy knee pain", &titles, 1, 1).unwrap();
        assert_eq!(scores.len(), 2);
        assert!((scores[0] - 1.0).abs() < 1e-9);
        assert!(scores[1] > 0.0 && scores[1] < 1.0);
    }

    #[test]
    fn test_rank_empty_query_is_all_zero() {
        let titles = ["exercise therapy knee pain", "acupuncture shoulder pain"];
        let scores = rank("", &titles, 1, 1).unwrap();
        assert_eq!(scores, vec![0.0, 0.0]);
    }

    #[test]
    fn test_rank_empty_corpus() {
        assert!(matches!(rank("knee", &[], 1, 1), Err(QueryError::EmptyCorpus)));
    }

    #[test]
    fn test_rank_validates_ngrams_before_corpus() {
        assert!(matches!(
            rank("knee", &[], 2, 1),
            Err(QueryError::InvalidNgramRange { min: 2, max: 1 })
        ));
        assert!(matches!(
            rank("knee", &["knee"], 0, 1),
            Err(QueryError::InvalidNgramRange { min: 0, max: 1 })
        ));
    }

    #[test]
    fn test_rank_bigrams() {
        let titles = ["knee pain exercise", "pain knee exercise"];
        let unigram = rank("knee pain", &titles, 1, 1).unwrap();
        assert!((unigram[0] - unigram[1]).abs() < 1e-12);

        let bigram = rank("knee pain", &titles, 1, 2).unwrap();
        assert!(bigram[0] > bigram[1]);
    }

    #[test]
    fn test_knee_pain_scenario() {
        let corpus = knee_corpus();
        let titles: Vec<&str> = corpus.iter().map(|r| r.normalized_title.as_str()).collect();
        let scores = rank("exercise knee pain", &titles, 1, 1).unwrap();
        assert!(scores[0] > scores[1]);
        assert!((scores[0] - scores[2]).abs() < 1e-12);

        let rows = assemble(&corpus, &scores, 2);
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].title, "exercise therapy for knee pain");
    }

    #[test]
    fn test_assemble_reorders_top_k_by_quality() {
        let corpus = vec![
            record("a", "Lombalgia", Some(3)),
            record("b", "Lombalgia", None),
            record("c", "Lombalgia", Some(9)),
            record("d", "Lombalgia", Some(10)),
        ];
        let scores = [0.9, 0.8, 0.7, 0.1];

        let rows = assemble(&corpus, &scores, 3);
        let titles: Vec<&str> = rows.iter().map(|r| r.title.as_str()).collect();
        // "d" has the best quality but falls outside the top 3 by similarity
        assert_eq!(titles, vec!["c", "a", "b"]);
        assert_eq!(rows[2].quality_score, 0);
    }

    #[test]
    fn test_assemble_ties_keep_corpus_order() {
        let corpus = vec![
            record("first", "Lombalgia", Some(5)),
            record("second", "Lombalgia", Some(5)),
            record("third", "Lombalgia", Some(5)),
        ];
        let rows = assemble(&corpus, &[0.0, 0.0, 0.0], 2);
        let titles: Vec<&str> = rows.iter().map(|r| r.title.as_str()).collect();
        assert_eq!(titles, vec!["first", "second"]);
    }

    #[test]
    fn test_assemble_clamps_top_k() {
        let corpus: Vec<CorpusRecord> = (0..5)
            .map(|i| record(&format!("title {}", i), "Cervicalgia", Some(i)))
            .collect();
        let scores = [0.1, 0.2, 0.3, 0.4, 0.5];
        assert_eq!(assemble(&corpus, &scores, 50).len(), 5);
        assert_eq!(assemble(&corpus, &scores, 0).len(), 1);
    }

    #[test]
    fn test_dedup_is_idempotent() {
        let corpus = knee_corpus();
        let rows = assemble(&corpus, &[0.5, 0.4, 0.5], 3);
        let once = dedup_rows(rows.clone());
        let twice = dedup_rows(once.clone());
        assert_eq!(once, twice);
        assert_eq!(once.len(), 2);
    }

    #[test]
    fn test_dedup_keeps_rows_differing_in_quality() {
        let corpus = vec![
            record("same title", "Lombalgia", Some(4)),
            record("same title", "Lombalgia", Some(5)),
        ];
        assert_eq!(assemble(&corpus, &[0.5, 0.5], 2).len(), 2);
    }

    #[test]
    fn test_dedup_keeps_absent_and_zero_quality_apart() {
        let corpus = vec![
            record("same title", "Lombalgia", None),
            record("same title", "Lombalgia", Some(0)),
        ];
        let rows = assemble(&corpus, &[0.5, 0.5], 2);
        assert_eq!(rows.len(), 2);
        assert!(rows.iter().all(|r| r.quality_score == 0));
    }

    #[test]
    fn test_engine_search() {
        let engine = engine(knee_corpus());
        let query = SearchQuery::new("Exercise for Knee Pain".to_string(), Some(2), None);
        let results = engine.search(&query).unwrap();

        assert_eq!(results.len(), 1);
        assert_eq!(results[0].title, "exercise therapy for knee pain");
        assert!(results[0].similarity > 0.0);
    }

    #[test]
    fn test_engine_empty_query_returns_zero_scores() {
        let engine = engine(knee_corpus());
        let query = SearchQuery::new(String::new(), Some(3), None);
        let results = engine.search(&query).unwrap();
        assert!(results.iter().all(|r| r.similarity == 0.0));

        let scores = engine.score_corpus("", true, NgramRange::unigrams()).unwrap();
        assert_eq!(scores, vec![0.0, 0.0, 0.0]);
    }

    #[test]
    fn test_engine_region_filter() {
        let engine = engine(knee_corpus());
        let query = SearchQuery::new("pain".to_string(), Some(5), Some("dor no ombro".to_string()));
        let results = engine.search(&query).unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].region, "Dor no ombro");

        let query = SearchQuery::new("pain".to_string(), Some(5), Some("Lombalgia".to_string()));
        assert!(engine.search(&query).unwrap().is_empty());
    }

    #[test]
    fn test_engine_empty_corpus() {
        let engine = engine(Vec::new());
        let query = SearchQuery::new("knee".to_string(), None, None);
        assert!(matches!(engine.search(&query), Err(QueryError::EmptyCorpus)));
    }

    #[test]
    fn test_engine_model_unavailable() {
        let engine = TitleSearchEngine::new(
            Normalizer::new(UnavailableModel),
            Corpus::new(knee_corpus()).unwrap(),
        );
        let query = SearchQuery::new("knee".to_string(), None, None);
        assert!(matches!(
            engine.search(&query),
            Err(QueryError::Normalization(NormalizeError::ModelUnavailable(_)))
        ));
    }
}
