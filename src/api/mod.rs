//! Dashboard API module.
//!
//! Request and response payloads exchanged with the dashboard UI, and the
//! service that turns a request into a ranked table. The UI renders the
//! response; this module owns validation and the "no query" prompt.

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::config::SearchConfig;
use crate::language::LanguageModel;
use crate::models::{QualityTier, RankedTitle};
use crate::query::{QueryError, SearchQuery, TitleSearchEngine};

/// Message shown instead of a result table when the query is blank.
pub const EMPTY_QUERY_PROMPT: &str = "Fill in the search field with a title or terms";

/// Errors that can occur while handling a request.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Invalid request parameters
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Search execution failed
    #[error("Search failed: {0}")]
    Search(#[from] QueryError),
}

/// Result type for API operations.
pub type ApiResult<T> = Result<T, ApiError>;

/// Request payload for a similar-titles lookup.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimilarTitlesRequest {
    /// Title or search terms (English)
    pub query: String,

    /// Number of similar articles to return (default: configured default)
    #[serde(default)]
    pub top_k: Option<usize>,

    /// Optional body-region filter
    #[serde(default)]
    pub region: Option<String>,
}

/// Data transfer object for a single result row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimilarTitleDto {
    pub title: String,
    pub region: String,
    pub quality_score: u8,
    pub study_type: String,
    pub similarity: f64,

    /// Quality tier as a string ("HIGH" or "LOW")
    pub quality_tier: String,
}

impl From<RankedTitle> for SimilarTitleDto {
    fn from(row: RankedTitle) -> Self {
        Self {
            quality_tier: row.quality_tier.label().to_string(),
            title: row.title,
            region: row.region,
            quality_score: row.quality_score,
            study_type: row.study_type,
            similarity: row.similarity,
        }
    }
}

/// Response payload for a similar-titles lookup.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimilarTitlesResponse {
    /// The original query text
    pub query: String,

    /// Result rows in display order
    pub results: Vec<SimilarTitleDto>,

    /// Number of rows returned
    pub count: usize,

    /// Message to show in place of results, set for blank queries
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prompt: Option<String>,
}

impl SimilarTitlesResponse {
    fn prompt(query: String) -> Self {
        Self {
            query,
            results: Vec::new(),
            count: 0,
            prompt: Some(EMPTY_QUERY_PROMPT.to_string()),
        }
    }

    pub fn high_quality_count(&self) -> usize {
        self.results
            .iter()
            .filter(|r| r.quality_tier == QualityTier::High.label())
            .count()
    }
}

/// Handles dashboard requests against a search engine.
pub struct SimilarTitlesService<M: LanguageModel> {
    engine: TitleSearchEngine<M>,
    config: SearchConfig,
}

impl<M: LanguageModel> SimilarTitlesService<M> {
    pub fn new(engine: TitleSearchEngine<M>, config: SearchConfig) -> Self {
        Self { engine, config }
    }

    pub fn engine(&self) -> &TitleSearchEngine<M> {
        &self.engine
    }

    pub fn config(&self) -> &SearchConfig {
        &self.config
    }

    /// Handle a similar-titles request.
    ///
    /// A blank query yields an empty response carrying a prompt rather than
    /// an arbitrary zero-similarity table. `top_k` is clamped to
    /// `[1, max_top_k]`.
    ///
    /// # Errors
    /// Returns `ApiError::InvalidRequest` for a blank region filter or bad
    /// n-gram configuration, `ApiError::Search` if the search fails.
    pub fn handle(&self, request: SimilarTitlesRequest) -> ApiResult<SimilarTitlesResponse> {
        if request.query.trim().is_empty() {
            debug!("Blank query, prompting for input");
            return Ok(SimilarTitlesResponse::prompt(request.query));
        }
        if let Some(region) = &request.region {
            if region.trim().is_empty() {
                return Err(ApiError::InvalidRequest("region filter is blank".to_string()));
            }
        }

        let top_k = self.config.clamp_top_k(request.top_k);
        let ngram_range = self
            .config
            .ngram_range()
            .map_err(|e| ApiError::InvalidRequest(e.to_string()))?;

        let query = SearchQuery::new(request.query.clone(), Some(top_k), request.region)
            .with_ngram_range(ngram_range)
            .with_lemma(self.config.use_lemma);
        let results: Vec<SimilarTitleDto> = self
            .engine
            .search(&query)?
            .into_iter()
            .map(SimilarTitleDto::from)
            .collect();

        Ok(SimilarTitlesResponse {
            query: request.query,
            count: results.len(),
            results,
            prompt: None,
        })
    }

    /// Handle a request given as JSON and answer with JSON.
    pub fn handle_json(&self, request_json: &str) -> ApiResult<String> {
        let request: SimilarTitlesRequest = serde_json::from_str(request_json)
            .map_err(|e| ApiError::InvalidRequest(format!("malformed request: {}", e)))?;
        let response = self.handle(request)?;
        serde_json::to_string(&response)
            .map_err(|e| ApiError::InvalidRequest(format!("cannot serialize response: {}", e)))
    }
}
