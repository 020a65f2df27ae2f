//! Evidence Search - title-similarity retrieval for a physiotherapy literature dashboard.
//!
//! Given a free-text query, this library finds the most similar article titles
//! in a fixed corpus and returns them ranked, secondarily ordered by the PEDro
//! methodological quality score.
//!
//! # Architecture
//!
//! - **models**: Core data structures (CorpusRecord, Title, RankedTitle, etc.)
//! - **language**: Pluggable tokenizer/tagger with a rule-based English model
//! - **normalize**: Title normalization (stop words, punctuation, lemmas)
//! - **vectorize**: TF-IDF vector space over word n-grams
//! - **query**: Similarity ranking, result assembly, and the search engine
//! - **corpus**: Read-only corpus and JSON/CSV providers
//! - **config**: TOML search settings
//! - **api**: Request/response payloads for the dashboard UI
//!
//! # Workflow
//!
//! ## Offline Preparation
//!
//! 1. Load raw article records (title, region, PEDro score, study type)
//! 2. Normalize every title with the same settings used at query time
//! 3. Write the prepared corpus as JSON
//!
//! ## Online Search
//!
//! 1. Receive a query from the dashboard
//! 2. Normalize the query text
//! 3. Fit a TF-IDF space over the query and corpus titles
//! 4. Compute cosine similarity between query and every title
//! 5. Keep the top-k by similarity, reorder by quality, drop duplicates
//!
//! # Example
//!
//! ```ignore
//! use evidence_search::{
//!     corpus::{Corpus, JsonFileCorpusProvider},
//!     language::RuleBasedModel,
//!     normalize::Normalizer,
//!     query::{SearchQuery, TitleSearchEngine},
//! };
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let provider = JsonFileCorpusProvider::from_file("corpus.json").await?;
//!     let corpus = Corpus::load(&provider, None).await?;
//!     let engine = TitleSearchEngine::new(Normalizer::new(RuleBasedModel::english()), corpus);
//!
//!     let query = SearchQuery::new("exercise for knee osteoarthritis".to_string(), Some(5), None);
//!     for row in engine.search(&query)? {
//!         println!("{}: PEDro {} ({:.3})", row.title, row.quality_score, row.similarity);
//!     }
//!     Ok(())
//! }
//! ```

pub mod api;
pub mod config;
pub mod corpus;
pub mod language;
pub mod models;
pub mod normalize;
pub mod query;
pub mod vectorize;

// Re-export commonly used types at the crate root
pub use config::SearchConfig;
pub use corpus::{Corpus, CorpusProvider};
pub use language::{LanguageModel, RuleBasedModel};
pub use models::{CorpusRecord, QualityTier, RankedTitle, Title};
pub use normalize::Normalizer;
pub use query::{SearchQuery, TitleSearchEngine};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Number of results returned when the caller does not ask for a count
pub const DEFAULT_TOP_K: usize = 5;

/// Largest result count the dashboard offers
pub const MAX_TOP_K: usize = 20;
