//! Literature corpus loading.
//!
//! This module defines the read-only corpus searched at query time and the
//! interface for sourcing corpus records from files. The corpus is loaded once
//! at startup and shared by every query without copying.
//!
//! The `CorpusProvider` trait abstracts the source of records, so the binaries
//! can read JSON or CSV exports of the dashboard dataset through one code path.

pub mod csv_file;
pub mod json_file;
pub mod prepare;

use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;
use tracing::{info, warn};

use crate::models::{CorpusRecord, MAX_QUALITY_SCORE};

pub use csv_file::CsvFileCorpusProvider;
pub use json_file::JsonFileCorpusProvider;

/// Errors that can occur while loading a corpus.
#[derive(Debug, Error)]
pub enum CorpusError {
    /// Failed to read from the data source
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Failed to parse the data format
    #[error("Parse error: {0}")]
    Parse(String),

    /// A record violates the corpus invariants
    #[error("Invalid record {index}: {reason}")]
    InvalidRecord { index: usize, reason: String },

    /// The corpus exceeds the configured size bound
    #[error("Corpus has {size} records, limit is {max}")]
    TooLarge { size: usize, max: usize },

    /// Unsupported input format
    #[error("Unsupported corpus format: {0}")]
    UnsupportedFormat(String),
}

/// Result type for corpus operations.
pub type CorpusResult<T> = Result<T, CorpusError>;

/// Trait for sourcing corpus records.
///
/// Providers return records in source order; that order is the corpus order
/// used for similarity tie-breaks.
#[async_trait]
pub trait CorpusProvider: Send + Sync {
    /// Fetch all records from this provider.
    async fn fetch_records(&self) -> CorpusResult<Vec<CorpusRecord>>;

    /// Get the total count of records available from this provider.
    async fn count_records(&self) -> CorpusResult<usize> {
        self.fetch_records().await.map(|records| records.len())
    }

    /// Get a human-readable name/description of this provider.
    fn name(&self) -> &str;
}

/// Immutable, ordered collection of corpus records.
#[derive(Debug, Clone)]
pub struct Corpus {
    records: Arc<[CorpusRecord]>,
}

impl Corpus {
    /// Build a corpus, validating every record.
    ///
    /// # Errors
    /// Returns `CorpusError::InvalidRecord` for quality scores above 10.
    pub fn new(records: Vec<CorpusRecord>) -> CorpusResult<Self> {
        for (index, record) in records.iter().enumerate() {
            if let Some(score) = record.quality_score {
                if score > MAX_QUALITY_SCORE {
                    return Err(CorpusError::InvalidRecord {
                        index,
                        reason: format!("quality score {} outside 0-{}", score, MAX_QUALITY_SCORE),
                    });
                }
            }
        }
        Ok(Self {
            records: records.into(),
        })
    }

    /// Build a corpus that may hold at most `max` records.
    pub fn with_limit(records: Vec<CorpusRecord>, max: Option<usize>) -> CorpusResult<Self> {
        if let Some(max) = max {
            if records.len() > max {
                return Err(CorpusError::TooLarge {
                    size: records.len(),
                    max,
                });
            }
        }
        Self::new(records)
    }

    /// Load a corpus from a provider.
    pub async fn load<P: CorpusProvider + ?Sized>(
        provider: &P,
        max: Option<usize>,
    ) -> CorpusResult<Self> {
        let records = provider.fetch_records().await?;
        info!("Loaded {} corpus records from {}", records.len(), provider.name());
        let corpus = Self::with_limit(records, max)?;
        let unnormalized = corpus.unnormalized_count();
        if unnormalized > 0 {
            warn!(
                "{} of {} records have no normalized title and will never match; run prepare-corpus on {}",
                unnormalized,
                corpus.len(),
                provider.name()
            );
        }
        Ok(corpus)
    }

    /// Number of records whose `normalized_title` is empty.
    pub fn unnormalized_count(&self) -> usize {
        self.records
            .iter()
            .filter(|r| r.normalized_title.trim().is_empty())
            .count()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn records(&self) -> &[CorpusRecord] {
        &self.records
    }

    /// Normalized titles in corpus order.
    pub fn titles(&self) -> Vec<&str> {
        self.records.iter().map(|r| r.normalized_title.as_str()).collect()
    }

    /// Records tagged with `region` (case-insensitive), in corpus order.
    pub fn filter_region(&self, region: &str) -> Vec<&CorpusRecord> {
        let wanted = region.trim().to_lowercase();
        self.records
            .iter()
            .filter(|r| r.region.trim().to_lowercase() == wanted)
            .collect()
    }

    /// Distinct region tags in first-seen order.
    pub fn regions(&self) -> Vec<&str> {
        let mut seen: Vec<&str> = Vec::new();
        for record in self.records.iter() {
            if !seen.contains(&record.region.as_str()) {
                seen.push(&record.region);
            }
        }
        seen
    }
}

/// Open a file-backed provider, choosing the format by file extension.
pub async fn open_provider(
    path: impl AsRef<std::path::Path>,
) -> CorpusResult<Box<dyn CorpusProvider>> {
    let path = path.as_ref();
    let extension = path
        .extension()
        .map(|e| e.to_string_lossy().to_lowercase())
        .unwrap_or_default();
    match extension.as_str() {
        "json" => Ok(Box::new(JsonFileCorpusProvider::from_file(path).await?)),
        "csv" => Ok(Box::new(CsvFileCorpusProvider::from_file(path).await?)),
        other => Err(CorpusError::UnsupportedFormat(format!(
            "{} (expected .json or .csv)",
            if other.is_empty() { "<none>" } else { other }
        ))),
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub(crate) fn record(title: &str, region: &str, quality: Option<u8>) -> CorpusRecord {
        CorpusRecord {
            title: title.to_string(),
            normalized_title: title.to_lowercase(),
            region: region.to_string(),
            quality_score: quality,
            study_type: "Ensaio clínico".to_string(),
            year: None,
        }
    }

    #[test]
    fn test_rejects_out_of_range_quality() {
        let result = Corpus::new(vec![record("a", "Lombalgia", Some(11))]);
        assert!(matches!(result, Err(CorpusError::InvalidRecord { index: 0, .. })));
    }

    #[test]
    fn test_with_limit() {
        let records = vec![record("a", "Lombalgia", None), record("b", "Lombalgia", None)];
        assert!(matches!(
            Corpus::with_limit(records.clone(), Some(1)),
            Err(CorpusError::TooLarge { size: 2, max: 1 })
        ));
        assert_eq!(Corpus::with_limit(records, None).unwrap().len(), 2);
    }

    #[test]
    fn test_filter_region_case_insensitive() {
        let corpus = Corpus::new(vec![
            record("a", "Lombalgia", None),
            record("b", "Dor no ombro", Some(5)),
            record("c", "lombalgia ", Some(8)),
        ])
        .unwrap();

        let filtered = corpus.filter_region("LOMBALGIA");
        let titles: Vec<&str> = filtered.iter().map(|r| r.title.as_str()).collect();
        assert_eq!(titles, vec!["a", "c"]);
        assert_eq!(corpus.regions(), vec!["Lombalgia", "Dor no ombro", "lombalgia "]);
    }

    #[test]
    fn test_titles_in_order() {
        let corpus = Corpus::new(vec![record("Knee", "OA", None), record("Hip", "OA", None)]).unwrap();
        assert_eq!(corpus.titles(), vec!["knee", "hip"]);
    }

    #[tokio::test]
    async fn test_load_raw_csv_counts_unnormalized_titles() {
        use std::io::Write;

        let mut file = tempfile::Builder::new().suffix(".csv").tempfile().unwrap();
        writeln!(file, "title,region,quality_score,study_type").unwrap();
        writeln!(file, "Knee pain exercise,OA Joelho,8,Ensaio clínico").unwrap();
        writeln!(file, "Low back pain,Lombalgia,,Revisão").unwrap();

        let provider = open_provider(file.path()).await.unwrap();
        let corpus = Corpus::load(provider.as_ref(), None).await.unwrap();
        assert_eq!(corpus.len(), 2);
        assert_eq!(corpus.unnormalized_count(), 2);

        let prepared = Corpus::new(vec![record("Knee", "OA", None), record("", "OA", None)]).unwrap();
        assert_eq!(prepared.unnormalized_count(), 1);
    }

    #[tokio::test]
    async fn test_open_provider_rejects_unknown_extension() {
        let result = open_provider("corpus.parquet").await;
        assert!(matches!(result, Err(CorpusError::UnsupportedFormat(_))));
    }
}
