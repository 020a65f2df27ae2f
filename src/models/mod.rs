//! Core data models for the evidence search system.
//!
//! This module contains the fundamental data structures used across the crate,
//! including corpus records, normalized titles, and ranked search results.

use serde::{Deserialize, Serialize};

/// Highest score on the PEDro methodological quality scale.
pub const MAX_QUALITY_SCORE: u8 = 10;

/// A title in both its raw and normalized forms.
///
/// Once built the normalized text is never recomputed; callers that need a
/// different normalization (e.g. without lemmas) build a new `Title`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Title {
    /// Text as typed by the user or stored in the source dataset
    pub raw: String,

    /// Lowercased text with stop words and punctuation removed
    pub normalized: String,
}

impl Title {
    pub fn new(raw: impl Into<String>, normalized: impl Into<String>) -> Self {
        Self {
            raw: raw.into(),
            normalized: normalized.into(),
        }
    }

    /// True when normalization left no content tokens.
    pub fn is_blank(&self) -> bool {
        self.normalized.trim().is_empty()
    }
}

/// A single article in the literature corpus.
///
/// The corpus is delivered pre-normalized: `normalized_title` must have been
/// produced by the same normalizer settings used at query time.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CorpusRecord {
    /// Article title as published
    pub title: String,

    /// Normalized title used for vectorization
    #[serde(default)]
    pub normalized_title: String,

    /// Body region the study addresses (e.g. "Lombalgia", "Dor no ombro")
    pub region: String,

    /// PEDro score (0-10), absent for studies that were never rated
    #[serde(default)]
    pub quality_score: Option<u8>,

    /// Study design label (e.g. "Ensaio clínico", "Revisão sistemática")
    pub study_type: String,

    /// Publication year, when the source dataset provides it
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub year: Option<i32>,
}

impl CorpusRecord {
    /// Quality score with absent values treated as 0.
    pub fn quality_or_zero(&self) -> u8 {
        self.quality_score.unwrap_or(0)
    }
}

/// Methodological quality classification derived from the PEDro score.
///
/// Trials scoring up to 6 are considered low quality, 7 or more high quality.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum QualityTier {
    /// PEDro score of 7 or more
    High,

    /// PEDro score of 6 or less (including unrated)
    Low,
}

impl QualityTier {
    /// Determine the quality tier from a PEDro score.
    pub fn from_score(score: u8) -> Self {
        if score >= 7 {
            QualityTier::High
        } else {
            QualityTier::Low
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            QualityTier::High => "HIGH",
            QualityTier::Low => "LOW",
        }
    }
}

/// A single row of the ranked result table.
///
/// This is the primary output type returned by the search API, combining
/// the record's display metadata with how well it matched the query.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RankedTitle {
    /// Article title as published
    pub title: String,

    /// Body region tag
    pub region: String,

    /// PEDro score, absent scores reported as 0
    pub quality_score: u8,

    /// Study design label
    pub study_type: String,

    /// Cosine similarity to the query (0.0 to 1.0, higher is better)
    pub similarity: f64,

    /// Categorical quality classification
    pub quality_tier: QualityTier,

    /// PEDro score as stored in the corpus; absent and 0 are distinct rows
    #[serde(skip)]
    pub source_quality: Option<u8>,
}

impl RankedTitle {
    /// Create a result row from a corpus record and its similarity score.
    pub fn new(record: &CorpusRecord, similarity: f64) -> Self {
        let quality_score = record.quality_or_zero();
        Self {
            title: record.title.clone(),
            region: record.region.clone(),
            quality_score,
            study_type: record.study_type.clone(),
            similarity,
            quality_tier: QualityTier::from_score(quality_score),
            source_quality: record.quality_score,
        }
    }

    /// Key used to collapse duplicate rows in the result table.
    pub fn dedup_key(&self) -> (&str, &str, Option<u8>) {
        (&self.title, &self.region, self.source_quality)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(quality: Option<u8>) -> CorpusRecord {
        CorpusRecord {
            title: "Exercise therapy for knee pain".to_string(),
            normalized_title: "exercise therapy knee pain".to_string(),
            region: "OA Joelho".to_string(),
            quality_score: quality,
            study_type: "Ensaio clínico".to_string(),
            year: Some(2019),
        }
    }

    #[test]
    fn test_quality_tier_from_score() {
        assert_eq!(QualityTier::from_score(10), QualityTier::High);
        assert_eq!(QualityTier::from_score(7), QualityTier::High);
        assert_eq!(QualityTier::from_score(6), QualityTier::Low);
        assert_eq!(QualityTier::from_score(0), QualityTier::Low);
    }

    #[test]
    fn test_missing_quality_reported_as_zero() {
        let row = RankedTitle::new(&record(None), 0.5);
        assert_eq!(row.quality_score, 0);
        assert_eq!(row.quality_tier, QualityTier::Low);

        assert_eq!(row.dedup_key().2, None);

        let row = RankedTitle::new(&record(Some(8)), 0.5);
        assert_eq!(row.quality_score, 8);
        assert_eq!(row.quality_tier, QualityTier::High);
    }

    #[test]
    fn test_record_deserializes_without_optional_fields() {
        let json = r#"{"title": "A", "region": "Lombalgia", "study_type": "Revisão"}"#;
        let record: CorpusRecord = serde_json::from_str(json).unwrap();
        assert_eq!(record.quality_score, None);
        assert_eq!(record.normalized_title, "");
        assert_eq!(record.year, None);
    }

    #[test]
    fn test_title_blank() {
        assert!(Title::new("The of and", "").is_blank());
        assert!(!Title::new("Knee pain", "knee pain").is_blank());
    }
}
