//! CSV file corpus provider.
//!
//! Expects a header row with `title`, `region`, `quality_score` and
//! `study_type`; `normalized_title` and `year` are optional. Dataframe exports
//! often write nullable integer columns as floats (`7.0`) or `nan`, so the
//! quality column accepts those spellings.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde::Deserialize;

use super::{CorpusError, CorpusProvider, CorpusResult};
use crate::models::CorpusRecord;

#[derive(Debug, Deserialize)]
struct CsvRow {
    title: String,
    #[serde(default)]
    normalized_title: Option<String>,
    region: String,
    #[serde(default)]
    quality_score: Option<String>,
    study_type: String,
    #[serde(default)]
    year: Option<String>,
}

/// Parse a nullable score cell: empty, `nan` and `null` are absent.
fn parse_optional_number(cell: Option<&str>) -> Result<Option<f64>, String> {
    let cell = match cell.map(str::trim) {
        None | Some("") => return Ok(None),
        Some(c) => c,
    };
    if matches!(cell.to_lowercase().as_str(), "nan" | "null" | "none" | "na") {
        return Ok(None);
    }
    cell.parse::<f64>()
        .map(Some)
        .map_err(|_| format!("not a number: {:?}", cell))
}

fn to_whole(value: f64, field: &str) -> Result<i64, String> {
    if value.fract() != 0.0 {
        return Err(format!("{} must be a whole number, got {}", field, value));
    }
    Ok(value as i64)
}

impl CsvRow {
    fn into_record(self, index: usize) -> CorpusResult<CorpusRecord> {
        let invalid = |reason: String| CorpusError::InvalidRecord { index, reason };

        let quality_score = match parse_optional_number(self.quality_score.as_deref()).map_err(invalid)? {
            Some(v) => {
                let whole = to_whole(v, "quality_score").map_err(invalid)?;
                let score = u8::try_from(whole)
                    .map_err(|_| invalid(format!("quality score {} outside 0-10", whole)))?;
                Some(score)
            }
            None => None,
        };
        let year = match parse_optional_number(self.year.as_deref()).map_err(invalid)? {
            Some(v) => Some(to_whole(v, "year").map_err(invalid)? as i32),
            None => None,
        };

        Ok(CorpusRecord {
            title: self.title,
            normalized_title: self.normalized_title.unwrap_or_default(),
            region: self.region,
            quality_score,
            study_type: self.study_type,
            year,
        })
    }
}

/// Corpus provider backed by a CSV file loaded eagerly at construction.
#[derive(Debug, Clone)]
pub struct CsvFileCorpusProvider {
    path: PathBuf,
    name: String,
    records: Vec<CorpusRecord>,
}

impl CsvFileCorpusProvider {
    pub async fn from_file(path: impl AsRef<Path>) -> CorpusResult<Self> {
        let path = path.as_ref().to_path_buf();
        let raw = tokio::fs::read(&path).await?;
        let records = Self::parse(&raw)?;
        Ok(Self {
            name: format!("csv:{}", path.display()),
            path,
            records,
        })
    }

    /// Parse records from CSV bytes.
    pub fn parse(raw: &[u8]) -> CorpusResult<Vec<CorpusRecord>> {
        let mut reader = ::csv::ReaderBuilder::new()
            .has_headers(true)
            .trim(::csv::Trim::Headers)
            .from_reader(raw);

        reader
            .deserialize::<CsvRow>()
            .enumerate()
            .map(|(index, row)| {
                let row = row.map_err(|e| CorpusError::Parse(format!("row {}: {}", index, e)))?;
                row.into_record(index)
            })
            .collect()
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl CorpusProvider for CsvFileCorpusProvider {
    async fn fetch_records(&self) -> CorpusResult<Vec<CorpusRecord>> {
        Ok(self.records.clone())
    }

    async fn count_records(&self) -> CorpusResult<usize> {
        Ok(self.records.len())
    }

    fn name(&self) -> &str {
        &self.name
    }
}
