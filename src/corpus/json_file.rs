//! JSON file corpus provider.
//!
//! Reads a JSON array of corpus records, as exported from the dashboard's
//! prepared dataset.

use std::path::{Path, PathBuf};

use async_trait::async_trait;

use super::{CorpusError, CorpusProvider, CorpusResult};
use crate::models::CorpusRecord;

/// Corpus provider backed by a JSON file loaded eagerly at construction.
#[derive(Debug, Clone)]
pub struct JsonFileCorpusProvider {
    path: PathBuf,
    name: String,
    records: Vec<CorpusRecord>,
}

impl JsonFileCorpusProvider {
    /// Read and parse `path`.
    ///
    /// # Errors
    /// Returns `CorpusError::Io` if the file cannot be read and
    /// `CorpusError::Parse` if it is not an array of records.
    pub async fn from_file(path: impl AsRef<Path>) -> CorpusResult<Self> {
        let path = path.as_ref().to_path_buf();
        let raw = tokio::fs::read_to_string(&path).await?;
        let records = Self::parse(&raw)
            .map_err(|e| CorpusError::Parse(format!("{}: {}", path.display(), e)))?;
        Ok(Self {
            name: format!("json:{}", path.display()),
            path,
            records,
        })
    }

    /// Parse records from a JSON string.
    pub fn parse(raw: &str) -> Result<Vec<CorpusRecord>, serde_json::Error> {
        serde_json::from_str(raw)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl CorpusProvider for JsonFileCorpusProvider {
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

/// Write records as a pretty-printed JSON array.
pub async fn write_records(path: impl AsRef<Path>, records: &[CorpusRecord]) -> CorpusResult<()> {
    let json = serde_json::to_string_pretty(records)
        .map_err(|e| CorpusError::Parse(format!("cannot serialize corpus: {}", e)))?;
    tokio::fs::write(path, json).await?;
    Ok(())
}
