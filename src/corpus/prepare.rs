//! Corpus preparation.
//!
//! Fills in `normalized_title` for raw records so the corpus can be searched.
//! Preparation must use the same normalizer settings as query time.

use tracing::{debug, warn};

use crate::language::LanguageModel;
use crate::models::CorpusRecord;
use crate::normalize::{NormalizeResult, Normalizer};

/// Statistics about a preparation run.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct PrepareStats {
    /// Number of records processed
    pub processed: usize,

    /// Records whose normalized title has at least one token
    pub normalized: usize,

    /// Records left with no content tokens after normalization
    pub empty_after_normalization: usize,
}

impl PrepareStats {
    pub fn new() -> Self {
        Self::default()
    }

    fn record(&mut self, normalized: &str) {
        self.processed += 1;
        if normalized.is_empty() {
            self.empty_after_normalization += 1;
        } else {
            self.normalized += 1;
        }
    }
}

/// Normalize the title of every record.
///
/// `on_progress` is called after each record with the running statistics.
///
/// # Errors
/// Stops at the first normalization failure; records are not partially
/// returned.
pub fn prepare_records<M, F>(
    normalizer: &Normalizer<M>,
    records: Vec<CorpusRecord>,
    use_lemma: bool,
    mut on_progress: F,
) -> NormalizeResult<(Vec<CorpusRecord>, PrepareStats)>
where
    M: LanguageModel,
    F: FnMut(&PrepareStats),
{
    let mut stats = PrepareStats::new();
    let mut prepared = Vec::with_capacity(records.len());

    for mut record in records {
        record.normalized_title = normalizer.normalize(&record.title, use_lemma)?;
        if record.normalized_title.is_empty() {
            warn!("Title normalized to nothing: {:?}", record.title);
        }
        stats.record(&record.normalized_title);
        on_progress(&stats);
        prepared.push(record);
    }

    debug!(
        "Prepared {} records ({} empty after normalization)",
        stats.processed, stats.empty_after_normalization
    );
    Ok((prepared, stats))
}
