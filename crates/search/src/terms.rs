//! Extra search terms keyed by correlation id.
//!
//! Extra terms are synonyms and boost words attached to a sector when it is
//! indexed. They come from an external source; a missing key simply means
//! the sector has no extra terms.

use std::collections::HashMap;
use std::io::Read;
use std::path::Path;

use serde::Deserialize;

use crate::error::{ConfigError, SearchClientResult};

/// Read-only lookup of extra terms by correlation id.
pub trait TermsProvider: Send + Sync {
    /// Returns the terms for `correlation_id`, in source order.
    fn terms_for(&self, correlation_id: u64) -> Option<&[String]>;
}

/// A provider with no terms at all.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoTerms;

impl TermsProvider for NoTerms {
    fn terms_for(&self, _correlation_id: u64) -> Option<&[String]> {
        None
    }
}

/// In-memory terms provider.
#[derive(Debug, Clone, Default)]
pub struct StaticTerms {
    terms: HashMap<u64, Vec<String>>,
}

#[derive(Debug, Deserialize)]
struct TermRow {
    correlation_id: u64,
    term: String,
}

impl StaticTerms {
    /// Creates an empty provider.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds terms for a correlation id, appending to any already present.
    pub fn with_terms<I, S>(mut self, correlation_id: u64, terms: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.terms
            .entry(correlation_id)
            .or_default()
            .extend(terms.into_iter().map(Into::into));
        self
    }

    /// Loads terms from CSV with a `correlation_id,term` header.
    ///
    /// Each row contributes one term; rows for the same id keep file order.
    /// Blank terms are skipped.
    pub fn from_csv_reader<R: Read>(reader: R) -> SearchClientResult<Self> {
        let mut csv = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(reader);
        let mut terms: HashMap<u64, Vec<String>> = HashMap::new();

        for (line, row) in csv.deserialize::<TermRow>().enumerate() {
            let row = row.map_err(|e| ConfigError::InvalidSetting {
                setting: "extra_terms".to_string(),
                // +2: one for the header, one for 1-based numbering
                message: format!("row {}: {}", line + 2, e),
            })?;
            if row.term.is_empty() {
                continue;
            }
            terms.entry(row.correlation_id).or_default().push(row.term);
        }

        tracing::debug!(sectors = terms.len(), "Loaded extra search terms");
        Ok(Self { terms })
    }

    /// Loads terms from a CSV file on disk.
    pub fn from_csv_path(path: impl AsRef<Path>) -> SearchClientResult<Self> {
        let path = path.as_ref();
        let file = std::fs::File::open(path).map_err(|e| ConfigError::InvalidSetting {
            setting: "extra_terms".to_string(),
            message: format!("cannot open {}: {}", path.display(), e),
        })?;
        Self::from_csv_reader(file)
    }

    /// Number of correlation ids with terms.
    pub fn len(&self) -> usize {
        self.terms.len()
    }

    /// Returns true if no terms are configured.
    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }
}

impl TermsProvider for StaticTerms {
    fn terms_for(&self, correlation_id: u64) -> Option<&[String]> {
        self.terms.get(&correlation_id).map(Vec::as_slice)
    }
}

impl From<HashMap<u64, Vec<String>>> for StaticTerms {
    fn from(terms: HashMap<u64, Vec<String>>) -> Self {
        Self { terms }
    }
}
