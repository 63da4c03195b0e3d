//! Error types for the taxonomy store and importer.

use std::path::PathBuf;

use thiserror::Error;

/// Errors raised by the taxonomy store and the sector importer.
#[derive(Error, Debug)]
pub enum TaxonomyError {
    /// A record with this public id already exists.
    #[error("{kind} with public id {public_id} already exists")]
    DuplicatePublicId {
        /// `"sector"` or `"activity"`.
        kind: &'static str,
        /// The conflicting id.
        public_id: u64,
    },

    /// A record with this correlation id already exists.
    #[error("{kind} with correlation id {correlation_id} already exists")]
    DuplicateCorrelationId {
        /// `"sector"` or `"activity"`.
        kind: &'static str,
        /// The conflicting id.
        correlation_id: u64,
    },

    /// The record has a blank name.
    #[error("{kind} requires a name")]
    MissingName {
        /// `"sector"` or `"activity"`.
        kind: &'static str,
    },

    /// No sector has this public id.
    #[error("sector {public_id} not found")]
    SectorNotFound {
        /// The missing id.
        public_id: u64,
    },

    /// No activity has this public id.
    #[error("activity {public_id} not found")]
    ActivityNotFound {
        /// The missing id.
        public_id: u64,
    },

    /// The CSV input could not be read or decoded.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// A data file could not be opened.
    #[error("failed to open {}: {source}", path.display())]
    Io {
        /// The file that failed to open.
        path: PathBuf,
        /// The underlying error.
        #[source]
        source: std::io::Error,
    },

    /// A row decoded but its contents are unusable.
    #[error("row {row}: {message}")]
    MalformedRow {
        /// 1-based data row number (header excluded).
        row: usize,
        /// What is wrong with it.
        message: String,
    },
}

/// Result type alias for taxonomy operations.
pub type TaxonomyResult<T> = Result<T, TaxonomyError>;
