//! Bulk indexing of sector records.
//!
//! Each record is mapped and written independently: a failed write is
//! recorded against its record and the remaining records are still written.
//! Earlier writes are never rolled back; re-running the whole pass is the
//! recovery path, and it is safe because documents are addressed by id.

use futures::stream::{self, StreamExt};

use crate::error::SearchClientError;
use crate::mapper::DocumentMapper;
use crate::transport::DynTransport;
use crate::types::SectorRecord;

/// Outcome of writing one record.
#[derive(Debug)]
pub struct RecordOutcome {
    /// The record's public id.
    pub public_id: u64,
    /// `Ok` if the document was written.
    pub result: Result<(), SearchClientError>,
}

/// Per-record results of a bulk indexing pass, in input order.
#[derive(Debug, Default)]
pub struct IndexReport {
    /// One entry per input record.
    pub outcomes: Vec<RecordOutcome>,
}

impl IndexReport {
    /// Number of records written.
    pub fn indexed(&self) -> usize {
        self.outcomes.iter().filter(|o| o.result.is_ok()).count()
    }

    /// Records that failed, with their errors.
    pub fn failures(&self) -> impl Iterator<Item = (u64, &SearchClientError)> {
        self.outcomes
            .iter()
            .filter_map(|o| o.result.as_ref().err().map(|e| (o.public_id, e)))
    }

    /// Number of records that failed.
    pub fn failed(&self) -> usize {
        self.outcomes.len() - self.indexed()
    }

    /// Returns true if every record was written.
    pub fn is_complete(&self) -> bool {
        self.outcomes.iter().all(|o| o.result.is_ok())
    }
}

/// Writes sector documents into an index.
#[derive(Clone)]
pub struct BulkIndexer {
    transport: DynTransport,
    mapper: DocumentMapper,
    concurrency: usize,
}

impl BulkIndexer {
    /// Creates an indexer issuing at most `concurrency` writes at once.
    pub fn new(transport: DynTransport, mapper: DocumentMapper, concurrency: usize) -> Self {
        Self {
            transport,
            mapper,
            concurrency: concurrency.max(1),
        }
    }

    /// Maps and writes every record into `index`.
    ///
    /// Never fails as a whole; inspect the returned [`IndexReport`].
    pub async fn index(&self, index: &str, records: &[SectorRecord]) -> IndexReport {
        let outcomes: Vec<RecordOutcome> = stream::iter(records)
            .map(|record| async move {
                RecordOutcome {
                    public_id: record.public_id,
                    result: self.index_one(index, record).await,
                }
            })
            // `buffered` keeps outcomes in input order while overlapping writes.
            .buffered(self.concurrency)
            .collect()
            .await;

        let report = IndexReport { outcomes };
        for (public_id, error) in report.failures() {
            tracing::warn!(index = %index, public_id, error = %error, "Failed to index sector");
        }
        tracing::info!(
            index = %index,
            indexed = report.indexed(),
            failed = report.failed(),
            "Bulk indexing finished"
        );
        report
    }

    /// Maps and writes a single record.
    pub async fn index_one(&self, index: &str, record: &SectorRecord) -> Result<(), SearchClientError> {
        let document = self.mapper.to_document(record)?;
        let body = serde_json::to_value(&document)?;
        self.transport
            .put_document(index, &document.document_id(), &body)
            .await?;
        tracing::trace!(index = %index, id = document.id, "Indexed sector");
        Ok(())
    }
}
