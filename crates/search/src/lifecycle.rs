//! Index creation, deletion and refresh.
//!
//! These are maintenance operations, separate from per-document writes. They
//! must not run concurrently with writes to the same index; callers sequence
//! delete/create, bulk indexing and commit as one phase.

use serde_json::Value;

use crate::error::{SearchClientResult, TransportError};
use crate::transport::DynTransport;

/// Creates, deletes and refreshes indices through a transport.
#[derive(Clone)]
pub struct IndexLifecycle {
    transport: DynTransport,
}

impl IndexLifecycle {
    /// Creates a lifecycle manager over `transport`.
    pub fn new(transport: DynTransport) -> Self {
        Self { transport }
    }

    /// Deletes `index` and recreates it with `body`.
    ///
    /// A missing index is not an error. Any failure creating the index is
    /// returned; at that point the old index is already gone.
    pub async fn rebuild_index(&self, index: &str, body: &Value) -> SearchClientResult<()> {
        self.delete_index(index).await?;
        self.create_index(index, body).await
    }

    /// Creates `index` with the given mapping/settings body.
    pub async fn create_index(&self, index: &str, body: &Value) -> SearchClientResult<()> {
        self.transport.create_index(index, body).await?;
        tracing::info!(index = %index, transport = self.transport.name(), "Created index");
        Ok(())
    }

    /// Deletes `index`, treating a missing index as success.
    pub async fn delete_index(&self, index: &str) -> SearchClientResult<()> {
        match self.transport.delete_index(index).await {
            Ok(()) => {
                tracing::info!(index = %index, "Deleted index");
                Ok(())
            }
            Err(TransportError::NotFound { .. }) => {
                tracing::debug!(index = %index, "Index did not exist, nothing to delete");
                Ok(())
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Makes documents written to `index` visible to searches.
    pub async fn commit(&self, index: &str) -> SearchClientResult<()> {
        self.transport.refresh_index(index).await?;
        tracing::debug!(index = %index, "Refreshed index");
        Ok(())
    }
}
