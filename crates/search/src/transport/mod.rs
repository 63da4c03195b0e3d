//! Transport abstraction between the search components and the engine.
//!
//! The lifecycle manager, the bulk indexer and the search executor only ever
//! talk to an [`IndexTransport`]. Two implementations ship with the crate:
//!
//! | Transport | Feature | Description |
//! |-----------|---------|-------------|
//! | [`ElasticsearchTransport`] | `elasticsearch` | HTTP transport over the official client |
//! | [`MemoryTransport`] | always | In-process index for tests and dry runs |
//!
//! [`DeadlineTransport`] wraps either one to bound every call by a deadline.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;

use crate::error::TransportError;

mod deadline;
#[cfg(feature = "elasticsearch")]
mod elasticsearch;
mod memory;

pub use deadline::DeadlineTransport;
#[cfg(feature = "elasticsearch")]
pub use self::elasticsearch::ElasticsearchTransport;
pub use memory::{MemoryTransport, TransportCall};

/// Result type alias for transport calls.
pub type TransportResult<T> = Result<T, TransportError>;

/// Shared, type-erased transport handed to each component.
pub type DynTransport = Arc<dyn IndexTransport>;

/// Raw operations against the search engine.
///
/// Implementations map engine responses onto [`TransportError`] kinds:
/// a missing index or document is [`TransportError::NotFound`], connection
/// trouble is [`TransportError::Transient`] and rejected payloads are
/// [`TransportError::MalformedRequest`]. Callers decide which kinds to
/// tolerate.
#[async_trait]
pub trait IndexTransport: Send + Sync {
    /// Returns a short name for logs.
    fn name(&self) -> &'static str;

    /// Deletes an index.
    async fn delete_index(&self, index: &str) -> TransportResult<()>;

    /// Creates an index with the given mapping/settings body.
    async fn create_index(&self, index: &str, body: &Value) -> TransportResult<()>;

    /// Writes a document at `id`, replacing any existing document.
    async fn put_document(&self, index: &str, id: &str, body: &Value) -> TransportResult<()>;

    /// Makes recent writes to `index` visible to searches.
    async fn refresh_index(&self, index: &str) -> TransportResult<()>;

    /// Runs a search request and returns the raw response body.
    async fn search(&self, index: &str, body: &Value) -> TransportResult<Value>;

    /// Returns the concrete indices an alias currently points at.
    ///
    /// An unknown alias yields an empty list.
    async fn alias_targets(&self, alias: &str) -> TransportResult<Vec<String>>;

    /// Atomically points `alias` at `target`, detaching it from `previous`.
    async fn swap_alias(&self, alias: &str, previous: &[String], target: &str)
    -> TransportResult<()>;
}
