//! Per-call deadline wrapper.

use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;

use crate::error::TransportError;

use super::{DynTransport, IndexTransport, TransportResult};

/// Wraps a transport so every call fails with [`TransportError::Transient`]
/// once `deadline` has elapsed.
pub struct DeadlineTransport {
    inner: DynTransport,
    deadline: Duration,
}

impl DeadlineTransport {
    /// Bounds each call on `inner` by `deadline`.
    pub fn new(inner: DynTransport, deadline: Duration) -> Self {
        Self { inner, deadline }
    }

    async fn bounded<T>(
        &self,
        operation: &str,
        call: impl Future<Output = TransportResult<T>>,
    ) -> TransportResult<T> {
        match tokio::time::timeout(self.deadline, call).await {
            Ok(result) => result,
            Err(_) => {
                tracing::warn!(operation, deadline = ?self.deadline, "Search engine call timed out");
                Err(TransportError::Transient {
                    operation: operation.to_string(),
                    message: format!("deadline of {:?} exceeded", self.deadline),
                })
            }
        }
    }
}

#[async_trait]
impl IndexTransport for DeadlineTransport {
    fn name(&self) -> &'static str {
        self.inner.name()
    }

    async fn delete_index(&self, index: &str) -> TransportResult<()> {
        self.bounded("delete_index", self.inner.delete_index(index))
            .await
    }

    async fn create_index(&self, index: &str, body: &Value) -> TransportResult<()> {
        self.bounded("create_index", self.inner.create_index(index, body))
            .await
    }

    async fn put_document(&self, index: &str, id: &str, body: &Value) -> TransportResult<()> {
        self.bounded("put_document", self.inner.put_document(index, id, body))
            .await
    }

    async fn refresh_index(&self, index: &str) -> TransportResult<()> {
        self.bounded("refresh_index", self.inner.refresh_index(index))
            .await
    }

    async fn search(&self, index: &str, body: &Value) -> TransportResult<Value> {
        self.bounded("search", self.inner.search(index, body)).await
    }

    async fn alias_targets(&self, alias: &str) -> TransportResult<Vec<String>> {
        self.bounded("alias_targets", self.inner.alias_targets(alias))
            .await
    }

    async fn swap_alias(
        &self,
        alias: &str,
        previous: &[String],
        target: &str,
    ) -> TransportResult<()> {
        self.bounded("swap_alias", self.inner.swap_alias(alias, previous, target))
            .await
    }
}
