//! The sector search client.
//!
//! [`SectorSearchClient`] wires the lifecycle manager, bulk indexer and search
//! executor to one transport and one configuration. A full rebuild is
//! `pre_index` → `index` → `post_index`; [`SectorSearchClient::rebuild`] runs
//! the three in order.
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//!
//! use licence_finder_search::{SearchClientConfig, SectorRecord, SectorSearchClient};
//! use licence_finder_search::transport::MemoryTransport;
//!
//! # tokio_test::block_on(async {
//! let client = SectorSearchClient::builder(SearchClientConfig::default())
//!     .transport(Arc::new(MemoryTransport::new()))
//!     .build()?;
//!
//! client.rebuild(&[SectorRecord::new(1, "Pet shop")]).await?;
//! assert_eq!(client.search("pet").await?, vec![1]);
//! # Ok::<(), licence_finder_search::SearchClientError>(())
//! # }).unwrap();
//! ```

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use uuid::Uuid;

use crate::config::SearchClientConfig;
use crate::error::{ConfigError, SearchClientError, SearchClientResult};
use crate::executor::{SearchExecutor, SearchOptions};
use crate::indexer::{BulkIndexer, IndexReport};
use crate::lifecycle::IndexLifecycle;
use crate::mapper::DocumentMapper;
use crate::schema;
use crate::terms::{NoTerms, TermsProvider};
use crate::transport::{DeadlineTransport, DynTransport};
use crate::types::SectorRecord;

/// Result of a rebuild behind an alias.
#[derive(Debug)]
pub struct AliasedRebuild {
    /// The freshly built index the alias now points at.
    pub index: String,
    /// Indices the alias pointed at before; they have been deleted.
    pub retired: Vec<String>,
    /// Previous indices that could not be deleted. The alias no longer
    /// points at them.
    pub undeleted: Vec<String>,
    /// Per-record indexing results.
    pub report: IndexReport,
}

/// Builder for [`SectorSearchClient`].
pub struct SectorSearchClientBuilder {
    config: SearchClientConfig,
    transport: Option<DynTransport>,
    terms: Arc<dyn TermsProvider>,
    deadline: Option<Duration>,
}

impl SectorSearchClientBuilder {
    /// Sets the transport. Required unless the `elasticsearch` feature is
    /// enabled, in which case one is built from the configuration.
    pub fn transport(mut self, transport: DynTransport) -> Self {
        self.transport = Some(transport);
        self
    }

    /// Sets the extra terms source (default: none).
    pub fn terms(mut self, terms: Arc<dyn TermsProvider>) -> Self {
        self.terms = terms;
        self
    }

    /// Bounds every engine call by `deadline`; overruns fail as transient.
    pub fn deadline(mut self, deadline: Duration) -> Self {
        self.deadline = Some(deadline);
        self
    }

    /// Validates the configuration and builds the client.
    pub fn build(self) -> SearchClientResult<SectorSearchClient> {
        self.config.validate()?;

        let transport = match self.transport {
            Some(transport) => transport,
            None => default_transport(&self.config)?,
        };
        let transport: DynTransport = match self.deadline {
            Some(deadline) => Arc::new(DeadlineTransport::new(transport, deadline)),
            None => transport,
        };

        let mapper = DocumentMapper::new(self.config.document_type.clone(), self.terms);
        let options = SearchOptions {
            fields: self.config.search_fields.clone(),
            normalize_boolean_operators: self.config.normalize_boolean_operators,
            size: schema::result_window(&self.config),
        };

        Ok(SectorSearchClient {
            transport: transport.clone(),
            lifecycle: IndexLifecycle::new(transport.clone()),
            indexer: BulkIndexer::new(transport.clone(), mapper, self.config.bulk_concurrency),
            executor: SearchExecutor::new(transport, options),
            config: self.config,
        })
    }
}

#[cfg(feature = "elasticsearch")]
fn default_transport(config: &SearchClientConfig) -> Result<DynTransport, ConfigError> {
    let transport = crate::transport::ElasticsearchTransport::new(config)?;
    Ok(Arc::new(transport))
}

#[cfg(not(feature = "elasticsearch"))]
fn default_transport(_config: &SearchClientConfig) -> Result<DynTransport, ConfigError> {
    Err(ConfigError::InvalidSetting {
        setting: "transport".to_string(),
        message: "no transport given and the 'elasticsearch' feature is disabled".to_string(),
    })
}

/// Indexes sectors and answers free-text lookups against one index.
#[derive(Clone)]
pub struct SectorSearchClient {
    config: SearchClientConfig,
    transport: DynTransport,
    lifecycle: IndexLifecycle,
    indexer: BulkIndexer,
    executor: SearchExecutor,
}

impl std::fmt::Debug for SectorSearchClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SectorSearchClient")
            .field("config", &self.config)
            .field("transport", &self.transport.name())
            .finish_non_exhaustive()
    }
}

impl SectorSearchClient {
    /// Starts building a client for `config`.
    pub fn builder(config: SearchClientConfig) -> SectorSearchClientBuilder {
        SectorSearchClientBuilder {
            config,
            transport: None,
            terms: Arc::new(NoTerms),
            deadline: None,
        }
    }

    /// Returns the client configuration.
    pub fn config(&self) -> &SearchClientConfig {
        &self.config
    }

    /// Returns the configured index (or alias) name.
    pub fn index_name(&self) -> &str {
        &self.config.index_name
    }

    /// Drops and recreates the index with the configured mapping.
    ///
    /// If the configured name is an alias left by
    /// [`rebuild_behind_alias`](Self::rebuild_behind_alias), the indices
    /// behind it are deleted first, which removes the alias.
    pub async fn pre_index(&self) -> SearchClientResult<()> {
        self.delete_alias_targets().await?;
        let body = schema::index_body(&self.config);
        self.lifecycle
            .rebuild_index(&self.config.index_name, &body)
            .await
    }

    /// Writes `records` into the index. See [`BulkIndexer::index`].
    pub async fn index(&self, records: &[SectorRecord]) -> IndexReport {
        self.indexer.index(&self.config.index_name, records).await
    }

    /// Makes the indexed documents searchable.
    pub async fn post_index(&self) -> SearchClientResult<()> {
        self.lifecycle.commit(&self.config.index_name).await
    }

    /// Runs `pre_index`, `index` and `post_index` in order.
    ///
    /// Record failures are reported in the returned [`IndexReport`]; only
    /// lifecycle failures abort the rebuild.
    pub async fn rebuild(&self, records: &[SectorRecord]) -> SearchClientResult<IndexReport> {
        tracing::info!(
            index = %self.config.index_name,
            records = records.len(),
            "Rebuilding sector index"
        );
        self.pre_index().await?;
        let report = self.index(records).await;
        self.post_index().await?;
        Ok(report)
    }

    /// Rebuilds into a fresh index and then repoints the configured name, as
    /// an alias, at it.
    ///
    /// Until the alias swap the previous index keeps serving searches. Any
    /// failure before the swap deletes the new index and leaves the alias
    /// alone, and so does a rebuild that indexed none of a non-empty
    /// `records` ([`SearchClientError::NothingIndexed`]). After the swap the
    /// previous indices are deleted; ones that cannot be are logged and
    /// returned in [`AliasedRebuild::undeleted`].
    pub async fn rebuild_behind_alias(
        &self,
        records: &[SectorRecord],
    ) -> SearchClientResult<AliasedRebuild> {
        let alias = &self.config.index_name;
        let index = fresh_index_name(alias);
        let body = schema::index_body(&self.config);

        self.lifecycle.create_index(&index, &body).await?;

        let (report, previous) = match self.stage(alias, &index, records).await {
            Ok(staged) => staged,
            Err(e) => {
                self.discard(&index).await;
                return Err(e);
            }
        };
        tracing::info!(alias = %alias, index = %index, "Alias now points at rebuilt index");

        let mut retired = Vec::with_capacity(previous.len());
        let mut undeleted = Vec::new();
        for old in previous {
            match self.lifecycle.delete_index(&old).await {
                Ok(()) => retired.push(old),
                Err(e) => {
                    tracing::warn!(index = %old, error = %e, "Failed to delete previous index");
                    undeleted.push(old);
                }
            }
        }

        Ok(AliasedRebuild {
            index,
            retired,
            undeleted,
            report,
        })
    }

    /// Deletes the index; a missing index is not an error.
    ///
    /// When the configured name is an alias, the indices behind it are
    /// deleted.
    pub async fn delete_index(&self) -> SearchClientResult<()> {
        self.delete_alias_targets().await?;
        self.lifecycle.delete_index(&self.config.index_name).await
    }

    /// Returns ids of sectors matching `query_text`, best match first.
    pub async fn search(&self, query_text: &str) -> SearchClientResult<Vec<u64>> {
        self.executor
            .search(&self.config.index_name, query_text)
            .await
    }

    /// Populates `index` and points `alias` at it, returning the report and
    /// the indices the alias used to point at.
    async fn stage(
        &self,
        alias: &str,
        index: &str,
        records: &[SectorRecord],
    ) -> SearchClientResult<(IndexReport, Vec<String>)> {
        let report = self.indexer.index(index, records).await;
        if report.indexed() == 0 && !records.is_empty() {
            return Err(SearchClientError::NothingIndexed {
                index: index.to_string(),
                records: records.len(),
            });
        }
        self.lifecycle.commit(index).await?;

        let previous = self.transport.alias_targets(alias).await?;
        if previous.is_empty() {
            // A plain rebuild may have left a concrete index under the alias name.
            self.lifecycle.delete_index(alias).await?;
        }
        self.transport.swap_alias(alias, &previous, index).await?;
        Ok((report, previous))
    }

    async fn delete_alias_targets(&self) -> SearchClientResult<()> {
        let targets = self
            .transport
            .alias_targets(&self.config.index_name)
            .await?;
        for target in &targets {
            self.lifecycle.delete_index(target).await?;
        }
        Ok(())
    }

    async fn discard(&self, index: &str) {
        if let Err(e) = self.lifecycle.delete_index(index).await {
            tracing::warn!(index = %index, error = %e, "Failed to clean up partially built index");
        }
    }
}

/// `{alias}-{timestamp}-{random}`; the random part keeps rebuilds started in
/// the same millisecond apart.
fn fresh_index_name(alias: &str) -> String {
    let suffix = Uuid::new_v4().simple().to_string();
    format!(
        "{}-{}-{}",
        alias,
        Utc::now().format("%Y%m%d%H%M%S%3f"),
        &suffix[..8]
    )
}
