//! Licence Finder sector search
//!
//! This crate builds and queries the free-text index used to look up business
//! sectors. It maps sector records into search documents, manages the index
//! lifecycle, writes documents in bulk and turns raw user input into safe
//! engine queries.
//!
//! # Features
//!
//! - `elasticsearch` (default) - HTTP transport over the official Elasticsearch client
//!
//! Without it only the in-memory transport is available.
//!
//! # Architecture
//!
//! - [`sanitizer`] - Escaping of query-syntax characters in user input
//! - [`mapper`] - Sector record to search document mapping
//! - [`terms`] - Extra search terms keyed by correlation id
//! - [`lifecycle`] - Index delete/create/refresh
//! - [`indexer`] - Bulk document writes with per-record outcomes
//! - [`executor`] - Query building and hit parsing
//! - [`transport`] - The engine seam and its implementations
//! - [`client`] - A client wiring all of the above to one configuration
//!
//! # Quick Start
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use licence_finder_search::{SearchClientConfig, SectorRecord, SectorSearchClient, StaticTerms};
//!
//! # async fn run() -> licence_finder_search::SearchClientResult<()> {
//! let config = SearchClientConfig {
//!     nodes: vec!["http://localhost:9200".to_string()],
//!     ..Default::default()
//! };
//! let terms = StaticTerms::new().with_terms(123, ["kittens", "puppies"]);
//!
//! let client = SectorSearchClient::builder(config)
//!     .terms(Arc::new(terms))
//!     .build()?;
//!
//! let records = vec![SectorRecord::new(321, "Pet shop").with_correlation_id(123)];
//! let report = client.rebuild(&records).await?;
//! assert!(report.is_complete());
//!
//! let ids = client.search("kittens").await?;
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

pub mod client;
pub mod config;
pub mod error;
pub mod executor;
pub mod indexer;
pub mod lifecycle;
pub mod mapper;
pub mod sanitizer;
pub mod schema;
pub mod terms;
pub mod transport;
pub mod types;

// Re-export commonly used types at crate root
pub use client::{AliasedRebuild, SectorSearchClient, SectorSearchClientBuilder};
pub use config::{SearchAuth, SearchClientConfig};
pub use error::{ConfigError, DocumentError, SearchClientError, SearchClientResult, TransportError};
pub use indexer::{IndexReport, RecordOutcome};
pub use terms::{NoTerms, StaticTerms, TermsProvider};
pub use types::{IndexedDocument, SectorRecord};

// Re-export the transport seam
pub use transport::{DynTransport, IndexTransport, MemoryTransport};

/// Crate version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Crate name.
pub const NAME: &str = env!("CARGO_PKG_NAME");
