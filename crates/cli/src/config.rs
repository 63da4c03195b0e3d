//! Command line configuration.
//!
//! # Environment Variables
//!
//! | Variable | Default | Description |
//! |----------|---------|-------------|
//! | `LF_ES_NODES` | http://localhost:9200 | Engine node URLs (comma-separated) |
//! | `LF_ES_USERNAME` | | Basic auth username |
//! | `LF_ES_PASSWORD` | | Basic auth password |
//! | `LF_INDEX_NAME` | licence-finder-sectors | Index (or alias) name |
//! | `LF_DOCUMENT_TYPE` | sector | Document type label |
//! | `LF_SHARDS` | 1 | Primary shards for new indices |
//! | `LF_REPLICAS` | 1 | Replica shards for new indices |
//! | `LF_REQUEST_TIMEOUT` | 30 | Transport request timeout (seconds) |
//! | `LF_DEADLINE_MS` | | Per-call deadline (milliseconds) |
//! | `LF_BULK_CONCURRENCY` | 4 | Concurrent document writes |
//! | `LF_NORMALIZE_BOOLEAN_OPERATORS` | true | Lowercase a trailing AND/OR/NOT |
//! | `LF_LOG_LEVEL` | info | Log level |

use std::path::PathBuf;
use std::time::Duration;

use clap::{Parser, Subcommand};
use licence_finder_search::{SearchAuth, SearchClientConfig};

/// Licence Finder sector search maintenance tool.
#[derive(Debug, Clone, Parser)]
#[command(name = "licence-search")]
#[command(about = "Build and query the Licence Finder sector search index")]
pub struct Cli {
    /// Engine node URLs (comma-separated).
    #[arg(
        long,
        env = "LF_ES_NODES",
        default_value = "http://localhost:9200",
        global = true
    )]
    pub nodes: String,

    /// Basic auth username.
    #[arg(long, env = "LF_ES_USERNAME", global = true)]
    pub username: Option<String>,

    /// Basic auth password.
    #[arg(long, env = "LF_ES_PASSWORD", global = true, hide_env_values = true)]
    pub password: Option<String>,

    /// Index name. With `reindex --alias` this is the alias.
    #[arg(
        long,
        env = "LF_INDEX_NAME",
        default_value = "licence-finder-sectors",
        global = true
    )]
    pub index: String,

    /// Document type label stored on every document.
    #[arg(long, env = "LF_DOCUMENT_TYPE", default_value = "sector", global = true)]
    pub document_type: String,

    /// Primary shards for new indices.
    #[arg(long, env = "LF_SHARDS", default_value = "1", global = true)]
    pub shards: u32,

    /// Replica shards for new indices.
    #[arg(long, env = "LF_REPLICAS", default_value = "1", global = true)]
    pub replicas: u32,

    /// Transport request timeout in seconds.
    #[arg(long, env = "LF_REQUEST_TIMEOUT", default_value = "30", global = true)]
    pub request_timeout: u64,

    /// Deadline applied to every engine call, in milliseconds.
    #[arg(long, env = "LF_DEADLINE_MS", global = true)]
    pub deadline_ms: Option<u64>,

    /// Maximum concurrent document writes while indexing.
    #[arg(long, env = "LF_BULK_CONCURRENCY", default_value = "4", global = true)]
    pub bulk_concurrency: usize,

    /// Lowercase a trailing AND/OR/NOT in search text.
    #[arg(
        long,
        env = "LF_NORMALIZE_BOOLEAN_OPERATORS",
        default_value = "true",
        action = clap::ArgAction::Set,
        global = true
    )]
    pub normalize_boolean_operators: bool,

    /// Log level (error, warn, info, debug, trace).
    #[arg(long, env = "LF_LOG_LEVEL", default_value = "info", global = true)]
    pub log_level: String,

    #[command(subcommand)]
    pub command: Command,
}

/// Subcommands.
#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// Import sectors from CSV and rebuild the index from them.
    Reindex {
        /// Sector taxonomy CSV file.
        #[arg(long)]
        sectors: PathBuf,

        /// Extra search terms CSV file (`correlation_id,term`).
        #[arg(long)]
        extra_terms: Option<PathBuf>,

        /// Build a fresh index and switch the index name, as an alias, to it.
        #[arg(long)]
        alias: bool,
    },

    /// Search sectors and print matching ids, best match first.
    Search {
        /// Search text; multiple words are joined with spaces.
        #[arg(required = true, num_args = 1..)]
        text: Vec<String>,
    },

    /// Delete the index. A missing index is not an error.
    DeleteIndex,
}

impl Cli {
    /// Splits `--nodes` into URLs, dropping blanks.
    pub fn node_urls(&self) -> Vec<String> {
        self.nodes
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect()
    }

    /// Returns the per-call deadline, if any.
    pub fn deadline(&self) -> Option<Duration> {
        self.deadline_ms.map(Duration::from_millis)
    }

    /// Builds the search client configuration from the arguments.
    pub fn search_config(&self) -> SearchClientConfig {
        let auth = match (&self.username, &self.password) {
            (Some(username), Some(password)) => Some(SearchAuth::Basic {
                username: username.clone(),
                password: password.clone(),
            }),
            _ => None,
        };

        SearchClientConfig {
            nodes: self.node_urls(),
            index_name: self.index.clone(),
            document_type: self.document_type.clone(),
            number_of_shards: self.shards,
            number_of_replicas: self.replicas,
            request_timeout_ms: self.request_timeout.saturating_mul(1000),
            bulk_concurrency: self.bulk_concurrency,
            normalize_boolean_operators: self.normalize_boolean_operators,
            auth,
            ..Default::default()
        }
    }

    /// Returns the search text as one string.
    pub fn search_text(text: &[String]) -> String {
        text.join(" ")
    }
}
