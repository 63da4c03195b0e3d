//! Search client configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::ConfigError;

/// Authentication configuration for the search engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum SearchAuth {
    /// Basic username/password authentication.
    Basic {
        /// The username for basic auth.
        username: String,
        /// The password for basic auth.
        password: String,
    },
    /// Bearer token authentication.
    Bearer {
        /// The bearer token.
        token: String,
    },
}

/// Configuration for the sector search client.
///
/// Everything engine-specific (index name, document type label, the fields
/// searched and the mapping payload) comes from here; nothing is hardcoded in
/// the components.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchClientConfig {
    /// Engine node URLs (e.g., `["http://localhost:9200"]`).
    /// Currently uses the first node (single-node connection pool).
    pub nodes: Vec<String>,

    /// Name of the index (or alias, for aliased rebuilds) holding sectors.
    #[serde(default = "default_index_name")]
    pub index_name: String,

    /// Label stored on every document identifying its schema flavour.
    #[serde(default = "default_document_type")]
    pub document_type: String,

    /// Fields searched by free-text queries.
    #[serde(default = "default_search_fields")]
    pub search_fields: Vec<String>,

    /// Number of primary shards (default: 1).
    #[serde(default = "default_shards")]
    pub number_of_shards: u32,

    /// Number of replica shards (default: 1).
    #[serde(default = "default_replicas")]
    pub number_of_replicas: u32,

    /// Refresh interval (default: "1s").
    #[serde(default = "default_refresh_interval")]
    pub refresh_interval: String,

    /// Maximum result window size (default: 10000). Searches ask for this
    /// many hits so the client imposes no limit of its own.
    #[serde(default = "default_max_result_window")]
    pub max_result_window: u32,

    /// Request timeout in milliseconds (default: 30000).
    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,

    /// Upper bound on concurrent document writes during bulk indexing
    /// (default: 4). `1` writes strictly in input order.
    #[serde(default = "default_bulk_concurrency")]
    pub bulk_concurrency: usize,

    /// Lowercase a trailing `AND`/`OR`/`NOT` in free-text queries
    /// (default: true).
    #[serde(default = "default_normalize_boolean_operators")]
    pub normalize_boolean_operators: bool,

    /// Replaces the generated mapping/settings payload when set.
    #[serde(default)]
    pub index_settings: Option<Value>,

    /// Optional authentication.
    #[serde(default)]
    pub auth: Option<SearchAuth>,

    /// Whether to disable certificate validation (default: false).
    /// Only use for development/testing.
    #[serde(default)]
    pub disable_certificate_validation: bool,
}

fn default_index_name() -> String {
    "licence-finder-sectors".to_string()
}

fn default_document_type() -> String {
    "sector".to_string()
}

fn default_search_fields() -> Vec<String> {
    vec![
        "title".to_string(),
        "extra_terms".to_string(),
        "activities".to_string(),
    ]
}

fn default_shards() -> u32 {
    1
}

fn default_replicas() -> u32 {
    1
}

fn default_refresh_interval() -> String {
    "1s".to_string()
}

fn default_max_result_window() -> u32 {
    10000
}

fn default_request_timeout_ms() -> u64 {
    30000
}

fn default_bulk_concurrency() -> usize {
    4
}

fn default_normalize_boolean_operators() -> bool {
    true
}

impl Default for SearchClientConfig {
    fn default() -> Self {
        Self {
            nodes: vec!["http://localhost:9200".to_string()],
            index_name: default_index_name(),
            document_type: default_document_type(),
            search_fields: default_search_fields(),
            number_of_shards: default_shards(),
            number_of_replicas: default_replicas(),
            refresh_interval: default_refresh_interval(),
            max_result_window: default_max_result_window(),
            request_timeout_ms: default_request_timeout_ms(),
            bulk_concurrency: default_bulk_concurrency(),
            normalize_boolean_operators: default_normalize_boolean_operators(),
            index_settings: None,
            auth: None,
            disable_certificate_validation: false,
        }
    }
}

impl SearchClientConfig {
    /// Returns the per-request timeout.
    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }

    /// Validates the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.nodes.is_empty() {
            return Err(invalid("nodes", "at least one node is required"));
        }
        if self.index_name.trim().is_empty() {
            return Err(invalid("index_name", "cannot be empty"));
        }
        // Engine index names must be lowercase.
        if self.index_name.chars().any(|c| c.is_uppercase()) {
            return Err(invalid("index_name", "must be lowercase"));
        }
        if self.document_type.trim().is_empty() {
            return Err(invalid("document_type", "cannot be empty"));
        }
        if self.search_fields.is_empty() {
            return Err(invalid("search_fields", "at least one field is required"));
        }
        if self.bulk_concurrency == 0 {
            return Err(invalid("bulk_concurrency", "cannot be 0"));
        }
        if self.request_timeout_ms == 0 {
            return Err(invalid("request_timeout_ms", "cannot be 0"));
        }
        if let Some(settings) = &self.index_settings {
            if !settings.is_object() {
                return Err(invalid("index_settings", "must be a JSON object"));
            }
        }
        Ok(())
    }
}

fn invalid(setting: &str, message: &str) -> ConfigError {
    ConfigError::InvalidSetting {
        setting: setting.to_string(),
        message: message.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_config_defaults() {
        let config = SearchClientConfig::default();
        assert_eq!(config.nodes, vec!["http://localhost:9200"]);
        assert_eq!(config.index_name, "licence-finder-sectors");
        assert_eq!(config.document_type, "sector");
        assert_eq!(
            config.search_fields,
            vec!["title", "extra_terms", "activities"]
        );
        assert_eq!(config.bulk_concurrency, 4);
        assert!(config.normalize_boolean_operators);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_deserialize_fills_defaults() {
        let config: SearchClientConfig = serde_json::from_value(json!({
            "nodes": ["http://es:9200"],
            "index_name": "test-index"
        }))
        .unwrap();
        assert_eq!(config.index_name, "test-index");
        assert_eq!(config.document_type, "sector");
        assert_eq!(config.max_result_window, 10000);
        assert!(config.auth.is_none());
    }

    #[test]
    fn test_validate_rejects_uppercase_index() {
        let config = SearchClientConfig {
            index_name: "Sectors".to_string(),
            ..Default::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidSetting { setting, .. }) if setting == "index_name"
        ));
    }

    #[test]
    fn test_validate_rejects_zero_concurrency() {
        let config = SearchClientConfig {
            bulk_concurrency: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_non_object_settings() {
        let config = SearchClientConfig {
            index_settings: Some(json!(["nope"])),
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }
}
