//! Index mapping and settings for sector documents.

use serde_json::{Value, json};

use crate::config::SearchClientConfig;

/// Returns the mapping/settings payload used when creating the index.
///
/// A payload supplied through [`SearchClientConfig::index_settings`] wins;
/// otherwise one is generated from the shard, replica, refresh and result
/// window settings.
pub fn index_body(config: &SearchClientConfig) -> Value {
    config
        .index_settings
        .clone()
        .unwrap_or_else(|| create_index_mapping(config))
}

/// Returns the result window of indices created from `config`.
///
/// An override payload may set `index.max_result_window` (flat or nested,
/// number or string); otherwise the configured value applies.
pub fn result_window(config: &SearchClientConfig) -> u32 {
    let Some(settings) = config
        .index_settings
        .as_ref()
        .and_then(|body| body.get("settings"))
    else {
        return config.max_result_window;
    };

    [
        settings.get("index.max_result_window"),
        settings.get("index").and_then(|i| i.get("max_result_window")),
        settings.get("max_result_window"),
    ]
    .into_iter()
    .flatten()
    .find_map(|v| match v {
        Value::Number(n) => n.as_u64(),
        Value::String(s) => s.parse().ok(),
        _ => None,
    })
    .map(|w| u32::try_from(w).unwrap_or(u32::MAX))
    .unwrap_or(config.max_result_window)
}

/// Creates the default index mapping for sector documents.
///
/// The mapping includes:
/// - `document_type`: keyword label for the document's schema flavour
/// - `public_id`: the numeric sector id, also the document id
/// - `title`, `extra_terms`, `activities`: analysed text searched by queries
pub fn create_index_mapping(config: &SearchClientConfig) -> Value {
    json!({
        "settings": {
            "number_of_shards": config.number_of_shards,
            "number_of_replicas": config.number_of_replicas,
            "index.max_result_window": config.max_result_window,
            "refresh_interval": config.refresh_interval,
        },
        "mappings": {
            "properties": {
                "document_type": { "type": "keyword" },
                "public_id": { "type": "long" },
                "title": {
                    "type": "text",
                    "analyzer": "standard",
                    "fields": {
                        "keyword": { "type": "keyword" }
                    }
                },
                "extra_terms": {
                    "type": "text",
                    "analyzer": "standard"
                },
                "activities": {
                    "type": "text",
                    "analyzer": "standard"
                }
            }
        }
    })
}
