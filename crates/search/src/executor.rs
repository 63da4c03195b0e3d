//! Free-text sector search.

use std::collections::HashSet;

use serde_json::{Value, json};

use crate::error::{SearchClientResult, TransportError};
use crate::sanitizer::sanitize_query;
use crate::transport::DynTransport;

/// Query options for [`SearchExecutor`].
#[derive(Debug, Clone)]
pub struct SearchOptions {
    /// Fields the query string is matched against.
    pub fields: Vec<String>,
    /// Lowercase a trailing boolean keyword before sending.
    pub normalize_boolean_operators: bool,
    /// Number of hits requested from the engine. The client sets this to the
    /// index's result window, the most the engine will return.
    pub size: u32,
}

/// Runs free-text queries and returns matching sector ids.
#[derive(Clone)]
pub struct SearchExecutor {
    transport: DynTransport,
    options: SearchOptions,
}

impl SearchExecutor {
    /// Creates an executor over `transport`.
    pub fn new(transport: DynTransport, options: SearchOptions) -> Self {
        Self { transport, options }
    }

    /// Builds the request body for an already sanitized query.
    pub fn build_query(&self, sanitized: &str) -> Value {
        json!({
            "query": {
                "query_string": {
                    "fields": self.options.fields,
                    "query": sanitized
                }
            },
            "sort": [ { "_score": { "order": "desc" } } ],
            "_source": ["public_id"],
            "size": self.options.size
        })
    }

    /// Searches `index` for `query_text`, best match first.
    ///
    /// Blank input returns no ids without contacting the engine, and so does
    /// a search against an index that does not exist yet.
    ///
    /// At most [`SearchOptions::size`] ids are returned. The engine rejects
    /// larger requests, so this is capped at the index's
    /// `index.max_result_window` (10000 unless configured otherwise).
    pub async fn search(&self, index: &str, query_text: &str) -> SearchClientResult<Vec<u64>> {
        if query_text.trim().is_empty() {
            return Ok(Vec::new());
        }

        let sanitized = sanitize_query(query_text, self.options.normalize_boolean_operators);
        let body = self.build_query(&sanitized);

        let response = match self.transport.search(index, &body).await {
            Ok(response) => response,
            Err(TransportError::NotFound { .. }) => {
                tracing::debug!(index = %index, "Search against missing index");
                return Ok(Vec::new());
            }
            Err(e) => return Err(e.into()),
        };

        let ids = parse_hit_ids(&response);
        tracing::debug!(index = %index, query = %sanitized, hits = ids.len(), "Searched sectors");
        Ok(ids)
    }
}

/// Extracts sector ids from a search response in hit order, dropping repeats.
///
/// The id comes from `_source.public_id`, or from `_id` when the source does
/// not carry it. Hits with neither are skipped.
pub fn parse_hit_ids(response: &Value) -> Vec<u64> {
    let hits = response
        .get("hits")
        .and_then(|h| h.get("hits"))
        .and_then(|h| h.as_array())
        .map(Vec::as_slice)
        .unwrap_or_default();

    let mut seen = HashSet::new();
    hits.iter()
        .filter_map(hit_id)
        .filter(|id| seen.insert(*id))
        .collect()
}

fn hit_id(hit: &Value) -> Option<u64> {
    hit.get("_source")
        .and_then(|s| s.get("public_id"))
        .and_then(Value::as_u64)
        .or_else(|| {
            hit.get("_id")
                .and_then(Value::as_str)
                .and_then(|id| id.parse().ok())
        })
}
