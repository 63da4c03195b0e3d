//! In-process transport.
//!
//! `MemoryTransport` keeps indices, documents and aliases in memory and
//! mimics the engine behaviour the search components rely on: writes become
//! searchable only after a refresh, deleting a missing index is a not-found
//! error, creating an existing index is rejected, and aliases resolve to their
//! target indices. Every call is recorded so tests can assert on ordering,
//! and writes or whole-transport availability can be made to fail.
//!
//! Matching is deliberately simple: fields are split into lowercase
//! alphanumeric tokens and a document scores one point per query term
//! contained in any of its tokens.

use std::collections::{BTreeMap, HashMap, HashSet};

use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::{Value, json};

use crate::error::TransportError;

use super::{IndexTransport, TransportResult};

/// A call made against a [`MemoryTransport`].
#[derive(Debug, Clone, PartialEq, Eq)]
#[allow(missing_docs)]
pub enum TransportCall {
    DeleteIndex(String),
    CreateIndex(String),
    PutDocument { index: String, id: String },
    RefreshIndex(String),
    Search(String),
    AliasTargets(String),
    SwapAlias { alias: String, target: String },
}

#[derive(Debug, Default)]
struct MemoryIndex {
    body: Value,
    /// Documents visible to search.
    visible: BTreeMap<String, Value>,
    /// Documents written since the last refresh.
    staged: BTreeMap<String, Value>,
}

#[derive(Debug, Default)]
struct State {
    indices: HashMap<String, MemoryIndex>,
    aliases: HashMap<String, Vec<String>>,
    calls: Vec<TransportCall>,
    failing_documents: HashSet<String>,
    unavailable: bool,
}

impl State {
    fn resolve(&self, name: &str) -> Vec<String> {
        if self.indices.contains_key(name) {
            return vec![name.to_string()];
        }
        self.aliases.get(name).cloned().unwrap_or_default()
    }

    fn check_available(&self, operation: &str) -> TransportResult<()> {
        if self.unavailable {
            return Err(TransportError::Transient {
                operation: operation.to_string(),
                message: "connection refused".to_string(),
            });
        }
        Ok(())
    }
}

/// [`IndexTransport`] backed by process memory.
#[derive(Debug, Default)]
pub struct MemoryTransport {
    state: Mutex<State>,
}

impl MemoryTransport {
    /// Creates an empty transport.
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every later write of document `id` fail with a transient error.
    pub fn fail_writes_for(&self, id: impl Into<String>) {
        self.state.lock().failing_documents.insert(id.into());
    }

    /// Simulates the engine going away (or coming back).
    pub fn set_unavailable(&self, unavailable: bool) {
        self.state.lock().unavailable = unavailable;
    }

    /// Returns the calls made so far, oldest first.
    pub fn calls(&self) -> Vec<TransportCall> {
        self.state.lock().calls.clone()
    }

    /// Forgets recorded calls.
    pub fn clear_calls(&self) {
        self.state.lock().calls.clear();
    }

    /// Returns true if a concrete index with this name exists.
    pub fn index_exists(&self, index: &str) -> bool {
        self.state.lock().indices.contains_key(index)
    }

    /// Returns the names of all concrete indices, sorted.
    pub fn index_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.state.lock().indices.keys().cloned().collect();
        names.sort();
        names
    }

    /// Returns the mapping/settings body an index was created with.
    pub fn index_body(&self, index: &str) -> Option<Value> {
        self.state.lock().indices.get(index).map(|i| i.body.clone())
    }

    /// Returns the latest version of a document, refreshed or not.
    pub fn document(&self, index: &str, id: &str) -> Option<Value> {
        let state = self.state.lock();
        state.resolve(index).iter().find_map(|name| {
            let idx = state.indices.get(name)?;
            idx.staged.get(id).or_else(|| idx.visible.get(id)).cloned()
        })
    }

    /// Counts distinct documents in an index, refreshed or not.
    pub fn document_count(&self, index: &str) -> usize {
        let state = self.state.lock();
        state
            .resolve(index)
            .iter()
            .filter_map(|name| state.indices.get(name))
            .map(|idx| {
                idx.visible
                    .keys()
                    .chain(idx.staged.keys())
                    .collect::<HashSet<_>>()
                    .len()
            })
            .sum()
    }
}

fn tokenize(text: &str) -> Vec<String> {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty())
        .map(str::to_lowercase)
        .collect()
}

fn query_terms(query: &str) -> Vec<String> {
    query
        .split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty() && !matches!(*t, "AND" | "OR" | "NOT"))
        .map(str::to_lowercase)
        .collect()
}

fn field_tokens(source: &Value, fields: &[String]) -> Vec<String> {
    let mut tokens = Vec::new();
    for field in fields {
        match source.get(field) {
            Some(Value::String(s)) => tokens.extend(tokenize(s)),
            Some(Value::Array(values)) => {
                for v in values.iter().filter_map(Value::as_str) {
                    tokens.extend(tokenize(v));
                }
            }
            _ => {}
        }
    }
    tokens
}

#[async_trait]
impl IndexTransport for MemoryTransport {
    fn name(&self) -> &'static str {
        "memory"
    }

    async fn delete_index(&self, index: &str) -> TransportResult<()> {
        let mut state = self.state.lock();
        state.calls.push(TransportCall::DeleteIndex(index.to_string()));
        state.check_available("delete_index")?;

        if state.indices.remove(index).is_none() {
            return Err(TransportError::NotFound {
                operation: "delete_index".to_string(),
                target: index.to_string(),
            });
        }
        for targets in state.aliases.values_mut() {
            targets.retain(|t| t != index);
        }
        state.aliases.retain(|_, targets| !targets.is_empty());
        Ok(())
    }

    async fn create_index(&self, index: &str, body: &Value) -> TransportResult<()> {
        let mut state = self.state.lock();
        state.calls.push(TransportCall::CreateIndex(index.to_string()));
        state.check_available("create_index")?;

        if !body.is_object() {
            return Err(TransportError::MalformedRequest {
                operation: "create_index".to_string(),
                status: 400,
                message: "mapper_parsing_exception: body must be an object".to_string(),
            });
        }
        if state.indices.contains_key(index) || state.aliases.contains_key(index) {
            return Err(TransportError::MalformedRequest {
                operation: "create_index".to_string(),
                status: 400,
                message: format!("resource_already_exists_exception: {}", index),
            });
        }
        state.indices.insert(
            index.to_string(),
            MemoryIndex {
                body: body.clone(),
                ..Default::default()
            },
        );
        Ok(())
    }

    async fn put_document(&self, index: &str, id: &str, body: &Value) -> TransportResult<()> {
        let mut state = self.state.lock();
        state.calls.push(TransportCall::PutDocument {
            index: index.to_string(),
            id: id.to_string(),
        });
        state.check_available("put_document")?;

        if state.failing_documents.contains(id) {
            return Err(TransportError::Transient {
                operation: "put_document".to_string(),
                message: format!("injected failure for document {}", id),
            });
        }

        let targets = state.resolve(index);
        let name = match targets.as_slice() {
            [] => index.to_string(),
            [single] => single.clone(),
            _ => {
                return Err(TransportError::MalformedRequest {
                    operation: "put_document".to_string(),
                    status: 400,
                    message: format!("alias [{}] has more than one index", index),
                });
            }
        };
        // Writing to a missing index creates it, as the engine does.
        let idx = state.indices.entry(name).or_insert_with(|| MemoryIndex {
            body: json!({}),
            ..Default::default()
        });
        idx.staged.insert(id.to_string(), body.clone());
        Ok(())
    }

    async fn refresh_index(&self, index: &str) -> TransportResult<()> {
        let mut state = self.state.lock();
        state.calls.push(TransportCall::RefreshIndex(index.to_string()));
        state.check_available("refresh_index")?;

        let targets = state.resolve(index);
        if targets.is_empty() {
            return Err(TransportError::NotFound {
                operation: "refresh_index".to_string(),
                target: index.to_string(),
            });
        }
        for name in targets {
            if let Some(idx) = state.indices.get_mut(&name) {
                let staged = std::mem::take(&mut idx.staged);
                idx.visible.extend(staged);
            }
        }
        Ok(())
    }

    async fn search(&self, index: &str, body: &Value) -> TransportResult<Value> {
        let mut state = self.state.lock();
        state.calls.push(TransportCall::Search(index.to_string()));
        state.check_available("search")?;

        let targets = state.resolve(index);
        if targets.is_empty() {
            return Err(TransportError::NotFound {
                operation: "search".to_string(),
                target: index.to_string(),
            });
        }

        let query_string = &body["query"]["query_string"];
        let Some(query) = query_string["query"].as_str() else {
            return Err(TransportError::MalformedRequest {
                operation: "search".to_string(),
                status: 400,
                message: "parsing_exception: expected query_string.query".to_string(),
            });
        };
        let fields: Vec<String> = query_string["fields"]
            .as_array()
            .map(|f| {
                f.iter()
                    .filter_map(Value::as_str)
                    .map(String::from)
                    .collect()
            })
            .unwrap_or_default();
        let size = body["size"].as_u64().unwrap_or(10) as usize;
        let terms = query_terms(query);

        let mut scored: Vec<(usize, &String, &Value)> = Vec::new();
        for name in &targets {
            let Some(idx) = state.indices.get(name) else {
                continue;
            };
            for (id, source) in &idx.visible {
                let tokens = field_tokens(source, &fields);
                let score = terms
                    .iter()
                    .filter(|term| tokens.iter().any(|t| t.contains(term.as_str())))
                    .count();
                if score > 0 {
                    scored.push((score, id, source));
                }
            }
        }
        // Stable sort keeps id order among equal scores.
        scored.sort_by(|a, b| b.0.cmp(&a.0));

        let total = scored.len();
        let hits: Vec<Value> = scored
            .into_iter()
            .take(size)
            .map(|(score, id, source)| {
                json!({ "_id": id, "_score": score as f64, "_source": source })
            })
            .collect();

        Ok(json!({
            "hits": {
                "total": { "value": total, "relation": "eq" },
                "hits": hits
            }
        }))
    }

    async fn alias_targets(&self, alias: &str) -> TransportResult<Vec<String>> {
        let mut state = self.state.lock();
        state.calls.push(TransportCall::AliasTargets(alias.to_string()));
        state.check_available("alias_targets")?;

        let mut targets = state.aliases.get(alias).cloned().unwrap_or_default();
        targets.sort();
        Ok(targets)
    }

    async fn swap_alias(
        &self,
        alias: &str,
        previous: &[String],
        target: &str,
    ) -> TransportResult<()> {
        let mut state = self.state.lock();
        state.calls.push(TransportCall::SwapAlias {
            alias: alias.to_string(),
            target: target.to_string(),
        });
        state.check_available("swap_alias")?;

        if !state.indices.contains_key(target) {
            return Err(TransportError::NotFound {
                operation: "swap_alias".to_string(),
                target: target.to_string(),
            });
        }
        if state.indices.contains_key(alias) {
            return Err(TransportError::MalformedRequest {
                operation: "swap_alias".to_string(),
                status: 400,
                message: format!("invalid_alias_name_exception: an index exists with name [{}]", alias),
            });
        }

        let targets = state.aliases.entry(alias.to_string()).or_default();
        targets.retain(|t| !previous.contains(t));
        if !targets.iter().any(|t| t == target) {
            targets.push(target.to_string());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doc(id: u64, title: &str) -> Value {
        json!({ "public_id": id, "title": title, "extra_terms": [], "activities": [] })
    }

    fn query(text: &str) -> Value {
        json!({
            "query": { "query_string": { "query": text, "fields": ["title", "extra_terms"] } },
            "size": 100
        })
    }

    #[tokio::test]
    async fn test_delete_missing_index_is_not_found() {
        let transport = MemoryTransport::new();
        let err = transport.delete_index("missing").await.unwrap_err();
        assert!(matches!(err, TransportError::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_create_twice_is_rejected() {
        let transport = MemoryTransport::new();
        transport.create_index("sectors", &json!({})).await.unwrap();
        let err = transport
            .create_index("sectors", &json!({}))
            .await
            .unwrap_err();
        assert!(matches!(err, TransportError::MalformedRequest { .. }));
    }

    #[tokio::test]
    async fn test_writes_visible_after_refresh() {
        let transport = MemoryTransport::new();
        transport.create_index("sectors", &json!({})).await.unwrap();
        transport
            .put_document("sectors", "1", &doc(1, "Pet shop"))
            .await
            .unwrap();

        let before = transport.search("sectors", &query("pet")).await.unwrap();
        assert_eq!(before["hits"]["hits"].as_array().unwrap().len(), 0);

        transport.refresh_index("sectors").await.unwrap();
        let after = transport.search("sectors", &query("pet")).await.unwrap();
        assert_eq!(after["hits"]["hits"][0]["_id"], "1");
    }

    #[tokio::test]
    async fn test_put_overwrites_by_id() {
        let transport = MemoryTransport::new();
        transport.create_index("sectors", &json!({})).await.unwrap();
        transport
            .put_document("sectors", "1", &doc(1, "Old"))
            .await
            .unwrap();
        transport.refresh_index("sectors").await.unwrap();
        transport
            .put_document("sectors", "1", &doc(1, "New"))
            .await
            .unwrap();
        transport.refresh_index("sectors").await.unwrap();

        assert_eq!(transport.document_count("sectors"), 1);
        assert_eq!(transport.document("sectors", "1").unwrap()["title"], "New");
    }

    #[tokio::test]
    async fn test_search_orders_by_score() {
        let transport = MemoryTransport::new();
        transport.create_index("sectors", &json!({})).await.unwrap();
        transport
            .put_document("sectors", "1", &doc(1, "Fish farming"))
            .await
            .unwrap();
        transport
            .put_document("sectors", "2", &doc(2, "Fish and chip shop"))
            .await
            .unwrap();
        transport.refresh_index("sectors").await.unwrap();

        let response = transport
            .search("sectors", &query("fish shop"))
            .await
            .unwrap();
        let hits = response["hits"]["hits"].as_array().unwrap();
        assert_eq!(hits[0]["_id"], "2");
        assert_eq!(hits[1]["_id"], "1");
    }

    #[tokio::test]
    async fn test_alias_swap_and_resolution() {
        let transport = MemoryTransport::new();
        transport.create_index("sectors_a", &json!({})).await.unwrap();
        transport.create_index("sectors_b", &json!({})).await.unwrap();

        transport
            .swap_alias("sectors", &[], "sectors_a")
            .await
            .unwrap();
        assert_eq!(
            transport.alias_targets("sectors").await.unwrap(),
            vec!["sectors_a"]
        );

        transport
            .swap_alias("sectors", &["sectors_a".to_string()], "sectors_b")
            .await
            .unwrap();
        assert_eq!(
            transport.alias_targets("sectors").await.unwrap(),
            vec!["sectors_b"]
        );

        transport
            .put_document("sectors", "7", &doc(7, "Kennels"))
            .await
            .unwrap();
        assert!(transport.document("sectors_b", "7").is_some());
    }

    #[tokio::test]
    async fn test_unavailable_is_transient() {
        let transport = MemoryTransport::new();
        transport.set_unavailable(true);
        let err = transport.refresh_index("sectors").await.unwrap_err();
        assert!(matches!(err, TransportError::Transient { .. }));
        assert_eq!(
            transport.calls(),
            vec![TransportCall::RefreshIndex("sectors".to_string())]
        );
    }
}
