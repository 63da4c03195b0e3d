//! Elasticsearch transport built on the official client.

use std::fmt::Debug;

use async_trait::async_trait;
use elasticsearch::auth::Credentials;
use elasticsearch::cert::CertificateValidation;
use elasticsearch::http::response::Response;
use elasticsearch::http::transport::{SingleNodeConnectionPool, TransportBuilder};
use elasticsearch::indices::{
    IndicesCreateParts, IndicesDeleteParts, IndicesGetAliasParts, IndicesRefreshParts,
};
use elasticsearch::{Elasticsearch, IndexParts, SearchParts};
use serde_json::{Value, json};

use crate::config::{SearchAuth, SearchClientConfig};
use crate::error::{ConfigError, TransportError};

use super::{IndexTransport, TransportResult};

/// [`IndexTransport`] talking HTTP to an Elasticsearch cluster.
pub struct ElasticsearchTransport {
    client: Elasticsearch,
    node: String,
}

impl Debug for ElasticsearchTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ElasticsearchTransport")
            .field("node", &self.node)
            .finish_non_exhaustive()
    }
}

impl ElasticsearchTransport {
    /// Builds a transport for the first configured node.
    pub fn new(config: &SearchClientConfig) -> Result<Self, ConfigError> {
        let node = config
            .nodes
            .first()
            .cloned()
            .unwrap_or_else(|| "http://localhost:9200".to_string());

        let parsed_url: elasticsearch::http::Url =
            node.parse().map_err(|e| ConfigError::InvalidUrl {
                url: node.clone(),
                message: format!("{}", e),
            })?;

        let conn_pool = SingleNodeConnectionPool::new(parsed_url);

        let mut builder = TransportBuilder::new(conn_pool).timeout(config.request_timeout());

        if config.disable_certificate_validation {
            builder = builder.cert_validation(CertificateValidation::None);
        }

        if let Some(ref auth) = config.auth {
            builder = match auth {
                SearchAuth::Basic { username, password } => {
                    builder.auth(Credentials::Basic(username.clone(), password.clone()))
                }
                SearchAuth::Bearer { token } => builder.auth(Credentials::Bearer(token.clone())),
            };
        }

        let transport = builder.build().map_err(|e| ConfigError::TransportBuild {
            message: e.to_string(),
        })?;

        Ok(Self {
            client: Elasticsearch::new(transport),
            node,
        })
    }

    /// Returns the node this transport talks to.
    pub fn node(&self) -> &str {
        &self.node
    }
}

/// Turns a non-success response into the matching [`TransportError`].
async fn ensure_success(
    response: Response,
    operation: &str,
    target: &str,
) -> TransportResult<Response> {
    let status = response.status_code();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(TransportError::from_status(
        operation,
        target,
        status.as_u16(),
        body,
    ))
}

async fn read_json(response: Response, operation: &str) -> TransportResult<Value> {
    response
        .json::<Value>()
        .await
        .map_err(|e| TransportError::Internal {
            operation: operation.to_string(),
            message: format!("failed to parse response: {}", e),
            source: Some(Box::new(e)),
        })
}

#[async_trait]
impl IndexTransport for ElasticsearchTransport {
    fn name(&self) -> &'static str {
        "elasticsearch"
    }

    async fn delete_index(&self, index: &str) -> TransportResult<()> {
        let response = self
            .client
            .indices()
            .delete(IndicesDeleteParts::Index(&[index]))
            .send()
            .await?;
        ensure_success(response, "delete_index", index).await?;
        Ok(())
    }

    async fn create_index(&self, index: &str, body: &Value) -> TransportResult<()> {
        let response = self
            .client
            .indices()
            .create(IndicesCreateParts::Index(index))
            .body(body.clone())
            .send()
            .await?;
        ensure_success(response, "create_index", index).await?;
        Ok(())
    }

    async fn put_document(&self, index: &str, id: &str, body: &Value) -> TransportResult<()> {
        let response = self
            .client
            .index(IndexParts::IndexId(index, id))
            .body(body.clone())
            .send()
            .await?;
        ensure_success(response, "put_document", id).await?;
        Ok(())
    }

    async fn refresh_index(&self, index: &str) -> TransportResult<()> {
        let response = self
            .client
            .indices()
            .refresh(IndicesRefreshParts::Index(&[index]))
            .send()
            .await?;
        ensure_success(response, "refresh_index", index).await?;
        Ok(())
    }

    async fn search(&self, index: &str, body: &Value) -> TransportResult<Value> {
        let response = self
            .client
            .search(SearchParts::Index(&[index]))
            .body(body.clone())
            .send()
            .await?;
        let response = ensure_success(response, "search", index).await?;
        read_json(response, "search").await
    }

    async fn alias_targets(&self, alias: &str) -> TransportResult<Vec<String>> {
        let response = self
            .client
            .indices()
            .get_alias(IndicesGetAliasParts::Name(&[alias]))
            .send()
            .await?;

        let response = match ensure_success(response, "alias_targets", alias).await {
            Ok(r) => r,
            Err(TransportError::NotFound { .. }) => return Ok(Vec::new()),
            Err(e) => return Err(e),
        };

        // { "<index>": { "aliases": { "<alias>": {} } }, ... }
        let body = read_json(response, "alias_targets").await?;
        let mut targets: Vec<String> = body
            .as_object()
            .map(|indices| indices.keys().cloned().collect())
            .unwrap_or_default();
        targets.sort();
        Ok(targets)
    }

    async fn swap_alias(
        &self,
        alias: &str,
        previous: &[String],
        target: &str,
    ) -> TransportResult<()> {
        let mut actions: Vec<Value> = previous
            .iter()
            .map(|index| json!({ "remove": { "index": index, "alias": alias } }))
            .collect();
        actions.push(json!({ "add": { "index": target, "alias": alias } }));

        let response = self
            .client
            .indices()
            .update_aliases()
            .body(json!({ "actions": actions }))
            .send()
            .await?;
        ensure_success(response, "swap_alias", alias).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transport_creation() {
        let transport = ElasticsearchTransport::new(&SearchClientConfig::default()).unwrap();
        assert_eq!(transport.node(), "http://localhost:9200");
        assert_eq!(transport.name(), "elasticsearch");
    }

    #[test]
    fn test_transport_rejects_bad_url() {
        let config = SearchClientConfig {
            nodes: vec!["not a url".to_string()],
            ..Default::default()
        };
        assert!(matches!(
            ElasticsearchTransport::new(&config),
            Err(ConfigError::InvalidUrl { .. })
        ));
    }

    #[test]
    fn test_transport_with_auth() {
        let config = SearchClientConfig {
            auth: Some(SearchAuth::Bearer {
                token: "secret".to_string(),
            }),
            ..Default::default()
        };
        assert!(ElasticsearchTransport::new(&config).is_ok());
    }
}
