//! Error types for the search client.
//!
//! Errors are split by where they originate: the engine round trip
//! ([`TransportError`]), document construction ([`DocumentError`]) and client
//! configuration ([`ConfigError`]). [`SearchClientError`] wraps all three.

// Error enum variant fields are self-documenting via their #[error(...)] messages
#![allow(missing_docs)]

use thiserror::Error;

/// The primary error type for all search client operations.
#[derive(Error, Debug)]
pub enum SearchClientError {
    /// Errors talking to the search engine
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// Errors building a document from a record
    #[error(transparent)]
    Document(#[from] DocumentError),

    /// Configuration errors
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// An aliased rebuild wrote none of its records, so the alias was not moved
    #[error("rebuild into {index} indexed none of {records} records; alias left unchanged")]
    NothingIndexed { index: String, records: usize },
}

impl SearchClientError {
    /// Returns true if retrying the same call may succeed.
    ///
    /// Only transient transport failures are retryable; the client itself
    /// never retries.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            SearchClientError::Transport(TransportError::Transient { .. })
        )
    }
}

/// Errors reported by an [`IndexTransport`](crate::transport::IndexTransport).
#[derive(Error, Debug)]
pub enum TransportError {
    /// The index or document does not exist.
    #[error("{operation}: not found: {target}")]
    NotFound { operation: String, target: String },

    /// Timeout, refused connection or a temporarily unavailable engine.
    #[error("{operation}: transient failure: {message}")]
    Transient { operation: String, message: String },

    /// The engine rejected the request (bad mapping, bad query, ...).
    #[error("{operation}: request rejected (status {status}): {message}")]
    MalformedRequest {
        operation: String,
        status: u16,
        message: String,
    },

    /// Unexpected status or an unreadable response body.
    #[error("{operation}: {message}")]
    Internal {
        operation: String,
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },
}

impl TransportError {
    /// Classifies a non-success HTTP status returned by the engine.
    ///
    /// `404` maps to [`TransportError::NotFound`], throttling and gateway
    /// statuses to [`TransportError::Transient`], remaining `4xx` to
    /// [`TransportError::MalformedRequest`] and anything else to
    /// [`TransportError::Internal`].
    pub fn from_status(operation: &str, target: &str, status: u16, body: String) -> Self {
        match status {
            404 => TransportError::NotFound {
                operation: operation.to_string(),
                target: target.to_string(),
            },
            408 | 429 | 502 | 503 | 504 => TransportError::Transient {
                operation: operation.to_string(),
                message: format!("status {}: {}", status, body),
            },
            400..=499 => TransportError::MalformedRequest {
                operation: operation.to_string(),
                status,
                message: body,
            },
            _ => TransportError::Internal {
                operation: operation.to_string(),
                message: format!("unexpected status {}: {}", status, body),
                source: None,
            },
        }
    }
}

/// Errors building an index document from a record.
#[derive(Error, Debug)]
pub enum DocumentError {
    /// Document ids must be positive.
    #[error("invalid public id {public_id}: document ids must be positive")]
    InvalidPublicId { public_id: u64 },

    /// The record has no usable name.
    #[error("sector {public_id} has an empty name")]
    EmptyTitle { public_id: u64 },
}

/// Errors in client configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// A node URL could not be parsed.
    #[error("invalid node url '{url}': {message}")]
    InvalidUrl { url: String, message: String },

    /// The HTTP transport could not be constructed.
    #[error("failed to build transport: {message}")]
    TransportBuild { message: String },

    /// A configuration value is out of range or inconsistent.
    #[error("invalid setting '{setting}': {message}")]
    InvalidSetting { setting: String, message: String },
}

/// Result type alias for search client operations.
pub type SearchClientResult<T> = Result<T, SearchClientError>;

impl From<serde_json::Error> for SearchClientError {
    fn from(err: serde_json::Error) -> Self {
        SearchClientError::Transport(TransportError::Internal {
            operation: "serialize".to_string(),
            message: err.to_string(),
            source: Some(Box::new(err)),
        })
    }
}

#[cfg(feature = "elasticsearch")]
impl From<elasticsearch::Error> for TransportError {
    fn from(err: elasticsearch::Error) -> Self {
        // Errors surfacing from `send()` never carry an engine response; they
        // are connection level (refused, reset, timed out).
        TransportError::Transient {
            operation: "send".to_string(),
            message: err.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_status_not_found() {
        let err = TransportError::from_status("delete_index", "sectors", 404, String::new());
        assert!(matches!(err, TransportError::NotFound { .. }));
        assert_eq!(err.to_string(), "delete_index: not found: sectors");
    }

    #[test]
    fn test_from_status_transient() {
        for status in [429, 502, 503, 504] {
            let err = TransportError::from_status("search", "sectors", status, "busy".into());
            assert!(matches!(err, TransportError::Transient { .. }), "{status}");
        }
    }

    #[test]
    fn test_from_status_malformed() {
        let err = TransportError::from_status(
            "create_index",
            "sectors",
            400,
            "mapper_parsing_exception".into(),
        );
        match err {
            TransportError::MalformedRequest {
                status, message, ..
            } => {
                assert_eq!(status, 400);
                assert!(message.contains("mapper_parsing_exception"));
            }
            other => panic!("expected MalformedRequest, got {other:?}"),
        }
    }

    #[test]
    fn test_from_status_server_error_is_internal() {
        let err = TransportError::from_status("refresh", "sectors", 500, "boom".into());
        assert!(matches!(err, TransportError::Internal { .. }));
    }

    #[test]
    fn test_retryable_only_for_transient() {
        let transient: SearchClientError = TransportError::Transient {
            operation: "search".into(),
            message: "timed out".into(),
        }
        .into();
        assert!(transient.is_retryable());

        let malformed: SearchClientError = TransportError::MalformedRequest {
            operation: "search".into(),
            status: 400,
            message: "bad".into(),
        }
        .into();
        assert!(!malformed.is_retryable());

        let doc: SearchClientError = DocumentError::InvalidPublicId { public_id: 0 }.into();
        assert!(!doc.is_retryable());

        let empty = SearchClientError::NothingIndexed {
            index: "sectors-1".into(),
            records: 2,
        };
        assert!(!empty.is_retryable());
    }

    #[test]
    fn test_document_error_display() {
        let err = DocumentError::EmptyTitle { public_id: 7 };
        assert_eq!(err.to_string(), "sector 7 has an empty name");
    }
}
