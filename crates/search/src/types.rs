//! Records consumed by the indexer and the documents written for them.

use serde::{Deserialize, Serialize};

/// A sector as the search core sees it.
///
/// Records are owned by the taxonomy store; the search core only reads them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SectorRecord {
    /// Stable external identifier; becomes the document id.
    pub public_id: u64,
    /// Identifier in the upstream taxonomy source, used to look up extra terms.
    #[serde(default)]
    pub correlation_id: Option<u64>,
    /// Display name of the sector.
    pub name: String,
    /// Names of the activities associated with the sector.
    #[serde(default)]
    pub activities: Vec<String>,
}

impl SectorRecord {
    /// Creates a record without a correlation id or activities.
    pub fn new(public_id: u64, name: impl Into<String>) -> Self {
        Self {
            public_id,
            correlation_id: None,
            name: name.into(),
            activities: Vec::new(),
        }
    }

    /// Sets the correlation id.
    pub fn with_correlation_id(mut self, correlation_id: u64) -> Self {
        self.correlation_id = Some(correlation_id);
        self
    }

    /// Sets the activity names.
    pub fn with_activities<I, S>(mut self, activities: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.activities = activities.into_iter().map(Into::into).collect();
        self
    }
}

/// The document written to the index for one sector.
///
/// `id` is the document's address and is not part of the stored body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexedDocument {
    /// Document id; always equal to the record's `public_id`.
    #[serde(skip)]
    pub id: u64,
    /// Schema flavour label.
    pub document_type: String,
    /// Copy of `id` kept in the body so hits can be read from `_source`.
    pub public_id: u64,
    /// Sector name.
    pub title: String,
    /// Synonyms and boost terms; empty rather than absent.
    pub extra_terms: Vec<String>,
    /// Activity names; empty rather than absent.
    pub activities: Vec<String>,
}

impl IndexedDocument {
    /// Returns the document id in the form used in engine URLs.
    pub fn document_id(&self) -> String {
        self.id.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_document_body_excludes_id() {
        let doc = IndexedDocument {
            id: 123,
            document_type: "sector".into(),
            public_id: 123,
            title: "Test Sector".into(),
            extra_terms: vec![],
            activities: vec![],
        };
        let body = serde_json::to_value(&doc).unwrap();
        assert_eq!(
            body,
            json!({
                "document_type": "sector",
                "public_id": 123,
                "title": "Test Sector",
                "extra_terms": [],
                "activities": []
            })
        );
        assert_eq!(doc.document_id(), "123");
    }

    #[test]
    fn test_record_builder() {
        let record = SectorRecord::new(5, "Bakery")
            .with_correlation_id(1000011)
            .with_activities(["Selling food", "Baking"]);
        assert_eq!(record.correlation_id, Some(1000011));
        assert_eq!(record.activities, vec!["Selling food", "Baking"]);
    }
}
