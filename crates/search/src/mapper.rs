//! Conversion of sector records into index documents.

use std::sync::Arc;

use crate::error::DocumentError;
use crate::terms::TermsProvider;
use crate::types::{IndexedDocument, SectorRecord};

/// Builds [`IndexedDocument`]s from [`SectorRecord`]s.
///
/// Extra terms are read from the provider on every call, so a mapper always
/// reflects the provider's current contents.
#[derive(Clone)]
pub struct DocumentMapper {
    document_type: String,
    terms: Arc<dyn TermsProvider>,
}

impl std::fmt::Debug for DocumentMapper {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DocumentMapper")
            .field("document_type", &self.document_type)
            .finish_non_exhaustive()
    }
}

impl DocumentMapper {
    /// Creates a mapper labelling documents with `document_type`.
    pub fn new(document_type: impl Into<String>, terms: Arc<dyn TermsProvider>) -> Self {
        Self {
            document_type: document_type.into(),
            terms,
        }
    }

    /// Returns the document type label.
    pub fn document_type(&self) -> &str {
        &self.document_type
    }

    /// Maps one record to its document.
    pub fn to_document(&self, record: &SectorRecord) -> Result<IndexedDocument, DocumentError> {
        if record.public_id == 0 {
            return Err(DocumentError::InvalidPublicId {
                public_id: record.public_id,
            });
        }
        if record.name.trim().is_empty() {
            return Err(DocumentError::EmptyTitle {
                public_id: record.public_id,
            });
        }

        let extra_terms = record
            .correlation_id
            .and_then(|id| self.terms.terms_for(id))
            .map(<[String]>::to_vec)
            .unwrap_or_default();

        Ok(IndexedDocument {
            id: record.public_id,
            document_type: self.document_type.clone(),
            public_id: record.public_id,
            title: record.name.clone(),
            extra_terms,
            activities: record.activities.clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::terms::{NoTerms, StaticTerms};

    fn mapper(terms: impl TermsProvider + 'static) -> DocumentMapper {
        DocumentMapper::new("test-type", Arc::new(terms))
    }

    #[test]
    fn test_sector_to_document_fields() {
        let record = SectorRecord::new(123, "Test Sector").with_correlation_id(1);
        let document = mapper(NoTerms).to_document(&record).unwrap();

        assert_eq!(document.id, 123);
        assert_eq!(
            serde_json::to_value(&document).unwrap(),
            json!({
                "document_type": "test-type",
                "public_id": 123,
                "title": "Test Sector",
                "extra_terms": [],
                "activities": []
            })
        );
    }

    #[test]
    fn test_extra_terms_added_when_available() {
        let terms = StaticTerms::new().with_terms(123, ["foo", "bar", "monkey"]);
        let record = SectorRecord::new(321, "Test Sector").with_correlation_id(123);
        let document = mapper(terms).to_document(&record).unwrap();

        assert_eq!(document.id, 321);
        assert_eq!(document.extra_terms, vec!["foo", "bar", "monkey"]);
        assert!(document.activities.is_empty());
    }

    #[test]
    fn test_no_correlation_id_means_no_terms() {
        let terms = StaticTerms::new().with_terms(123, ["foo"]);
        let record = SectorRecord::new(123, "Test Sector");
        let document = mapper(terms).to_document(&record).unwrap();
        assert!(document.extra_terms.is_empty());
    }

    #[test]
    fn test_activities_copied() {
        let record = SectorRecord::new(9, "Kennels").with_activities(["Boarding dogs"]);
        let document = mapper(NoTerms).to_document(&record).unwrap();
        assert_eq!(document.activities, vec!["Boarding dogs"]);
    }

    #[test]
    fn test_rejects_zero_id_and_blank_name() {
        let m = mapper(NoTerms);
        assert!(matches!(
            m.to_document(&SectorRecord::new(0, "Zero")),
            Err(DocumentError::InvalidPublicId { public_id: 0 })
        ));
        assert!(matches!(
            m.to_document(&SectorRecord::new(4, "   ")),
            Err(DocumentError::EmptyTitle { public_id: 4 })
        ));
    }
}
