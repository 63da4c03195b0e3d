//! Licence Finder sector taxonomy
//!
//! Strongly-typed sectors and activities, an in-memory store enforcing their
//! uniqueness rules, and the importer for the sector CSV data. The store
//! feeds [`licence_finder_search`] through [`InMemoryTaxonomyStore::sector_records`].
//!
//! ```
//! use licence_finder_taxonomy::{InMemoryTaxonomyStore, NewSector};
//!
//! let store = InMemoryTaxonomyStore::new();
//! let top = store.create_sector(NewSector::named("Agriculture")).unwrap();
//! let leaf = store
//!     .create_sector(NewSector::named("Crop growing").with_parent(top.public_id))
//!     .unwrap();
//!
//! assert_eq!(store.parents(leaf.public_id), vec![top]);
//! assert_eq!(store.sector_records().len(), 2);
//! ```

#![warn(missing_docs)]

pub mod error;
pub mod importer;
pub mod models;
pub mod store;

pub use error::{TaxonomyError, TaxonomyResult};
pub use importer::{ImportSummary, SectorImporter};
pub use models::{Activity, NewActivity, NewSector, Sector};
pub use store::InMemoryTaxonomyStore;
