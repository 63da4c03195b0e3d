//! Sector and activity records.

use serde::{Deserialize, Serialize};

/// A business sector in the taxonomy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sector {
    /// Stable external identifier.
    pub public_id: u64,
    /// Identifier in the source taxonomy (the OID in the import files).
    pub correlation_id: Option<u64>,
    /// Display name.
    pub name: String,
    /// Classification code from the source taxonomy, e.g. `A0.010`.
    pub tax_code: Option<String>,
    /// Depth in the taxonomy, 1 being the top level.
    pub layer: Option<u8>,
    /// Public ids of parent sectors.
    pub parent_ids: Vec<u64>,
    /// Public ids of linked activities.
    pub activity_ids: Vec<u64>,
}

/// An activity that may require a licence, linked to sectors.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Activity {
    /// Stable external identifier.
    pub public_id: u64,
    /// Identifier in the source taxonomy.
    pub correlation_id: Option<u64>,
    /// Display name.
    pub name: String,
    /// Public ids of linked sectors.
    pub sector_ids: Vec<u64>,
}

/// A sector to be created. Leave `public_id` unset to have one allocated.
#[derive(Debug, Clone, Default)]
#[allow(missing_docs)]
pub struct NewSector {
    pub public_id: Option<u64>,
    pub correlation_id: Option<u64>,
    pub name: String,
    pub tax_code: Option<String>,
    pub layer: Option<u8>,
    pub parent_ids: Vec<u64>,
}

impl NewSector {
    /// Starts a sector with only a name.
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    /// Sets an explicit public id.
    pub fn with_public_id(mut self, public_id: u64) -> Self {
        self.public_id = Some(public_id);
        self
    }

    /// Sets the correlation id.
    pub fn with_correlation_id(mut self, correlation_id: u64) -> Self {
        self.correlation_id = Some(correlation_id);
        self
    }

    /// Adds a parent sector.
    pub fn with_parent(mut self, parent_id: u64) -> Self {
        self.parent_ids.push(parent_id);
        self
    }
}

/// An activity to be created. Leave `public_id` unset to have one allocated.
#[derive(Debug, Clone, Default)]
#[allow(missing_docs)]
pub struct NewActivity {
    pub public_id: Option<u64>,
    pub correlation_id: Option<u64>,
    pub name: String,
    pub sector_ids: Vec<u64>,
}

impl NewActivity {
    /// Starts an activity with only a name.
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    /// Sets an explicit public id.
    pub fn with_public_id(mut self, public_id: u64) -> Self {
        self.public_id = Some(public_id);
        self
    }

    /// Sets the correlation id.
    pub fn with_correlation_id(mut self, correlation_id: u64) -> Self {
        self.correlation_id = Some(correlation_id);
        self
    }

    /// Links the activity to sectors.
    pub fn in_sectors(mut self, sector_ids: impl IntoIterator<Item = u64>) -> Self {
        self.sector_ids.extend(sector_ids);
        self
    }
}
