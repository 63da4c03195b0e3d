//! In-memory taxonomy store.
//!
//! Sectors and activities are each unique by public id and by correlation id.
//! Public ids not supplied by the caller come from a per-kind counter that
//! skips ids already taken.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use licence_finder_search::SectorRecord;
use parking_lot::RwLock;

use crate::error::{TaxonomyError, TaxonomyResult};
use crate::models::{Activity, NewActivity, NewSector, Sector};

#[derive(Debug, Default)]
struct Counter(u64);

impl Counter {
    fn next_free<V>(&mut self, taken: &BTreeMap<u64, V>) -> u64 {
        loop {
            self.0 += 1;
            if !taken.contains_key(&self.0) {
                return self.0;
            }
        }
    }
}

#[derive(Debug, Default)]
struct Inner {
    sectors: BTreeMap<u64, Sector>,
    sectors_by_correlation: HashMap<u64, u64>,
    sector_counter: Counter,
    activities: BTreeMap<u64, Activity>,
    activities_by_correlation: HashMap<u64, u64>,
    activity_counter: Counter,
}

/// Thread-safe in-memory store of sectors and activities.
#[derive(Debug, Default)]
pub struct InMemoryTaxonomyStore {
    inner: RwLock<Inner>,
}

impl InMemoryTaxonomyStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores a new sector and returns it with its public id assigned.
    ///
    /// Every parent must already exist.
    pub fn create_sector(&self, new: NewSector) -> TaxonomyResult<Sector> {
        if new.name.trim().is_empty() {
            return Err(TaxonomyError::MissingName { kind: "sector" });
        }

        let mut inner = self.inner.write();
        if let Some(public_id) = new.public_id
            && inner.sectors.contains_key(&public_id)
        {
            return Err(TaxonomyError::DuplicatePublicId {
                kind: "sector",
                public_id,
            });
        }
        if let Some(correlation_id) = new.correlation_id
            && inner.sectors_by_correlation.contains_key(&correlation_id)
        {
            return Err(TaxonomyError::DuplicateCorrelationId {
                kind: "sector",
                correlation_id,
            });
        }
        if let Some(&missing) = new
            .parent_ids
            .iter()
            .find(|id| !inner.sectors.contains_key(*id))
        {
            return Err(TaxonomyError::SectorNotFound { public_id: missing });
        }

        let public_id = match new.public_id {
            Some(id) => id,
            None => {
                let Inner {
                    sector_counter,
                    sectors,
                    ..
                } = &mut *inner;
                sector_counter.next_free(sectors)
            }
        };

        let sector = Sector {
            public_id,
            correlation_id: new.correlation_id,
            name: new.name,
            tax_code: new.tax_code,
            layer: new.layer,
            parent_ids: dedup(new.parent_ids),
            activity_ids: Vec::new(),
        };
        if let Some(correlation_id) = sector.correlation_id {
            inner.sectors_by_correlation.insert(correlation_id, public_id);
        }
        inner.sectors.insert(public_id, sector.clone());
        tracing::debug!(public_id, name = %sector.name, "Created sector");
        Ok(sector)
    }

    /// Stores a new activity, linking it both ways to its sectors.
    pub fn create_activity(&self, new: NewActivity) -> TaxonomyResult<Activity> {
        if new.name.trim().is_empty() {
            return Err(TaxonomyError::MissingName { kind: "activity" });
        }

        let mut inner = self.inner.write();
        if let Some(public_id) = new.public_id
            && inner.activities.contains_key(&public_id)
        {
            return Err(TaxonomyError::DuplicatePublicId {
                kind: "activity",
                public_id,
            });
        }
        if let Some(correlation_id) = new.correlation_id
            && inner.activities_by_correlation.contains_key(&correlation_id)
        {
            return Err(TaxonomyError::DuplicateCorrelationId {
                kind: "activity",
                correlation_id,
            });
        }
        let sector_ids = dedup(new.sector_ids);
        if let Some(&missing) = sector_ids
            .iter()
            .find(|id| !inner.sectors.contains_key(*id))
        {
            return Err(TaxonomyError::SectorNotFound { public_id: missing });
        }

        let public_id = match new.public_id {
            Some(id) => id,
            None => {
                let Inner {
                    activity_counter,
                    activities,
                    ..
                } = &mut *inner;
                activity_counter.next_free(activities)
            }
        };

        for sector_id in &sector_ids {
            if let Some(sector) = inner.sectors.get_mut(sector_id) {
                sector.activity_ids.push(public_id);
            }
        }
        let activity = Activity {
            public_id,
            correlation_id: new.correlation_id,
            name: new.name,
            sector_ids,
        };
        if let Some(correlation_id) = activity.correlation_id {
            inner
                .activities_by_correlation
                .insert(correlation_id, public_id);
        }
        inner.activities.insert(public_id, activity.clone());
        Ok(activity)
    }

    /// Links an existing activity to an existing sector. Linking twice is a no-op.
    pub fn link_activity(&self, activity_id: u64, sector_id: u64) -> TaxonomyResult<()> {
        let mut inner = self.inner.write();
        if !inner.activities.contains_key(&activity_id) {
            return Err(TaxonomyError::ActivityNotFound {
                public_id: activity_id,
            });
        }
        let Some(sector) = inner.sectors.get_mut(&sector_id) else {
            return Err(TaxonomyError::SectorNotFound {
                public_id: sector_id,
            });
        };
        if !sector.activity_ids.contains(&activity_id) {
            sector.activity_ids.push(activity_id);
        }
        if let Some(activity) = inner.activities.get_mut(&activity_id)
            && !activity.sector_ids.contains(&sector_id)
        {
            activity.sector_ids.push(sector_id);
        }
        Ok(())
    }

    /// Returns every sector ordered by public id.
    pub fn find_all(&self) -> Vec<Sector> {
        self.inner.read().sectors.values().cloned().collect()
    }

    /// Looks up a sector by public id.
    pub fn find_by_public_id(&self, public_id: u64) -> Option<Sector> {
        self.inner.read().sectors.get(&public_id).cloned()
    }

    /// Looks up a sector by correlation id.
    pub fn find_by_correlation_id(&self, correlation_id: u64) -> Option<Sector> {
        let inner = self.inner.read();
        inner
            .sectors_by_correlation
            .get(&correlation_id)
            .and_then(|id| inner.sectors.get(id))
            .cloned()
    }

    /// Returns the parents of a sector; unknown sectors have none.
    pub fn parents(&self, public_id: u64) -> Vec<Sector> {
        let inner = self.inner.read();
        inner
            .sectors
            .get(&public_id)
            .map(|sector| {
                sector
                    .parent_ids
                    .iter()
                    .filter_map(|id| inner.sectors.get(id))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Looks up an activity by public id.
    pub fn find_activity_by_public_id(&self, public_id: u64) -> Option<Activity> {
        self.inner.read().activities.get(&public_id).cloned()
    }

    /// Looks up an activity by correlation id.
    pub fn find_activity_by_correlation_id(&self, correlation_id: u64) -> Option<Activity> {
        let inner = self.inner.read();
        inner
            .activities_by_correlation
            .get(&correlation_id)
            .and_then(|id| inner.activities.get(id))
            .cloned()
    }

    /// Returns activities linked to any of the given sectors, each once,
    /// ordered by public id.
    pub fn find_activities_by_sectors(&self, sector_ids: &[u64]) -> Vec<Activity> {
        let inner = self.inner.read();
        let ids: BTreeSet<u64> = sector_ids
            .iter()
            .filter_map(|id| inner.sectors.get(id))
            .flat_map(|sector| sector.activity_ids.iter().copied())
            .collect();
        ids.iter()
            .filter_map(|id| inner.activities.get(id))
            .cloned()
            .collect()
    }

    /// Number of sectors stored.
    pub fn sector_count(&self) -> usize {
        self.inner.read().sectors.len()
    }

    /// Number of activities stored.
    pub fn activity_count(&self) -> usize {
        self.inner.read().activities.len()
    }

    /// Converts every sector into the record indexed for search, with linked
    /// activity names resolved.
    pub fn sector_records(&self) -> Vec<SectorRecord> {
        let inner = self.inner.read();
        inner
            .sectors
            .values()
            .map(|sector| {
                let activities = sector
                    .activity_ids
                    .iter()
                    .filter_map(|id| inner.activities.get(id))
                    .map(|activity| activity.name.clone());
                let record =
                    SectorRecord::new(sector.public_id, sector.name.clone()).with_activities(activities);
                match sector.correlation_id {
                    Some(correlation_id) => record.with_correlation_id(correlation_id),
                    None => record,
                }
            })
            .collect()
    }
}

fn dedup(ids: Vec<u64>) -> Vec<u64> {
    let mut seen = BTreeSet::new();
    ids.into_iter().filter(|id| seen.insert(*id)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_sector_with_explicit_ids() {
        let store = InMemoryTaxonomyStore::new();
        let sector = store
            .create_sector(NewSector::named("Some Sector").with_public_id(42))
            .unwrap();

        assert_eq!(sector.public_id, 42);
        let found = store.find_by_public_id(42).unwrap();
        assert_eq!(found.name, "Some Sector");
    }

    #[test]
    fn test_public_id_uniqueness() {
        let store = InMemoryTaxonomyStore::new();
        store
            .create_sector(NewSector::named("First").with_public_id(42))
            .unwrap();
        let err = store
            .create_sector(NewSector::named("Second").with_public_id(42))
            .unwrap_err();
        assert!(matches!(
            err,
            TaxonomyError::DuplicatePublicId {
                kind: "sector",
                public_id: 42
            }
        ));
    }

    #[test]
    fn test_correlation_id_uniqueness() {
        let store = InMemoryTaxonomyStore::new();
        store
            .create_sector(NewSector::named("First").with_correlation_id(7))
            .unwrap();
        let err = store
            .create_sector(NewSector::named("Second").with_correlation_id(7))
            .unwrap_err();
        assert!(matches!(err, TaxonomyError::DuplicateCorrelationId { .. }));
        assert_eq!(store.sector_count(), 1);
    }

    #[test]
    fn test_requires_name() {
        let store = InMemoryTaxonomyStore::new();
        assert!(matches!(
            store.create_sector(NewSector::named("")),
            Err(TaxonomyError::MissingName { kind: "sector" })
        ));
        assert!(matches!(
            store.create_activity(NewActivity::named("  ")),
            Err(TaxonomyError::MissingName { kind: "activity" })
        ));
    }

    #[test]
    fn test_allocated_ids_skip_taken_ones() {
        let store = InMemoryTaxonomyStore::new();
        store
            .create_sector(NewSector::named("Explicit").with_public_id(2))
            .unwrap();

        let a = store.create_sector(NewSector::named("A")).unwrap();
        let b = store.create_sector(NewSector::named("B")).unwrap();
        assert_eq!(a.public_id, 1);
        assert_eq!(b.public_id, 3);
    }

    #[test]
    fn test_retrieval_of_missing_ids() {
        let store = InMemoryTaxonomyStore::new();
        let sector = store.create_sector(NewSector::named("Test Sector")).unwrap();
        assert!(store.find_by_public_id(sector.public_id + 1).is_none());
        assert!(store.find_by_correlation_id(1000011).is_none());
    }

    #[test]
    fn test_unknown_parent_rejected() {
        let store = InMemoryTaxonomyStore::new();
        let err = store
            .create_sector(NewSector::named("Orphan").with_parent(99))
            .unwrap_err();
        assert!(matches!(err, TaxonomyError::SectorNotFound { public_id: 99 }));
    }

    #[test]
    fn test_activity_links_sectors_both_ways() {
        let store = InMemoryTaxonomyStore::new();
        let s1 = store.create_sector(NewSector::named("S1")).unwrap();
        let s2 = store.create_sector(NewSector::named("S2")).unwrap();

        let a = store
            .create_activity(NewActivity::named("A").in_sectors([s1.public_id, s2.public_id]))
            .unwrap();
        assert_eq!(a.sector_ids, vec![s1.public_id, s2.public_id]);
        assert_eq!(
            store.find_by_public_id(s2.public_id).unwrap().activity_ids,
            vec![a.public_id]
        );
    }

    #[test]
    fn test_link_activity_is_idempotent() {
        let store = InMemoryTaxonomyStore::new();
        let s = store.create_sector(NewSector::named("S")).unwrap();
        let a = store.create_activity(NewActivity::named("A")).unwrap();

        store.link_activity(a.public_id, s.public_id).unwrap();
        store.link_activity(a.public_id, s.public_id).unwrap();

        assert_eq!(
            store.find_by_public_id(s.public_id).unwrap().activity_ids,
            vec![a.public_id]
        );
        assert!(matches!(
            store.link_activity(99, s.public_id),
            Err(TaxonomyError::ActivityNotFound { public_id: 99 })
        ));
    }

    #[test]
    fn test_find_activities_by_sectors_returns_each_once() {
        let store = InMemoryTaxonomyStore::new();
        let s1 = store.create_sector(NewSector::named("Fooey Sector")).unwrap().public_id;
        let s2 = store.create_sector(NewSector::named("Kablooey Sector")).unwrap().public_id;
        let s3 = store.create_sector(NewSector::named("Gooey Sector")).unwrap().public_id;

        let a1 = store.create_activity(NewActivity::named("Fooey Activity").in_sectors([s1])).unwrap();
        let a2 = store.create_activity(NewActivity::named("Kablooey Activity").in_sectors([s2])).unwrap();
        let a3 = store.create_activity(NewActivity::named("Gooey Activity").in_sectors([s3])).unwrap();
        let a4 = store.create_activity(NewActivity::named("Kabloom").in_sectors([s1, s2])).unwrap();
        let a5 = store
            .create_activity(NewActivity::named("Transmogrifying").in_sectors([s1, s3]))
            .unwrap();

        let found: Vec<u64> = store
            .find_activities_by_sectors(&[s2, s3])
            .iter()
            .map(|a| a.public_id)
            .collect();
        assert_eq!(found, vec![a2.public_id, a3.public_id, a4.public_id, a5.public_id]);

        let found: Vec<u64> = store
            .find_activities_by_sectors(&[s1, s3])
            .iter()
            .map(|a| a.public_id)
            .collect();
        assert_eq!(found, vec![a1.public_id, a3.public_id, a4.public_id, a5.public_id]);
    }

    #[test]
    fn test_sector_records_resolve_activity_names() {
        let store = InMemoryTaxonomyStore::new();
        let s = store
            .create_sector(NewSector::named("Pet shop").with_public_id(321).with_correlation_id(123))
            .unwrap();
        store
            .create_activity(NewActivity::named("Selling animals").in_sectors([s.public_id]))
            .unwrap();

        let records = store.sector_records();
        assert_eq!(
            records,
            vec![
                SectorRecord::new(321, "Pet shop")
                    .with_correlation_id(123)
                    .with_activities(["Selling animals"])
            ]
        );
    }
}
