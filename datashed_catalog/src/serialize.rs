//! JSON snapshot forms for the catalog. Maps are written as arrays so the serialized catalog is
//! stable and human-diffable, and rebuilt (with duplicate checks) on the way back in.

use crate::catalog::{CatalogEntry, InnerCatalog, SequenceNumber};
use bimap::BiHashMap;
use datashed_id::EntryId;
use datashed_source::SourceSpec;
use serde::de::Error as _;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

impl Serialize for InnerCatalog {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        CatalogSnapshot::from(self).serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for InnerCatalog {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let snapshot = CatalogSnapshot::deserialize(deserializer)?;
        snapshot.try_into().map_err(D::Error::custom)
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct CatalogSnapshot {
    name: Arc<str>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    description: Option<Arc<str>>,
    entries: Vec<EntrySnapshot>,
    #[serde(default)]
    sequence: SequenceNumber,
}

#[derive(Debug, Serialize, Deserialize)]
struct EntrySnapshot {
    id: EntryId,
    #[serde(flatten)]
    spec: SourceSpec,
}

impl From<&InnerCatalog> for CatalogSnapshot {
    fn from(catalog: &InnerCatalog) -> Self {
        let mut entries: Vec<_> = catalog
            .entries
            .values()
            .map(|entry| EntrySnapshot {
                id: entry.id(),
                spec: entry.spec().clone(),
            })
            .collect();
        entries.sort_by(|a, b| a.spec.name.cmp(&b.spec.name));
        Self {
            name: Arc::clone(&catalog.name),
            description: catalog.description.as_ref().map(Arc::clone),
            entries,
            sequence: catalog.sequence,
        }
    }
}

impl TryFrom<CatalogSnapshot> for InnerCatalog {
    type Error = String;

    fn try_from(snapshot: CatalogSnapshot) -> Result<Self, Self::Error> {
        let mut inner = InnerCatalog::new(snapshot.name);
        inner.description = snapshot.description;
        inner.sequence = snapshot.sequence;
        let mut entry_map = BiHashMap::new();
        for EntrySnapshot { id, spec } in snapshot.entries {
            if entry_map.contains_right(&spec.name) {
                return Err(format!("found duplicate entry: {}", spec.name));
            }
            if entry_map.contains_left(&id) {
                return Err(format!("found duplicate entry id: {id}"));
            }
            entry_map.insert(id, Arc::clone(&spec.name));
            inner.entries.insert(id, Arc::new(CatalogEntry::new(id, spec)));
        }
        inner.entry_map = entry_map;
        Ok(inner)
    }
}
