//! The in-memory catalog: a mapping from entry name to entry definition.

use crate::file;
use bimap::BiHashMap;
use datashed_id::EntryId;
use datashed_source::{DataSource, DriverRegistry, SourceSpec};
use object_store::ObjectStore;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize, Serializer};
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;
use thiserror::Error;
use tracing::info;

#[derive(Debug, Error)]
pub enum Error {
    #[error("entry {name:?} not in catalog")]
    EntryNotFound { name: String },

    #[error("catalog already contains an entry named {name:?}")]
    DuplicateEntry { name: String },

    #[error("failed to read catalog file: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid catalog file: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("source error: {0}")]
    Source(#[from] datashed_source::Error),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Bumped on every catalog mutation so cached derived state can notice changes.
#[derive(
    Debug, Default, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct SequenceNumber(u32);

impl SequenceNumber {
    pub fn new(id: u32) -> Self {
        Self(id)
    }

    pub fn next(&self) -> Self {
        Self(self.0 + 1)
    }

    pub fn as_u32(&self) -> u32 {
        self.0
    }
}

/// A declarative description of a data source: stateless until materialized with [`open`].
///
/// [`open`]: CatalogEntry::open
#[derive(Debug, Clone, PartialEq)]
pub struct CatalogEntry {
    id: EntryId,
    spec: SourceSpec,
}

impl CatalogEntry {
    pub fn new(id: EntryId, spec: SourceSpec) -> Self {
        Self { id, spec }
    }

    pub fn id(&self) -> EntryId {
        self.id
    }

    pub fn name(&self) -> Arc<str> {
        Arc::clone(&self.spec.name)
    }

    pub fn description(&self) -> Option<Arc<str>> {
        self.spec.description.as_ref().map(Arc::clone)
    }

    pub fn driver(&self) -> Arc<str> {
        Arc::clone(&self.spec.driver)
    }

    pub fn spec(&self) -> &SourceSpec {
        &self.spec
    }

    /// Names of the plots declared on this entry.
    pub fn plots(&self) -> Vec<String> {
        self.spec.metadata.plot_names()
    }

    /// The key/value structure rendered by `describe` and the browser.
    pub fn display_content(&self) -> serde_json::Value {
        self.spec.display_content()
    }

    /// Materialize the source this entry describes. No I/O happens here; sources open lazily.
    pub fn open(
        &self,
        registry: &DriverRegistry,
        store: Arc<dyn ObjectStore>,
    ) -> Result<Arc<dyn DataSource>> {
        Ok(registry.open(self.spec.clone(), store)?)
    }
}

/// The catalog is a named map of entries behind a lock, in the same shape the cached JSON form
/// takes on disk.
#[derive(Debug)]
pub struct Catalog {
    inner: RwLock<InnerCatalog>,
}

impl PartialEq for Catalog {
    fn eq(&self, other: &Self) -> bool {
        self.inner.read().eq(&other.inner.read())
    }
}

impl Serialize for Catalog {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        self.inner.read().serialize(serializer)
    }
}

impl Catalog {
    pub fn new(name: Arc<str>) -> Self {
        Self {
            inner: RwLock::new(InnerCatalog::new(name)),
        }
    }

    pub fn from_inner(inner: InnerCatalog) -> Self {
        Self {
            inner: RwLock::new(inner),
        }
    }

    /// Load a catalog from a declarative TOML file. Relative `path` arguments are resolved
    /// against the file's directory so a catalog can sit next to its data.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let catalog = file::load(path)?;
        info!(
            catalog = %catalog.name(),
            entries = catalog.len(),
            file = %path.display(),
            "loaded catalog"
        );
        Ok(catalog)
    }

    pub fn name(&self) -> Arc<str> {
        Arc::clone(&self.inner.read().name)
    }

    pub fn description(&self) -> Option<Arc<str>> {
        self.inner.read().description.as_ref().map(Arc::clone)
    }

    /// Look an entry up by name.
    pub fn get(&self, name: &str) -> Option<Arc<CatalogEntry>> {
        let inner = self.inner.read();
        let id = inner.entry_map.get_by_right(name)?;
        inner.entries.get(id).map(Arc::clone)
    }

    /// Like [`get`](Self::get), but a missing entry is an error naming it.
    pub fn require(&self, name: &str) -> Result<Arc<CatalogEntry>> {
        self.get(name).ok_or_else(|| Error::EntryNotFound {
            name: name.to_string(),
        })
    }

    pub fn get_by_id(&self, id: EntryId) -> Option<Arc<CatalogEntry>> {
        self.inner.read().entries.get(&id).map(Arc::clone)
    }

    pub fn entry_name_to_id(&self, name: &str) -> Option<EntryId> {
        self.inner.read().entry_map.get_by_right(name).copied()
    }

    pub fn entry_id_to_name(&self, id: EntryId) -> Option<Arc<str>> {
        self.inner.read().entry_map.get_by_left(&id).map(Arc::clone)
    }

    /// Entry names, sorted.
    pub fn entry_names(&self) -> Vec<String> {
        let mut names: Vec<_> = self
            .inner
            .read()
            .entries
            .values()
            .map(|entry| entry.name().to_string())
            .collect();
        names.sort_unstable();
        names
    }

    /// All entries, sorted by name.
    pub fn entries(&self) -> Vec<Arc<CatalogEntry>> {
        let mut entries: Vec<_> = self.inner.read().entries.values().map(Arc::clone).collect();
        entries.sort_by(|a, b| a.name().cmp(&b.name()));
        entries
    }

    /// Add an entry, allocating its id. Duplicate names are rejected.
    pub fn insert_entry(&self, spec: SourceSpec) -> Result<Arc<CatalogEntry>> {
        let mut inner = self.inner.write();
        if inner.entry_map.contains_right(&spec.name) {
            return Err(Error::DuplicateEntry {
                name: spec.name.to_string(),
            });
        }
        let id = EntryId::new();
        let name = Arc::clone(&spec.name);
        let entry = Arc::new(CatalogEntry::new(id, spec));
        inner.entries.insert(id, Arc::clone(&entry));
        inner.entry_map.insert(id, name);
        inner.sequence = inner.sequence.next();
        inner.updated = true;
        Ok(entry)
    }

    pub fn remove_entry(&self, name: &str) -> Result<Arc<CatalogEntry>> {
        let mut inner = self.inner.write();
        let Some((id, _)) = inner.entry_map.remove_by_right(name) else {
            return Err(Error::EntryNotFound {
                name: name.to_string(),
            });
        };
        let entry = inner
            .entries
            .remove(&id)
            .expect("entry map and entries are kept in sync");
        inner.sequence = inner.sequence.next();
        inner.updated = true;
        Ok(entry)
    }

    pub fn len(&self) -> usize {
        self.inner.read().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.read().entries.is_empty()
    }

    pub fn sequence_number(&self) -> SequenceNumber {
        self.inner.read().sequence
    }

    pub fn is_updated(&self) -> bool {
        self.inner.read().updated
    }

    /// After the catalog's cached form has been written, clear the dirty flag, provided nothing
    /// changed while the write was in flight.
    pub fn set_updated_false_if_sequence_matches(&self, sequence_number: SequenceNumber) {
        let mut inner = self.inner.write();
        if inner.sequence == sequence_number {
            inner.updated = false;
        }
    }

    pub fn clone_inner(&self) -> InnerCatalog {
        self.inner.read().clone()
    }
}

/// The catalog contents proper; [`Catalog`] wraps this in a lock.
#[derive(Debug, Clone)]
pub struct InnerCatalog {
    pub(crate) name: Arc<str>,
    pub(crate) description: Option<Arc<str>>,
    pub(crate) entries: HashMap<EntryId, Arc<CatalogEntry>>,
    pub(crate) entry_map: BiHashMap<EntryId, Arc<str>>,
    pub(crate) sequence: SequenceNumber,
    /// True when the catalog changed since it was last serialized.
    pub(crate) updated: bool,
}

// The dirty flag is transient bookkeeping and does not participate in equality.
impl PartialEq for InnerCatalog {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
            && self.description == other.description
            && self.entries == other.entries
            && self.entry_map == other.entry_map
            && self.sequence == other.sequence
    }
}

impl InnerCatalog {
    pub fn new(name: Arc<str>) -> Self {
        Self {
            name,
            description: None,
            entries: HashMap::new(),
            entry_map: BiHashMap::new(),
            sequence: SequenceNumber::default(),
            updated: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use datashed_source::Container;
    use pretty_assertions::assert_eq;

    fn sample_spec(name: &str) -> SourceSpec {
        SourceSpec::new(name, "csv")
            .with_description("a sample")
            .with_container(Container::Table)
            .with_arg("path", format!("data/{name}.csv"))
    }

    #[test]
    fn insert_get_remove_roundtrip() {
        let catalog = Catalog::new("demo".into());
        assert!(catalog.is_empty());
        assert!(!catalog.is_updated());

        let entry = catalog.insert_entry(sample_spec("trips")).unwrap();
        assert_eq!(catalog.len(), 1);
        assert!(catalog.is_updated());
        assert_eq!(catalog.sequence_number(), SequenceNumber::new(1));

        let fetched = catalog.get("trips").unwrap();
        assert_eq!(fetched.id(), entry.id());
        assert_eq!(catalog.entry_id_to_name(entry.id()).unwrap(), "trips".into());
        assert_eq!(catalog.entry_name_to_id("trips"), Some(entry.id()));

        let removed = catalog.remove_entry("trips").unwrap();
        assert_eq!(removed.name(), "trips".into());
        assert!(catalog.is_empty());
        assert!(catalog.get("trips").is_none());
        assert_eq!(catalog.sequence_number(), SequenceNumber::new(2));
    }

    #[test]
    fn duplicate_entry_rejected() {
        let catalog = Catalog::new("demo".into());
        catalog.insert_entry(sample_spec("trips")).unwrap();
        let err = catalog.insert_entry(sample_spec("trips")).unwrap_err();
        assert!(matches!(err, Error::DuplicateEntry { name } if name == "trips"));
    }

    #[test]
    fn missing_entry_errors() {
        let catalog = Catalog::new("demo".into());
        let err = catalog.require("nope").unwrap_err();
        assert!(matches!(err, Error::EntryNotFound { name } if name == "nope"));
        let err = catalog.remove_entry("nope").unwrap_err();
        assert!(matches!(err, Error::EntryNotFound { name } if name == "nope"));
    }

    #[test]
    fn updated_flag_clears_when_sequence_matches() {
        let catalog = Catalog::new("demo".into());
        catalog.insert_entry(sample_spec("trips")).unwrap();
        let sequence = catalog.sequence_number();
        catalog.set_updated_false_if_sequence_matches(sequence);
        assert!(!catalog.is_updated());

        catalog.insert_entry(sample_spec("fares")).unwrap();
        // A stale sequence number must not clear the flag.
        catalog.set_updated_false_if_sequence_matches(sequence);
        assert!(catalog.is_updated());
    }

    #[test]
    fn entries_sorted_by_name() {
        let catalog = Catalog::new("demo".into());
        catalog.insert_entry(sample_spec("zones")).unwrap();
        catalog.insert_entry(sample_spec("fares")).unwrap();
        catalog.insert_entry(sample_spec("trips")).unwrap();
        assert_eq!(catalog.entry_names(), vec!["fares", "trips", "zones"]);
        let entries = catalog.entries();
        assert_eq!(entries[0].name(), "fares".into());
        assert_eq!(entries[2].name(), "zones".into());
    }
}
