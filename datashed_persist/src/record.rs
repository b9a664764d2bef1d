//! Records of persisted artifacts and the index that holds them.

use crate::token::CacheToken;
use chrono::{DateTime, Utc};
use datashed_source::{Container, SourceSpec};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

/// Summary of one persisted artifact set: everything needed to reopen the cached copy, refresh
/// it from the original source, or decide that it has gone stale.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PersistRecord {
    pub token: CacheToken,
    /// The spec of the source that was persisted, kept so the artifact can be refreshed.
    pub source: SourceSpec,
    pub container: Container,
    /// Format of the cached artifact, which is also the driver that reopens it.
    pub format: Arc<str>,
    /// Object store paths of the artifact parts.
    pub paths: Vec<String>,
    pub row_count: u64,
    pub size_bytes: u64,
    pub created: DateTime<Utc>,
    /// Time-to-live; a record past it reports [`needs_refresh`](Self::needs_refresh).
    #[serde(default, with = "humantime_serde", skip_serializing_if = "Option::is_none")]
    pub ttl: Option<Duration>,
}

impl PersistRecord {
    /// Whether the artifact has outlived its ttl. Records without one never go stale.
    pub fn needs_refresh(&self) -> bool {
        match self.ttl {
            Some(ttl) => Utc::now()
                .signed_duration_since(self.created)
                .to_std()
                .map(|age| age >= ttl)
                .unwrap_or(false),
            None => false,
        }
    }

    /// The spec the cached copy opens under: same identity, but read through the artifact
    /// format's driver. Description and metadata (plots included) carry over so the cached copy
    /// presents like the original.
    pub fn cached_spec(&self) -> SourceSpec {
        let mut spec = SourceSpec::new(Arc::clone(&self.source.name), Arc::clone(&self.format))
            .with_container(self.container)
            .with_arg("path", self.paths[0].as_str());
        spec.description = self.source.description.as_ref().map(Arc::clone);
        spec.metadata = self.source.metadata.clone();
        spec
    }
}

/// Token-keyed map of persist records; the JSON form lives in the object store and survives
/// process restarts.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PersistIndex {
    records: BTreeMap<String, PersistRecord>,
}

impl PersistIndex {
    pub fn get(&self, token: &CacheToken) -> Option<&PersistRecord> {
        self.records.get(token.as_str())
    }

    pub fn insert(&mut self, record: PersistRecord) {
        self.records.insert(record.token.to_string(), record);
    }

    pub fn remove(&mut self, token: &CacheToken) -> Option<PersistRecord> {
        self.records.remove(token.as_str())
    }

    pub fn contains(&self, token: &CacheToken) -> bool {
        self.records.contains_key(token.as_str())
    }

    pub fn records(&self) -> impl Iterator<Item = &PersistRecord> {
        self.records.values()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn record(ttl: Option<Duration>, created: DateTime<Utc>) -> PersistRecord {
        PersistRecord {
            token: CacheToken::from_hex("deadbeef"),
            source: SourceSpec::new("trips", "csv").with_arg("path", "/data/trips.csv"),
            container: Container::Table,
            format: "parquet".into(),
            paths: vec!["persisted/deadbeef/part-00000.parquet".to_string()],
            row_count: 10,
            size_bytes: 1024,
            created,
            ttl,
        }
    }

    #[test]
    fn no_ttl_never_needs_refresh() {
        let old = Utc::now() - chrono::Duration::days(365);
        assert!(!record(None, old).needs_refresh());
    }

    #[test]
    fn expired_ttl_needs_refresh() {
        let old = Utc::now() - chrono::Duration::hours(2);
        assert!(record(Some(Duration::from_secs(3600)), old).needs_refresh());
        assert!(!record(Some(Duration::from_secs(24 * 3600)), old).needs_refresh());
    }

    #[test]
    fn cached_spec_reopens_through_artifact_format() {
        let record = record(None, Utc::now());
        let spec = record.cached_spec();
        assert_eq!(spec.name, "trips".into());
        assert_eq!(spec.driver, "parquet".into());
        assert_eq!(
            spec.arg_str("path"),
            Some("persisted/deadbeef/part-00000.parquet")
        );
    }

    #[test]
    fn index_json_roundtrip() {
        let mut index = PersistIndex::default();
        index.insert(record(Some(Duration::from_secs(60)), Utc::now()));
        let serialized = serde_json::to_string_pretty(&index).unwrap();
        let deserialized: PersistIndex = serde_json::from_str(&serialized).unwrap();
        assert_eq!(index, deserialized);
        assert!(deserialized.contains(&CacheToken::from_hex("deadbeef")));
    }
}
