//! The persist store: a catalog of cached artifacts kept in object storage.

use crate::exporters::ExporterRegistry;
use crate::paths::{ArtifactPath, PersistIndexPath};
use crate::record::{PersistIndex, PersistRecord};
use crate::token::CacheToken;
use crate::{Error, Result};
use chrono::Utc;
use datashed_source::{DataSource, DriverRegistry};
use futures::TryStreamExt;
use object_store::path::Path as ObjPath;
use object_store::ObjectStore;
use parking_lot::RwLock;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

/// Default prefix persisted artifacts live under within the object store.
pub const DEFAULT_PREFIX: &str = "persisted";

/// Owns the persist index and delegates format conversion to the exporter registered for each
/// source's container type.
///
/// Locks are never held across I/O; the index is snapshotted out of the lock, mutated briefly,
/// and written back to the store as a whole.
#[derive(Debug)]
pub struct PersistStore {
    store: Arc<dyn ObjectStore>,
    prefix: Arc<str>,
    drivers: Arc<DriverRegistry>,
    exporters: Arc<ExporterRegistry>,
    index: RwLock<PersistIndex>,
}

impl PersistStore {
    /// A store with an empty index, using the global exporter registry and built-in drivers.
    pub fn new(store: Arc<dyn ObjectStore>, prefix: impl Into<Arc<str>>) -> Self {
        Self {
            store,
            prefix: prefix.into(),
            drivers: Arc::new(DriverRegistry::with_defaults()),
            exporters: ExporterRegistry::global(),
            index: RwLock::new(PersistIndex::default()),
        }
    }

    /// Swap in a private exporter registry.
    pub fn with_exporters(mut self, exporters: Arc<ExporterRegistry>) -> Self {
        self.exporters = exporters;
        self
    }

    /// Swap in a private driver registry, used when refreshing records.
    pub fn with_drivers(mut self, drivers: Arc<DriverRegistry>) -> Self {
        self.drivers = drivers;
        self
    }

    /// A store whose index is read back from object storage, so cached artifacts survive process
    /// restarts. A missing index file means an empty store, not an error.
    pub async fn load(store: Arc<dyn ObjectStore>, prefix: impl Into<Arc<str>>) -> Result<Self> {
        let persist_store = Self::new(store, prefix);
        persist_store.reload_index().await?;
        Ok(persist_store)
    }

    /// Re-read the index from object storage, replacing the in-memory copy.
    pub async fn reload_index(&self) -> Result<()> {
        let path = PersistIndexPath::new(&self.prefix);
        match self.store.get(&path).await {
            Ok(response) => {
                let bytes = response.bytes().await?;
                let index: PersistIndex = serde_json::from_slice(&bytes)?;
                debug!(records = index.len(), "loaded persist index");
                *self.index.write() = index;
            }
            Err(object_store::Error::NotFound { .. }) => {}
            Err(e) => return Err(e.into()),
        }
        Ok(())
    }

    pub fn object_store(&self) -> Arc<dyn ObjectStore> {
        Arc::clone(&self.store)
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Persist a source into its cached local form.
    ///
    /// Idempotent: when the source's token is already recorded and the artifact is both alive
    /// and fresh, the recorded copy is reopened without invoking the exporter again. Either way
    /// the originating instance gets its `has_been_persisted` flag set, and the returned source
    /// reports `is_persisted`.
    pub async fn persist(&self, source: &dyn DataSource) -> Result<Arc<dyn DataSource>> {
        self.persist_with_ttl(source, None).await
    }

    /// [`persist`](Self::persist) with a time-to-live: once the artifact outlives it, the next
    /// persist or refresh re-exports instead of reusing it.
    pub async fn persist_with_ttl(
        &self,
        source: &dyn DataSource,
        ttl: Option<Duration>,
    ) -> Result<Arc<dyn DataSource>> {
        let token = CacheToken::from_source(source);
        let existing = self.index.read().get(&token).cloned();
        if let Some(record) = existing {
            if !record.needs_refresh() && self.artifact_alive(&record).await {
                debug!(
                    name = %source.name(),
                    token = token.short(),
                    "source already persisted; reusing cached artifact"
                );
                source.persist_state().mark_persist_triggered();
                return self.open_record(&record);
            }
        }
        let record = self.export(source, ttl, token).await?;
        source.persist_state().mark_persist_triggered();
        self.open_record(&record)
    }

    /// Re-export a recorded artifact from its original source.
    pub async fn refresh(&self, token: &CacheToken) -> Result<Arc<dyn DataSource>> {
        let record = self.require_record(token)?;
        let source = self
            .drivers
            .open(record.source.clone(), Arc::clone(&self.store))?;
        let record = self.export(source.as_ref(), record.ttl, token.clone()).await?;
        self.open_record(&record)
    }

    /// Delete a recorded artifact and forget it.
    pub async fn remove(&self, token: &CacheToken) -> Result<()> {
        let record = self
            .index
            .write()
            .remove(token)
            .ok_or_else(|| Error::UnknownToken {
                token: token.to_string(),
            })?;
        self.delete_artifacts(&record.token).await?;
        self.write_index().await?;
        info!(token = token.short(), "removed persisted artifact");
        Ok(())
    }

    /// Delete every recorded artifact.
    pub async fn clear(&self) -> Result<()> {
        let tokens: Vec<_> = self
            .index
            .read()
            .records()
            .map(|record| record.token.clone())
            .collect();
        for token in &tokens {
            self.delete_artifacts(token).await?;
        }
        *self.index.write() = PersistIndex::default();
        self.write_index().await?;
        info!(removed = tokens.len(), "cleared persist store");
        Ok(())
    }

    /// Reopen the cached copy recorded under a token.
    pub async fn open_cached(&self, token: &CacheToken) -> Result<Arc<dyn DataSource>> {
        let record = self.require_record(token)?;
        self.open_record(&record)
    }

    pub fn record(&self, token: &CacheToken) -> Option<PersistRecord> {
        self.index.read().get(token).cloned()
    }

    pub fn records(&self) -> Vec<PersistRecord> {
        self.index.read().records().cloned().collect()
    }

    pub fn contains(&self, token: &CacheToken) -> bool {
        self.index.read().contains(token)
    }

    /// Whether the recorded artifact has outlived its ttl.
    pub fn needs_refresh(&self, token: &CacheToken) -> Result<bool> {
        Ok(self.require_record(token)?.needs_refresh())
    }

    pub fn len(&self) -> usize {
        self.index.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.read().is_empty()
    }

    fn require_record(&self, token: &CacheToken) -> Result<PersistRecord> {
        self.record(token).ok_or_else(|| Error::UnknownToken {
            token: token.to_string(),
        })
    }

    async fn export(
        &self,
        source: &dyn DataSource,
        ttl: Option<Duration>,
        token: CacheToken,
    ) -> Result<PersistRecord> {
        let container = source.container();
        let exporter = self
            .exporters
            .for_container(container)
            .ok_or(Error::NoExporterForContainer { container })?;
        let summary = exporter
            .export(source, &self.store, &self.prefix, &token)
            .await?;
        info!(
            name = %source.name(),
            token = token.short(),
            format = exporter.format(),
            rows = summary.row_count,
            size_bytes = summary.size_bytes,
            "persisted source"
        );
        let record = PersistRecord {
            token,
            source: source.spec().clone(),
            container,
            format: exporter.format().into(),
            paths: summary.paths,
            row_count: summary.row_count,
            size_bytes: summary.size_bytes,
            created: Utc::now(),
            ttl,
        };
        self.index.write().insert(record.clone());
        self.write_index().await?;
        Ok(record)
    }

    fn open_record(&self, record: &PersistRecord) -> Result<Arc<dyn DataSource>> {
        let exporter = self
            .exporters
            .for_container(record.container)
            .ok_or(Error::NoExporterForContainer {
                container: record.container,
            })?;
        exporter.open(record, Arc::clone(&self.store))
    }

    async fn artifact_alive(&self, record: &PersistRecord) -> bool {
        for raw in &record.paths {
            let Ok(path) = ObjPath::parse(raw) else {
                return false;
            };
            if self.store.head(&path).await.is_err() {
                return false;
            }
        }
        true
    }

    async fn delete_artifacts(&self, token: &CacheToken) -> Result<()> {
        let dir = ArtifactPath::dir(&self.prefix, token);
        let mut objects = self.store.list(Some(&dir));
        while let Some(meta) = objects.try_next().await? {
            self.store.delete(&meta.location).await?;
        }
        Ok(())
    }

    async fn write_index(&self) -> Result<()> {
        let snapshot = self.index.read().clone();
        let bytes = serde_json::to_vec_pretty(&snapshot)?;
        let path = PersistIndexPath::new(&self.prefix);
        self.store.put(&path, bytes.into()).await?;
        Ok(())
    }
}
