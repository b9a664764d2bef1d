//! Exporter plugins: the format conversions behind `persist`.
//!
//! An exporter owns one container type. Persisting a source looks its exporter up in the
//! registry, hands it the source to materialize into an artifact, and later reopens the artifact
//! through the same exporter. The registry is swappable so embedders can plug in their own
//! formats.

mod jsonl;
mod parquet;

pub use jsonl::JsonlExporter;
pub use parquet::ParquetExporter;

use crate::record::PersistRecord;
use crate::token::CacheToken;
use crate::Result;
use async_trait::async_trait;
use datashed_source::{Container, DataSource};
use object_store::ObjectStore;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::fmt::Debug;
use std::sync::{Arc, OnceLock};
use tracing::debug;

/// What an export produced: artifact locations and their aggregate shape.
#[derive(Debug, Clone)]
pub struct ExportSummary {
    /// Object store paths of the written artifact parts.
    pub paths: Vec<String>,
    pub row_count: u64,
    pub size_bytes: u64,
}

/// Converts a source's data into a cached artifact and reopens artifacts it wrote earlier.
#[async_trait]
pub trait Exporter: Debug + Send + Sync + 'static {
    /// The container type this exporter persists.
    fn container(&self) -> Container;

    /// Artifact format name; doubles as the driver the cached copy opens under.
    fn format(&self) -> &'static str;

    /// Materialize the source and write the artifact under the token's directory.
    async fn export(
        &self,
        source: &dyn DataSource,
        store: &Arc<dyn ObjectStore>,
        prefix: &str,
        token: &CacheToken,
    ) -> Result<ExportSummary>;

    /// Reopen the cached copy a record points at. The result reports `is_persisted`.
    fn open(
        &self,
        record: &PersistRecord,
        store: Arc<dyn ObjectStore>,
    ) -> Result<Arc<dyn DataSource>>;
}

/// Registry of exporters keyed by container type.
#[derive(Debug)]
pub struct ExporterRegistry {
    inner: RwLock<HashMap<Container, Arc<dyn Exporter>>>,
}

impl Default for ExporterRegistry {
    fn default() -> Self {
        Self::with_defaults()
    }
}

impl ExporterRegistry {
    /// An empty registry.
    pub fn empty() -> Self {
        Self {
            inner: RwLock::new(HashMap::new()),
        }
    }

    /// A registry with the built-in exporters installed. `Blob` sources have no default
    /// exporter; persisting one fails with a typed error.
    pub fn with_defaults() -> Self {
        let registry = Self::empty();
        registry.register(Arc::new(ParquetExporter));
        registry.register(Arc::new(JsonlExporter));
        registry
    }

    /// The process-wide registry used when a store is not handed its own.
    pub fn global() -> Arc<Self> {
        static GLOBAL: OnceLock<Arc<ExporterRegistry>> = OnceLock::new();
        Arc::clone(GLOBAL.get_or_init(|| Arc::new(Self::with_defaults())))
    }

    /// Install an exporter for its container type, replacing any existing one.
    pub fn register(&self, exporter: Arc<dyn Exporter>) {
        debug!(
            container = %exporter.container(),
            format = exporter.format(),
            "registering exporter"
        );
        self.inner.write().insert(exporter.container(), exporter);
    }

    pub fn for_container(&self, container: Container) -> Option<Arc<dyn Exporter>> {
        self.inner.read().get(&container).map(Arc::clone)
    }
}
