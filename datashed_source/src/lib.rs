//! Definitions for the data sources that catalog entries materialize into. A source is a lazily
//! opened handle to some underlying dataset: constructing one performs no I/O, `discover` probes
//! the schema and shape cheaply, and `read` materializes the full dataset into memory.
//!
//! Sources are produced by drivers registered in a [`DriverRegistry`] keyed by driver name. Each
//! driver declares the container type its data arrives as, which in turn decides how the source
//! is persisted into its cached local form.

pub mod drivers;
pub mod metadata;
pub mod registry;

use arrow::datatypes::SchemaRef;
use arrow::record_batch::RecordBatch;
use async_trait::async_trait;
use bytes::Bytes;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::any::Any;
use std::collections::BTreeMap;
use std::fmt::Debug;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use thiserror::Error;

pub use metadata::{Metadata, PlotDef, PlotKind};
pub use registry::{Driver, DriverRegistry};

#[derive(Debug, Error)]
pub enum Error {
    #[error("no driver registered under name {driver:?}")]
    UnknownDriver { driver: String },

    #[error("entry declares container {declared} but driver {driver:?} produces {actual}")]
    ContainerMismatch {
        driver: String,
        declared: Container,
        actual: Container,
    },

    #[error("driver {driver:?} requires argument {arg:?}")]
    MissingArg { driver: String, arg: &'static str },

    #[error("driver {driver:?} argument {arg:?} is invalid: {reason}")]
    InvalidArg {
        driver: String,
        arg: &'static str,
        reason: String,
    },

    #[error("object store error: {0}")]
    ObjectStore(#[from] object_store::Error),

    #[error("object store path error: {0}")]
    ObjectStorePath(#[from] object_store::path::Error),

    #[error("arrow error: {0}")]
    Arrow(#[from] arrow::error::ArrowError),

    #[error("parquet error: {0}")]
    Parquet(#[from] parquet::errors::ParquetError),

    #[error("invalid json: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

/// The shape a source's data arrives as. Persistence delegates to the exporter registered for
/// this type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Container {
    /// Tabular data, materialized as arrow record batches.
    Table,
    /// A sequence of JSON values.
    Items,
    /// An opaque run of bytes.
    Blob,
}

impl std::fmt::Display for Container {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Table => write!(f, "table"),
            Self::Items => write!(f, "items"),
            Self::Blob => write!(f, "blob"),
        }
    }
}

/// Fully materialized source data, one variant per [`Container`].
#[derive(Debug, Clone)]
pub enum SourceData {
    Table(TableData),
    Items(Vec<Value>),
    Blob(Bytes),
}

impl SourceData {
    pub fn container(&self) -> Container {
        match self {
            Self::Table(_) => Container::Table,
            Self::Items(_) => Container::Items,
            Self::Blob(_) => Container::Blob,
        }
    }
}

/// Schema plus record batches for a `Table` container source.
#[derive(Debug, Clone)]
pub struct TableData {
    pub schema: SchemaRef,
    pub batches: Vec<RecordBatch>,
}

impl TableData {
    pub fn rows(&self) -> usize {
        self.batches.iter().map(|b| b.num_rows()).sum()
    }
}

/// The result of cheaply probing a source without reading it in full.
#[derive(Debug, Clone)]
pub struct Discovery {
    pub container: Container,
    /// Present for `Table` sources once the schema is known.
    pub schema: Option<SchemaRef>,
    /// Row (or item) count, when the probe could determine it.
    pub rows: Option<usize>,
}

/// The declarative identity a source was built from: everything needed to construct it again.
///
/// Two specs with the same driver and arguments refer to the same underlying dataset, which is
/// what the persistence layer keys its cache on.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceSpec {
    pub name: Arc<str>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<Arc<str>>,
    pub driver: Arc<str>,
    /// Container type declared by the entry; validated against the driver when opened.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub container: Option<Container>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub args: BTreeMap<String, Value>,
    #[serde(default, skip_serializing_if = "Metadata::is_empty")]
    pub metadata: Metadata,
}

impl SourceSpec {
    pub fn new(name: impl Into<Arc<str>>, driver: impl Into<Arc<str>>) -> Self {
        Self {
            name: name.into(),
            description: None,
            driver: driver.into(),
            container: None,
            args: BTreeMap::new(),
            metadata: Metadata::default(),
        }
    }

    pub fn with_description(mut self, description: impl Into<Arc<str>>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_container(mut self, container: Container) -> Self {
        self.container = Some(container);
        self
    }

    pub fn with_arg(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.args.insert(key.into(), value.into());
        self
    }

    pub fn with_metadata(mut self, metadata: Metadata) -> Self {
        self.metadata = metadata;
        self
    }

    pub fn arg(&self, key: &str) -> Option<&Value> {
        self.args.get(key)
    }

    pub fn arg_str(&self, key: &str) -> Option<&str> {
        self.args.get(key).and_then(Value::as_str)
    }

    pub fn arg_bool(&self, key: &str) -> Option<bool> {
        self.args.get(key).and_then(Value::as_bool)
    }

    /// Canonical identity string for this spec's underlying dataset. Argument maps are ordered,
    /// so two specs differing only in argument insertion order produce the same basis.
    pub fn cache_key_basis(&self) -> String {
        #[derive(Serialize)]
        struct Basis<'a> {
            args: &'a BTreeMap<String, Value>,
            driver: &'a str,
        }
        serde_json::to_string(&Basis {
            args: &self.args,
            driver: &self.driver,
        })
        .expect("spec args are valid json values")
    }

    /// The ordered key/value structure shown by `describe` and the browser's description panel.
    /// Plot definitions are stripped from the metadata; they belong to the plot panel.
    pub fn display_content(&self) -> Value {
        let mut content = serde_json::Map::new();
        content.insert("name".to_string(), Value::String(self.name.to_string()));
        if let Some(description) = &self.description {
            content.insert(
                "description".to_string(),
                Value::String(description.to_string()),
            );
        }
        content.insert("driver".to_string(), Value::String(self.driver.to_string()));
        if let Some(container) = self.container {
            content.insert(
                "container".to_string(),
                Value::String(container.to_string()),
            );
        }
        if !self.args.is_empty() {
            content.insert(
                "args".to_string(),
                Value::Object(
                    self.args
                        .iter()
                        .map(|(k, v)| (k.clone(), v.clone()))
                        .collect(),
                ),
            );
        }
        let metadata = self.metadata.without_plots();
        if !metadata.is_empty() {
            content.insert("metadata".to_string(), metadata.to_value());
        }
        Value::Object(content)
    }
}

/// Persistence flags carried by every source instance.
///
/// `has_been_persisted` records that this instance triggered a persist; it flips on the original
/// source and stays unset on the cached copy. `is_persisted` marks an instance that IS the cached
/// copy and is fixed at construction.
#[derive(Debug, Default)]
pub struct PersistState {
    has_been_persisted: AtomicBool,
    is_persisted: bool,
}

impl PersistState {
    pub fn new() -> Self {
        Self::default()
    }

    /// State for a source that is itself a cached materialization.
    pub fn cached() -> Self {
        Self {
            has_been_persisted: AtomicBool::new(false),
            is_persisted: true,
        }
    }

    pub fn has_been_persisted(&self) -> bool {
        self.has_been_persisted.load(Ordering::SeqCst)
    }

    pub fn is_persisted(&self) -> bool {
        self.is_persisted
    }

    /// Record that a persist call originated from the owning instance.
    pub fn mark_persist_triggered(&self) {
        self.has_been_persisted.store(true, Ordering::SeqCst);
    }
}

/// A lazily-opened handle to actual data.
#[async_trait]
pub trait DataSource: Debug + Send + Sync + 'static {
    /// The declarative identity this source was built from.
    fn spec(&self) -> &SourceSpec;

    /// The container type this source's data arrives as.
    fn container(&self) -> Container;

    /// Persistence flags for this instance.
    fn persist_state(&self) -> &PersistState;

    /// Probe the underlying data without reading it in full.
    async fn discover(&self) -> Result<Discovery>;

    /// Materialize the full dataset.
    async fn read(&self) -> Result<SourceData>;

    fn as_any(&self) -> &dyn Any;

    fn name(&self) -> Arc<str> {
        Arc::clone(&self.spec().name)
    }

    fn driver(&self) -> Arc<str> {
        Arc::clone(&self.spec().driver)
    }

    fn description(&self) -> Option<Arc<str>> {
        self.spec().description.as_ref().map(Arc::clone)
    }

    fn metadata(&self) -> &Metadata {
        &self.spec().metadata
    }

    /// Names of the plots declared in this source's metadata.
    fn plots(&self) -> Vec<String> {
        self.spec().metadata.plot_names()
    }

    fn has_been_persisted(&self) -> bool {
        self.persist_state().has_been_persisted()
    }

    fn is_persisted(&self) -> bool {
        self.persist_state().is_persisted()
    }

    fn cache_key_basis(&self) -> String {
        self.spec().cache_key_basis()
    }

    fn display_content(&self) -> Value {
        self.spec().display_content()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn cache_key_basis_ignores_arg_order() {
        let a = SourceSpec::new("trips", "csv")
            .with_arg("path", "/data/trips.csv")
            .with_arg("delimiter", ";");
        let b = SourceSpec::new("trips_again", "csv")
            .with_arg("delimiter", ";")
            .with_arg("path", "/data/trips.csv");
        // Same driver + args means the same dataset, regardless of name or insertion order.
        assert_eq!(a.cache_key_basis(), b.cache_key_basis());
    }

    #[test]
    fn cache_key_basis_distinguishes_args_and_driver() {
        let a = SourceSpec::new("trips", "csv").with_arg("path", "/data/trips.csv");
        let b = SourceSpec::new("trips", "csv").with_arg("path", "/data/other.csv");
        let c = SourceSpec::new("trips", "jsonl").with_arg("path", "/data/trips.csv");
        assert_ne!(a.cache_key_basis(), b.cache_key_basis());
        assert_ne!(a.cache_key_basis(), c.cache_key_basis());
    }

    #[test]
    fn display_content_strips_plots() {
        let metadata: Metadata = serde_json::from_value(serde_json::json!({
            "owner": "ops",
            "plots": {
                "fares": {"kind": "line", "x": "time", "y": ["fare"]}
            }
        }))
        .unwrap();
        let spec = SourceSpec::new("trips", "csv")
            .with_description("Taxi trips")
            .with_arg("path", "/data/trips.csv")
            .with_metadata(metadata);

        let content = spec.display_content();
        let object = content.as_object().unwrap();
        assert_eq!(object["name"], "trips");
        assert_eq!(object["driver"], "csv");
        assert_eq!(object["metadata"]["owner"], "ops");
        assert!(object["metadata"].get("plots").is_none());
    }

    #[test]
    fn persist_state_flags() {
        let state = PersistState::new();
        assert!(!state.has_been_persisted());
        assert!(!state.is_persisted());
        state.mark_persist_triggered();
        assert!(state.has_been_persisted());
        assert!(!state.is_persisted());

        let cached = PersistState::cached();
        assert!(!cached.has_been_persisted());
        assert!(cached.is_persisted());
    }
}
