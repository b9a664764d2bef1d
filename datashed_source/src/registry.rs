//! Driver plugin registry. Entries name their driver; the registry resolves that name to a
//! [`Driver`] that can construct the source. Unknown names surface as a typed error rather than
//! a panic so a catalog can reference drivers that are not installed.

use crate::drivers::{CsvDriver, JsonlDriver, ParquetDriver};
use crate::{Container, DataSource, Error, Result, SourceSpec};
use object_store::ObjectStore;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::fmt::Debug;
use std::sync::Arc;
use tracing::debug;

/// Constructs sources from specs. One driver per data format.
pub trait Driver: Debug + Send + Sync + 'static {
    /// The name entries use to select this driver.
    fn name(&self) -> &'static str;

    /// The container type sources built by this driver produce.
    fn container(&self) -> Container;

    /// Build a source from the spec. Must not perform I/O; sources open lazily.
    fn open(&self, spec: SourceSpec, store: Arc<dyn ObjectStore>) -> Result<Arc<dyn DataSource>>;
}

/// Registry of drivers keyed by name.
#[derive(Debug)]
pub struct DriverRegistry {
    drivers: RwLock<HashMap<&'static str, Arc<dyn Driver>>>,
}

impl Default for DriverRegistry {
    fn default() -> Self {
        Self::with_defaults()
    }
}

impl DriverRegistry {
    /// An empty registry.
    pub fn empty() -> Self {
        Self {
            drivers: RwLock::new(HashMap::new()),
        }
    }

    /// A registry with the built-in drivers installed.
    pub fn with_defaults() -> Self {
        let registry = Self::empty();
        registry.register(Arc::new(CsvDriver));
        registry.register(Arc::new(ParquetDriver));
        registry.register(Arc::new(JsonlDriver));
        registry
    }

    /// Install a driver, replacing any existing driver with the same name.
    pub fn register(&self, driver: Arc<dyn Driver>) {
        debug!(driver = driver.name(), "registering driver");
        self.drivers.write().insert(driver.name(), driver);
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn Driver>> {
        self.drivers.read().get(name).map(Arc::clone)
    }

    pub fn driver_names(&self) -> Vec<&'static str> {
        let mut names: Vec<_> = self.drivers.read().keys().copied().collect();
        names.sort_unstable();
        names
    }

    /// Resolve the spec's driver and build the source, validating any declared container type
    /// against what the driver actually produces.
    pub fn open(
        &self,
        spec: SourceSpec,
        store: Arc<dyn ObjectStore>,
    ) -> Result<Arc<dyn DataSource>> {
        let driver = self
            .get(&spec.driver)
            .ok_or_else(|| Error::UnknownDriver {
                driver: spec.driver.to_string(),
            })?;
        if let Some(declared) = spec.container {
            if declared != driver.container() {
                return Err(Error::ContainerMismatch {
                    driver: driver.name().to_string(),
                    declared,
                    actual: driver.container(),
                });
            }
        }
        driver.open(spec, store)
    }
}
