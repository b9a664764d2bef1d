//! Config shared by every subcommand.

use datashed_catalog::Catalog;
use datashed_persist::store::DEFAULT_PREFIX;
use datashed_persist::PersistStore;
use datashed_source::DriverRegistry;
use object_store::local::LocalFileSystem;
use object_store::ObjectStore;
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Debug, clap::Parser)]
pub(crate) struct DatashedConfig {
    /// Path to the catalog definition file
    #[clap(
        short = 'c',
        long = "catalog",
        env = "DATASHED_CATALOG",
        default_value = "catalog.toml"
    )]
    pub catalog_path: PathBuf,

    /// Directory the persist index and cached artifacts live under
    #[clap(long = "data-dir", env = "DATASHED_DATA_DIR", default_value = ".datashed")]
    pub data_dir: PathBuf,
}

impl DatashedConfig {
    pub(crate) fn load_catalog(&self) -> Result<Arc<Catalog>, datashed_catalog::Error> {
        Ok(Arc::new(Catalog::from_file(&self.catalog_path)?))
    }

    pub(crate) fn drivers(&self) -> Arc<DriverRegistry> {
        Arc::new(DriverRegistry::with_defaults())
    }

    /// A store rooted at the filesystem root, so catalog entries can address data anywhere on
    /// disk by absolute path and persisted artifacts land under the data directory.
    pub(crate) fn object_store(&self) -> Result<Arc<dyn ObjectStore>, object_store::Error> {
        Ok(Arc::new(LocalFileSystem::new()))
    }

    /// The object store prefix cached artifacts are written under.
    pub(crate) fn persist_prefix(&self) -> Result<String, std::io::Error> {
        std::fs::create_dir_all(&self.data_dir)?;
        let absolute = std::path::absolute(&self.data_dir)?;
        Ok(format!(
            "{}/{DEFAULT_PREFIX}",
            absolute.to_string_lossy().trim_start_matches('/')
        ))
    }

    pub(crate) async fn persist_store(
        &self,
        store: Arc<dyn ObjectStore>,
    ) -> Result<Arc<PersistStore>, CommonError> {
        let prefix = self.persist_prefix()?;
        Ok(Arc::new(PersistStore::load(store, prefix).await?))
    }
}

#[derive(Debug, thiserror::Error)]
pub(crate) enum CommonError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Persist(#[from] datashed_persist::Error),
}
