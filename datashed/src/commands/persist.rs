use clap::Parser;
use datashed_persist::CacheToken;
use std::sync::Arc;
use std::time::Duration;

use super::common::{CommonError, DatashedConfig};

#[derive(Debug, thiserror::Error)]
pub(crate) enum Error {
    #[error(transparent)]
    Catalog(#[from] datashed_catalog::Error),

    #[error(transparent)]
    Persist(#[from] datashed_persist::Error),

    #[error(transparent)]
    Common(#[from] CommonError),

    #[error("object store error: {0}")]
    ObjectStore(#[from] object_store::Error),
}

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Parser)]
pub struct Config {
    /// Common datashed config
    #[clap(flatten)]
    datashed_config: DatashedConfig,

    /// The entry to persist
    entry: String,

    /// Re-export the cached copy once it is older than this, e.g. `30m` or `2d`
    #[clap(long, value_parser = humantime::parse_duration)]
    ttl: Option<Duration>,
}

pub(crate) async fn command(config: Config) -> Result<()> {
    let catalog = config.datashed_config.load_catalog()?;
    let entry = catalog.require(&config.entry)?;
    let store = config.datashed_config.object_store()?;
    let persist_store = config.datashed_config.persist_store(Arc::clone(&store)).await?;

    let source = entry.open(&config.datashed_config.drivers(), store)?;
    let cached = persist_store.persist_with_ttl(source.as_ref(), config.ttl).await?;
    let token = CacheToken::from_source(source.as_ref());
    let record = persist_store
        .record(&token)
        .expect("record exists after a successful persist");

    println!("persisted {} as {}", entry.name(), cached.driver());
    println!("token: {token}");
    for path in &record.paths {
        println!("path: /{path}");
    }
    println!("rows: {}", record.row_count);
    println!("size: {} bytes", record.size_bytes);
    Ok(())
}
