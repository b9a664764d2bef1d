use clap::Parser;

use super::common::DatashedConfig;

#[derive(Debug, thiserror::Error)]
pub(crate) enum Error {
    #[error(transparent)]
    Catalog(#[from] datashed_catalog::Error),

    #[error(transparent)]
    Source(#[from] datashed_source::Error),

    #[error("object store error: {0}")]
    ObjectStore(#[from] object_store::Error),
}

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Parser)]
pub struct Config {
    /// Common datashed config
    #[clap(flatten)]
    datashed_config: DatashedConfig,

    /// The entry to probe
    entry: String,
}

pub(crate) async fn command(config: Config) -> Result<()> {
    let catalog = config.datashed_config.load_catalog()?;
    let entry = catalog.require(&config.entry)?;
    let source = entry.open(
        &config.datashed_config.drivers(),
        config.datashed_config.object_store()?,
    )?;

    let discovery = source.discover().await?;
    println!("entry: {}", entry.name());
    println!("driver: {}", source.driver());
    println!("container: {}", discovery.container);
    if let Some(rows) = discovery.rows {
        println!("rows: {rows}");
    }
    if let Some(schema) = discovery.schema {
        println!("schema:");
        for field in schema.fields() {
            println!("  {}: {}", field.name(), field.data_type());
        }
    }
    Ok(())
}
