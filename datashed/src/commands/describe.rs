use clap::Parser;
use datashed_catalog::pretty_describe;

use super::common::DatashedConfig;

#[derive(Debug, thiserror::Error)]
pub(crate) enum Error {
    #[error(transparent)]
    Catalog(#[from] datashed_catalog::Error),
}

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Parser)]
pub struct Config {
    /// Common datashed config
    #[clap(flatten)]
    datashed_config: DatashedConfig,

    /// The entry to describe
    entry: String,
}

pub(crate) async fn command(config: Config) -> Result<()> {
    let catalog = config.datashed_config.load_catalog()?;
    let entry = catalog.require(&config.entry)?;
    println!("{}", pretty_describe(&entry.display_content()));
    Ok(())
}
