use clap::Parser;

use super::common::DatashedConfig;

#[derive(Debug, thiserror::Error)]
pub(crate) enum Error {
    #[error(transparent)]
    Catalog(#[from] datashed_catalog::Error),
}

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Parser)]
#[clap(visible_alias = "ls")]
pub struct Config {
    /// Common datashed config
    #[clap(flatten)]
    datashed_config: DatashedConfig,
}

pub(crate) async fn command(config: Config) -> Result<()> {
    let catalog = config.datashed_config.load_catalog()?;
    println!("{}:", catalog.name());
    for entry in catalog.entries() {
        match entry.description() {
            Some(description) => println!(
                "  {} ({}) - {}",
                entry.name(),
                entry.driver(),
                description.lines().next().unwrap_or_default()
            ),
            None => println!("  {} ({})", entry.name(), entry.driver()),
        }
    }
    Ok(())
}
