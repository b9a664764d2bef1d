use clap::Parser;
use datashed_tui::App;

use super::common::{CommonError, DatashedConfig};

#[derive(Debug, thiserror::Error)]
pub(crate) enum Error {
    #[error(transparent)]
    Catalog(#[from] datashed_catalog::Error),

    #[error(transparent)]
    Common(#[from] CommonError),

    #[error(transparent)]
    Tui(#[from] datashed_tui::Error),

    #[error("object store error: {0}")]
    ObjectStore(#[from] object_store::Error),
}

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Parser)]
pub struct Config {
    /// Common datashed config
    #[clap(flatten)]
    datashed_config: DatashedConfig,
}

pub(crate) async fn command(config: Config) -> Result<()> {
    let catalog = config.datashed_config.load_catalog()?;
    let store = config.datashed_config.object_store()?;
    let persist_store = config
        .datashed_config
        .persist_store(std::sync::Arc::clone(&store))
        .await?;

    let mut app = App::new(
        catalog,
        config.datashed_config.drivers(),
        store,
        persist_store,
    );
    datashed_tui::run(&mut app).await?;
    Ok(())
}
