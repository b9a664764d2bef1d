use clap::Parser;
use datashed_persist::CacheToken;

use super::common::{CommonError, DatashedConfig};

#[derive(Debug, thiserror::Error)]
pub(crate) enum Error {
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

    #[clap(subcommand)]
    command: Command,
}

#[derive(Debug, Parser)]
enum Command {
    /// List the persisted artifacts
    List,

    /// Delete one persisted artifact by its token
    Remove {
        /// The artifact's cache token, as printed by `persist` or `cache list`
        token: String,
    },

    /// Delete every persisted artifact
    Clear,
}

pub(crate) async fn command(config: Config) -> Result<()> {
    let store = config.datashed_config.object_store()?;
    let persist_store = config.datashed_config.persist_store(store).await?;

    match config.command {
        Command::List => {
            if persist_store.is_empty() {
                println!("no persisted artifacts");
                return Ok(());
            }
            for record in persist_store.records() {
                let ttl = match record.ttl {
                    Some(ttl) => humantime::format_duration(ttl).to_string(),
                    None => "none".to_string(),
                };
                let stale = if record.needs_refresh() { " (stale)" } else { "" };
                println!(
                    "{} {} [{}] rows={} size={}B created={} ttl={}{}",
                    record.token,
                    record.source.name,
                    record.format,
                    record.row_count,
                    record.size_bytes,
                    record.created.to_rfc3339(),
                    ttl,
                    stale,
                );
            }
        }
        Command::Remove { token } => {
            persist_store.remove(&CacheToken::from_hex(token)).await?;
            println!("removed");
        }
        Command::Clear => {
            let removed = persist_store.len();
            persist_store.clear().await?;
            println!("removed {removed} artifacts");
        }
    }
    Ok(())
}
