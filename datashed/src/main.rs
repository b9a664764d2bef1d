//! Entrypoint of the datashed binary
#![deny(rustdoc::broken_intra_doc_links, rustdoc::bare_urls, rust_2018_idioms)]

use dotenvy::dotenv;
use tracing_subscriber::EnvFilter;

mod commands {
    pub(crate) mod common;
    pub mod browse;
    pub mod cache;
    pub mod describe;
    pub mod discover;
    pub mod list;
    pub mod persist;
}

enum ReturnCode {
    Failure = 1,
}

#[derive(Debug, clap::Parser)]
#[clap(
    name = "datashed",
    about = "Datashed catalog browser and command line tools",
    long_about = r#"Datashed catalog browser and command line tools

Examples:
    # List the entries of a catalog
    datashed list --catalog demo/catalog.toml

    # Persist an entry into its cached local form
    datashed persist trips --catalog demo/catalog.toml

    # Browse the catalog interactively
    datashed browse --catalog demo/catalog.toml

    # Run with full debug logging specified with LOG_FILTER
    LOG_FILTER=debug datashed list --catalog demo/catalog.toml
"#
)]
struct Config {
    #[clap(subcommand)]
    command: Option<Command>,
}

#[derive(Debug, clap::Parser)]
enum Command {
    /// List the entries of the catalog
    List(commands::list::Config),

    /// Show the full description of an entry
    Describe(commands::describe::Config),

    /// Open an entry and probe its schema and shape
    Discover(commands::discover::Config),

    /// Persist an entry into its cached local form
    Persist(commands::persist::Config),

    /// Inspect or prune the persisted artifact cache
    Cache(commands::cache::Config),

    /// Browse the catalog interactively
    Browse(commands::browse::Config),
}

fn main() -> Result<(), std::io::Error> {
    // load all environment variables from .env before doing anything
    load_dotenv();

    let config: Config = clap::Parser::parse();

    init_logs();

    let tokio_runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;

    tokio_runtime.block_on(async move {
        match config.command {
            None => println!("command required, -h/--help for help"),
            Some(Command::List(config)) => {
                if let Err(e) = commands::list::command(config).await {
                    eprintln!("List command failed: {e}");
                    std::process::exit(ReturnCode::Failure as _)
                }
            }
            Some(Command::Describe(config)) => {
                if let Err(e) = commands::describe::command(config).await {
                    eprintln!("Describe command failed: {e}");
                    std::process::exit(ReturnCode::Failure as _)
                }
            }
            Some(Command::Discover(config)) => {
                if let Err(e) = commands::discover::command(config).await {
                    eprintln!("Discover command failed: {e}");
                    std::process::exit(ReturnCode::Failure as _)
                }
            }
            Some(Command::Persist(config)) => {
                if let Err(e) = commands::persist::command(config).await {
                    eprintln!("Persist command failed: {e}");
                    std::process::exit(ReturnCode::Failure as _)
                }
            }
            Some(Command::Cache(config)) => {
                if let Err(e) = commands::cache::command(config).await {
                    eprintln!("Cache command failed: {e}");
                    std::process::exit(ReturnCode::Failure as _)
                }
            }
            Some(Command::Browse(config)) => {
                if let Err(e) = commands::browse::command(config).await {
                    eprintln!("Browse command failed: {e}");
                    std::process::exit(ReturnCode::Failure as _)
                }
            }
        }
    });

    Ok(())
}

/// Source the .env file before initialising the Config struct - this sets
/// any envs in the file, which the Config struct then uses.
///
/// Precedence is given to existing env variables.
fn load_dotenv() {
    match dotenv() {
        Ok(_) => {}
        Err(dotenvy::Error::Io(err)) if err.kind() == std::io::ErrorKind::NotFound => {
            // Ignore this - a missing env file is not an error, defaults will
            // be applied when initialising the Config struct.
        }
        Err(e) => {
            eprintln!("FATAL Error loading config from: {e}");
            eprintln!("Aborting");
            std::process::exit(1);
        }
    };
}

/// Logging defaults to `info` and is overridden through `LOG_FILTER`.
fn init_logs() {
    let filter = EnvFilter::try_from_env("LOG_FILTER")
        .unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
