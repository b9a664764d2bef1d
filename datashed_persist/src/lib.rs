//! Persistence layer: materializing sources into cached local artifacts.
//!
//! Persisting a source delegates the actual format conversion to the exporter registered for the
//! source's container type, records the result in an index kept in object storage, and hands back
//! a new source that reads from the cached artifact. Persisting the same source again is
//! idempotent: the index is keyed by a token derived from the source's identity, so the second
//! call reopens the recorded artifact without exporting anything.

pub mod exporters;
pub mod paths;
pub mod record;
pub mod store;
pub mod token;

use datashed_source::Container;
use thiserror::Error;

pub use exporters::{Exporter, ExporterRegistry, ExportSummary};
pub use record::{PersistIndex, PersistRecord};
pub use store::PersistStore;
pub use token::CacheToken;

#[derive(Debug, Error)]
pub enum Error {
    #[error("no exporter registered for container {container}")]
    NoExporterForContainer { container: Container },

    #[error("no persisted artifact recorded under token {token}")]
    UnknownToken { token: String },

    #[error("exporter for container {expected} was handed {actual} data")]
    WrongContainer {
        expected: Container,
        actual: Container,
    },

    #[error("no record batches to convert")]
    NoRecordBatches,

    #[error("no rows to serialise")]
    NoRows,

    #[error("source error: {0}")]
    Source(#[from] datashed_source::Error),

    #[error("object store error: {0}")]
    ObjectStore(#[from] object_store::Error),

    #[error("object store path error: {0}")]
    ObjectStorePath(#[from] object_store::path::Error),

    #[error("invalid persist index: {0}")]
    Json(#[from] serde_json::Error),

    #[error("failed to build parquet file: {0}")]
    Parquet(#[from] parquet::errors::ParquetError),

    #[error("arrow error: {0}")]
    Arrow(#[from] arrow::error::ArrowError),

    #[error("unexpected error: {0:?}")]
    Unexpected(#[from] anyhow::Error),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
