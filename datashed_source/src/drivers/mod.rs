//! Built-in drivers: csv, parquet, and newline-delimited json.

mod csv;
mod jsonl;
mod parquet;

pub use csv::{CsvDriver, CsvSource};
pub use jsonl::{JsonlDriver, JsonlSource};
pub use parquet::{ParquetDriver, ParquetSource};

use crate::{Error, Result, SourceSpec};
use object_store::path::Path as ObjPath;

/// Resolve the required `path` argument into an object store path. Leading slashes are dropped so
/// absolute filesystem paths address a root-mounted local store and plain keys address stores
/// like the in-memory one unchanged.
pub(crate) fn object_path(spec: &SourceSpec, driver: &'static str) -> Result<ObjPath> {
    let raw = spec.arg_str("path").ok_or_else(|| Error::MissingArg {
        driver: driver.to_string(),
        arg: "path",
    })?;
    Ok(ObjPath::parse(raw.trim_start_matches('/'))?)
}
