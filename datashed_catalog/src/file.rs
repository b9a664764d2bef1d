//! Loading catalogs from declarative TOML files.
//!
//! ```toml
//! name = "demo"
//! description = "Example catalog"
//!
//! [sources.trips]
//! description = "Taxi trips"
//! driver = "csv"
//! args = { path = "data/trips.csv" }
//!
//! [sources.trips.metadata.plots.fares]
//! kind = "line"
//! x = "time"
//! y = ["fare"]
//! ```

use crate::catalog::{Catalog, CatalogEntry, InnerCatalog, Result};
use datashed_id::EntryId;
use datashed_source::{Container, Metadata, SourceSpec};
use serde::Deserialize;
use serde_json::Value;
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;

#[derive(Debug, Deserialize)]
struct CatalogFile {
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    sources: BTreeMap<String, SourceDef>,
}

#[derive(Debug, Deserialize)]
struct SourceDef {
    #[serde(default)]
    description: Option<String>,
    driver: String,
    #[serde(default)]
    container: Option<Container>,
    #[serde(default)]
    args: BTreeMap<String, toml::Value>,
    #[serde(default)]
    metadata: BTreeMap<String, toml::Value>,
}

pub(crate) fn load(path: &Path) -> Result<Catalog> {
    let text = std::fs::read_to_string(path)?;
    let file: CatalogFile = toml::from_str(&text)?;

    let name: Arc<str> = match file.name {
        Some(name) => name.into(),
        None => path
            .file_stem()
            .map(|stem| stem.to_string_lossy().into_owned())
            .unwrap_or_else(|| "catalog".to_string())
            .into(),
    };
    let mut inner = InnerCatalog::new(name);
    inner.description = file.description.map(|d| Arc::from(d.as_str()));

    let base = path.parent().unwrap_or_else(|| Path::new("."));
    for (source_name, def) in file.sources {
        let mut spec = SourceSpec::new(source_name, def.driver);
        if let Some(description) = def.description {
            spec = spec.with_description(description.as_str());
        }
        if let Some(container) = def.container {
            spec = spec.with_container(container);
        }
        for (key, value) in def.args {
            let mut value = to_json(value);
            if key == "path" {
                value = resolve_path(value, base)?;
            }
            spec = spec.with_arg(key, value);
        }
        let metadata_map = def
            .metadata
            .into_iter()
            .map(|(k, v)| (k, to_json(v)))
            .collect::<BTreeMap<_, _>>();
        spec = spec.with_metadata(Metadata::new(metadata_map));

        // The TOML parser already rejects duplicate source tables, so ids and names here are
        // guaranteed fresh.
        let id = EntryId::new();
        inner.entry_map.insert(id, Arc::clone(&spec.name));
        inner
            .entries
            .insert(id, Arc::new(CatalogEntry::new(id, spec)));
    }
    Ok(Catalog::from_inner(inner))
}

fn to_json(value: toml::Value) -> Value {
    serde_json::to_value(value).expect("toml values are representable as json")
}

/// Resolve a relative `path` argument against the catalog file's directory so a catalog can
/// reference data sitting next to it.
fn resolve_path(value: Value, base: &Path) -> Result<Value> {
    let Value::String(raw) = value else {
        return Ok(value);
    };
    let path = Path::new(&raw);
    if path.is_absolute() {
        return Ok(Value::String(raw));
    }
    let resolved = std::path::absolute(base.join(path))?;
    Ok(Value::String(resolved.to_string_lossy().into_owned()))
}
