//! Implementation of the catalog: a named collection of entry definitions, each describing how
//! to construct a data source. Catalogs are loaded from declarative TOML files, held entirely in
//! memory, and serializable to JSON for cached forms.

pub mod catalog;
pub mod describe;
pub(crate) mod file;
pub(crate) mod serialize;

pub use catalog::{Catalog, CatalogEntry, Error, InnerCatalog, Result, SequenceNumber};
pub use describe::pretty_describe;
