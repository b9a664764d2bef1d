//! CSV driver, reading delimited text into arrow record batches.

use crate::drivers::object_path;
use crate::{
    Container, DataSource, Discovery, Driver, Error, PersistState, Result, SourceData, SourceSpec,
    TableData,
};
use arrow_csv::reader::Format;
use arrow_csv::ReaderBuilder;
use async_trait::async_trait;
use bytes::Bytes;
use object_store::path::Path as ObjPath;
use object_store::ObjectStore;
use std::any::Any;
use std::io::Cursor;
use std::sync::Arc;
use tracing::debug;

const DRIVER_NAME: &str = "csv";

#[derive(Debug)]
pub struct CsvDriver;

impl Driver for CsvDriver {
    fn name(&self) -> &'static str {
        DRIVER_NAME
    }

    fn container(&self) -> Container {
        Container::Table
    }

    fn open(&self, spec: SourceSpec, store: Arc<dyn ObjectStore>) -> Result<Arc<dyn DataSource>> {
        Ok(Arc::new(CsvSource::try_new(spec, store)?))
    }
}

/// A lazily-read CSV file. Arguments: `path` (required), `delimiter` (single character, default
/// `,`), `has_header` (default true).
#[derive(Debug)]
pub struct CsvSource {
    spec: SourceSpec,
    store: Arc<dyn ObjectStore>,
    path: ObjPath,
    delimiter: u8,
    has_header: bool,
    persist_state: PersistState,
}

impl CsvSource {
    pub fn try_new(spec: SourceSpec, store: Arc<dyn ObjectStore>) -> Result<Self> {
        let path = object_path(&spec, DRIVER_NAME)?;
        let delimiter = match spec.arg_str("delimiter") {
            None => b',',
            Some(s) if s.len() == 1 => s.as_bytes()[0],
            Some(s) => {
                return Err(Error::InvalidArg {
                    driver: DRIVER_NAME.to_string(),
                    arg: "delimiter",
                    reason: format!("expected a single character, got {s:?}"),
                })
            }
        };
        let has_header = spec.arg_bool("has_header").unwrap_or(true);
        Ok(Self {
            spec,
            store,
            path,
            delimiter,
            has_header,
            persist_state: PersistState::new(),
        })
    }

    fn format(&self) -> Format {
        Format::default()
            .with_header(self.has_header)
            .with_delimiter(self.delimiter)
    }

    async fn fetch(&self) -> Result<Bytes> {
        debug!(path = %self.path, "reading csv source");
        Ok(self.store.get(&self.path).await?.bytes().await?)
    }
}

#[async_trait]
impl DataSource for CsvSource {
    fn spec(&self) -> &SourceSpec {
        &self.spec
    }

    fn container(&self) -> Container {
        Container::Table
    }

    fn persist_state(&self) -> &PersistState {
        &self.persist_state
    }

    async fn discover(&self) -> Result<Discovery> {
        let bytes = self.fetch().await?;
        let (schema, rows) = self.format().infer_schema(Cursor::new(&bytes), None)?;
        Ok(Discovery {
            container: Container::Table,
            schema: Some(Arc::new(schema)),
            rows: Some(rows),
        })
    }

    async fn read(&self) -> Result<SourceData> {
        let bytes = self.fetch().await?;
        let (schema, _) = self.format().infer_schema(Cursor::new(&bytes), None)?;
        let schema = Arc::new(schema);
        let reader = ReaderBuilder::new(Arc::clone(&schema))
            .with_format(self.format())
            .build(Cursor::new(&bytes))?;
        let batches = reader.collect::<Result<Vec<_>, _>>()?;
        Ok(SourceData::Table(TableData { schema, batches }))
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use arrow::datatypes::DataType;
    use object_store::memory::InMemory;
    use pretty_assertions::assert_eq;

    const DATA: &str = "city,population\nberlin,3850809\nhamburg,1853935\n";

    async fn store_with_csv() -> Arc<dyn ObjectStore> {
        let store: Arc<dyn ObjectStore> = Arc::new(InMemory::new());
        store
            .put(&ObjPath::from("data/cities.csv"), DATA.into())
            .await
            .unwrap();
        store
    }

    fn spec() -> SourceSpec {
        SourceSpec::new("cities", "csv").with_arg("path", "data/cities.csv")
    }

    #[tokio::test]
    async fn discover_infers_schema_and_rows() {
        let source = CsvSource::try_new(spec(), store_with_csv().await).unwrap();
        let discovery = source.discover().await.unwrap();
        assert_eq!(discovery.container, Container::Table);
        assert_eq!(discovery.rows, Some(2));
        let schema = discovery.schema.unwrap();
        assert_eq!(schema.field(0).name(), "city");
        assert_eq!(schema.field(1).name(), "population");
        assert_eq!(schema.field(1).data_type(), &DataType::Int64);
    }

    #[tokio::test]
    async fn read_materializes_batches() {
        let source = CsvSource::try_new(spec(), store_with_csv().await).unwrap();
        let SourceData::Table(table) = source.read().await.unwrap() else {
            panic!("csv source must produce a table");
        };
        assert_eq!(table.rows(), 2);
        assert_eq!(table.schema.fields().len(), 2);
    }

    #[tokio::test]
    async fn custom_delimiter() {
        let store: Arc<dyn ObjectStore> = Arc::new(InMemory::new());
        store
            .put(&ObjPath::from("data/semi.csv"), "a;b\n1;2\n".into())
            .await
            .unwrap();
        let spec = SourceSpec::new("semi", "csv")
            .with_arg("path", "data/semi.csv")
            .with_arg("delimiter", ";");
        let source = CsvSource::try_new(spec, store).unwrap();
        let discovery = source.discover().await.unwrap();
        assert_eq!(discovery.schema.unwrap().fields().len(), 2);
    }

    #[test]
    fn invalid_delimiter_rejected() {
        let spec = SourceSpec::new("semi", "csv")
            .with_arg("path", "data/semi.csv")
            .with_arg("delimiter", "ab");
        let err = CsvSource::try_new(spec, Arc::new(InMemory::new())).unwrap_err();
        assert!(matches!(err, Error::InvalidArg { arg: "delimiter", .. }));
    }

    #[test]
    fn missing_path_rejected() {
        let err = CsvSource::try_new(SourceSpec::new("x", "csv"), Arc::new(InMemory::new()))
            .unwrap_err();
        assert!(matches!(err, Error::MissingArg { arg: "path", .. }));
    }
}
