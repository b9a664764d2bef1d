//! Parquet driver. Also the cached form Table sources persist into, so the persistence layer
//! reopens artifacts through this source type.

use crate::drivers::object_path;
use crate::{
    Container, DataSource, Discovery, Driver, PersistState, Result, SourceData, SourceSpec,
    TableData,
};
use async_trait::async_trait;
use bytes::Bytes;
use object_store::path::Path as ObjPath;
use object_store::ObjectStore;
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use std::any::Any;
use std::sync::Arc;
use tracing::debug;

const DRIVER_NAME: &str = "parquet";

#[derive(Debug)]
pub struct ParquetDriver;

impl Driver for ParquetDriver {
    fn name(&self) -> &'static str {
        DRIVER_NAME
    }

    fn container(&self) -> Container {
        Container::Table
    }

    fn open(&self, spec: SourceSpec, store: Arc<dyn ObjectStore>) -> Result<Arc<dyn DataSource>> {
        Ok(Arc::new(ParquetSource::try_new(spec, store)?))
    }
}

/// A lazily-read parquet file. Argument: `path` (required).
#[derive(Debug)]
pub struct ParquetSource {
    spec: SourceSpec,
    store: Arc<dyn ObjectStore>,
    path: ObjPath,
    persist_state: PersistState,
}

impl ParquetSource {
    pub fn try_new(spec: SourceSpec, store: Arc<dyn ObjectStore>) -> Result<Self> {
        Self::with_state(spec, store, PersistState::new())
    }

    /// A parquet source that is itself a cached materialization, as produced by the persistence
    /// layer when it reopens an artifact.
    pub fn cached(spec: SourceSpec, store: Arc<dyn ObjectStore>) -> Result<Self> {
        Self::with_state(spec, store, PersistState::cached())
    }

    fn with_state(
        spec: SourceSpec,
        store: Arc<dyn ObjectStore>,
        persist_state: PersistState,
    ) -> Result<Self> {
        let path = object_path(&spec, DRIVER_NAME)?;
        Ok(Self {
            spec,
            store,
            path,
            persist_state,
        })
    }

    pub fn path(&self) -> &ObjPath {
        &self.path
    }

    async fn fetch(&self) -> Result<Bytes> {
        debug!(path = %self.path, "reading parquet source");
        Ok(self.store.get(&self.path).await?.bytes().await?)
    }
}

#[async_trait]
impl DataSource for ParquetSource {
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
        let builder = ParquetRecordBatchReaderBuilder::try_new(bytes)?;
        let rows = builder.metadata().file_metadata().num_rows();
        Ok(Discovery {
            container: Container::Table,
            schema: Some(Arc::clone(builder.schema())),
            rows: Some(rows as usize),
        })
    }

    async fn read(&self) -> Result<SourceData> {
        let bytes = self.fetch().await?;
        let builder = ParquetRecordBatchReaderBuilder::try_new(bytes)?;
        let schema = Arc::clone(builder.schema());
        let reader = builder.build()?;
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
    use arrow::array::{Int64Array, StringArray};
    use arrow::datatypes::{DataType, Field, Schema};
    use arrow::record_batch::RecordBatch;
    use object_store::memory::InMemory;
    use parquet::arrow::ArrowWriter;
    use pretty_assertions::assert_eq;

    fn sample_batch() -> RecordBatch {
        let schema = Arc::new(Schema::new(vec![
            Field::new("city", DataType::Utf8, false),
            Field::new("population", DataType::Int64, false),
        ]));
        RecordBatch::try_new(
            schema,
            vec![
                Arc::new(StringArray::from(vec!["berlin", "hamburg"])),
                Arc::new(Int64Array::from(vec![3_850_809, 1_853_935])),
            ],
        )
        .unwrap()
    }

    async fn store_with_parquet() -> Arc<dyn ObjectStore> {
        let batch = sample_batch();
        let mut buffer = Vec::new();
        let mut writer = ArrowWriter::try_new(&mut buffer, batch.schema(), None).unwrap();
        writer.write(&batch).unwrap();
        writer.close().unwrap();

        let store: Arc<dyn ObjectStore> = Arc::new(InMemory::new());
        store
            .put(&ObjPath::from("data/cities.parquet"), buffer.into())
            .await
            .unwrap();
        store
    }

    fn spec() -> SourceSpec {
        SourceSpec::new("cities", "parquet").with_arg("path", "data/cities.parquet")
    }

    #[tokio::test]
    async fn discover_reads_footer_metadata() {
        let source = ParquetSource::try_new(spec(), store_with_parquet().await).unwrap();
        let discovery = source.discover().await.unwrap();
        assert_eq!(discovery.rows, Some(2));
        assert_eq!(discovery.schema.unwrap().field(0).name(), "city");
    }

    #[tokio::test]
    async fn read_roundtrips_batches() {
        let source = ParquetSource::try_new(spec(), store_with_parquet().await).unwrap();
        let SourceData::Table(table) = source.read().await.unwrap() else {
            panic!("parquet source must produce a table");
        };
        assert_eq!(table.rows(), 2);
        assert_eq!(table.batches[0], sample_batch());
    }

    #[tokio::test]
    async fn cached_sources_report_is_persisted() {
        let source = ParquetSource::cached(spec(), store_with_parquet().await).unwrap();
        assert!(source.is_persisted());
        assert!(!source.has_been_persisted());
    }
}
