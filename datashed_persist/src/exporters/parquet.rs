//! Table container exporter: record batches encoded into a parquet artifact.

use crate::exporters::{Exporter, ExportSummary};
use crate::paths::{ArtifactPath, PARQUET_FILE_EXTENSION};
use crate::record::PersistRecord;
use crate::token::CacheToken;
use crate::{Error, Result};
use async_trait::async_trait;
use datashed_source::drivers::ParquetSource;
use datashed_source::{Container, DataSource, SourceData};
use object_store::ObjectStore;
use parquet::arrow::ArrowWriter;
use parquet::basic::{Compression, ZstdLevel};
use parquet::file::properties::WriterProperties;
use std::sync::Arc;
use tracing::debug;

#[derive(Debug)]
pub struct ParquetExporter;

#[async_trait]
impl Exporter for ParquetExporter {
    fn container(&self) -> Container {
        Container::Table
    }

    fn format(&self) -> &'static str {
        "parquet"
    }

    async fn export(
        &self,
        source: &dyn DataSource,
        store: &Arc<dyn ObjectStore>,
        prefix: &str,
        token: &CacheToken,
    ) -> Result<ExportSummary> {
        let data = source.read().await?;
        let SourceData::Table(table) = data else {
            return Err(Error::WrongContainer {
                expected: Container::Table,
                actual: data.container(),
            });
        };
        if table.batches.is_empty() {
            return Err(Error::NoRecordBatches);
        }
        let rows = table.rows();
        if rows == 0 {
            return Err(Error::NoRows);
        }

        let props = WriterProperties::builder()
            .set_compression(Compression::ZSTD(ZstdLevel::default()))
            .build();
        let mut buffer = Vec::new();
        let mut writer = ArrowWriter::try_new(&mut buffer, Arc::clone(&table.schema), Some(props))?;
        for batch in &table.batches {
            writer.write(batch)?;
        }
        writer.close()?;

        let path = ArtifactPath::new(prefix, token, 0, PARQUET_FILE_EXTENSION);
        let size_bytes = buffer.len() as u64;
        debug!(path = %*path, rows, size_bytes, "writing parquet artifact");
        store.put(&path, buffer.into()).await?;

        Ok(ExportSummary {
            paths: vec![path.to_string()],
            row_count: rows as u64,
            size_bytes,
        })
    }

    fn open(
        &self,
        record: &PersistRecord,
        store: Arc<dyn ObjectStore>,
    ) -> Result<Arc<dyn DataSource>> {
        Ok(Arc::new(ParquetSource::cached(record.cached_spec(), store)?))
    }
}
