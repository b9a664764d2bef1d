//! Items container exporter: one JSON value per line.

use crate::exporters::{Exporter, ExportSummary};
use crate::paths::{ArtifactPath, JSONL_FILE_EXTENSION};
use crate::record::PersistRecord;
use crate::token::CacheToken;
use crate::{Error, Result};
use async_trait::async_trait;
use datashed_source::drivers::JsonlSource;
use datashed_source::{Container, DataSource, SourceData};
use object_store::ObjectStore;
use std::sync::Arc;
use tracing::debug;

#[derive(Debug)]
pub struct JsonlExporter;

#[async_trait]
impl Exporter for JsonlExporter {
    fn container(&self) -> Container {
        Container::Items
    }

    fn format(&self) -> &'static str {
        "jsonl"
    }

    async fn export(
        &self,
        source: &dyn DataSource,
        store: &Arc<dyn ObjectStore>,
        prefix: &str,
        token: &CacheToken,
    ) -> Result<ExportSummary> {
        let data = source.read().await?;
        let SourceData::Items(items) = data else {
            return Err(Error::WrongContainer {
                expected: Container::Items,
                actual: data.container(),
            });
        };
        if items.is_empty() {
            return Err(Error::NoRows);
        }

        let mut buffer = Vec::new();
        for item in &items {
            serde_json::to_writer(&mut buffer, item)?;
            buffer.push(b'\n');
        }

        let path = ArtifactPath::new(prefix, token, 0, JSONL_FILE_EXTENSION);
        let size_bytes = buffer.len() as u64;
        debug!(path = %*path, items = items.len(), size_bytes, "writing jsonl artifact");
        store.put(&path, buffer.into()).await?;

        Ok(ExportSummary {
            paths: vec![path.to_string()],
            row_count: items.len() as u64,
            size_bytes,
        })
    }

    fn open(
        &self,
        record: &PersistRecord,
        store: Arc<dyn ObjectStore>,
    ) -> Result<Arc<dyn DataSource>> {
        Ok(Arc::new(JsonlSource::cached(record.cached_spec(), store)?))
    }
}
