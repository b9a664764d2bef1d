//! Newline-delimited JSON driver for `Items` container sources.

use crate::drivers::object_path;
use crate::{
    Container, DataSource, Discovery, Driver, PersistState, Result, SourceData, SourceSpec,
};
use async_trait::async_trait;
use bytes::Bytes;
use object_store::path::Path as ObjPath;
use object_store::ObjectStore;
use serde_json::Value;
use std::any::Any;
use std::sync::Arc;
use tracing::debug;

const DRIVER_NAME: &str = "jsonl";

#[derive(Debug)]
pub struct JsonlDriver;

impl Driver for JsonlDriver {
    fn name(&self) -> &'static str {
        DRIVER_NAME
    }

    fn container(&self) -> Container {
        Container::Items
    }

    fn open(&self, spec: SourceSpec, store: Arc<dyn ObjectStore>) -> Result<Arc<dyn DataSource>> {
        Ok(Arc::new(JsonlSource::try_new(spec, store)?))
    }
}

/// One JSON value per line. Argument: `path` (required).
#[derive(Debug)]
pub struct JsonlSource {
    spec: SourceSpec,
    store: Arc<dyn ObjectStore>,
    path: ObjPath,
    persist_state: PersistState,
}

impl JsonlSource {
    pub fn try_new(spec: SourceSpec, store: Arc<dyn ObjectStore>) -> Result<Self> {
        Self::with_state(spec, store, PersistState::new())
    }

    /// A jsonl source that is itself a cached materialization.
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
        debug!(path = %self.path, "reading jsonl source");
        Ok(self.store.get(&self.path).await?.bytes().await?)
    }

    fn parse(bytes: &Bytes) -> Result<Vec<Value>> {
        let text = String::from_utf8_lossy(bytes);
        text.lines()
            .filter(|line| !line.trim().is_empty())
            .map(|line| Ok(serde_json::from_str(line)?))
            .collect()
    }
}

#[async_trait]
impl DataSource for JsonlSource {
    fn spec(&self) -> &SourceSpec {
        &self.spec
    }

    fn container(&self) -> Container {
        Container::Items
    }

    fn persist_state(&self) -> &PersistState {
        &self.persist_state
    }

    async fn discover(&self) -> Result<Discovery> {
        let bytes = self.fetch().await?;
        let items = Self::parse(&bytes)?;
        Ok(Discovery {
            container: Container::Items,
            schema: None,
            rows: Some(items.len()),
        })
    }

    async fn read(&self) -> Result<SourceData> {
        let bytes = self.fetch().await?;
        Ok(SourceData::Items(Self::parse(&bytes)?))
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use object_store::memory::InMemory;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    const DATA: &str = "{\"event\": \"login\", \"user\": 1}\n\n{\"event\": \"logout\", \"user\": 1}\n";

    async fn source() -> JsonlSource {
        let store: Arc<dyn ObjectStore> = Arc::new(InMemory::new());
        store
            .put(&ObjPath::from("data/events.jsonl"), DATA.into())
            .await
            .unwrap();
        let spec = SourceSpec::new("events", "jsonl").with_arg("path", "data/events.jsonl");
        JsonlSource::try_new(spec, store).unwrap()
    }

    #[tokio::test]
    async fn blank_lines_are_skipped() {
        let source = source().await;
        let discovery = source.discover().await.unwrap();
        assert_eq!(discovery.rows, Some(2));
        assert_eq!(discovery.container, Container::Items);
        assert!(discovery.schema.is_none());
    }

    #[tokio::test]
    async fn read_parses_values() {
        let source = source().await;
        let SourceData::Items(items) = source.read().await.unwrap() else {
            panic!("jsonl source must produce items");
        };
        assert_eq!(items[0], json!({"event": "login", "user": 1}));
        assert_eq!(items[1], json!({"event": "logout", "user": 1}));
    }

    #[tokio::test]
    async fn invalid_json_is_an_error() {
        let store: Arc<dyn ObjectStore> = Arc::new(InMemory::new());
        store
            .put(&ObjPath::from("data/bad.jsonl"), "not json\n".into())
            .await
            .unwrap();
        let spec = SourceSpec::new("bad", "jsonl").with_arg("path", "data/bad.jsonl");
        let source = JsonlSource::try_new(spec, store).unwrap();
        assert!(source.read().await.is_err());
    }
}
