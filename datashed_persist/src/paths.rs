//! Object store paths for persisted artifacts and the persist index.

use crate::token::CacheToken;
use object_store::path::Path as ObjPath;
use std::ops::Deref;

/// File extension for parquet artifacts
pub const PARQUET_FILE_EXTENSION: &str = "parquet";

/// File extension for newline-delimited json artifacts
pub const JSONL_FILE_EXTENSION: &str = "jsonl";

/// File name of the persist index within the store prefix
pub const INDEX_FILE_NAME: &str = "index.json";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersistIndexPath(ObjPath);

impl PersistIndexPath {
    pub fn new(prefix: &str) -> Self {
        Self(ObjPath::from(format!("{prefix}/{INDEX_FILE_NAME}")))
    }
}

impl Deref for PersistIndexPath {
    type Target = ObjPath;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl AsRef<ObjPath> for PersistIndexPath {
    fn as_ref(&self) -> &ObjPath {
        &self.0
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactPath(ObjPath);

impl ArtifactPath {
    pub fn new(prefix: &str, token: &CacheToken, part: usize, extension: &str) -> Self {
        Self(ObjPath::from(format!(
            "{prefix}/{token}/part-{part:05}.{extension}"
        )))
    }

    /// The directory all of a token's artifacts live under.
    pub fn dir(prefix: &str, token: &CacheToken) -> ObjPath {
        ObjPath::from(format!("{prefix}/{token}"))
    }
}

impl Deref for ArtifactPath {
    type Target = ObjPath;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl AsRef<ObjPath> for ArtifactPath {
    fn as_ref(&self) -> &ObjPath {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn persist_index_path_new() {
        assert_eq!(
            *PersistIndexPath::new("persisted"),
            ObjPath::from("persisted/index.json")
        );
    }

    #[test]
    fn artifact_path_new() {
        let token = CacheToken::from_hex("deadbeef");
        assert_eq!(
            *ArtifactPath::new("persisted", &token, 0, PARQUET_FILE_EXTENSION),
            ObjPath::from("persisted/deadbeef/part-00000.parquet")
        );
        assert_eq!(
            *ArtifactPath::new("persisted", &token, 12, JSONL_FILE_EXTENSION),
            ObjPath::from("persisted/deadbeef/part-00012.jsonl")
        );
    }

    #[test]
    fn artifact_dir() {
        let token = CacheToken::from_hex("deadbeef");
        assert_eq!(
            ArtifactPath::dir("persisted", &token),
            ObjPath::from("persisted/deadbeef")
        );
    }
}
