//! Cache tokens: the stable identity of a persisted dataset.

use datashed_source::{DataSource, SourceSpec};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt::Display;
use std::sync::Arc;

/// Lowercase hex SHA-256 of a source's canonical cache-key basis. Two sources describing the
/// same underlying dataset (same driver, same arguments) share a token, which is what makes
/// repeated persists land on the same cached artifact.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CacheToken(Arc<str>);

impl CacheToken {
    pub fn from_source(source: &dyn DataSource) -> Self {
        Self::from_basis(&source.cache_key_basis())
    }

    pub fn from_spec(spec: &SourceSpec) -> Self {
        Self::from_basis(&spec.cache_key_basis())
    }

    fn from_basis(basis: &str) -> Self {
        Self(hex::encode(Sha256::digest(basis.as_bytes())).into())
    }

    /// Wrap an already-encoded token, e.g. one a user pasted into the CLI.
    pub fn from_hex(token: impl Into<Arc<str>>) -> Self {
        Self(token.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Shortened form for display surfaces.
    pub fn short(&self) -> &str {
        &self.0[..self.0.len().min(12)]
    }
}

impl Display for CacheToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn token_is_hex_sha256() {
        let spec = SourceSpec::new("trips", "csv").with_arg("path", "/data/trips.csv");
        let token = CacheToken::from_spec(&spec);
        assert_eq!(token.as_str().len(), 64);
        assert!(token.as_str().chars().all(|c| c.is_ascii_hexdigit()));
        // Deterministic across calls.
        assert_eq!(token, CacheToken::from_spec(&spec));
    }

    #[test]
    fn token_ignores_name_but_not_args() {
        let a = SourceSpec::new("trips", "csv").with_arg("path", "/data/trips.csv");
        let b = SourceSpec::new("other_name", "csv").with_arg("path", "/data/trips.csv");
        let c = SourceSpec::new("trips", "csv").with_arg("path", "/data/zones.csv");
        assert_eq!(CacheToken::from_spec(&a), CacheToken::from_spec(&b));
        assert_ne!(CacheToken::from_spec(&a), CacheToken::from_spec(&c));
    }
}
