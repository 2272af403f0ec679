use std::collections::HashSet;
use std::error::Error as StdError;

use async_trait::async_trait;

/// Lookup of articles persisted by earlier runs.
///
/// Titles are scoped per site: the same title on two sites is two articles.
#[async_trait]
pub trait DedupOracle: Send + Sync {
    async fn exists(&self, site_id: &str, title: &str) -> Result<bool, DedupError>;
}

#[derive(Debug, thiserror::Error)]
#[error("dedup lookup failed for '{title}'")]
pub struct DedupError {
    pub title: String,
    #[source]
    pub source: Box<dyn StdError + Send + Sync>,
}

impl DedupError {
    pub fn new<E>(title: impl Into<String>, source: E) -> Self
    where
        E: Into<Box<dyn StdError + Send + Sync>>,
    {
        Self {
            title: title.into(),
            source: source.into(),
        }
    }
}

/// `(site_id, title)` pairs held in memory.
#[async_trait]
impl DedupOracle for HashSet<(String, String)> {
    async fn exists(&self, site_id: &str, title: &str) -> Result<bool, DedupError> {
        Ok(self.contains(&(site_id.to_string(), title.to_string())))
    }
}
