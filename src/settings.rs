//! Run configuration read from a JSON file.
//!
//! ```json
//! {
//!   "crawler": { "row_timeout_ms": 10000, "page_delay_ms": 3000, "crawling_concurrency": 2 },
//!   "keywords": ["AI", "R&D"],
//!   "store_path": "articles.json",
//!   "sites": [ ... ]
//! }
//! ```

use std::{
    fs, io,
    path::{Path, PathBuf},
    time::Duration,
};

use serde::{Deserialize, Serialize};

use crate::{CatalogError, CrawlerOptions, Keywords, SiteCatalog, SiteConfig};

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Settings {
    #[serde(default)]
    pub crawler: CrawlerSettings,
    #[serde(default)]
    pub keywords: Keywords,
    #[serde(default)]
    pub store_path: Option<PathBuf>,
    pub sites: Vec<SiteConfig>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct CrawlerSettings {
    pub row_timeout_ms: u64,
    pub page_delay_ms: u64,
    pub crawling_concurrency: usize,
    pub max_pages: Option<usize>,
}

impl Default for CrawlerSettings {
    fn default() -> Self {
        let options = CrawlerOptions::default();
        Self {
            row_timeout_ms: options.row_timeout.as_millis() as u64,
            page_delay_ms: options.page_delay.as_millis() as u64,
            crawling_concurrency: options.crawling_concurrency,
            max_pages: options.max_pages,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read settings from '{}'", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("malformed settings")]
    Parse(#[from] serde_json::Error),
    #[error("crawling concurrency must be greater than 0, got {0}")]
    InvalidConcurrency(usize),
    #[error("max pages must be greater than 0")]
    InvalidMaxPages,
    #[error("invalid site catalog")]
    Catalog(#[from] CatalogError),
}

impl Settings {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let json = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let settings = Self::from_json_str(&json)?;
        tracing::info!(
            sites = settings.sites.len(),
            keywords = settings.keywords.len(),
            "loaded settings from '{}'",
            path.display()
        );
        Ok(settings)
    }

    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let settings: Settings = serde_json::from_str(json)?;
        settings.options()?;
        Ok(settings)
    }

    pub fn options(&self) -> Result<CrawlerOptions, ConfigError> {
        let crawler = &self.crawler;
        if crawler.crawling_concurrency == 0 {
            return Err(ConfigError::InvalidConcurrency(0));
        }
        if crawler.max_pages == Some(0) {
            return Err(ConfigError::InvalidMaxPages);
        }
        Ok(CrawlerOptions {
            row_timeout: Duration::from_millis(crawler.row_timeout_ms),
            page_delay: Duration::from_millis(crawler.page_delay_ms),
            crawling_concurrency: crawler.crawling_concurrency,
            max_pages: crawler.max_pages,
        })
    }

    pub fn catalog(&self) -> Result<SiteCatalog, ConfigError> {
        Ok(SiteCatalog::new(self.sites.clone())?)
    }
}
