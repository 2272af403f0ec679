//! Per-site scrape configuration.
//!
//! Sites are crawled in the order they appear in the catalog. Besides the
//! selectors used to find listing rows and their fields, each site picks how
//! an article link is obtained, see [`LinkMode`].

use serde::{Deserialize, Serialize};
use url::Url;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct SiteConfig {
    pub id: String,
    /// Listing page the crawl starts from.
    pub url: String,
    pub row_selector: String,
    pub title_selector: String,
    pub date_selector: String,
    /// Selector matching the page-number controls. Sites without one only
    /// have their first page crawled.
    #[serde(default)]
    pub page_selector: Option<String>,
    #[serde(default)]
    pub start_page: usize,
    /// Rows before this index (pinned notices, header rows) are ignored.
    #[serde(default)]
    pub start_row: usize,
    #[serde(default)]
    pub link: LinkMode,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum LinkMode {
    /// Read `attribute` from the row (or the element under `selector`).
    /// When a `template` is given, `{value}` in it is replaced by the
    /// attribute value. Relative results are resolved against the site url.
    Attribute {
        #[serde(default)]
        selector: Option<String>,
        attribute: String,
        #[serde(default)]
        template: Option<String>,
    },
    /// Open the title, read the browser location and go back.
    #[default]
    Navigate,
}

impl SiteConfig {
    pub fn resolve_link(
        &self,
        value: &str,
        template: Option<&str>,
    ) -> Result<String, url::ParseError> {
        let raw = match template {
            Some(template) => template.replace("{value}", value),
            None => value.to_string(),
        };
        let base = Url::parse(&self.url)?;
        Ok(base.join(&raw)?.to_string())
    }
}

#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    #[error("site '{0}' is configured more than once")]
    DuplicateSite(String),
    #[error("malformed site catalog")]
    Parse(#[from] serde_json::Error),
}

#[derive(Debug, Clone, Default)]
pub struct SiteCatalog {
    sites: Vec<SiteConfig>,
}

impl SiteCatalog {
    pub fn new(sites: Vec<SiteConfig>) -> Result<Self, CatalogError> {
        for (index, site) in sites.iter().enumerate() {
            if sites[..index].iter().any(|other| other.id == site.id) {
                return Err(CatalogError::DuplicateSite(site.id.clone()));
            }
        }
        Ok(Self { sites })
    }

    pub fn from_json_str(json: &str) -> Result<Self, CatalogError> {
        Self::new(serde_json::from_str(json)?)
    }

    pub fn site_ids(&self) -> impl Iterator<Item = &str> {
        self.sites.iter().map(|site| site.id.as_str())
    }

    pub fn get(&self, id: &str) -> Option<&SiteConfig> {
        self.sites.iter().find(|site| site.id == id)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, SiteConfig> {
        self.sites.iter()
    }

    pub fn len(&self) -> usize {
        self.sites.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sites.is_empty()
    }
}
