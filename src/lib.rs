//! A library for incrementally crawling paginated announcement listings
//! through the trait `PageNavigator`.

mod article;
pub mod catalog;
pub mod crawler;
mod dedup;
pub mod digest;
pub mod incident;
pub mod navigator;
pub mod settings;
pub mod shutdown;
pub mod store;
mod tagger;

pub use article::{normalize_title, Article};
pub use catalog::{CatalogError, LinkMode, SiteCatalog, SiteConfig};
pub use crawler::{
    CrawlError, CrawlReport, Crawler, CrawlerOptions, RunError, SiteFailure, SiteOutcome,
};
pub use dedup::{DedupError, DedupOracle};
pub use digest::Digest;
pub use incident::{ErrorReporter, Incident};
pub use navigator::{NavigatorError, NavigatorFactory, PageNavigator};
pub use settings::{ConfigError, Settings};
pub use store::JsonArticleStore;
pub use tagger::{tag, Keywords};
