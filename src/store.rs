//! JSON file store of collected articles.
//!
//! The store answers dedup lookups for later runs and keeps the collection
//! time of every article so a digest can be rebuilt for a given day.

use std::{
    collections::HashSet,
    fs,
    io::{self, Write},
    path::{Path, PathBuf},
};

use async_trait::async_trait;
use chrono::{DateTime, Local, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;

use crate::{
    crawler::CrawlReport,
    incident::{ErrorReporter, Incident},
    Article, DedupError, DedupOracle,
};

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct StoredArticle {
    #[serde(flatten)]
    pub article: Article,
    pub collected_at: DateTime<Utc>,
}

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("failed to read '{}'", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to write '{}'", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("'{}' is not a valid article store", path.display())]
    Malformed {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

#[derive(Debug, Default)]
struct StoreState {
    articles: Vec<StoredArticle>,
    keys: HashSet<(String, String)>,
}

impl StoreState {
    fn insert(&mut self, stored: StoredArticle) -> bool {
        let key = (stored.article.site_id.clone(), stored.article.title.clone());
        if !self.keys.insert(key) {
            return false;
        }
        self.articles.push(stored);
        true
    }
}

#[derive(Debug, Deserialize)]
struct StoreFile {
    articles: Vec<StoredArticle>,
}

#[derive(Debug)]
pub struct JsonArticleStore {
    path: PathBuf,
    state: RwLock<StoreState>,
}

impl JsonArticleStore {
    /// Opens the store at `path`. A missing file is an empty store.
    pub fn open<P: Into<PathBuf>>(path: P) -> Result<Self, StoreError> {
        let path = path.into();
        let mut state = StoreState::default();
        match fs::File::open(&path) {
            Ok(file) => {
                let reader = io::BufReader::new(file);
                let stored: StoreFile =
                    serde_json::from_reader(reader).map_err(|source| StoreError::Malformed {
                        path: path.clone(),
                        source,
                    })?;
                for article in stored.articles {
                    state.insert(article);
                }
                tracing::info!(
                    articles = state.articles.len(),
                    "read article store from '{}'",
                    path.display()
                );
            }
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                tracing::warn!("no article store at '{}', starting empty", path.display());
            }
            Err(source) => return Err(StoreError::Read { path, source }),
        }
        Ok(Self {
            path,
            state: RwLock::new(state),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub async fn len(&self) -> usize {
        self.state.read().await.articles.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.state.read().await.articles.is_empty()
    }

    /// Adds every collected article of `report` and writes the file.
    /// Returns how many articles were new to the store.
    pub async fn save_report(&self, report: &CrawlReport) -> Result<usize, StoreError> {
        let collected_at = Utc::now();
        let mut state = self.state.write().await;
        let mut fresh = StoreState::default();
        for article in report.articles() {
            let key = (article.site_id.clone(), article.title.clone());
            if !state.keys.contains(&key) {
                fresh.insert(StoredArticle {
                    article: article.clone(),
                    collected_at,
                });
            }
        }

        let all: Vec<&StoredArticle> = state.articles.iter().chain(&fresh.articles).collect();
        self.write(&all)?;

        let added = fresh.articles.len();
        for stored in fresh.articles {
            state.insert(stored);
        }
        tracing::info!(added, total = state.articles.len(), "articles recorded");
        Ok(added)
    }

    /// Same as [`save_report`](Self::save_report), but a failed write is
    /// also handed to `reporter` as a run-level incident.
    pub async fn save_report_or_notify(
        &self,
        report: &CrawlReport,
        reporter: &dyn ErrorReporter,
    ) -> Result<usize, StoreError> {
        let result = self.save_report(report).await;
        if let Err(err) = &result {
            let incident = Incident::run("failed to save collected articles", err);
            reporter.report(&incident).await;
        }
        result
    }

    /// Articles collected on `date`, local time, in collection order.
    pub async fn articles_collected_on(&self, date: NaiveDate) -> Vec<StoredArticle> {
        self.state
            .read()
            .await
            .articles
            .iter()
            .filter(|stored| stored.collected_at.with_timezone(&Local).date_naive() == date)
            .cloned()
            .collect()
    }

    fn write(&self, articles: &[&StoredArticle]) -> Result<(), StoreError> {
        let json = serde_json::json!({ "articles": articles });
        let write_error = |source: io::Error| StoreError::Write {
            path: self.path.clone(),
            source,
        };
        let json_string =
            serde_json::to_string_pretty(&json).map_err(|err| write_error(err.into()))?;
        let mut file = fs::File::create(&self.path).map_err(write_error)?;
        file.write_all(json_string.as_bytes()).map_err(write_error)?;
        tracing::debug!("wrote article store to '{}'", self.path.display());
        Ok(())
    }
}

#[async_trait]
impl DedupOracle for JsonArticleStore {
    async fn exists(&self, site_id: &str, title: &str) -> Result<bool, DedupError> {
        Ok(self
            .state
            .read()
            .await
            .keys
            .contains(&(site_id.to_string(), title.to_string())))
    }
}
