use std::{
    sync::atomic::{AtomicUsize, Ordering},
    sync::Arc,
    time::Duration,
};

use futures::future;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::Instrument;

use crate::{
    incident::{ErrorReporter, Incident, TracingReporter},
    navigator::{NavigatorError, NavigatorFactory, PageNavigator},
    DedupError, DedupOracle, Keywords, SiteCatalog, SiteConfig,
};

mod report;
mod site;
mod state;
mod statistics;

pub use report::{CrawlReport, SiteFailure, SiteOutcome};
pub use state::{SiteCrawl, StopReason};
pub use statistics::Statistics;

use site::SiteCrawler;

pub struct Crawler {
    keywords: Keywords,
    options: CrawlerOptions,
    reporter: Arc<dyn ErrorReporter>,
}

#[derive(Debug, Clone)]
pub struct CrawlerOptions {
    /// How long to wait for listing rows before refreshing.
    pub row_timeout: Duration,
    /// Pause after every navigation or page switch.
    pub page_delay: Duration,
    /// Number of sites crawled at once, each with its own navigator.
    pub crawling_concurrency: usize,
    pub max_pages: Option<usize>,
}

impl Default for CrawlerOptions {
    fn default() -> Self {
        Self {
            row_timeout: Duration::from_secs(10),
            page_delay: Duration::from_secs(3),
            crawling_concurrency: 1,
            max_pages: None,
        }
    }
}

/// Failure that aborts one site's crawl.
#[derive(Debug, thiserror::Error)]
pub enum CrawlError {
    #[error("navigation to '{url}' failed")]
    Navigation {
        url: String,
        #[source]
        source: NavigatorError,
    },
    #[error("listing rows unavailable on page {page} after a refresh")]
    RowsUnavailable {
        page: usize,
        #[source]
        source: NavigatorError,
    },
    #[error("could not read {field} at page {page}, row {row}")]
    Extraction {
        field: &'static str,
        page: usize,
        row: usize,
        #[source]
        source: NavigatorError,
    },
    #[error("link '{value}' is not a valid url")]
    InvalidLink {
        value: String,
        #[source]
        source: url::ParseError,
    },
    #[error(transparent)]
    Dedup(#[from] DedupError),
    #[error("crawl cancelled")]
    Cancelled,
}

/// Failure that aborts the whole run.
#[derive(Debug, thiserror::Error)]
pub enum RunError {
    #[error("failed to create a page navigator")]
    Navigator(#[source] NavigatorError),
}

impl Crawler {
    pub fn new(keywords: Keywords, options: CrawlerOptions) -> Self {
        Self {
            keywords,
            options,
            reporter: Arc::new(TracingReporter),
        }
    }

    pub fn with_reporter(mut self, reporter: Arc<dyn ErrorReporter>) -> Self {
        self.reporter = reporter;
        self
    }

    pub fn options(&self) -> &CrawlerOptions {
        &self.options
    }

    /// Crawls every site of the catalog and returns their outcomes in
    /// catalog order.
    ///
    /// A failing site is reported and recorded as failed; the other sites
    /// are unaffected. Only failing to create a navigator aborts the run.
    pub async fn run<F: NavigatorFactory>(
        &self,
        factory: &F,
        oracle: &dyn DedupOracle,
        catalog: &SiteCatalog,
        token: CancellationToken,
    ) -> Result<CrawlReport, RunError> {
        let starting_time = Instant::now();
        let statistics = Statistics::default();
        let concurrency = self
            .options
            .crawling_concurrency
            .clamp(1, catalog.len().max(1));
        tracing::info!(sites = catalog.len(), concurrency, "running crawler");

        let mut navigators = Vec::with_capacity(concurrency);
        for _ in 0..concurrency {
            match factory.create().await {
                Ok(navigator) => navigators.push(navigator),
                Err(err) => {
                    let incident = Incident::run("failed to create a page navigator", &err);
                    self.reporter.report(&incident).await;
                    for mut navigator in navigators {
                        if let Err(err) = navigator.close().await {
                            tracing::warn!("failed to close navigator: {err}");
                        }
                    }
                    return Err(RunError::Navigator(err));
                }
            }
        }

        let sites: Vec<&SiteConfig> = catalog.iter().collect();
        let next_site = AtomicUsize::new(0);
        let workers = navigators.into_iter().map(|mut navigator| {
            let sites = &sites;
            let next_site = &next_site;
            let statistics = &statistics;
            let token = &token;
            async move {
                let mut outcomes = Vec::new();
                loop {
                    let index = next_site.fetch_add(1, Ordering::SeqCst);
                    let Some(site) = sites.get(index) else {
                        break;
                    };
                    let outcome = self
                        .crawl_site(&mut navigator, oracle, site, statistics, token)
                        .await;
                    outcomes.push((index, outcome));
                }
                if let Err(err) = navigator.close().await {
                    tracing::warn!("failed to close navigator: {err}");
                }
                outcomes
            }
        });

        let mut outcomes: Vec<(usize, SiteOutcome)> =
            future::join_all(workers).await.into_iter().flatten().collect();
        outcomes.sort_by_key(|(index, _)| *index);

        let mut report = CrawlReport::default();
        for (index, outcome) in outcomes {
            report.insert(sites[index].id.as_str(), outcome);
        }

        tracing::info!(
            articles = report.total_articles(),
            failed_sites = report.failed_sites().count(),
            "crawler: run finished"
        );
        statistics.write_to_log(starting_time.elapsed());
        Ok(report)
    }

    /// Crawls one site with the given navigator.
    ///
    /// Never fails: site-level errors are reported and turned into
    /// [`SiteOutcome::Failed`].
    pub async fn crawl_site<N: PageNavigator>(
        &self,
        navigator: &mut N,
        oracle: &dyn DedupOracle,
        site: &SiteConfig,
        statistics: &Statistics,
        token: &CancellationToken,
    ) -> SiteOutcome {
        let started = Instant::now();
        statistics.site_started();
        tracing::info!(site = %site.id, url = %site.url, "crawling site");

        let result = SiteCrawler {
            navigator,
            oracle,
            site,
            keywords: &self.keywords,
            options: &self.options,
            statistics,
            token,
        }
        .crawl()
        .instrument(tracing::info_span!("site", site = %site.id))
        .await;

        match result {
            Ok(crawl) => {
                tracing::info!(
                    site = %site.id,
                    articles = crawl.articles.len(),
                    pages = crawl.pages_visited,
                    rows = crawl.rows_scanned,
                    stop = %crawl.stop,
                    running_time = ?started.elapsed(),
                    "site crawled"
                );
                SiteOutcome::Collected(crawl.articles)
            }
            Err(err @ CrawlError::Cancelled) => {
                statistics.site_failed();
                tracing::warn!(site = %site.id, "crawl cancelled");
                SiteOutcome::Failed(SiteFailure::from_error(&err))
            }
            Err(err) => {
                statistics.site_failed();
                let incident = Incident::site(
                    &site.id,
                    format!("crawling '{}' failed: {err}", site.id),
                    &err,
                );
                self.reporter.report(&incident).await;
                SiteOutcome::Failed(SiteFailure::from_error(&err))
            }
        }
    }
}
