use tokio_util::sync::CancellationToken;

use super::{state::CrawlState, CrawlError, CrawlerOptions, SiteCrawl, Statistics, StopReason};
use crate::{
    article::normalize_title,
    navigator::{NavigatorError, PageNavigator},
    Article, DedupOracle, Keywords, LinkMode, SiteConfig,
};

/// Walks one site's listing pages newest-first until it reaches an article
/// persisted by an earlier run or runs out of pages.
pub(crate) struct SiteCrawler<'a, N: PageNavigator> {
    pub navigator: &'a mut N,
    pub oracle: &'a dyn DedupOracle,
    pub site: &'a SiteConfig,
    pub keywords: &'a Keywords,
    pub options: &'a CrawlerOptions,
    pub statistics: &'a Statistics,
    pub token: &'a CancellationToken,
}

impl<'a, N: PageNavigator> SiteCrawler<'a, N> {
    pub async fn crawl(mut self) -> Result<SiteCrawl, CrawlError> {
        let site = self.site;
        let mut state = CrawlState::new(site);
        self.open_listing().await?;

        while state.more_pages() {
            self.check_cancelled()?;
            if let Some(limit) = self.options.max_pages {
                if state.pages_visited() >= limit {
                    tracing::debug!(site = %site.id, limit, "page limit reached");
                    state.stop(StopReason::PageLimit);
                    break;
                }
            }

            if state.page != site.start_page {
                match self.select_page(state.page).await {
                    Ok(()) => {}
                    Err(NavigatorError::PageNotFound { .. }) => {
                        tracing::debug!(site = %site.id, page = state.page, "no more pages");
                        state.stop(StopReason::Exhausted);
                        break;
                    }
                    Err(source) => {
                        return Err(CrawlError::Navigation {
                            url: site.url.clone(),
                            source,
                        })
                    }
                }
            }
            state.page_loaded(site.start_row);
            self.statistics.page_visited();

            self.scan_rows(&mut state).await?;
            if state.more_pages() {
                state.next_page();
            }
        }

        Ok(state.finish())
    }

    async fn scan_rows(&mut self, state: &mut CrawlState) -> Result<(), CrawlError> {
        let site = self.site;
        let page = state.page;
        let mut rows = self.wait_for_rows(page).await?;
        tracing::debug!(site = %site.id, page, rows = rows.len(), "scanning rows");

        while state.row < rows.len() {
            self.check_cancelled()?;
            let index = state.row;
            let row = &rows[index];
            state.row_scanned();
            self.statistics.row_scanned();

            let title = match self.navigator.extract_text(row, &site.title_selector).await {
                Ok(text) => normalize_title(&text),
                Err(NavigatorError::FieldNotFound { .. }) => {
                    tracing::debug!(site = %site.id, page, row = index, "no title, page consumed");
                    return Ok(());
                }
                Err(source) => {
                    return Err(CrawlError::Extraction {
                        field: "title",
                        page,
                        row: index,
                        source,
                    })
                }
            };

            if self.oracle.exists(&site.id, &title).await? {
                tracing::debug!(
                    site = %site.id,
                    page,
                    row = index,
                    title = %title,
                    "reached persisted article"
                );
                state.stop(StopReason::AlreadyPersisted { title });
                return Ok(());
            }

            if state.has_collected(&title) {
                tracing::debug!(
                    site = %site.id,
                    page,
                    row = index,
                    title = %title,
                    "duplicate in this run"
                );
                state.next_row();
                continue;
            }

            let date = self
                .navigator
                .extract_text(row, &site.date_selector)
                .await
                .map_err(|source| CrawlError::Extraction {
                    field: "date",
                    page,
                    row: index,
                    source,
                })?;
            let (url, left_listing) = self.extract_link(row, page, index).await?;
            let keywords = self.keywords.tag(&title);

            tracing::debug!(
                site = %site.id,
                page,
                row = index,
                title = %title,
                url = %url,
                "collected"
            );
            state.collect(Article {
                site_id: site.id.clone(),
                title,
                date: date.trim().to_string(),
                url,
                keywords,
            });
            self.statistics.article_collected();

            if left_listing {
                rows = self.wait_for_rows(page).await?;
            }
            state.next_row();
        }

        Ok(())
    }

    /// Returns the article url and whether the browser left the listing to
    /// obtain it.
    async fn extract_link(
        &mut self,
        row: &N::Row,
        page: usize,
        index: usize,
    ) -> Result<(String, bool), CrawlError> {
        let site = self.site;
        let link_error = |source| CrawlError::Extraction {
            field: "link",
            page,
            row: index,
            source,
        };

        match &site.link {
            LinkMode::Attribute {
                selector,
                attribute,
                template,
            } => {
                let value = self
                    .navigator
                    .extract_attribute(row, selector.as_deref(), attribute)
                    .await
                    .map_err(link_error)?;
                let url = site
                    .resolve_link(value.trim(), template.as_deref())
                    .map_err(|source| CrawlError::InvalidLink {
                        value: value.clone(),
                        source,
                    })?;
                Ok((url, false))
            }
            LinkMode::Navigate => {
                let url = self
                    .navigator
                    .open_and_read_location(row, &site.title_selector)
                    .await
                    .map_err(link_error)?;
                self.settle().await;
                Ok((url, true))
            }
        }
    }

    /// Waits for the page's rows, refreshing the listing once if they do not
    /// show up in time.
    async fn wait_for_rows(&mut self, page: usize) -> Result<Vec<N::Row>, CrawlError> {
        let site = self.site;
        let timeout = self.options.row_timeout;

        match self.navigator.wait_for_rows(&site.row_selector, timeout).await {
            Ok(rows) => Ok(rows),
            Err(NavigatorError::RowTimeout { .. }) => {
                tracing::warn!(site = %site.id, page, "rows did not appear, refreshing once");
                self.open_listing().await?;
                if page != site.start_page {
                    self.select_page(page)
                        .await
                        .map_err(|source| CrawlError::Navigation {
                            url: site.url.clone(),
                            source,
                        })?;
                }
                self.navigator
                    .wait_for_rows(&site.row_selector, timeout)
                    .await
                    .map_err(|source| CrawlError::RowsUnavailable { page, source })
            }
            Err(source) => Err(CrawlError::RowsUnavailable { page, source }),
        }
    }

    async fn open_listing(&mut self) -> Result<(), CrawlError> {
        let site = self.site;
        self.navigator
            .navigate(&site.url)
            .await
            .map_err(|source| CrawlError::Navigation {
                url: site.url.clone(),
                source,
            })?;
        self.settle().await;
        Ok(())
    }

    async fn select_page(&mut self, index: usize) -> Result<(), NavigatorError> {
        let site = self.site;
        let Some(selector) = site.page_selector.as_deref() else {
            return Err(NavigatorError::PageNotFound { index });
        };
        self.navigator.goto_page(selector, index).await?;
        self.settle().await;
        Ok(())
    }

    async fn settle(&self) {
        if !self.options.page_delay.is_zero() {
            tokio::time::sleep(self.options.page_delay).await;
        }
    }

    fn check_cancelled(&self) -> Result<(), CrawlError> {
        if self.token.is_cancelled() {
            return Err(CrawlError::Cancelled);
        }
        Ok(())
    }
}
