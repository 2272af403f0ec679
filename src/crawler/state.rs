use std::fmt;

use crate::{Article, SiteConfig};

/// Why a site's walk ended without an error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StopReason {
    /// Reached a title persisted by an earlier run.
    AlreadyPersisted { title: String },
    /// No page control for the next index.
    Exhausted,
    /// Hit the configured page limit.
    PageLimit,
}

impl fmt::Display for StopReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StopReason::AlreadyPersisted { title } => write!(f, "already persisted: '{title}'"),
            StopReason::Exhausted => f.write_str("exhausted"),
            StopReason::PageLimit => f.write_str("page limit"),
        }
    }
}

/// Result of one successful site walk.
#[derive(Debug, Clone)]
pub struct SiteCrawl {
    pub articles: Vec<Article>,
    pub pages_visited: usize,
    pub rows_scanned: usize,
    pub stop: StopReason,
}

#[derive(Debug)]
pub(crate) struct CrawlState {
    pub page: usize,
    pub row: usize,
    collected_titles: Vec<String>,
    more_pages: bool,
    articles: Vec<Article>,
    pages_visited: usize,
    rows_scanned: usize,
    stop: Option<StopReason>,
}

impl CrawlState {
    pub fn new(site: &SiteConfig) -> Self {
        Self {
            page: site.start_page,
            row: site.start_row,
            collected_titles: Vec::new(),
            more_pages: true,
            articles: Vec::new(),
            pages_visited: 0,
            rows_scanned: 0,
            stop: None,
        }
    }

    pub fn more_pages(&self) -> bool {
        self.more_pages
    }

    pub fn pages_visited(&self) -> usize {
        self.pages_visited
    }

    pub fn page_loaded(&mut self, start_row: usize) {
        self.pages_visited += 1;
        self.row = start_row;
    }

    pub fn row_scanned(&mut self) {
        self.rows_scanned += 1;
    }

    pub fn has_collected(&self, title: &str) -> bool {
        self.collected_titles.iter().any(|collected| collected == title)
    }

    pub fn collect(&mut self, article: Article) {
        self.collected_titles.push(article.title.clone());
        self.articles.push(article);
    }

    pub fn next_row(&mut self) {
        self.row += 1;
    }

    pub fn next_page(&mut self) {
        self.page += 1;
    }

    pub fn stop(&mut self, reason: StopReason) {
        self.more_pages = false;
        self.stop = Some(reason);
    }

    pub fn finish(self) -> SiteCrawl {
        SiteCrawl {
            articles: self.articles,
            pages_visited: self.pages_visited,
            rows_scanned: self.rows_scanned,
            stop: self.stop.unwrap_or(StopReason::Exhausted),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::LinkMode;

    fn site() -> SiteConfig {
        SiteConfig {
            id: "ntis".into(),
            url: "https://ntis.test/list".into(),
            row_selector: "tr".into(),
            title_selector: "td.tl".into(),
            date_selector: "td.date".into(),
            page_selector: None,
            start_page: 1,
            start_row: 2,
            link: LinkMode::Navigate,
        }
    }

    fn article(title: &str) -> Article {
        Article {
            site_id: "ntis".into(),
            title: title.into(),
            date: "2024-05-01".into(),
            url: format!("https://ntis.test/{title}"),
            keywords: Vec::new(),
        }
    }

    #[test]
    fn starts_at_configured_indices() {
        let state = CrawlState::new(&site());
        assert_eq!((state.page, state.row), (1, 2));
        assert!(state.more_pages());
    }

    #[test]
    fn page_load_resets_row_and_counts() {
        let mut state = CrawlState::new(&site());
        state.next_row();
        state.next_row();
        state.next_page();
        state.page_loaded(2);
        assert_eq!((state.page, state.row, state.pages_visited()), (2, 2, 1));
    }

    #[test]
    fn remembers_collected_titles() {
        let mut state = CrawlState::new(&site());
        state.collect(article("a"));
        assert!(state.has_collected("a"));
        assert!(!state.has_collected("b"));
    }

    #[test]
    fn stop_keeps_articles_and_reason() {
        let mut state = CrawlState::new(&site());
        state.collect(article("a"));
        state.stop(StopReason::AlreadyPersisted { title: "b".into() });
        assert!(!state.more_pages());

        let crawl = state.finish();
        assert_eq!(crawl.articles, vec![article("a")]);
        assert_eq!(crawl.stop.to_string(), "already persisted: 'b'");
    }
}
