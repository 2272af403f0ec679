use std::{
    sync::{
        atomic::{AtomicUsize, Ordering},
        Arc,
    },
    time::Duration,
};

#[derive(Debug, Clone)]
pub struct Statistics {
    pub num_sites: Arc<AtomicUsize>,
    pub num_site_failures: Arc<AtomicUsize>,
    pub num_pages: Arc<AtomicUsize>,
    pub num_rows: Arc<AtomicUsize>,
    pub num_articles: Arc<AtomicUsize>,
}

impl Default for Statistics {
    fn default() -> Self {
        Self {
            num_sites: Arc::new(AtomicUsize::new(0)),
            num_site_failures: Arc::new(AtomicUsize::new(0)),
            num_pages: Arc::new(AtomicUsize::new(0)),
            num_rows: Arc::new(AtomicUsize::new(0)),
            num_articles: Arc::new(AtomicUsize::new(0)),
        }
    }
}

impl Statistics {
    pub fn site_started(&self) {
        self.num_sites.fetch_add(1, Ordering::SeqCst);
    }
    pub fn site_failed(&self) {
        self.num_site_failures.fetch_add(1, Ordering::SeqCst);
    }
    pub fn page_visited(&self) {
        self.num_pages.fetch_add(1, Ordering::SeqCst);
    }
    pub fn row_scanned(&self) {
        self.num_rows.fetch_add(1, Ordering::SeqCst);
    }
    pub fn article_collected(&self) {
        self.num_articles.fetch_add(1, Ordering::SeqCst);
    }

    pub fn write_to_log(&self, running_time: Duration) {
        let num_sites = self.num_sites.load(Ordering::Relaxed);
        let num_site_failures = self.num_site_failures.load(Ordering::Relaxed);
        let num_pages = self.num_pages.load(Ordering::Relaxed);
        let num_rows = self.num_rows.load(Ordering::Relaxed);
        let num_articles = self.num_articles.load(Ordering::Relaxed);
        tracing::info!(
            num_sites,
            num_site_failures,
            num_pages,
            num_rows,
            num_articles,
            running_time = ?running_time,
            "statistics"
        );
    }
}
