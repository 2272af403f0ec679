use std::{error::Error, fs, path::PathBuf, sync::Arc};

use announcement_crawler::{
    incident::TracingReporter, shutdown, Crawler, Digest, JsonArticleStore, Settings,
};
use chrono::Local;
use clap::Parser;
use tracing_subscriber::{prelude::*, EnvFilter};

/// Crawls recorded listing pages and prints the digest of new articles.
#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Cli {
    /// Settings file with crawler options, keywords and sites
    #[arg(short, long)]
    settings: PathBuf,

    /// Recorded listing pages, keyed by listing url
    #[arg(short, long, required_unless_present = "stored_only")]
    fixture: Option<PathBuf>,

    /// Article store; overrides `store_path` from the settings
    #[arg(long)]
    store: Option<PathBuf>,

    /// Skip crawling and rebuild today's digest from the store
    #[arg(long)]
    stored_only: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(
            EnvFilter::try_from_default_env()
                .or_else(|_| EnvFilter::try_new("info"))
                .expect("telemetry: Creating EnvFilter"),
        )
        .init();

    let cli = Cli::parse();
    let settings = Settings::load(&cli.settings)?;
    let catalog = settings.catalog()?;
    let store_path = cli
        .store
        .or_else(|| settings.store_path.clone())
        .unwrap_or_else(|| PathBuf::from("articles.json"));
    let store = JsonArticleStore::open(store_path)?;
    let today = Local::now().date_naive();

    let digest = match cli.fixture {
        Some(fixture_path) if !cli.stored_only => {
            let fixture: fixture::Fixture =
                serde_json::from_str(&fs::read_to_string(&fixture_path)?)?;
            let factory = fixture::FixtureFactory::new(Arc::new(fixture));
            let crawler = Crawler::new(settings.keywords.clone(), settings.options()?);

            let report = crawler
                .run(&factory, &store, &catalog, shutdown::cancel_on_ctrl_c())
                .await?;
            store.save_report_or_notify(&report, &TracingReporter).await?;
            for (site_id, failure) in report.failed_sites() {
                tracing::warn!(site = %site_id, reason = %failure.reason, "site not crawled");
            }
            Digest::from_report(&report, today)
        }
        _ => {
            let stored = store.articles_collected_on(today).await;
            Digest::from_stored(today, &catalog, &stored)
        }
    };

    tracing::info!(subject = %digest.subject(), keywords = ?digest.keywords, "digest ready");
    println!("{}", serde_json::to_string_pretty(&digest)?);
    Ok(())
}

pub mod fixture {
    use std::{collections::HashMap, sync::Arc, time::Duration};

    use announcement_crawler::navigator::{NavigatorError, NavigatorFactory, PageNavigator};
    use async_trait::async_trait;

    /// Listing url to its pages, each a list of rows.
    pub type Fixture = HashMap<String, Vec<Vec<FixtureRow>>>;

    #[derive(Debug, Clone, Default, serde::Deserialize)]
    pub struct FixtureRow {
        /// Selector to element text.
        #[serde(default)]
        pub fields: HashMap<String, String>,
        #[serde(default)]
        pub attributes: HashMap<String, String>,
        /// Where opening the row's title leads.
        #[serde(default)]
        pub location: Option<String>,
    }

    pub struct FixtureFactory {
        fixture: Arc<Fixture>,
    }

    impl FixtureFactory {
        pub fn new(fixture: Arc<Fixture>) -> Self {
            Self { fixture }
        }
    }

    #[async_trait]
    impl NavigatorFactory for FixtureFactory {
        type Navigator = FixtureNavigator;

        async fn create(&self) -> Result<FixtureNavigator, NavigatorError> {
            Ok(FixtureNavigator {
                fixture: self.fixture.clone(),
                pages: None,
                page: 0,
            })
        }
    }

    pub struct FixtureNavigator {
        fixture: Arc<Fixture>,
        pages: Option<String>,
        page: usize,
    }

    impl FixtureNavigator {
        fn pages(&self) -> &[Vec<FixtureRow>] {
            self.pages
                .as_ref()
                .and_then(|url| self.fixture.get(url))
                .map(Vec::as_slice)
                .unwrap_or_default()
        }
    }

    fn missing(selector: &str) -> NavigatorError {
        NavigatorError::FieldNotFound {
            selector: selector.to_string(),
        }
    }

    #[async_trait]
    impl PageNavigator for FixtureNavigator {
        type Row = FixtureRow;

        async fn navigate(&mut self, url: &str) -> Result<(), NavigatorError> {
            if !self.fixture.contains_key(url) {
                return Err(NavigatorError::Navigation {
                    url: url.to_string(),
                    reason: "not in fixture".to_string(),
                });
            }
            self.pages = Some(url.to_string());
            self.page = 0;
            Ok(())
        }

        async fn goto_page(&mut self, _selector: &str, index: usize) -> Result<(), NavigatorError> {
            if index >= self.pages().len() {
                return Err(NavigatorError::PageNotFound { index });
            }
            self.page = index;
            Ok(())
        }

        async fn wait_for_rows(
            &mut self,
            selector: &str,
            timeout: Duration,
        ) -> Result<Vec<FixtureRow>, NavigatorError> {
            match self.pages().get(self.page) {
                Some(rows) if !rows.is_empty() => Ok(rows.clone()),
                _ => Err(NavigatorError::RowTimeout {
                    selector: selector.to_string(),
                    timeout,
                }),
            }
        }

        async fn extract_text(
            &mut self,
            row: &FixtureRow,
            selector: &str,
        ) -> Result<String, NavigatorError> {
            row.fields.get(selector).cloned().ok_or_else(|| missing(selector))
        }

        async fn extract_attribute(
            &mut self,
            row: &FixtureRow,
            _selector: Option<&str>,
            attribute: &str,
        ) -> Result<String, NavigatorError> {
            row.attributes
                .get(attribute)
                .cloned()
                .ok_or_else(|| missing(attribute))
        }

        async fn open_and_read_location(
            &mut self,
            row: &FixtureRow,
            selector: &str,
        ) -> Result<String, NavigatorError> {
            row.location.clone().ok_or_else(|| missing(selector))
        }
    }
}
