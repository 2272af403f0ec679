#![allow(dead_code)]

use std::{
    collections::{HashMap, HashSet},
    sync::{
        atomic::{AtomicUsize, Ordering},
        Arc, Mutex,
    },
    time::Duration,
};

use announcement_crawler::{
    incident::{ErrorReporter, Incident},
    navigator::{NavigatorError, NavigatorFactory, PageNavigator},
    CrawlerOptions, LinkMode, SiteConfig,
};
use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

#[derive(Debug, Clone, Default)]
pub struct Row {
    fields: HashMap<String, String>,
    attributes: HashMap<String, String>,
    location: Option<String>,
}

impl Row {
    pub fn titled(title: &str) -> Self {
        let slug = title.replace(' ', "-");
        let mut row = Row::default();
        row.fields.insert("title".into(), format!("  {title}\n"));
        row.fields.insert("date".into(), " 2024.05.02 ".into());
        row.attributes.insert("href".into(), format!("/view/{slug}"));
        row.location = Some(format!("https://detail.test/{slug}"));
        row
    }

    pub fn untitled() -> Self {
        let mut row = Row::default();
        row.fields.insert("date".into(), "2024.05.02".into());
        row
    }

    pub fn without_date(mut self) -> Self {
        self.fields.remove("date");
        self
    }
}

pub fn page(titles: &[&str]) -> Vec<Row> {
    titles.iter().map(|title| Row::titled(title)).collect()
}

#[derive(Debug, Default)]
struct Listing {
    pages: Vec<Vec<Row>>,
    /// Page index to number of row waits that still time out.
    timeouts: HashMap<usize, usize>,
}

/// Shared listing content and a log of every navigator call.
#[derive(Debug, Clone, Default)]
pub struct Script {
    listings: Arc<Mutex<HashMap<String, Listing>>>,
    events: Arc<Mutex<Vec<String>>>,
    /// Listing url whose navigation cancels the token.
    cancel_on: Arc<Mutex<Option<(String, CancellationToken)>>>,
}

impl Script {
    pub fn listing(&self, url: &str, pages: Vec<Vec<Row>>) -> &Self {
        self.listings.lock().unwrap().insert(
            url.to_string(),
            Listing {
                pages,
                timeouts: HashMap::new(),
            },
        );
        self
    }

    /// The next `count` row waits on the first page of `url` time out.
    pub fn timeouts(&self, url: &str, count: usize) -> &Self {
        self.timeouts_on(url, 0, count)
    }

    pub fn timeouts_on(&self, url: &str, page: usize, count: usize) -> &Self {
        if let Some(listing) = self.listings.lock().unwrap().get_mut(url) {
            listing.timeouts.insert(page, count);
        }
        self
    }

    pub fn cancel_on_navigate(&self, url: &str, token: CancellationToken) -> &Self {
        *self.cancel_on.lock().unwrap() = Some((url.to_string(), token));
        self
    }

    pub fn events(&self) -> Vec<String> {
        self.events.lock().unwrap().clone()
    }

    pub fn count(&self, prefix: &str) -> usize {
        self.events()
            .iter()
            .filter(|event| event.starts_with(prefix))
            .count()
    }

    fn log(&self, event: String) {
        self.events.lock().unwrap().push(event);
    }

    pub fn factory(&self) -> ScriptedFactory {
        ScriptedFactory {
            script: self.clone(),
            fail_after: None,
            created: AtomicUsize::new(0),
        }
    }
}

pub struct ScriptedNavigator {
    script: Script,
    url: Option<String>,
    page: usize,
}

#[async_trait]
impl PageNavigator for ScriptedNavigator {
    type Row = Row;

    async fn navigate(&mut self, url: &str) -> Result<(), NavigatorError> {
        self.script.log(format!("navigate {url}"));
        {
            let cancel_on = self.script.cancel_on.lock().unwrap();
            if let Some((_, token)) = cancel_on.as_ref().filter(|(at, _)| at.as_str() == url) {
                token.cancel();
            }
        }
        if !self.script.listings.lock().unwrap().contains_key(url) {
            return Err(NavigatorError::Navigation {
                url: url.to_string(),
                reason: "connection refused".into(),
            });
        }
        self.url = Some(url.to_string());
        self.page = 0;
        Ok(())
    }

    async fn goto_page(&mut self, _selector: &str, index: usize) -> Result<(), NavigatorError> {
        let url = self.url.clone().unwrap_or_default();
        self.script.log(format!("page {url} {index}"));
        let listings = self.script.listings.lock().unwrap();
        match listings.get(&url) {
            Some(listing) if index < listing.pages.len() => {
                self.page = index;
                Ok(())
            }
            _ => Err(NavigatorError::PageNotFound { index }),
        }
    }

    async fn wait_for_rows(
        &mut self,
        selector: &str,
        timeout: Duration,
    ) -> Result<Vec<Row>, NavigatorError> {
        let url = self.url.clone().unwrap_or_default();
        self.script.log(format!("wait {url} {}", self.page));
        let mut listings = self.script.listings.lock().unwrap();
        let listing = listings
            .get_mut(&url)
            .ok_or_else(|| NavigatorError::RowTimeout {
                selector: selector.to_string(),
                timeout,
            })?;
        if let Some(remaining) = listing.timeouts.get_mut(&self.page).filter(|n| **n > 0) {
            *remaining -= 1;
            return Err(NavigatorError::RowTimeout {
                selector: selector.to_string(),
                timeout,
            });
        }
        Ok(listing.pages.get(self.page).cloned().unwrap_or_default())
    }

    async fn extract_text(&mut self, row: &Row, selector: &str) -> Result<String, NavigatorError> {
        row.fields
            .get(selector)
            .cloned()
            .ok_or_else(|| NavigatorError::FieldNotFound {
                selector: selector.to_string(),
            })
    }

    async fn extract_attribute(
        &mut self,
        row: &Row,
        _selector: Option<&str>,
        attribute: &str,
    ) -> Result<String, NavigatorError> {
        row.attributes
            .get(attribute)
            .cloned()
            .ok_or_else(|| NavigatorError::FieldNotFound {
                selector: attribute.to_string(),
            })
    }

    async fn open_and_read_location(
        &mut self,
        row: &Row,
        selector: &str,
    ) -> Result<String, NavigatorError> {
        self.script.log("open".to_string());
        row.location
            .clone()
            .ok_or_else(|| NavigatorError::FieldNotFound {
                selector: selector.to_string(),
            })
    }

    async fn close(&mut self) -> Result<(), NavigatorError> {
        self.script.log("close".to_string());
        Ok(())
    }
}

pub struct ScriptedFactory {
    script: Script,
    /// Number of navigators handed out before creation starts failing.
    fail_after: Option<usize>,
    created: AtomicUsize,
}

impl ScriptedFactory {
    pub fn failing(self) -> Self {
        self.failing_after(0)
    }

    pub fn failing_after(mut self, created: usize) -> Self {
        self.fail_after = Some(created);
        self
    }
}

#[derive(Debug, thiserror::Error)]
#[error("browser binary not found")]
struct BrowserMissing;

#[async_trait]
impl NavigatorFactory for ScriptedFactory {
    type Navigator = ScriptedNavigator;

    async fn create(&self) -> Result<ScriptedNavigator, NavigatorError> {
        self.script.log("create".to_string());
        let created = self.created.fetch_add(1, Ordering::SeqCst);
        if self.fail_after.is_some_and(|limit| created >= limit) {
            return Err(NavigatorError::session(BrowserMissing));
        }
        Ok(ScriptedNavigator {
            script: self.script.clone(),
            url: None,
            page: 0,
        })
    }
}

#[derive(Debug, Default)]
pub struct CollectingReporter {
    incidents: Mutex<Vec<Incident>>,
}

impl CollectingReporter {
    pub fn incidents(&self) -> Vec<Incident> {
        self.incidents.lock().unwrap().clone()
    }
}

#[async_trait]
impl ErrorReporter for CollectingReporter {
    async fn report(&self, incident: &Incident) {
        self.incidents.lock().unwrap().push(incident.clone());
    }
}

pub fn site(id: &str) -> SiteConfig {
    SiteConfig {
        id: id.to_string(),
        url: listing_url(id),
        row_selector: "tr".into(),
        title_selector: "title".into(),
        date_selector: "date".into(),
        page_selector: Some(".paging a".into()),
        start_page: 0,
        start_row: 0,
        link: LinkMode::Attribute {
            selector: None,
            attribute: "href".into(),
            template: None,
        },
    }
}

pub fn listing_url(id: &str) -> String {
    format!("https://{id}.test/list")
}

pub fn options() -> CrawlerOptions {
    CrawlerOptions {
        row_timeout: Duration::from_millis(10),
        page_delay: Duration::ZERO,
        ..CrawlerOptions::default()
    }
}

pub fn persisted(entries: &[(&str, &str)]) -> HashSet<(String, String)> {
    entries
        .iter()
        .map(|(site_id, title)| (site_id.to_string(), title.to_string()))
        .collect()
}
