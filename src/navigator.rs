use std::error::Error as StdError;
use std::time::Duration;

use async_trait::async_trait;

/// A single stateful browsing session.
///
/// One navigator drives one site crawl at a time. Crawls that run
/// concurrently each get their own instance from a [`NavigatorFactory`].
#[async_trait]
pub trait PageNavigator: Send {
    /// Handle to one listing row on the current page.
    type Row: Send + Sync;

    async fn navigate(&mut self, url: &str) -> Result<(), NavigatorError>;

    /// Activates the page control with the given index among the elements
    /// matching `selector`. Fails with [`NavigatorError::PageNotFound`] when
    /// there is no such control.
    async fn goto_page(&mut self, selector: &str, index: usize) -> Result<(), NavigatorError>;

    /// Waits until at least one row matching `selector` is present and
    /// returns all of them in document order.
    async fn wait_for_rows(
        &mut self,
        selector: &str,
        timeout: Duration,
    ) -> Result<Vec<Self::Row>, NavigatorError>;

    async fn extract_text(&mut self, row: &Self::Row, selector: &str)
        -> Result<String, NavigatorError>;

    /// Reads `attribute` from the element matching `selector` inside `row`,
    /// or from the row itself when `selector` is `None`.
    async fn extract_attribute(
        &mut self,
        row: &Self::Row,
        selector: Option<&str>,
        attribute: &str,
    ) -> Result<String, NavigatorError>;

    /// Opens the element matching `selector` in the current tab, reads the
    /// resulting location and returns to the listing.
    ///
    /// Row handles obtained before this call may be stale afterwards.
    async fn open_and_read_location(
        &mut self,
        row: &Self::Row,
        selector: &str,
    ) -> Result<String, NavigatorError>;

    async fn close(&mut self) -> Result<(), NavigatorError> {
        Ok(())
    }
}

#[async_trait]
pub trait NavigatorFactory: Send + Sync {
    type Navigator: PageNavigator;

    async fn create(&self) -> Result<Self::Navigator, NavigatorError>;
}

#[derive(Debug, thiserror::Error)]
pub enum NavigatorError {
    #[error("no page control with index {index}")]
    PageNotFound { index: usize },
    #[error("rows matching '{selector}' did not appear within {timeout:?}")]
    RowTimeout { selector: String, timeout: Duration },
    #[error("no element matching '{selector}'")]
    FieldNotFound { selector: String },
    #[error("navigation to '{url}' failed: {reason}")]
    Navigation { url: String, reason: String },
    #[error("browser session error")]
    Session(#[source] Box<dyn StdError + Send + Sync>),
}

impl NavigatorError {
    pub fn session<E: StdError + Send + Sync + 'static>(err: E) -> Self {
        NavigatorError::Session(Box::new(err))
    }
}
