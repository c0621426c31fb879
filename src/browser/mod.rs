//! Browser session trait.
//!
//! The crawler only needs a handful of page operations. Keeping them behind
//! [`BrowserSession`] lets the crawl run against Chromium in production and
//! against scripted sessions in tests.

mod chrome;

pub use chrome::ChromeSession;

use crate::error::BrowserError;
use async_trait::async_trait;
use std::time::Duration;

/// A single browser page driven sequentially.
#[async_trait]
pub trait BrowserSession: Send {
    /// Navigates the page to `url` and waits for it to load.
    async fn goto(&mut self, url: &str) -> Result<(), BrowserError>;

    /// Checks whether `selector` currently matches anything, without waiting.
    async fn has_element(&mut self, selector: &str) -> Result<bool, BrowserError>;

    /// Waits up to `timeout` for `selector` to match.
    ///
    /// Returns `false` on timeout; a timeout is not an error.
    async fn wait_for(
        &mut self,
        selector: &str,
        timeout: Duration,
    ) -> Result<bool, BrowserError>;

    /// Waits up to `timeout` for `selector` and clicks the first match.
    ///
    /// Fails with [`BrowserError::ElementNotFound`] if it never appears.
    async fn click(&mut self, selector: &str, timeout: Duration) -> Result<(), BrowserError>;

    /// Reads the resolved `src` of the first element matching `selector`.
    async fn media_src(&mut self, selector: &str) -> Result<Option<String>, BrowserError>;

    /// Returns the outer HTML of every element matching `selector`, in
    /// document order.
    async fn outer_html_all(&mut self, selector: &str) -> Result<Vec<String>, BrowserError>;

    /// Shuts the browser down.
    async fn close(&mut self) -> Result<(), BrowserError>;
}
