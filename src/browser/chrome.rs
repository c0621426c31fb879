//! Chromium-backed browser session using the DevTools protocol.

use super::BrowserSession;
use crate::config::{BrowserConfig, MAX_WAIT};
use crate::error::BrowserError;
use async_trait::async_trait;
use chromiumoxide::Page;
use chromiumoxide::browser::{Browser, BrowserConfig as LaunchConfig};
use chromiumoxide::cdp::browser_protocol::network::SetCacheDisabledParams;
use futures::StreamExt;
use serde_json::Value as JsonValue;
use std::future::Future;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::Instant;

/// One Chromium process with a single page.
pub struct ChromeSession {
    browser: Browser,
    page: Page,
    handler: Option<JoinHandle<()>>,
    poll_interval: Duration,
}

impl ChromeSession {
    /// Launches Chromium and opens a blank page.
    ///
    /// `poll_interval` is how often selector waits re-query the DOM.
    pub async fn launch(
        config: &BrowserConfig,
        poll_interval: Duration,
    ) -> Result<Self, BrowserError> {
        let mut builder =
            LaunchConfig::builder().window_size(config.window_width, config.window_height);
        if !config.headless {
            builder = builder.with_head();
        }
        if let Some(path) = &config.executable {
            builder = builder.chrome_executable(path);
        }
        let launch_config = builder.build().map_err(BrowserError::Launch)?;

        let (browser, mut handler) = Browser::launch(launch_config).await?;

        // The protocol connection only makes progress while its event stream
        // is polled.
        let handler = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if event.is_err() {
                    break;
                }
            }
        });

        let page = browser.new_page("about:blank").await?;
        if config.disable_cache {
            page.execute(SetCacheDisabledParams::new(true)).await?;
        }

        Ok(Self {
            browser,
            page,
            handler: Some(handler),
            poll_interval,
        })
    }
}

/// Builds a script returning the resolved `src` of the first match, or null.
fn media_src_script(selector: &str) -> Result<String, BrowserError> {
    let literal =
        serde_json::to_string(selector).map_err(|e| BrowserError::Evaluation(e.to_string()))?;
    Ok(format!(
        "(() => {{ const el = document.querySelector({}); return el ? el.src : null; }})()",
        literal
    ))
}

async fn page_has_element(page: &Page, selector: &str) -> Result<bool, BrowserError> {
    let elements = page.find_elements(selector).await?;
    Ok(!elements.is_empty())
}

/// Re-runs `check` every `interval` until it reports a match or `timeout`
/// passes.
///
/// Queries can fail while a navigation swaps the document out, so a failed
/// poll is retried. The last error is only returned if no poll ever got an
/// answer.
async fn poll_until<F, Fut>(
    timeout: Duration,
    interval: Duration,
    mut check: F,
) -> Result<bool, BrowserError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<bool, BrowserError>>,
{
    let deadline = Instant::now() + timeout.min(MAX_WAIT);
    let mut answered = false;
    let mut last_error = None;

    loop {
        match check().await {
            Ok(true) => return Ok(true),
            Ok(false) => answered = true,
            Err(e) => last_error = Some(e),
        }
        if Instant::now() >= deadline {
            return match last_error {
                Some(e) if !answered => Err(e),
                _ => Ok(false),
            };
        }
        tokio::time::sleep(interval).await;
    }
}

#[async_trait]
impl BrowserSession for ChromeSession {
    async fn goto(&mut self, url: &str) -> Result<(), BrowserError> {
        self.page.goto(url).await?;
        Ok(())
    }

    async fn has_element(&mut self, selector: &str) -> Result<bool, BrowserError> {
        page_has_element(&self.page, selector).await
    }

    async fn wait_for(
        &mut self,
        selector: &str,
        timeout: Duration,
    ) -> Result<bool, BrowserError> {
        let page = &self.page;
        poll_until(timeout, self.poll_interval, move || {
            page_has_element(page, selector)
        })
        .await
    }

    async fn click(&mut self, selector: &str, timeout: Duration) -> Result<(), BrowserError> {
        if !self.wait_for(selector, timeout).await? {
            return Err(BrowserError::ElementNotFound(selector.to_string()));
        }
        self.page.find_element(selector).await?.click().await?;
        Ok(())
    }

    async fn media_src(&mut self, selector: &str) -> Result<Option<String>, BrowserError> {
        let result = self.page.evaluate(media_src_script(selector)?).await?;
        match result.value() {
            Some(JsonValue::String(src)) if !src.is_empty() => Ok(Some(src.clone())),
            Some(JsonValue::String(_)) | Some(JsonValue::Null) | None => Ok(None),
            Some(other) => Err(BrowserError::Evaluation(format!(
                "expected a string src for {}, got {}",
                selector, other
            ))),
        }
    }

    async fn outer_html_all(&mut self, selector: &str) -> Result<Vec<String>, BrowserError> {
        let elements = self.page.find_elements(selector).await?;
        let mut markup = Vec::with_capacity(elements.len());
        for element in elements {
            if let Some(html) = element.outer_html().await? {
                markup.push(html);
            }
        }
        Ok(markup)
    }

    async fn close(&mut self) -> Result<(), BrowserError> {
        self.browser.close().await?;
        if let Some(handler) = self.handler.take() {
            let _ = handler.await;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_media_src_script_quotes_selector() {
        let script = media_src_script(r#"a[href$="x"] + img"#).unwrap();
        assert!(script.contains(r#"document.querySelector("a[href$=\"x\"] + img")"#));
        assert!(script.ends_with("})()"));
    }

    fn detached() -> BrowserError {
        BrowserError::Evaluation("document detached".to_string())
    }

    #[tokio::test]
    async fn test_poll_until_reports_persistent_failure() {
        let mut calls = 0;
        let result = poll_until(Duration::from_millis(20), Duration::from_millis(1), || {
            calls += 1;
            std::future::ready(Err(detached()))
        })
        .await;

        assert!(matches!(result, Err(BrowserError::Evaluation(_))));
        assert!(calls > 1);
    }

    #[tokio::test]
    async fn test_poll_until_transient_failure_then_absent() {
        let mut calls = 0;
        let result = poll_until(Duration::from_millis(20), Duration::from_millis(1), || {
            calls += 1;
            std::future::ready(if calls == 1 { Err(detached()) } else { Ok(false) })
        })
        .await;

        assert!(matches!(result, Ok(false)));
    }

    #[tokio::test]
    async fn test_poll_until_transient_failure_then_found() {
        let mut calls = 0;
        let result = poll_until(Duration::from_secs(5), Duration::from_millis(1), || {
            calls += 1;
            std::future::ready(if calls == 1 { Err(detached()) } else { Ok(true) })
        })
        .await;

        assert!(matches!(result, Ok(true)));
        assert_eq!(calls, 2);
    }

    #[tokio::test]
    async fn test_poll_until_checks_once_with_zero_timeout() {
        let mut calls = 0;
        let result = poll_until(Duration::ZERO, Duration::from_millis(1), || {
            calls += 1;
            std::future::ready(Ok(false))
        })
        .await;

        assert!(matches!(result, Ok(false)));
        assert_eq!(calls, 1);
    }
}
