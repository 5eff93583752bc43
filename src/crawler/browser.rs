//! Headless Chromium page fetcher
//!
//! One browser session and one tab are opened when the fetcher is built and
//! reused for every page of the run. Each fetch navigates the tab, waits a
//! fixed render interval for client-side scripts, then reads the DOM.

use crate::config::CrawlerConfig;
use crate::crawler::fetcher::{FetchError, PageFetcher};
use async_trait::async_trait;
use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::Page;
use futures::StreamExt;
use std::time::Duration;
use tokio::task::JoinHandle;

/// Fetcher backed by a long-lived Chromium session
pub struct BrowserFetcher {
    browser: Option<Browser>,
    page: Option<Page>,
    handler: JoinHandle<()>,
    nav_timeout: Duration,
    render_wait: Duration,
}

impl BrowserFetcher {
    /// Launches Chromium and opens the working tab
    ///
    /// # Returns
    ///
    /// * `Ok(BrowserFetcher)` - Browser is running and ready to navigate
    /// * `Err(FetchError::Browser)` - Chromium could not be launched
    pub async fn launch(config: &CrawlerConfig) -> Result<Self, FetchError> {
        let nav_timeout = Duration::from_millis(config.nav_timeout);

        let mut builder = BrowserConfig::builder()
            .request_timeout(nav_timeout)
            .arg(format!("--user-agent={}", config.user_agent));
        if !config.headless {
            builder = builder.with_head();
        }
        let browser_config = builder.build().map_err(FetchError::Browser)?;

        let (browser, mut handler) = Browser::launch(browser_config)
            .await
            .map_err(|e| FetchError::Browser(format!("failed to launch Chromium: {}", e)))?;

        // The CDP handler must be polled for the browser to make progress
        let handler = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if let Err(e) = event {
                    tracing::debug!("Browser handler stopped: {}", e);
                    break;
                }
            }
        });

        let page = match browser.new_page("about:blank").await {
            Ok(page) => page,
            Err(e) => {
                handler.abort();
                return Err(FetchError::Browser(format!("failed to open tab: {}", e)));
            }
        };

        tracing::info!(
            "Browser session started (headless: {}, nav timeout: {:?})",
            config.headless,
            nav_timeout
        );

        Ok(Self {
            browser: Some(browser),
            page: Some(page),
            handler,
            nav_timeout,
            render_wait: Duration::from_millis(config.render_wait),
        })
    }
}

#[async_trait]
impl PageFetcher for BrowserFetcher {
    async fn fetch(&mut self, url: &str) -> Result<String, FetchError> {
        let page = self.page.as_ref().ok_or(FetchError::Closed)?;

        match tokio::time::timeout(self.nav_timeout, page.goto(url)).await {
            Ok(Ok(_)) => {}
            Ok(Err(e)) => {
                return Err(FetchError::Browser(format!(
                    "navigation to {} failed: {}",
                    url, e
                )))
            }
            Err(_) => {
                return Err(FetchError::Timeout {
                    url: url.to_string(),
                    timeout_ms: self.nav_timeout.as_millis() as u64,
                })
            }
        }

        tokio::time::sleep(self.render_wait).await;

        page.content()
            .await
            .map_err(|e| FetchError::Browser(format!("failed to read DOM of {}: {}", url, e)))
    }

    async fn shutdown(&mut self) -> Result<(), FetchError> {
        if let Some(page) = self.page.take() {
            if let Err(e) = page.close().await {
                tracing::warn!("Failed to close tab: {}", e);
            }
        }

        let result = match self.browser.take() {
            Some(mut browser) => {
                let closed = browser
                    .close()
                    .await
                    .map(|_| ())
                    .map_err(|e| FetchError::Browser(format!("failed to close browser: {}", e)));
                if let Err(e) = browser.wait().await {
                    tracing::warn!("Failed to reap browser process: {}", e);
                }
                closed
            }
            None => Ok(()),
        };

        self.handler.abort();
        tracing::info!("Browser session closed");
        result
    }
}

impl Drop for BrowserFetcher {
    fn drop(&mut self) {
        self.handler.abort();
    }
}
