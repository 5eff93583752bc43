//! Page fetcher interface and HTTP implementation
//!
//! This module defines:
//! - The `PageFetcher` trait every backend implements
//! - `FetchError` and its retry classification
//! - `HttpFetcher`, a plain reqwest backend for server-rendered sources
//! - `fetch_or_empty`, the empty-string-on-failure wrapper used for detail pages

use crate::config::CrawlerConfig;
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use std::time::Duration;
use thiserror::Error;

/// Errors that can occur while fetching a page
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("Timed out after {timeout_ms}ms fetching {url}")]
    Timeout { url: String, timeout_ms: u64 },

    #[error("HTTP {status} from {url}")]
    Status { url: String, status: u16 },

    #[error("Network error fetching {url}: {message}")]
    Network { url: String, message: String },

    #[error("Browser error: {0}")]
    Browser(String),

    #[error("Fetcher has been shut down")]
    Closed,
}

impl FetchError {
    /// Returns true if another attempt might succeed
    ///
    /// | Error | Retry |
    /// |-------|-------|
    /// | Timeout | yes |
    /// | Network | yes |
    /// | Browser | yes |
    /// | HTTP 429, 5xx | yes |
    /// | Other HTTP status | no |
    /// | Closed | no |
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Timeout { .. } | Self::Network { .. } | Self::Browser(_) => true,
            Self::Status { status, .. } => {
                *status == StatusCode::TOO_MANY_REQUESTS.as_u16() || *status >= 500
            }
            Self::Closed => false,
        }
    }
}

/// A source of rendered page markup
///
/// Implementations are driven sequentially by one coordinator and may hold
/// long-lived resources such as a browser session.
#[async_trait]
pub trait PageFetcher: Send {
    /// Fetches `url` and returns its markup
    async fn fetch(&mut self, url: &str) -> Result<String, FetchError>;

    /// Releases the fetcher's resources
    ///
    /// Called once when the run ends, whatever the reason.
    async fn shutdown(&mut self) -> Result<(), FetchError>;
}

/// Fetches a page, turning any failure into an empty string
///
/// Used for job detail pages, where a missing description must not abandon
/// the posting.
pub async fn fetch_or_empty<F: PageFetcher + ?Sized>(fetcher: &mut F, url: &str) -> String {
    match fetcher.fetch(url).await {
        Ok(html) => html,
        Err(e) => {
            tracing::warn!("Failed to fetch {}: {}", url, e);
            String::new()
        }
    }
}

/// Builds an HTTP client with proper configuration
///
/// # Arguments
///
/// * `config` - The crawler configuration (user agent and timeout)
///
/// # Returns
///
/// * `Ok(Client)` - Successfully built HTTP client
/// * `Err(reqwest::Error)` - Failed to build client
pub fn build_http_client(config: &CrawlerConfig) -> Result<Client, reqwest::Error> {
    Client::builder()
        .user_agent(config.user_agent.as_str())
        .timeout(Duration::from_millis(config.nav_timeout))
        .connect_timeout(Duration::from_secs(10))
        .gzip(true)
        .brotli(true)
        .build()
}

/// Fetcher that issues plain GET requests
pub struct HttpFetcher {
    client: Client,
    timeout_ms: u64,
}

impl HttpFetcher {
    pub fn new(config: &CrawlerConfig) -> Result<Self, reqwest::Error> {
        Ok(Self {
            client: build_http_client(config)?,
            timeout_ms: config.nav_timeout,
        })
    }
}

#[async_trait]
impl PageFetcher for HttpFetcher {
    async fn fetch(&mut self, url: &str) -> Result<String, FetchError> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| self.classify(url, e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        response.text().await.map_err(|e| self.classify(url, e))
    }

    async fn shutdown(&mut self) -> Result<(), FetchError> {
        Ok(())
    }
}

impl HttpFetcher {
    fn classify(&self, url: &str, error: reqwest::Error) -> FetchError {
        if error.is_timeout() {
            FetchError::Timeout {
                url: url.to_string(),
                timeout_ms: self.timeout_ms,
            }
        } else {
            FetchError::Network {
                url: url.to_string(),
                message: error.to_string(),
            }
        }
    }
}
