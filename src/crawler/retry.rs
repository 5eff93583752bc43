//! Retry policy for page fetches

use crate::config::RetryConfig;
use crate::crawler::fetcher::{FetchError, PageFetcher};
use crate::crawler::shutdown::Shutdown;
use async_trait::async_trait;
use std::time::Duration;

/// How many times a fetch is attempted and how long to back off between
/// attempts
#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    /// Total attempts, including the first
    pub max_attempts: u32,
    pub base_delay: Duration,
    pub backoff_multiplier: f64,
}

impl RetryPolicy {
    /// A policy that tries exactly once
    pub fn none() -> Self {
        Self {
            max_attempts: 1,
            base_delay: Duration::ZERO,
            backoff_multiplier: 1.0,
        }
    }

    /// Delay after the failed attempt number `attempt` (1-based)
    ///
    /// `base_delay * backoff_multiplier^(attempt - 1)`
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1).min(i32::MAX as u32) as i32;
        let nanos = self.base_delay.as_nanos() as f64 * self.backoff_multiplier.powi(exponent);

        if nanos.is_finite() && nanos < u64::MAX as f64 {
            Duration::from_nanos(nanos as u64)
        } else {
            Duration::MAX
        }
    }
}

impl From<&RetryConfig> for RetryPolicy {
    fn from(config: &RetryConfig) -> Self {
        Self {
            max_attempts: config.max_attempts.max(1),
            base_delay: Duration::from_millis(config.base_delay),
            backoff_multiplier: config.backoff_multiplier,
        }
    }
}

/// Wraps a fetcher and retries retryable failures with backoff
///
/// With a shutdown handle attached, a pending backoff ends as soon as
/// shutdown is triggered and the last error is returned.
pub struct RetryingFetcher {
    inner: Box<dyn PageFetcher>,
    policy: RetryPolicy,
    shutdown: Option<Shutdown>,
}

impl RetryingFetcher {
    pub fn new(inner: Box<dyn PageFetcher>, policy: RetryPolicy) -> Self {
        Self {
            inner,
            policy,
            shutdown: None,
        }
    }

    pub fn with_shutdown(mut self, shutdown: Shutdown) -> Self {
        self.shutdown = Some(shutdown);
        self
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }
}

#[async_trait]
impl PageFetcher for RetryingFetcher {
    async fn fetch(&mut self, url: &str) -> Result<String, FetchError> {
        let mut attempt = 1;
        loop {
            match self.inner.fetch(url).await {
                Ok(html) => return Ok(html),
                Err(e) if e.is_retryable() && attempt < self.policy.max_attempts => {
                    if self.shutdown.as_ref().is_some_and(Shutdown::is_triggered) {
                        return Err(e);
                    }

                    let delay = self.policy.delay_for(attempt);
                    tracing::warn!(
                        "Attempt {}/{} for {} failed: {}; retrying in {:?}",
                        attempt,
                        self.policy.max_attempts,
                        url,
                        e,
                        delay
                    );
                    match &self.shutdown {
                        Some(shutdown) => {
                            tokio::select! {
                                _ = tokio::time::sleep(delay) => {}
                                _ = shutdown.wait() => {
                                    tracing::info!("Shutdown requested, abandoning retries for {}", url);
                                    return Err(e);
                                }
                            }
                        }
                        None => tokio::time::sleep(delay).await,
                    }
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }

    async fn shutdown(&mut self) -> Result<(), FetchError> {
        self.inner.shutdown().await
    }
}
