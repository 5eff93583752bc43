//! Crawler module for listing page fetching and processing
//!
//! This module contains the core crawling logic, including:
//! - Page fetching through a browser or plain HTTP, with retry logic
//! - Listing and detail page parsing
//! - Cooperative shutdown
//! - Overall crawl coordination

mod browser;
mod coordinator;
mod fetcher;
mod parser;
mod retry;
mod shutdown;

pub use browser::BrowserFetcher;
pub use coordinator::{run_crawl, Coordinator};
pub use fetcher::{build_http_client, fetch_or_empty, FetchError, HttpFetcher, PageFetcher};
pub use parser::{parse_description, parse_listing, CompiledSelectors};
pub use retry::{RetryPolicy, RetryingFetcher};
pub use shutdown::Shutdown;
