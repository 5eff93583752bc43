//! Crawler coordinator - main crawl orchestration logic
//!
//! This module contains the crawl loop that walks the search result pages
//! in order:
//! - Fetching each listing page and parsing its job cards
//! - Fetching each card's detail page for the description
//! - Extracting, hashing and persisting the postings
//! - Tracking session counters and stop conditions
//! - Handling interrupts and logging the session

use crate::config::{Config, FetchBackend};
use crate::crawler::browser::BrowserFetcher;
use crate::crawler::fetcher::{fetch_or_empty, HttpFetcher, PageFetcher};
use crate::crawler::parser::{parse_description, parse_listing, CompiledSelectors};
use crate::crawler::retry::{RetryPolicy, RetryingFetcher};
use crate::crawler::shutdown::Shutdown;
use crate::extract::FieldExtractor;
use crate::posting::JobPosting;
use crate::state::{CrawlSession, CrawlState, PageOutcome, PageTally, StopReason};
use crate::storage::{open_storage, InsertOutcome, SqliteStorage, Storage};
use crate::TideError;
use chrono::{DateTime, Utc};
use std::path::Path;
use std::time::{Duration, Instant};
use tracing::Instrument;
use url::Url;

/// Pages between progress reports
const PROGRESS_INTERVAL: u32 = 5;

/// Main crawler coordinator structure
pub struct Coordinator {
    config: Config,
    fetcher: Box<dyn PageFetcher>,
    storage: SqliteStorage,
    extractor: FieldExtractor,
    selectors: CompiledSelectors,
    base_url: Url,
    shutdown: Shutdown,
    last_scraped: Option<DateTime<Utc>>,
}

impl Coordinator {
    /// Creates a new coordinator instance
    ///
    /// # Arguments
    ///
    /// * `config` - The validated configuration
    /// * `fetcher` - Page source; owned by the coordinator for the whole run
    /// * `storage` - Opened database
    /// * `shutdown` - Cancellation handle observed between steps
    pub fn new(
        config: Config,
        fetcher: Box<dyn PageFetcher>,
        storage: SqliteStorage,
        shutdown: Shutdown,
    ) -> Result<Self, TideError> {
        let selectors = CompiledSelectors::new(&config.selectors)?;
        let base_url = Url::parse(&config.source.base_url)?;
        let extractor = FieldExtractor::new(&config.extraction);

        Ok(Self {
            config,
            fetcher,
            storage,
            extractor,
            selectors,
            base_url,
            shutdown,
            last_scraped: None,
        })
    }

    /// Runs the crawl to completion
    ///
    /// The fetcher is shut down and the session logged exactly once,
    /// however the run stops.
    ///
    /// # Returns
    ///
    /// * `Ok(CrawlSession)` - The finished session
    /// * `Err(TideError)` - The session could not be written to the log
    pub async fn run(&mut self) -> Result<CrawlSession, TideError> {
        let span = tracing::info_span!("crawl", source = %self.config.source.base_url);
        self.crawl().instrument(span).await
    }

    async fn crawl(&mut self) -> Result<CrawlSession, TideError> {
        let max_pages = self.config.crawler.max_pages;
        let mut session = CrawlSession::new(Utc::now());
        let start_time = Instant::now();

        tracing::info!("Starting crawl of up to {} pages", max_pages);

        let mut state = CrawlState::Idle.start(max_pages);
        while let CrawlState::Running { page } = state {
            if self.shutdown.is_triggered() {
                state = state.interrupt();
                break;
            }

            let outcome = self.process_page(page, &mut session).await;
            state = state.advance(outcome, max_pages);

            if page % PROGRESS_INTERVAL == 0 {
                tracing::info!(
                    "Progress: {} pages scraped, {} jobs found, {} new, {} errors",
                    session.pages_scraped,
                    session.jobs_found,
                    session.jobs_inserted,
                    session.errors
                );
            }

            if !state.is_stopped() {
                self.pause_between_pages().await;
            }
        }

        let reason = state.stop_reason().unwrap_or(StopReason::Interrupted);
        session.finish(reason);

        tracing::info!(
            "Crawl stopped ({}) after {:?}: {} pages, {} jobs found, {} inserted, {} duplicates, {} errors",
            reason,
            start_time.elapsed(),
            session.pages_scraped,
            session.jobs_found,
            session.jobs_inserted,
            session.duplicates_found,
            session.errors
        );

        let logged = self.storage.log_session(&session);

        if let Err(e) = self.fetcher.shutdown().await {
            tracing::warn!("Failed to shut down fetcher: {}", e);
        }

        match logged {
            Ok(id) => {
                tracing::info!("Session {} logged with status {}", id, session.status());
                Ok(session)
            }
            Err(e) => {
                tracing::error!("Failed to log session: {}", e);
                Err(e.into())
            }
        }
    }

    /// Processes a single listing page
    ///
    /// Counters are gathered in a page-local tally and merged into the
    /// session only once the page has been persisted, so an interrupted
    /// page leaves no trace.
    async fn process_page(&mut self, page: u32, session: &mut CrawlSession) -> PageOutcome {
        let url = self.config.source.page_url(page);
        tracing::info!("Scraping page {}: {}", page, url);

        let html = match self.fetcher.fetch(&url).await {
            Ok(html) => html,
            Err(_) if self.shutdown.is_triggered() => return self.discard(page),
            Err(e) => {
                tracing::warn!("Failed to fetch listing page {}: {}", page, e);
                session.record_failed_page();
                return PageOutcome::Failed;
            }
        };

        if self.shutdown.is_triggered() {
            return self.discard(page);
        }

        let fragments = parse_listing(&html, &self.selectors, &self.base_url);
        if fragments.is_empty() {
            tracing::warn!("No job cards on page {}, reached end of results", page);
            return PageOutcome::Empty;
        }

        let mut postings = Vec::with_capacity(fragments.len());
        for fragment in &fragments {
            if self.shutdown.is_triggered() {
                return self.discard(page);
            }

            let description = if fragment.url.is_empty() {
                String::new()
            } else {
                let detail = fetch_or_empty(self.fetcher.as_mut(), &fragment.url).await;
                parse_description(&detail, &self.selectors)
            };

            let scraped_at = self.next_scrape_time();
            postings.push(self.extractor.build_posting(fragment, description, scraped_at));
        }

        if self.shutdown.is_triggered() {
            return self.discard(page);
        }

        let tally = self.persist(&postings);
        session.commit_page(&tally);

        tracing::info!(
            "Page {}: {} jobs found, {} new, {} duplicates",
            page,
            tally.jobs_found,
            tally.jobs_inserted,
            tally.duplicates_found
        );

        PageOutcome::from_count(fragments.len())
    }

    fn persist(&mut self, postings: &[JobPosting]) -> PageTally {
        let mut tally = PageTally {
            jobs_found: postings.len() as u32,
            ..PageTally::default()
        };

        for posting in postings {
            match self.storage.insert_posting(posting) {
                Ok(InsertOutcome::Inserted(id)) => {
                    tally.jobs_inserted += 1;
                    tracing::debug!("Inserted #{}: {} at {}", id, posting.title, posting.company);
                }
                Ok(InsertOutcome::Duplicate) => {
                    tally.duplicates_found += 1;
                    tracing::debug!("Duplicate: {} at {}", posting.title, posting.company);
                }
                Err(e) => {
                    tally.errors += 1;
                    tracing::error!(
                        "Failed to store {} at {}: {}",
                        posting.title,
                        posting.company,
                        e
                    );
                }
            }
        }

        tally
    }

    fn discard(&self, page: u32) -> PageOutcome {
        tracing::info!("Shutdown requested, discarding page {}", page);
        PageOutcome::Interrupted
    }

    /// Scrape timestamp that never goes backwards within a run
    fn next_scrape_time(&mut self) -> DateTime<Utc> {
        let now = Utc::now();
        let scraped_at = match self.last_scraped {
            Some(last) if last > now => last,
            _ => now,
        };
        self.last_scraped = Some(scraped_at);
        scraped_at
    }

    /// Waits the inter-page delay, returning early on shutdown
    async fn pause_between_pages(&self) {
        let delay = Duration::from_millis(self.config.crawler.inter_page_delay);
        if delay.is_zero() {
            return;
        }

        tokio::select! {
            _ = tokio::time::sleep(delay) => {}
            _ = self.shutdown.wait() => {
                tracing::info!("Shutdown requested during inter-page delay");
            }
        }
    }
}

/// Runs the main crawl operation
///
/// This function:
///
/// 1. Opens the database
/// 2. Starts the configured fetch backend behind the retry policy
/// 3. Walks the result pages until the results end, the page budget is
///    used up or `shutdown` is triggered
/// 4. Logs the session
///
/// # Arguments
///
/// * `config` - The crawler configuration
/// * `shutdown` - Cancellation handle, usually wired to Ctrl-C
///
/// # Example
///
/// ```no_run
/// use job_tide::config::load_config;
/// use job_tide::crawler::{run_crawl, Shutdown};
/// use std::path::Path;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let config = load_config(Path::new("config.toml"))?;
/// let session = run_crawl(config, Shutdown::new()).await?;
/// println!("{} new postings", session.jobs_inserted);
/// # Ok(())
/// # }
/// ```
pub async fn run_crawl(config: Config, shutdown: Shutdown) -> Result<CrawlSession, TideError> {
    let storage = open_storage(Path::new(&config.output.database_path))?;

    let backend: Box<dyn PageFetcher> = match config.crawler.backend {
        FetchBackend::Browser => Box::new(BrowserFetcher::launch(&config.crawler).await?),
        FetchBackend::Http => Box::new(HttpFetcher::new(&config.crawler)?),
    };
    let fetcher = RetryingFetcher::new(backend, RetryPolicy::from(&config.retry))
        .with_shutdown(shutdown.clone());

    let mut coordinator = Coordinator::new(config, Box::new(fetcher), storage, shutdown)?;
    coordinator.run().await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{
        CrawlerConfig, ExtractionConfig, OutputConfig, RetryConfig, SelectorConfig, SourceConfig,
    };
    use crate::crawler::FetchError;
    use crate::state::SessionStatus;
    use async_trait::async_trait;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Arc;
    use tempfile::TempDir;

    const BASE: &str = "https://jobs.example.com";

    enum Script {
        Html(String),
        Fail,
    }

    /// Serves canned pages; unknown URLs fail with a 404
    struct ScriptedFetcher {
        pages: HashMap<String, Script>,
        trigger_on: Option<(String, Shutdown)>,
        closed: Arc<AtomicBool>,
    }

    #[async_trait]
    impl PageFetcher for ScriptedFetcher {
        async fn fetch(&mut self, url: &str) -> Result<String, FetchError> {
            if let Some((trigger_url, shutdown)) = &self.trigger_on {
                if trigger_url == url {
                    shutdown.trigger();
                }
            }

            match self.pages.get(url) {
                Some(Script::Html(html)) => Ok(html.clone()),
                Some(Script::Fail) => Err(FetchError::Timeout {
                    url: url.to_string(),
                    timeout_ms: 1,
                }),
                None => Err(FetchError::Status {
                    url: url.to_string(),
                    status: 404,
                }),
            }
        }

        async fn shutdown(&mut self) -> Result<(), FetchError> {
            self.closed.store(true, Ordering::SeqCst);
            Ok(())
        }
    }

    fn page_url(page: u32) -> String {
        if page == 1 {
            format!("{}/data-analyst-jobs", BASE)
        } else {
            format!("{}/data-analyst-jobs-{}", BASE, page)
        }
    }

    /// Listing markup for (slug, title, company, location) cards
    fn listing(cards: &[(&str, &str, &str, &str)]) -> Script {
        let body: String = cards
            .iter()
            .map(|(slug, title, company, location)| {
                format!(
                    r#"<div class="srp-jobtuple-wrapper">
                        <a class="title" href="/job/{}">{}</a>
                        <a class="subTitle">{}</a>
                        <li class="location">{}</li>
                        <li class="experience">2-4 Yrs</li>
                    </div>"#,
                    slug, title, company, location
                )
            })
            .collect();
        Script::Html(format!("<html><body>{}</body></html>", body))
    }

    fn detail(text: &str) -> Script {
        Script::Html(format!(
            r#"<html><body><div class="job-description">{}</div></body></html>"#,
            text
        ))
    }

    fn config(dir: &TempDir, max_pages: u32) -> Config {
        Config {
            source: SourceConfig {
                base_url: BASE.to_string(),
                search_path: "data-analyst-jobs".to_string(),
            },
            crawler: CrawlerConfig {
                max_pages,
                inter_page_delay: 0,
                nav_timeout: 1_000,
                render_wait: 0,
                backend: FetchBackend::Http,
                user_agent: "JobTideTest/1.0".to_string(),
                headless: true,
            },
            retry: RetryConfig::default(),
            output: OutputConfig {
                database_path: dir.path().join("jobs.db").to_string_lossy().into_owned(),
            },
            extraction: ExtractionConfig::default(),
            selectors: SelectorConfig::default(),
        }
    }

    struct Harness {
        coordinator: Coordinator,
        storage: SqliteStorage,
        closed: Arc<AtomicBool>,
        dir: TempDir,
    }

    fn harness(
        max_pages: u32,
        pages: Vec<(String, Script)>,
        trigger_on: Option<String>,
    ) -> (Harness, Shutdown) {
        let dir = tempfile::tempdir().unwrap();
        let config = config(&dir, max_pages);
        let storage = open_storage(Path::new(&config.output.database_path)).unwrap();
        let shutdown = Shutdown::new();
        let closed = Arc::new(AtomicBool::new(false));

        let fetcher = ScriptedFetcher {
            pages: pages.into_iter().collect(),
            trigger_on: trigger_on.map(|url| (url, shutdown.clone())),
            closed: closed.clone(),
        };

        let coordinator =
            Coordinator::new(config, Box::new(fetcher), storage.clone(), shutdown.clone())
                .unwrap();

        (
            Harness {
                coordinator,
                storage,
                closed,
                dir,
            },
            shutdown,
        )
    }

    #[tokio::test]
    async fn test_empty_page_ends_results() {
        let pages = vec![
            (
                page_url(1),
                listing(&[
                    ("a", "Data Analyst", "Acme", "Pune"),
                    ("b", "BI Analyst", "Globex", "Mumbai"),
                ]),
            ),
            (format!("{}/job/a", BASE), detail("Python and SQL")),
            (
                page_url(2),
                listing(&[
                    ("c", "Senior Data Analyst", "Initech", "Bengaluru, India"),
                    ("d", "Reporting Analyst", "Umbrella", "Delhi"),
                ]),
            ),
            (page_url(3), Script::Html("<html><body></body></html>".to_string())),
        ];
        let (mut h, _shutdown) = harness(5, pages, None);

        let session = h.coordinator.run().await.unwrap();

        assert_eq!(session.pages_scraped, 2);
        assert_eq!(session.jobs_found, 4);
        assert_eq!(session.jobs_inserted, 4);
        assert_eq!(session.errors, 0);
        assert_eq!(session.status(), SessionStatus::Completed);
        assert_eq!(session.stop_reason, Some(StopReason::EndOfResults));

        assert_eq!(h.storage.count_postings().unwrap(), 4);
        assert_eq!(h.storage.recent_sessions(10).unwrap().len(), 1);
        assert!(h.closed.load(Ordering::SeqCst));

        let stored = h.storage.get_postings(chrono::Duration::days(1)).unwrap();
        let first = stored.iter().find(|p| p.posting.title == "Data Analyst").unwrap();
        assert_eq!(first.posting.description, "Python and SQL");
        assert_eq!(first.posting.skills.len(), 2);

        // Detail page missing: posting kept with an empty description
        let second = stored.iter().find(|p| p.posting.title == "BI Analyst").unwrap();
        assert_eq!(second.posting.description, "");
    }

    #[tokio::test]
    async fn test_failed_listing_page_counts_error_and_continues() {
        let pages = vec![
            (page_url(1), listing(&[("a", "Data Analyst", "Acme", "Pune")])),
            (page_url(2), Script::Fail),
            (page_url(3), listing(&[("c", "BI Analyst", "Globex", "Pune")])),
        ];
        let (mut h, _shutdown) = harness(3, pages, None);

        let session = h.coordinator.run().await.unwrap();

        assert_eq!(session.pages_scraped, 2);
        assert_eq!(session.errors, 1);
        assert_eq!(session.jobs_inserted, 2);
        assert_eq!(session.status(), SessionStatus::CompletedWithErrors);
        assert_eq!(session.stop_reason, Some(StopReason::PageBudgetExhausted));

        let logged = h.storage.recent_sessions(1).unwrap();
        assert_eq!(logged[0].status, SessionStatus::CompletedWithErrors);
        assert_eq!(logged[0].errors, 1);
    }

    #[tokio::test]
    async fn test_interrupt_discards_in_flight_page() {
        let pages = vec![
            (
                page_url(1),
                listing(&[
                    ("a", "Data Analyst", "Acme", "Pune"),
                    ("b", "BI Analyst", "Globex", "Pune"),
                ]),
            ),
            (page_url(2), listing(&[("c", "Senior Analyst", "Initech", "Pune")])),
            (page_url(3), listing(&[("d", "Reporting Analyst", "Umbrella", "Pune")])),
        ];
        let (mut h, shutdown) = harness(5, pages, Some(page_url(2)));

        let session = h.coordinator.run().await.unwrap();

        assert!(shutdown.is_triggered());
        assert_eq!(session.stop_reason, Some(StopReason::Interrupted));
        assert_eq!(session.pages_scraped, 1);
        assert_eq!(session.jobs_found, 2);
        assert_eq!(session.status(), SessionStatus::Completed);

        assert_eq!(h.storage.count_postings().unwrap(), 2);
        assert_eq!(h.storage.recent_sessions(10).unwrap().len(), 1);
        assert!(h.closed.load(Ordering::SeqCst));
    }

    #[tokio::test]
    async fn test_shutdown_before_start_logs_empty_session() {
        let pages = vec![(page_url(1), listing(&[("a", "Data Analyst", "Acme", "Pune")]))];
        let (mut h, shutdown) = harness(3, pages, None);
        shutdown.trigger();

        let session = h.coordinator.run().await.unwrap();

        assert_eq!(session.pages_scraped, 0);
        assert_eq!(session.stop_reason, Some(StopReason::Interrupted));
        assert_eq!(h.storage.count_postings().unwrap(), 0);
        assert_eq!(h.storage.recent_sessions(10).unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_duplicates_across_pages() {
        let pages = vec![
            (page_url(1), listing(&[("a", "Data Analyst", "Acme Pvt Ltd", "Pune")])),
            (
                page_url(2),
                listing(&[
                    ("a2", "Data  Analyst", "ACME", "Pune, India"),
                    ("b", "BI Analyst", "Globex", "Pune"),
                ]),
            ),
        ];
        let (mut h, _shutdown) = harness(2, pages, None);

        let session = h.coordinator.run().await.unwrap();

        assert_eq!(session.jobs_found, 3);
        assert_eq!(session.jobs_inserted, 2);
        assert_eq!(session.duplicates_found, 1);
        assert_eq!(h.storage.count_postings().unwrap(), 2);
    }

    #[tokio::test]
    async fn test_scrape_times_are_monotonic() {
        let pages = vec![(
            page_url(1),
            listing(&[
                ("a", "Data Analyst", "Acme", "Pune"),
                ("b", "BI Analyst", "Globex", "Pune"),
                ("c", "Senior Analyst", "Initech", "Pune"),
            ]),
        )];
        let (mut h, _shutdown) = harness(1, pages, None);

        h.coordinator.run().await.unwrap();

        let stored = h.storage.get_postings(chrono::Duration::days(1)).unwrap();
        assert_eq!(stored.len(), 3);
        assert!(stored
            .windows(2)
            .all(|w| w[0].posting.date_scraped <= w[1].posting.date_scraped));
    }

    #[tokio::test]
    async fn test_rejected_insert_counts_error_and_leaves_no_partial_rows() {
        let pages = vec![
            (
                page_url(1),
                listing(&[
                    ("a", "Data Analyst", "Acme", "Pune"),
                    ("b", "Boom", "Globex", "Mumbai"),
                    ("c", "BI Analyst", "Initech", "Delhi"),
                ]),
            ),
            (format!("{}/job/a", BASE), detail("Python and SQL")),
            (format!("{}/job/c", BASE), detail("Tableau dashboards")),
            (
                page_url(2),
                listing(&[("d", "Reporting Analyst", "Umbrella", "Noida")]),
            ),
            (page_url(3), Script::Html("<html><body></body></html>".to_string())),
        ];
        let (mut h, _shutdown) = harness(5, pages, None);

        // Reject one posting outright and another one at its skill rows
        let conn = rusqlite::Connection::open(h.dir.path().join("jobs.db")).unwrap();
        conn.execute_batch(
            "CREATE TRIGGER reject_boom BEFORE INSERT ON job_postings
                 WHEN NEW.title = 'Boom'
             BEGIN SELECT RAISE(ABORT, 'posting rejected'); END;
             CREATE TRIGGER reject_tableau BEFORE INSERT ON job_skills
                 WHEN NEW.skill = 'tableau'
             BEGIN SELECT RAISE(ABORT, 'skill rejected'); END;",
        )
        .unwrap();

        let session = h.coordinator.run().await.unwrap();

        assert_eq!(session.pages_scraped, 2);
        assert_eq!(session.jobs_found, 4);
        assert_eq!(session.jobs_inserted, 2);
        assert_eq!(session.errors, 2);
        assert_eq!(session.status(), SessionStatus::CompletedWithErrors);
        assert_eq!(session.stop_reason, Some(StopReason::EndOfResults));

        assert_eq!(h.storage.count_postings().unwrap(), 2);
        let stored = h.storage.get_postings(chrono::Duration::days(1)).unwrap();
        let mut titles: Vec<&str> = stored.iter().map(|p| p.posting.title.as_str()).collect();
        titles.sort_unstable();
        assert_eq!(titles, vec!["Data Analyst", "Reporting Analyst"]);

        let orphans: i64 = conn
            .query_row(
                "SELECT COUNT(*) FROM job_skills WHERE job_id NOT IN (SELECT id FROM job_postings)",
                [],
                |row| row.get(0),
            )
            .unwrap();
        assert_eq!(orphans, 0);
        let skills: i64 = conn
            .query_row("SELECT COUNT(*) FROM job_skills", [], |row| row.get(0))
            .unwrap();
        assert_eq!(skills, 2);

        let logged = h.storage.recent_sessions(10).unwrap();
        assert_eq!(logged[0].errors, 2);
    }
}
