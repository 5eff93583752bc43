//! Integration tests for the crawler
//!
//! These tests use wiremock to serve listing and detail pages and drive the
//! full crawl cycle end-to-end over the HTTP backend.

use job_tide::config::{
    Config, CrawlerConfig, ExtractionConfig, FetchBackend, OutputConfig, RetryConfig,
    SelectorConfig, SourceConfig,
};
use job_tide::crawler::{run_crawl, Shutdown};
use job_tide::state::{SessionStatus, StopReason};
use job_tide::storage::{open_storage, Storage};
use std::path::Path;
use tempfile::TempDir;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Creates a test configuration pointing at the mock server
fn create_test_config(base_url: &str, db_path: &Path, max_pages: u32, max_attempts: u32) -> Config {
    Config {
        source: SourceConfig {
            base_url: base_url.to_string(),
            search_path: "data-analyst-jobs".to_string(),
        },
        crawler: CrawlerConfig {
            max_pages,
            inter_page_delay: 10, // Very short for testing
            nav_timeout: 2_000,
            render_wait: 0,
            backend: FetchBackend::Http,
            user_agent: "JobTideTest/1.0".to_string(),
            headless: true,
        },
        retry: RetryConfig {
            max_attempts,
            base_delay: 1,
            backoff_multiplier: 2.0,
        },
        output: OutputConfig {
            database_path: db_path.to_string_lossy().into_owned(),
        },
        extraction: ExtractionConfig::default(),
        selectors: SelectorConfig::default(),
    }
}

fn job_card(slug: &str, title: &str, company: &str, location: &str) -> String {
    format!(
        r#"<div class="srp-jobtuple-wrapper">
            <a class="title" href="/job/{}">{}</a>
            <a class="subTitle">{}</a>
            <ul>
                <li class="experience">3-5 Yrs</li>
                <li class="salary">6-10 Lacs PA</li>
                <li class="location">{}</li>
            </ul>
            <span class="job-post-day">2 Days Ago</span>
        </div>"#,
        slug, title, company, location
    )
}

fn listing_page(cards: &[String]) -> String {
    format!(
        "<html><head><title>Jobs</title></head><body>{}</body></html>",
        cards.concat()
    )
}

fn detail_page(description: &str) -> String {
    format!(
        r#"<html><body><section class="job-description">{}</section></body></html>"#,
        description
    )
}

async fn mount_html(server: &MockServer, route: &str, body: String) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(body)
                .insert_header("content-type", "text/html"),
        )
        .mount(server)
        .await;
}

/// Two pages of results followed by an empty third page
async fn mount_two_pages(server: &MockServer) {
    mount_html(
        server,
        "/data-analyst-jobs",
        listing_page(&[
            job_card("a", "Data Analyst", "Acme Analytics Pvt Ltd", "Bengaluru, India"),
            job_card("b", "Business Analyst", "Globex", "Mumbai"),
        ]),
    )
    .await;
    mount_html(
        server,
        "/data-analyst-jobs-2",
        listing_page(&[
            job_card("c", "Senior Data Analyst", "Initech", "Pune"),
            job_card("d", "BI Developer", "Umbrella", "Gurgaon"),
        ]),
    )
    .await;
    mount_html(server, "/data-analyst-jobs-3", listing_page(&[])).await;

    mount_html(
        server,
        "/job/a",
        detail_page("Strong Python, SQL and Tableau skills required."),
    )
    .await;
    mount_html(server, "/job/b", detail_page("Excel and Power BI.")).await;
    mount_html(server, "/job/c", detail_page("Spark on AWS.")).await;
    // No mock for /job/d: the detail fetch fails with 404
}

#[tokio::test]
async fn test_full_crawl_until_end_of_results() {
    let server = MockServer::start().await;
    mount_two_pages(&server).await;

    let dir = TempDir::new().unwrap();
    let db_path = dir.path().join("jobs.db");
    let config = create_test_config(&server.uri(), &db_path, 10, 1);

    let session = run_crawl(config, Shutdown::new()).await.unwrap();

    assert_eq!(session.pages_scraped, 2);
    assert_eq!(session.jobs_found, 4);
    assert_eq!(session.jobs_inserted, 4);
    assert_eq!(session.duplicates_found, 0);
    assert_eq!(session.errors, 0);
    assert_eq!(session.stop_reason, Some(StopReason::EndOfResults));
    assert_eq!(session.status(), SessionStatus::Completed);

    let storage = open_storage(&db_path).unwrap();
    assert_eq!(storage.count_postings().unwrap(), 4);

    let postings = storage.get_postings(chrono::Duration::days(1)).unwrap();
    assert_eq!(postings.len(), 4);

    let analyst = postings
        .iter()
        .map(|p| &p.posting)
        .find(|p| p.title == "Data Analyst")
        .expect("posting should be stored");
    assert_eq!(analyst.location.as_option().map(String::as_str), Some("Bangalore"));
    assert_eq!(analyst.experience_min(), Some(3));
    assert_eq!(analyst.experience_max(), Some(5));
    assert_eq!(analyst.salary_min(), Some(6.0));
    assert_eq!(analyst.salary_max(), Some(10.0));
    assert_eq!(analyst.date_posted.as_deref(), Some("2 Days Ago"));
    assert!(analyst.source_url.ends_with("/job/a"));

    let mut skills: Vec<_> = analyst.skills.iter().map(|s| s.name.as_str()).collect();
    skills.sort_unstable();
    assert_eq!(skills, vec!["python", "sql", "tableau"]);

    let developer = postings
        .iter()
        .map(|p| &p.posting)
        .find(|p| p.title == "BI Developer")
        .expect("posting without description should still be stored");
    assert!(developer.description.is_empty());
    assert!(developer.skills.is_empty());

    let sessions = storage.recent_sessions(10).unwrap();
    assert_eq!(sessions.len(), 1);
    assert_eq!(sessions[0].pages_scraped, 2);
    assert_eq!(sessions[0].status, SessionStatus::Completed);
}

#[tokio::test]
async fn test_recrawl_only_counts_duplicates() {
    let server = MockServer::start().await;
    mount_two_pages(&server).await;

    let dir = TempDir::new().unwrap();
    let db_path = dir.path().join("jobs.db");

    let first = run_crawl(
        create_test_config(&server.uri(), &db_path, 10, 1),
        Shutdown::new(),
    )
    .await
    .unwrap();
    assert_eq!(first.jobs_inserted, 4);

    let second = run_crawl(
        create_test_config(&server.uri(), &db_path, 10, 1),
        Shutdown::new(),
    )
    .await
    .unwrap();
    assert_eq!(second.jobs_found, 4);
    assert_eq!(second.jobs_inserted, 0);
    assert_eq!(second.duplicates_found, 4);

    let storage = open_storage(&db_path).unwrap();
    assert_eq!(storage.count_postings().unwrap(), 4);
    assert_eq!(storage.recent_sessions(10).unwrap().len(), 2);
}

#[tokio::test]
async fn test_listing_failure_counts_error_and_continues() {
    let server = MockServer::start().await;

    mount_html(
        &server,
        "/data-analyst-jobs",
        listing_page(&[job_card("a", "Data Analyst", "Acme", "Pune")]),
    )
    .await;
    Mock::given(method("GET"))
        .and(path("/data-analyst-jobs-2"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;
    mount_html(
        &server,
        "/data-analyst-jobs-3",
        listing_page(&[job_card("c", "Data Engineer", "Initech", "Chennai")]),
    )
    .await;

    let dir = TempDir::new().unwrap();
    let db_path = dir.path().join("jobs.db");
    let config = create_test_config(&server.uri(), &db_path, 3, 2);

    let session = run_crawl(config, Shutdown::new()).await.unwrap();

    assert_eq!(session.pages_scraped, 2);
    assert_eq!(session.jobs_inserted, 2);
    assert_eq!(session.errors, 1);
    assert_eq!(session.stop_reason, Some(StopReason::PageBudgetExhausted));
    assert_eq!(session.status(), SessionStatus::CompletedWithErrors);

    // Two attempts at the failing page
    let requests = server.received_requests().await.unwrap();
    let failing = requests
        .iter()
        .filter(|r| r.url.path() == "/data-analyst-jobs-2")
        .count();
    assert_eq!(failing, 2);

    let storage = open_storage(&db_path).unwrap();
    let sessions = storage.recent_sessions(1).unwrap();
    assert_eq!(sessions[0].errors, 1);
    assert_eq!(sessions[0].status, SessionStatus::CompletedWithErrors);
}

#[tokio::test]
async fn test_transient_failure_is_retried() {
    let server = MockServer::start().await;

    // First request fails, the retry succeeds
    Mock::given(method("GET"))
        .and(path("/data-analyst-jobs"))
        .respond_with(ResponseTemplate::new(503))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    mount_html(
        &server,
        "/data-analyst-jobs",
        listing_page(&[job_card("a", "Data Analyst", "Acme", "Hyderabad")]),
    )
    .await;

    let dir = TempDir::new().unwrap();
    let db_path = dir.path().join("jobs.db");
    let config = create_test_config(&server.uri(), &db_path, 1, 3);

    let session = run_crawl(config, Shutdown::new()).await.unwrap();

    assert_eq!(session.errors, 0);
    assert_eq!(session.pages_scraped, 1);
    assert_eq!(session.jobs_inserted, 1);
    assert_eq!(session.stop_reason, Some(StopReason::PageBudgetExhausted));
}

#[tokio::test]
async fn test_triggered_shutdown_persists_nothing() {
    let server = MockServer::start().await;
    mount_two_pages(&server).await;

    let dir = TempDir::new().unwrap();
    let db_path = dir.path().join("jobs.db");
    let config = create_test_config(&server.uri(), &db_path, 10, 1);

    let shutdown = Shutdown::new();
    shutdown.trigger();

    let session = run_crawl(config, shutdown).await.unwrap();
    assert_eq!(session.stop_reason, Some(StopReason::Interrupted));
    assert_eq!(session.pages_scraped, 0);

    let storage = open_storage(&db_path).unwrap();
    assert_eq!(storage.count_postings().unwrap(), 0);
    assert_eq!(storage.recent_sessions(10).unwrap().len(), 1);
}
