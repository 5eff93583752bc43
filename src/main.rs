//! Job-Tide main entry point
//!
//! This is the command-line interface for the Job-Tide ingestion pipeline.

use clap::Parser;
use job_tide::config::{load_config_with_hash, Config};
use job_tide::crawler::{run_crawl, Shutdown};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Upper bound for `--days-back`
const MAX_DAYS_BACK: i64 = 36_500;

/// Exit status on a forced abort (128 + SIGINT)
const EXIT_INTERRUPTED: i32 = 130;

/// Job-Tide: a job-market ingestion pipeline
///
/// Job-Tide walks the result pages of a job listing site, extracts
/// structured fields from each posting, drops postings it has already seen
/// and stores the rest in SQLite.
#[derive(Parser, Debug)]
#[command(name = "job-tide")]
#[command(version)]
#[command(about = "A job-market ingestion pipeline", long_about = None)]
struct Cli {
    /// Path to TOML configuration file
    #[arg(value_name = "CONFIG")]
    config: PathBuf,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Override the configured page budget
    #[arg(long, value_name = "N", value_parser = clap::value_parser!(u32).range(1..))]
    pages: Option<u32>,

    /// Validate config and show what would be crawled without actually crawling
    #[arg(long, conflicts_with = "stats")]
    dry_run: bool,

    /// Show statistics from the database and exit
    #[arg(long, conflicts_with = "dry_run")]
    stats: bool,

    /// Trailing window in days for the statistics view
    #[arg(
        long,
        value_name = "N",
        default_value_t = 7,
        value_parser = clap::value_parser!(u32).range(0..=MAX_DAYS_BACK)
    )]
    days_back: u32,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    setup_logging(cli.verbose, cli.quiet);

    // Load and validate configuration
    tracing::info!("Loading configuration from: {}", cli.config.display());
    let mut config = match load_config_with_hash(&cli.config) {
        Ok((cfg, hash)) => {
            tracing::info!("Configuration loaded successfully (hash: {})", hash);
            cfg
        }
        Err(e) => {
            tracing::error!("Failed to load configuration: {}", e);
            return Err(e.into());
        }
    };

    if let Some(pages) = cli.pages {
        config.crawler.max_pages = pages;
    }

    // Handle different modes
    if cli.dry_run {
        handle_dry_run(&config);
    } else if cli.stats {
        handle_stats(&config, cli.days_back)?;
    } else {
        handle_crawl(config).await?;
    }

    Ok(())
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        // Only show errors
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("job_tide=info,warn"),
            1 => EnvFilter::new("job_tide=debug,info"),
            2 => EnvFilter::new("job_tide=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .init();
}

/// Handles the --dry-run mode: shows the effective config and the page URLs
fn handle_dry_run(config: &Config) {
    println!("=== Job-Tide Dry Run ===\n");

    println!("Source:");
    println!("  Base URL: {}", config.source.base_url);
    println!("  Search path: {}", config.source.search_path);

    println!("\nCrawler Configuration:");
    println!("  Backend: {:?}", config.crawler.backend);
    println!("  Max pages: {}", config.crawler.max_pages);
    println!("  Inter-page delay: {}ms", config.crawler.inter_page_delay);
    println!("  Navigation timeout: {}ms", config.crawler.nav_timeout);
    println!("  Render wait: {}ms", config.crawler.render_wait);
    println!("  Headless: {}", config.crawler.headless);
    println!("  User agent: {}", config.crawler.user_agent);

    println!("\nRetry Policy:");
    println!("  Max attempts: {}", config.retry.max_attempts);
    println!("  Base delay: {}ms", config.retry.base_delay);
    println!("  Backoff multiplier: {}", config.retry.backoff_multiplier);

    println!("\nExtraction:");
    println!("  Skills: {}", config.extraction.skills.len());
    println!("  City aliases: {}", config.extraction.city_aliases.len());
    for tier in &config.extraction.experience_tiers {
        match tier.max {
            Some(max) => println!("  - {}: {}-{} years", tier.name, tier.min, max),
            None => println!("  - {}: {}+ years", tier.name, tier.min),
        }
    }

    println!("\nOutput:");
    println!("  Database: {}", config.output.database_path);

    println!("\nPages ({}):", config.crawler.max_pages);
    for page in 1..=config.crawler.max_pages {
        println!("  {}", config.source.page_url(page));
    }

    println!("\n✓ Configuration is valid");
}

/// Handles the --stats mode: shows statistics from the database
fn handle_stats(config: &Config, days_back: u32) -> Result<(), Box<dyn std::error::Error>> {
    use job_tide::output::{load_statistics, print_statistics};
    use job_tide::storage::open_storage;
    use std::path::Path;

    println!("Database: {}\n", config.output.database_path);

    let storage = open_storage(Path::new(&config.output.database_path))?;
    let stats = load_statistics(&storage, days_back)?;
    print_statistics(&stats);

    Ok(())
}

/// First Ctrl-C requests a cooperative shutdown, a second one exits at once
fn spawn_interrupt_handler(shutdown: Shutdown) {
    tokio::spawn(async move {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to listen for Ctrl-C: {}", e);
            return;
        }
        tracing::warn!("Interrupt received, finishing current step (Ctrl-C again to abort)");
        shutdown.trigger();

        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::error!("Second interrupt received, aborting");
            std::process::exit(EXIT_INTERRUPTED);
        }
    });
}

/// Handles the main crawl operation
async fn handle_crawl(config: Config) -> Result<(), Box<dyn std::error::Error>> {
    tracing::info!(
        "Crawling {} ({:?} backend, up to {} pages)",
        config.source.page_url(1),
        config.crawler.backend,
        config.crawler.max_pages
    );

    let shutdown = Shutdown::new();
    spawn_interrupt_handler(shutdown.clone());

    match run_crawl(config, shutdown).await {
        Ok(session) => {
            tracing::info!(
                "Crawl finished with status {}: {} new postings",
                session.status(),
                session.jobs_inserted
            );
            Ok(())
        }
        Err(e) => {
            tracing::error!("Crawl failed: {}", e);
            Err(e.into())
        }
    }
}
