//! HTML parser for listing and detail pages
//!
//! This module turns rendered markup into raw job fragments:
//! - One `JobFragment` per job card on a listing page
//! - The description text of a job detail page
//!
//! A selector that matches nothing means the field is absent; it is never an
//! error.

use crate::config::{parse_selector, SelectorConfig};
use crate::posting::JobFragment;
use crate::ConfigError;
use scraper::{ElementRef, Html, Selector};
use url::Url;

/// Listing and detail selectors compiled once per run
#[derive(Debug, Clone)]
pub struct CompiledSelectors {
    job_card: Selector,
    title: Selector,
    any_link: Selector,
    company: Selector,
    location: Selector,
    experience: Selector,
    salary: Selector,
    date_posted: Selector,
    description: Vec<Selector>,
}

impl CompiledSelectors {
    /// Compiles every selector in `config`
    ///
    /// # Returns
    ///
    /// * `Ok(CompiledSelectors)` - All selectors parsed
    /// * `Err(ConfigError::InvalidSelector)` - The first selector that did not
    pub fn new(config: &SelectorConfig) -> Result<Self, ConfigError> {
        Ok(Self {
            job_card: parse_selector(&config.job_card)?,
            title: parse_selector(&config.title)?,
            any_link: parse_selector("a")?,
            company: parse_selector(&config.company)?,
            location: parse_selector(&config.location)?,
            experience: parse_selector(&config.experience)?,
            salary: parse_selector(&config.salary)?,
            date_posted: parse_selector(&config.date_posted)?,
            description: config
                .description
                .iter()
                .map(|s| parse_selector(s))
                .collect::<Result<_, _>>()?,
        })
    }
}

/// Parses a listing page into job fragments
///
/// The title comes from the title selector, falling back to the first link
/// of the card. Cards without any title text are skipped. Detail links are
/// resolved against `base_url`.
///
/// # Example
///
/// ```
/// use job_tide::config::SelectorConfig;
/// use job_tide::crawler::{parse_listing, CompiledSelectors};
/// use url::Url;
///
/// let html = r#"<div class="srp-jobtuple-wrapper">
///     <a class="title" href="/job/1">Data Analyst</a>
///     <a class="subTitle">Acme</a>
/// </div>"#;
/// let selectors = CompiledSelectors::new(&SelectorConfig::default()).unwrap();
/// let base = Url::parse("https://jobs.example.com/").unwrap();
///
/// let fragments = parse_listing(html, &selectors, &base);
/// assert_eq!(fragments[0].url, "https://jobs.example.com/job/1");
/// ```
pub fn parse_listing(html: &str, selectors: &CompiledSelectors, base_url: &Url) -> Vec<JobFragment> {
    let document = Html::parse_document(html);
    let mut fragments = Vec::new();

    for card in document.select(&selectors.job_card) {
        let Some(title_el) = card
            .select(&selectors.title)
            .next()
            .or_else(|| card.select(&selectors.any_link).next())
        else {
            continue;
        };

        let title = element_text(&title_el);
        if title.is_empty() {
            tracing::debug!("Skipping job card without a title");
            continue;
        }

        let url = title_el
            .value()
            .attr("href")
            .and_then(|href| resolve_link(href, base_url))
            .unwrap_or_default();

        fragments.push(JobFragment {
            title,
            url,
            company: select_text(&card, &selectors.company),
            location: select_text(&card, &selectors.location),
            experience: select_text(&card, &selectors.experience),
            salary: select_text(&card, &selectors.salary),
            date_posted: select_text(&card, &selectors.date_posted),
        });
    }

    fragments
}

/// Extracts the description text of a job detail page
///
/// Description selectors are tried in order and the first one with text
/// wins. Returns an empty string when none match.
pub fn parse_description(html: &str, selectors: &CompiledSelectors) -> String {
    let document = Html::parse_document(html);

    selectors
        .description
        .iter()
        .filter_map(|selector| document.select(selector).next())
        .map(|el| element_text(&el))
        .find(|text| !text.is_empty())
        .unwrap_or_default()
}

/// Text of the first element under `root` matching `selector`
fn select_text(root: &ElementRef<'_>, selector: &Selector) -> Option<String> {
    root.select(selector)
        .next()
        .map(|el| element_text(&el))
        .filter(|text| !text.is_empty())
}

/// Text of an element with whitespace runs collapsed to single spaces
fn element_text(element: &ElementRef<'_>) -> String {
    element
        .text()
        .flat_map(str::split_whitespace)
        .collect::<Vec<_>>()
        .join(" ")
}

/// Resolves a detail link to an absolute HTTP(S) URL
///
/// Returns None for empty, fragment-only and non-HTTP links.
fn resolve_link(href: &str, base_url: &Url) -> Option<String> {
    let href = href.trim();

    if href.is_empty() || href.starts_with('#') || href.starts_with("javascript:") {
        return None;
    }

    match base_url.join(href) {
        Ok(absolute_url) if matches!(absolute_url.scheme(), "http" | "https") => {
            Some(absolute_url.to_string())
        }
        _ => None,
    }
}
