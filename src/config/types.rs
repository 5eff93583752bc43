use serde::Deserialize;

/// Main configuration structure for Job-Tide
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub source: SourceConfig,
    pub crawler: CrawlerConfig,
    #[serde(default)]
    pub retry: RetryConfig,
    pub output: OutputConfig,
    #[serde(default)]
    pub extraction: ExtractionConfig,
    #[serde(default)]
    pub selectors: SelectorConfig,
}

/// Where the listing pages live
#[derive(Debug, Clone, Deserialize)]
pub struct SourceConfig {
    /// Site root, also used to resolve relative job links
    #[serde(rename = "base-url")]
    pub base_url: String,

    /// Path segment of the first search results page (e.g. "data-analyst-jobs")
    #[serde(rename = "search-path")]
    pub search_path: String,
}

impl SourceConfig {
    /// Builds the URL of a search results page
    ///
    /// Page 1 is `{base}/{search-path}`, later pages append `-{page}`.
    pub fn page_url(&self, page: u32) -> String {
        let base = format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            self.search_path.trim_matches('/')
        );
        if page > 1 {
            format!("{}-{}", base, page)
        } else {
            base
        }
    }
}

/// Which page fetcher drives the crawl
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FetchBackend {
    /// Headless Chromium, for sources that render listings client-side
    Browser,
    /// Plain HTTP GET, for server-rendered sources
    Http,
}

/// Crawler behavior configuration
#[derive(Debug, Clone, Deserialize)]
pub struct CrawlerConfig {
    /// Highest results page to visit
    #[serde(rename = "max-pages")]
    pub max_pages: u32,

    /// Pause after each persisted page (milliseconds)
    #[serde(rename = "inter-page-delay")]
    pub inter_page_delay: u64,

    /// Navigation timeout per request (milliseconds)
    #[serde(rename = "nav-timeout")]
    pub nav_timeout: u64,

    /// Time given to client-side rendering after navigation (milliseconds)
    #[serde(rename = "render-wait", default = "default_render_wait")]
    pub render_wait: u64,

    #[serde(default = "default_backend")]
    pub backend: FetchBackend,

    #[serde(rename = "user-agent", default = "default_user_agent")]
    pub user_agent: String,

    /// Run the browser without a visible window
    #[serde(default = "default_headless")]
    pub headless: bool,
}

/// Retry policy applied to every page fetch
#[derive(Debug, Clone, Deserialize)]
pub struct RetryConfig {
    #[serde(rename = "max-attempts")]
    pub max_attempts: u32,

    /// Delay before the second attempt (milliseconds)
    #[serde(rename = "base-delay")]
    pub base_delay: u64,

    #[serde(rename = "backoff-multiplier")]
    pub backoff_multiplier: f64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: 1000,
            backoff_multiplier: 2.0,
        }
    }
}

/// Output configuration
#[derive(Debug, Clone, Deserialize)]
pub struct OutputConfig {
    /// Path to the SQLite database file
    #[serde(rename = "database-path")]
    pub database_path: String,
}

/// Vocabulary and lookup tables used by the field extractor
#[derive(Debug, Clone, Deserialize)]
pub struct ExtractionConfig {
    #[serde(default = "default_skills")]
    pub skills: Vec<String>,

    /// Checked in order; the first alias found in a location wins
    #[serde(rename = "city-aliases", default = "default_city_aliases")]
    pub city_aliases: Vec<CityAlias>,

    #[serde(rename = "experience-tiers", default = "default_experience_tiers")]
    pub experience_tiers: Vec<ExperienceTier>,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            skills: default_skills(),
            city_aliases: default_city_aliases(),
            experience_tiers: default_experience_tiers(),
        }
    }
}

/// Maps a spelling found in listing text to a canonical city
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct CityAlias {
    pub alias: String,
    pub city: String,
}

impl CityAlias {
    pub fn new(alias: &str, city: &str) -> Self {
        Self {
            alias: alias.to_string(),
            city: city.to_string(),
        }
    }
}

/// A named experience bucket with inclusive bounds
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ExperienceTier {
    pub name: String,
    pub min: u32,
    /// Missing upper bound means the tier is open-ended
    #[serde(default)]
    pub max: Option<u32>,
}

impl ExperienceTier {
    pub fn new(name: &str, min: u32, max: Option<u32>) -> Self {
        Self {
            name: name.to_string(),
            min,
            max,
        }
    }

    /// Returns true if `years` falls inside this tier
    pub fn contains(&self, years: u32) -> bool {
        years >= self.min && self.max.map_or(true, |max| years <= max)
    }
}

/// CSS selectors for listing and detail pages
#[derive(Debug, Clone, Deserialize)]
pub struct SelectorConfig {
    #[serde(rename = "job-card", default = "default_job_card")]
    pub job_card: String,

    #[serde(default = "default_title")]
    pub title: String,

    #[serde(default = "default_company")]
    pub company: String,

    #[serde(default = "default_location")]
    pub location: String,

    #[serde(default = "default_experience")]
    pub experience: String,

    #[serde(default = "default_salary")]
    pub salary: String,

    #[serde(rename = "date-posted", default = "default_date_posted")]
    pub date_posted: String,

    /// Tried in order on the detail page; the first match wins
    #[serde(default = "default_description")]
    pub description: Vec<String>,
}

impl Default for SelectorConfig {
    fn default() -> Self {
        Self {
            job_card: default_job_card(),
            title: default_title(),
            company: default_company(),
            location: default_location(),
            experience: default_experience(),
            salary: default_salary(),
            date_posted: default_date_posted(),
            description: default_description(),
        }
    }
}

fn default_render_wait() -> u64 {
    5000
}

fn default_backend() -> FetchBackend {
    FetchBackend::Browser
}

fn default_headless() -> bool {
    true
}

fn default_user_agent() -> String {
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
     (KHTML, like Gecko) Chrome/115.0.0.0 Safari/537.36"
        .to_string()
}

fn default_skills() -> Vec<String> {
    [
        "python",
        "r",
        "sql",
        "mysql",
        "postgresql",
        "mongodb",
        "nosql",
        "tableau",
        "power bi",
        "powerbi",
        "excel",
        "vba",
        "sas",
        "spss",
        "hadoop",
        "spark",
        "kafka",
        "aws",
        "azure",
        "gcp",
        "docker",
        "kubernetes",
        "git",
        "github",
        "jupyter",
        "pandas",
        "numpy",
        "scikit-learn",
        "tensorflow",
        "pytorch",
        "keras",
        "matplotlib",
        "seaborn",
        "plotly",
        "dashboard",
        "etl",
        "data warehouse",
        "business intelligence",
        "machine learning",
        "deep learning",
        "statistics",
        "statistical analysis",
        "data mining",
        "data visualization",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

fn default_city_aliases() -> Vec<CityAlias> {
    [
        ("bengaluru", "bangalore"),
        ("mumbai", "mumbai"),
        ("pune", "pune"),
        ("hyderabad", "hyderabad"),
        ("chennai", "chennai"),
        ("delhi", "delhi"),
        ("gurgaon", "gurgaon"),
        ("noida", "noida"),
        ("kolkata", "kolkata"),
        ("ahmedabad", "ahmedabad"),
    ]
    .iter()
    .map(|(alias, city)| CityAlias::new(alias, city))
    .collect()
}

fn default_experience_tiers() -> Vec<ExperienceTier> {
    vec![
        ExperienceTier::new("entry", 0, Some(2)),
        ExperienceTier::new("mid", 3, Some(7)),
        ExperienceTier::new("senior", 8, None),
    ]
}

fn default_job_card() -> String {
    "div.srp-jobtuple-wrapper".to_string()
}

fn default_title() -> String {
    "a.title".to_string()
}

fn default_company() -> String {
    "a.subTitle".to_string()
}

fn default_location() -> String {
    "li.location".to_string()
}

fn default_experience() -> String {
    "li.experience".to_string()
}

fn default_salary() -> String {
    "li.salary".to_string()
}

fn default_date_posted() -> String {
    "span.job-post-day".to_string()
}

fn default_description() -> Vec<String> {
    vec![
        ".dang-inner-html".to_string(),
        ".job-description".to_string(),
        ".JDres".to_string(),
        "[class*=\"description\"]".to_string(),
    ]
}
