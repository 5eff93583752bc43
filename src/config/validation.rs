use crate::config::types::{
    Config, CrawlerConfig, ExperienceTier, ExtractionConfig, OutputConfig, RetryConfig,
    SelectorConfig, SourceConfig,
};
use crate::ConfigError;
use scraper::Selector;
use url::Url;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_source_config(&config.source)?;
    validate_crawler_config(&config.crawler)?;
    validate_retry_config(&config.retry)?;
    validate_output_config(&config.output)?;
    validate_extraction_config(&config.extraction)?;
    validate_selectors(&config.selectors)?;
    Ok(())
}

/// Validates the listing source
fn validate_source_config(config: &SourceConfig) -> Result<(), ConfigError> {
    let url = Url::parse(&config.base_url)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid base_url: {}", e)))?;

    if url.scheme() != "https" && url.scheme() != "http" {
        return Err(ConfigError::InvalidUrl(format!(
            "base_url '{}' must use http or https",
            config.base_url
        )));
    }

    if config.search_path.trim_matches('/').is_empty() {
        return Err(ConfigError::Validation(
            "search_path cannot be empty".to_string(),
        ));
    }

    Ok(())
}

/// Validates crawler configuration
fn validate_crawler_config(config: &CrawlerConfig) -> Result<(), ConfigError> {
    if config.max_pages < 1 {
        return Err(ConfigError::Validation(format!(
            "max_pages must be >= 1, got {}",
            config.max_pages
        )));
    }

    if config.nav_timeout == 0 {
        return Err(ConfigError::Validation(
            "nav_timeout must be greater than 0ms".to_string(),
        ));
    }

    if config.user_agent.trim().is_empty() {
        return Err(ConfigError::Validation(
            "user_agent cannot be empty".to_string(),
        ));
    }

    Ok(())
}

/// Validates the retry policy
fn validate_retry_config(config: &RetryConfig) -> Result<(), ConfigError> {
    if config.max_attempts < 1 {
        return Err(ConfigError::Validation(format!(
            "max_attempts must be >= 1, got {}",
            config.max_attempts
        )));
    }

    if !config.backoff_multiplier.is_finite() || config.backoff_multiplier < 1.0 {
        return Err(ConfigError::Validation(format!(
            "backoff_multiplier must be >= 1.0, got {}",
            config.backoff_multiplier
        )));
    }

    Ok(())
}

/// Validates output configuration
fn validate_output_config(config: &OutputConfig) -> Result<(), ConfigError> {
    if config.database_path.is_empty() {
        return Err(ConfigError::Validation(
            "database_path cannot be empty".to_string(),
        ));
    }

    Ok(())
}

/// Validates the skill vocabulary, alias table and tiers
fn validate_extraction_config(config: &ExtractionConfig) -> Result<(), ConfigError> {
    if config.skills.is_empty() {
        return Err(ConfigError::Validation(
            "skills vocabulary cannot be empty".to_string(),
        ));
    }

    if let Some(blank) = config.skills.iter().position(|s| s.trim().is_empty()) {
        return Err(ConfigError::Validation(format!(
            "skills entry #{} is empty",
            blank + 1
        )));
    }

    for entry in &config.city_aliases {
        if entry.alias.trim().is_empty() || entry.city.trim().is_empty() {
            return Err(ConfigError::Validation(format!(
                "city alias '{}' -> '{}' has an empty side",
                entry.alias, entry.city
            )));
        }
    }

    validate_experience_tiers(&config.experience_tiers)
}

/// Validates that tiers are well-formed, ascending and non-overlapping
///
/// Only the last tier may be open-ended.
fn validate_experience_tiers(tiers: &[ExperienceTier]) -> Result<(), ConfigError> {
    if tiers.is_empty() {
        return Err(ConfigError::Validation(
            "at least one experience tier is required".to_string(),
        ));
    }

    for (index, tier) in tiers.iter().enumerate() {
        if tier.name.trim().is_empty() {
            return Err(ConfigError::Validation(format!(
                "experience tier #{} has no name",
                index + 1
            )));
        }

        match tier.max {
            Some(max) if max < tier.min => {
                return Err(ConfigError::Validation(format!(
                    "experience tier '{}' has max {} below min {}",
                    tier.name, max, tier.min
                )));
            }
            None if index + 1 != tiers.len() => {
                return Err(ConfigError::Validation(format!(
                    "only the last experience tier may be open-ended, '{}' is not last",
                    tier.name
                )));
            }
            _ => {}
        }

        if let Some(previous) = index.checked_sub(1).map(|i| &tiers[i]) {
            // previous.max is always Some here, the open-ended check above guarantees it
            if previous.max.map_or(true, |max| tier.min <= max) {
                return Err(ConfigError::Validation(format!(
                    "experience tier '{}' overlaps or precedes '{}'",
                    tier.name, previous.name
                )));
            }
        }
    }

    Ok(())
}

/// Validates that every selector parses
fn validate_selectors(config: &SelectorConfig) -> Result<(), ConfigError> {
    let singles = [
        &config.job_card,
        &config.title,
        &config.company,
        &config.location,
        &config.experience,
        &config.salary,
        &config.date_posted,
    ];

    for selector in singles.into_iter().chain(config.description.iter()) {
        parse_selector(selector)?;
    }

    if config.description.is_empty() {
        return Err(ConfigError::Validation(
            "at least one description selector is required".to_string(),
        ));
    }

    Ok(())
}

/// Compiles a single CSS selector
pub(crate) fn parse_selector(selector: &str) -> Result<Selector, ConfigError> {
    Selector::parse(selector).map_err(|e| ConfigError::InvalidSelector {
        selector: selector.to_string(),
        message: format!("{:?}", e),
    })
}
