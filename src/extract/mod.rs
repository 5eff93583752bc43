//! Field extraction from loosely formatted listing text
//!
//! Every function in this module is pure and total: malformed input yields
//! `Field::Unknown` (or an empty collection), never an error.
//!
//! # Components
//!
//! - `experience`: experience ranges and tier labels
//! - `salary`: salary ranges in lakh-per-annum units
//! - `skills`: whole-word skill matching against a vocabulary
//! - `text`: location, title and company normalization
//! - `identity`: the deduplication hash

mod experience;
mod identity;
mod salary;
mod skills;
mod text;

pub use experience::{categorize_experience_level, extract_experience, ExperienceRange};
pub use identity::hash_identity;
pub use salary::{extract_salary, SalaryRange};
pub use skills::{categorize_skill, extract_skills, Skill, SkillCategory, SkillMatcher};
pub use text::{clean_company, clean_title, normalize_location};

use crate::config::{CityAlias, ExperienceTier, ExtractionConfig};
use crate::posting::{JobFragment, JobPosting, UNKNOWN_COMPANY};
use chrono::{DateTime, Utc};

/// An extracted value that may be missing from the source text
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field<T> {
    Present(T),
    Unknown,
}

impl<T> Default for Field<T> {
    fn default() -> Self {
        Self::Unknown
    }
}

impl<T> Field<T> {
    pub fn is_present(&self) -> bool {
        matches!(self, Self::Present(_))
    }

    pub fn as_option(&self) -> Option<&T> {
        match self {
            Self::Present(value) => Some(value),
            Self::Unknown => None,
        }
    }

    pub fn into_option(self) -> Option<T> {
        match self {
            Self::Present(value) => Some(value),
            Self::Unknown => None,
        }
    }

    pub fn map<U, F: FnOnce(T) -> U>(self, f: F) -> Field<U> {
        match self {
            Self::Present(value) => Field::Present(f(value)),
            Self::Unknown => Field::Unknown,
        }
    }
}

impl<T> From<Option<T>> for Field<T> {
    fn from(value: Option<T>) -> Self {
        match value {
            Some(v) => Self::Present(v),
            None => Self::Unknown,
        }
    }
}

/// Extraction tables bundled for one crawl run
///
/// The skill vocabulary is compiled once here instead of on every posting.
#[derive(Debug, Clone)]
pub struct FieldExtractor {
    skills: SkillMatcher,
    city_aliases: Vec<CityAlias>,
    tiers: Vec<ExperienceTier>,
}

impl FieldExtractor {
    pub fn new(config: &ExtractionConfig) -> Self {
        Self {
            skills: SkillMatcher::new(&config.skills),
            city_aliases: config.city_aliases.clone(),
            tiers: config.experience_tiers.clone(),
        }
    }

    pub fn tiers(&self) -> &[ExperienceTier] {
        &self.tiers
    }

    pub fn normalize_location(&self, text: &str) -> Field<String> {
        normalize_location(text, &self.city_aliases)
    }

    pub fn extract_skills(&self, text: &str) -> Vec<Skill> {
        self.skills.extract(text)
    }

    pub fn experience_level(&self, posting: &JobPosting) -> String {
        categorize_experience_level(posting.experience_min(), posting.experience_max(), &self.tiers)
    }

    /// Turns a listing fragment and its detail description into a posting
    ///
    /// The identity hash covers the cleaned title, the cleaned company and
    /// the normalized location, so cosmetic differences between re-scrapes
    /// (spacing, a "Pvt Ltd" suffix, "Bengaluru, India") do not defeat
    /// deduplication.
    pub fn build_posting(
        &self,
        fragment: &JobFragment,
        description: String,
        scraped_at: DateTime<Utc>,
    ) -> JobPosting {
        let title = clean_title(&fragment.title);

        let company = fragment
            .company
            .as_deref()
            .map(clean_title)
            .filter(|c| !c.is_empty())
            .unwrap_or_else(|| UNKNOWN_COMPANY.to_string());

        let location = fragment
            .location
            .as_deref()
            .map(|l| self.normalize_location(l))
            .unwrap_or_default();

        let experience = fragment
            .experience
            .as_deref()
            .map(extract_experience)
            .unwrap_or_default();

        let salary = fragment
            .salary
            .as_deref()
            .map(extract_salary)
            .unwrap_or_default();

        let skills = self.extract_skills(&description);

        let identity_hash = hash_identity(
            &title,
            &clean_company(&company),
            location.as_option().map_or("unknown", String::as_str),
        );

        JobPosting {
            title,
            company,
            location,
            experience,
            salary,
            description,
            skills,
            source_url: fragment.url.clone(),
            date_posted: fragment.date_posted.clone(),
            date_scraped: scraped_at,
            is_active: true,
            identity_hash,
        }
    }
}
