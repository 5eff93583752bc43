//! Job posting records
//!
//! `JobFragment` is what the listing parser pulls out of one job card, still
//! as raw text. `JobPosting` is the normalized, typed record that gets
//! hashed and persisted.

use crate::extract::{ExperienceRange, Field, SalaryRange, Skill};
use chrono::{DateTime, Utc};

/// Company name recorded when a card carries none
pub const UNKNOWN_COMPANY: &str = "Unknown";

/// Raw fields of one job card on a listing page
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct JobFragment {
    pub title: String,
    /// Absolute URL of the job detail page
    pub url: String,
    pub company: Option<String>,
    pub location: Option<String>,
    pub experience: Option<String>,
    pub salary: Option<String>,
    pub date_posted: Option<String>,
}

/// A normalized job posting
#[derive(Debug, Clone, PartialEq)]
pub struct JobPosting {
    pub title: String,
    pub company: String,
    pub location: Field<String>,
    pub experience: Field<ExperienceRange>,
    pub salary: Field<SalaryRange>,
    pub description: String,
    /// Unique by name
    pub skills: Vec<Skill>,
    pub source_url: String,
    pub date_posted: Option<String>,
    pub date_scraped: DateTime<Utc>,
    pub is_active: bool,
    pub identity_hash: String,
}

impl JobPosting {
    pub fn experience_min(&self) -> Option<u32> {
        self.experience.as_option().map(|e| e.min)
    }

    pub fn experience_max(&self) -> Option<u32> {
        self.experience.as_option().map(|e| e.max)
    }

    pub fn salary_min(&self) -> Option<f64> {
        self.salary.as_option().map(|s| s.min)
    }

    pub fn salary_max(&self) -> Option<f64> {
        self.salary.as_option().map(|s| s.max)
    }
}
