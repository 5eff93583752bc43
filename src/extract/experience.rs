use crate::config::ExperienceTier;
use crate::extract::text::title_case;
use crate::extract::Field;
use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    // "3-5 years", "3 to 5 yrs", "3–5 Yrs"
    static ref RANGE_RE: Regex =
        Regex::new(r"(\d+)\s*(?:-|–|to)\s*(\d+)\s*y(?:ea)?rs?").unwrap();
    // "5+ years"
    static ref PLUS_RE: Regex = Regex::new(r"(\d+)\s*\+\s*y(?:ea)?rs?").unwrap();
    // "2 years"
    static ref SINGLE_RE: Regex = Regex::new(r"(\d+)\s*y(?:ea)?rs?").unwrap();
    static ref FRESHER_RE: Regex = Regex::new(r"fresher|entry[\s-]level").unwrap();
}

/// Years added to the lower bound of an open "X+ years" requirement
const PLUS_SPAN: u32 = 2;

/// An experience requirement in whole years, `min <= max`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExperienceRange {
    pub min: u32,
    pub max: u32,
}

impl ExperienceRange {
    /// Builds a range, ordering the bounds if they arrive reversed
    pub fn new(a: u32, b: u32) -> Self {
        Self {
            min: a.min(b),
            max: a.max(b),
        }
    }
}

/// Extracts an experience range from free text
///
/// Patterns are tried in priority order: explicit range, "X+" with an
/// implied two-year span, a single figure, then fresher phrasing (0-1).
///
/// # Example
///
/// ```
/// use job_tide::extract::{extract_experience, ExperienceRange, Field};
///
/// assert_eq!(extract_experience("3-5 years"), Field::Present(ExperienceRange::new(3, 5)));
/// assert_eq!(extract_experience("not stated"), Field::Unknown);
/// ```
pub fn extract_experience(text: &str) -> Field<ExperienceRange> {
    let text = text.to_lowercase();
    if text.trim().is_empty() {
        return Field::Unknown;
    }

    if let Some(caps) = RANGE_RE.captures(&text) {
        if let (Some(min), Some(max)) = (parse_years(&caps[1]), parse_years(&caps[2])) {
            return Field::Present(ExperienceRange::new(min, max));
        }
    }

    if let Some(caps) = PLUS_RE.captures(&text) {
        if let Some(min) = parse_years(&caps[1]) {
            return Field::Present(ExperienceRange::new(min, min.saturating_add(PLUS_SPAN)));
        }
    }

    if let Some(caps) = SINGLE_RE.captures(&text) {
        if let Some(years) = parse_years(&caps[1]) {
            return Field::Present(ExperienceRange::new(years, years));
        }
    }

    if FRESHER_RE.is_match(&text) {
        return Field::Present(ExperienceRange::new(0, 1));
    }

    Field::Unknown
}

fn parse_years(digits: &str) -> Option<u32> {
    digits.parse().ok()
}

/// Buckets an experience requirement into a named tier
///
/// Only the lower bound decides the tier. A missing lower bound is
/// "Unknown"; a lower bound outside every tier is "Senior+".
pub fn categorize_experience_level(
    min: Option<u32>,
    _max: Option<u32>,
    tiers: &[ExperienceTier],
) -> String {
    let Some(min) = min else {
        return "Unknown".to_string();
    };

    tiers
        .iter()
        .find(|tier| tier.contains(min))
        .map(|tier| title_case(&tier.name))
        .unwrap_or_else(|| "Senior+".to_string())
}
