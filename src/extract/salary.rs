use crate::extract::Field;
use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    // "4-6 lakh", "4.5 to 6 Lakhs PA", "8-12 LPA"
    static ref LAKH_RE: Regex = Regex::new(
        r"(\d+(?:\.\d+)?)\s*(?:-|–|to)\s*(\d+(?:\.\d+)?)\s*(?:lakhs?|lacs?|lpa)"
    )
    .unwrap();
    // "₹3,00,000-₹5,00,000" (after separators are stripped)
    static ref RUPEE_RE: Regex = Regex::new(
        r"₹\s*(\d+(?:\.\d+)?)\s*(?:-|–|to)\s*₹?\s*(\d+(?:\.\d+)?)"
    )
    .unwrap();
}

/// Rupees in one lakh
const RUPEES_PER_LAKH: f64 = 100_000.0;

/// An annual salary range in lakh (LPA) units, `min <= max`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SalaryRange {
    pub min: f64,
    pub max: f64,
}

impl SalaryRange {
    /// Builds a range, ordering the bounds if they arrive reversed
    pub fn new(a: f64, b: f64) -> Self {
        Self {
            min: a.min(b),
            max: a.max(b),
        }
    }
}

/// Extracts a salary range in lakh units from free text
///
/// Lakh ranges are taken as is; rupee ranges are divided by 100,000.
/// Digit-group commas are removed before matching.
pub fn extract_salary(text: &str) -> Field<SalaryRange> {
    let text = text.to_lowercase().replace(',', "");

    if let Some(caps) = LAKH_RE.captures(&text) {
        if let (Some(min), Some(max)) = (parse_amount(&caps[1]), parse_amount(&caps[2])) {
            return Field::Present(SalaryRange::new(min, max));
        }
    }

    if let Some(caps) = RUPEE_RE.captures(&text) {
        if let (Some(min), Some(max)) = (parse_amount(&caps[1]), parse_amount(&caps[2])) {
            return Field::Present(SalaryRange::new(
                min / RUPEES_PER_LAKH,
                max / RUPEES_PER_LAKH,
            ));
        }
    }

    Field::Unknown
}

fn parse_amount(digits: &str) -> Option<f64> {
    digits.parse::<f64>().ok().filter(|v| v.is_finite())
}
