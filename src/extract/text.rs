use crate::config::CityAlias;
use crate::extract::Field;
use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    static ref COUNTRY_SUFFIX_RE: Regex = Regex::new(r"\s*,\s*(?:india|in)$").unwrap();
    static ref COMPANY_SUFFIX_RE: Regex = Regex::new(
        r"(?i)[\s,]*\b(?:pvt|private|ltd|limited|inc|incorporated|corp|corporation)\.?\s*$"
    )
    .unwrap();
    static ref WHITESPACE_RE: Regex = Regex::new(r"\s+").unwrap();
}

/// Normalizes a location to a canonical, title-cased city name
///
/// A trailing ", India" (or ", IN") is dropped. Aliases are tried in table
/// order and the first one occurring in the lowercased text decides the city.
pub fn normalize_location(text: &str, aliases: &[CityAlias]) -> Field<String> {
    let lowered = text.trim().to_lowercase();
    let location = COUNTRY_SUFFIX_RE.replace(&lowered, "");
    let location = location.trim();

    if location.is_empty() {
        return Field::Unknown;
    }

    let canonical = aliases
        .iter()
        .find(|entry| {
            !entry.alias.is_empty() && location.contains(entry.alias.to_lowercase().as_str())
        })
        .map_or(location, |entry| entry.city.as_str());

    Field::Present(title_case(canonical))
}

/// Collapses runs of whitespace and trims
pub fn clean_title(title: &str) -> String {
    WHITESPACE_RE.replace_all(title.trim(), " ").into_owned()
}

/// Strips legal-entity suffixes such as "Pvt. Ltd." from a company name
///
/// A name that is nothing but a suffix is returned whitespace-cleaned
/// rather than emptied.
pub fn clean_company(company: &str) -> String {
    let original = clean_title(company);
    let mut name = original.clone();

    loop {
        let stripped = COMPANY_SUFFIX_RE.replace(&name, "").trim().to_string();
        if stripped == name {
            break;
        }
        name = stripped;
    }

    if name.is_empty() {
        original
    } else {
        name
    }
}

/// Uppercases the first letter of every alphabetic run, lowercases the rest
pub(crate) fn title_case(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut at_word_start = true;

    for c in text.chars() {
        if c.is_alphabetic() {
            if at_word_start {
                out.extend(c.to_uppercase());
            } else {
                out.extend(c.to_lowercase());
            }
            at_word_start = false;
        } else {
            out.push(c);
            at_word_start = true;
        }
    }

    out
}
