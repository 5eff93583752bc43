use regex::{Regex, RegexBuilder};
use std::collections::HashSet;
use std::fmt;

/// Category of a tracked skill
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum SkillCategory {
    ProgrammingLanguage,
    Database,
    Visualization,
    CloudPlatform,
    MlTool,
    Other,
}

impl SkillCategory {
    /// Converts the category to its stored label
    pub fn to_db_string(&self) -> &'static str {
        match self {
            Self::ProgrammingLanguage => "Programming Language",
            Self::Database => "Database",
            Self::Visualization => "Visualization",
            Self::CloudPlatform => "Cloud Platform",
            Self::MlTool => "ML/AI Tool",
            Self::Other => "Other",
        }
    }

    /// Parses a stored label, unrecognized labels fall back to `Other`
    pub fn from_db_string(s: &str) -> Self {
        match s {
            "Programming Language" => Self::ProgrammingLanguage,
            "Database" => Self::Database,
            "Visualization" => Self::Visualization,
            "Cloud Platform" => Self::CloudPlatform,
            "ML/AI Tool" => Self::MlTool,
            _ => Self::Other,
        }
    }
}

impl fmt::Display for SkillCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_db_string())
    }
}

/// A skill mentioned by a posting
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Skill {
    pub name: String,
    pub category: SkillCategory,
}

impl Skill {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            category: categorize_skill(name),
        }
    }
}

/// Looks up the category of a skill name
pub fn categorize_skill(skill: &str) -> SkillCategory {
    const PROGRAMMING_LANGUAGES: &[&str] = &["python", "r", "sql", "vba", "java", "scala"];
    const DATABASES: &[&str] = &["mysql", "postgresql", "mongodb", "nosql", "oracle"];
    const VISUALIZATION: &[&str] = &[
        "tableau",
        "power bi",
        "powerbi",
        "matplotlib",
        "seaborn",
        "plotly",
    ];
    const CLOUD: &[&str] = &["aws", "azure", "gcp", "google cloud"];
    const ML_TOOLS: &[&str] = &["scikit-learn", "tensorflow", "pytorch", "keras"];

    let skill = skill.trim().to_lowercase();
    let skill = skill.as_str();

    if PROGRAMMING_LANGUAGES.contains(&skill) {
        SkillCategory::ProgrammingLanguage
    } else if DATABASES.contains(&skill) {
        SkillCategory::Database
    } else if VISUALIZATION.contains(&skill) {
        SkillCategory::Visualization
    } else if CLOUD.contains(&skill) {
        SkillCategory::CloudPlatform
    } else if ML_TOOLS.contains(&skill) {
        SkillCategory::MlTool
    } else {
        SkillCategory::Other
    }
}

/// A skill vocabulary compiled into word-boundary patterns
#[derive(Debug, Clone)]
pub struct SkillMatcher {
    patterns: Vec<(Skill, Regex)>,
}

impl SkillMatcher {
    /// Compiles the vocabulary
    ///
    /// Entries that repeat an earlier name (ignoring case) are dropped.
    pub fn new(vocabulary: &[String]) -> Self {
        let mut seen = HashSet::new();
        let mut patterns = Vec::with_capacity(vocabulary.len());

        for entry in vocabulary {
            let name = entry.trim();
            if name.is_empty() || !seen.insert(name.to_lowercase()) {
                continue;
            }

            let pattern = format!(r"\b{}\b", regex::escape(name));
            match RegexBuilder::new(&pattern).case_insensitive(true).build() {
                Ok(regex) => patterns.push((Skill::new(name), regex)),
                Err(e) => tracing::warn!("Skipping skill '{}': {}", name, e),
            }
        }

        Self { patterns }
    }

    /// Returns the vocabulary skills mentioned in `text`, in vocabulary order
    pub fn extract(&self, text: &str) -> Vec<Skill> {
        if text.trim().is_empty() {
            return Vec::new();
        }

        self.patterns
            .iter()
            .filter(|(_, regex)| regex.is_match(text))
            .map(|(skill, _)| skill.clone())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.patterns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }
}

/// Extracts vocabulary skills from `text` with whole-word matching
///
/// Compiles the vocabulary on every call; reuse a `SkillMatcher` when
/// scanning many descriptions.
pub fn extract_skills(text: &str, vocabulary: &[String]) -> Vec<Skill> {
    SkillMatcher::new(vocabulary).extract(text)
}
