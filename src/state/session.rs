use crate::state::StopReason;
use chrono::{DateTime, Utc};
use std::fmt;

/// Terminal status of a crawl session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SessionStatus {
    Completed,
    CompletedWithErrors,
}

impl SessionStatus {
    /// Converts the status to a database string representation
    pub fn to_db_string(&self) -> &'static str {
        match self {
            Self::Completed => "completed",
            Self::CompletedWithErrors => "completed_with_errors",
        }
    }

    /// Parses a status from a database string representation
    ///
    /// Returns None if the string doesn't match any known status.
    pub fn from_db_string(s: &str) -> Option<Self> {
        match s {
            "completed" => Some(Self::Completed),
            "completed_with_errors" => Some(Self::CompletedWithErrors),
            _ => None,
        }
    }
}

impl fmt::Display for SessionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_db_string())
    }
}

/// Counters collected while processing one listing page
///
/// Kept apart from the session so an interrupted page can be dropped
/// without touching the session totals.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PageTally {
    pub jobs_found: u32,
    pub jobs_inserted: u32,
    pub duplicates_found: u32,
    pub errors: u32,
}

/// Counters for one crawl run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CrawlSession {
    pub started_at: DateTime<Utc>,
    pub pages_scraped: u32,
    pub jobs_found: u32,
    pub jobs_inserted: u32,
    pub duplicates_found: u32,
    pub errors: u32,
    pub stop_reason: Option<StopReason>,
}

impl CrawlSession {
    pub fn new(started_at: DateTime<Utc>) -> Self {
        Self {
            started_at,
            pages_scraped: 0,
            jobs_found: 0,
            jobs_inserted: 0,
            duplicates_found: 0,
            errors: 0,
            stop_reason: None,
        }
    }

    /// Folds a persisted page into the session totals
    pub fn commit_page(&mut self, tally: &PageTally) {
        self.pages_scraped += 1;
        self.jobs_found += tally.jobs_found;
        self.jobs_inserted += tally.jobs_inserted;
        self.duplicates_found += tally.duplicates_found;
        self.errors += tally.errors;
    }

    /// Records a listing page that could not be fetched
    pub fn record_failed_page(&mut self) {
        self.errors += 1;
    }

    pub fn finish(&mut self, reason: StopReason) {
        self.stop_reason = Some(reason);
    }

    /// `Completed` iff no errors were recorded
    pub fn status(&self) -> SessionStatus {
        if self.errors == 0 {
            SessionStatus::Completed
        } else {
            SessionStatus::CompletedWithErrors
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_roundtrip() {
        for status in [SessionStatus::Completed, SessionStatus::CompletedWithErrors] {
            assert_eq!(SessionStatus::from_db_string(status.to_db_string()), Some(status));
        }
        assert_eq!(SessionStatus::from_db_string("running"), None);
    }

    #[test]
    fn test_commit_page_accumulates() {
        let mut session = CrawlSession::new(Utc::now());
        let tally = PageTally {
            jobs_found: 20,
            jobs_inserted: 18,
            duplicates_found: 2,
            errors: 0,
        };

        session.commit_page(&tally);
        session.commit_page(&tally);

        assert_eq!(session.pages_scraped, 2);
        assert_eq!(session.jobs_found, 40);
        assert_eq!(session.jobs_inserted, 36);
        assert_eq!(session.duplicates_found, 4);
        assert_eq!(session.status(), SessionStatus::Completed);
    }

    #[test]
    fn test_errors_change_status() {
        let mut session = CrawlSession::new(Utc::now());
        session.record_failed_page();

        assert_eq!(session.pages_scraped, 0);
        assert_eq!(session.errors, 1);
        assert_eq!(session.status(), SessionStatus::CompletedWithErrors);
    }
}
