//! Statistics generation from the job database
//!
//! This module reads the session log and the posting window back from
//! storage and prints them for the `--stats` view.

use crate::state::SessionStatus;
use crate::storage::{SessionRecord, Storage};
use crate::TideError;

/// Number of session log rows shown
pub const RECENT_SESSIONS: u32 = 10;

/// Database statistics summary
#[derive(Debug, Clone, PartialEq)]
pub struct TideStatistics {
    /// All postings ever stored
    pub total_postings: u64,

    /// Active postings scraped inside the window
    pub postings_in_window: u64,

    /// Length of the window in days
    pub window_days: u32,

    /// Most recent sessions first
    pub recent_sessions: Vec<SessionRecord>,
}

impl TideStatistics {
    /// Share of the listed sessions that finished without errors
    pub fn clean_session_rate(&self) -> f64 {
        if self.recent_sessions.is_empty() {
            return 0.0;
        }
        let clean = self
            .recent_sessions
            .iter()
            .filter(|s| s.status == SessionStatus::Completed)
            .count();
        clean as f64 / self.recent_sessions.len() as f64 * 100.0
    }
}

/// Loads statistics from storage
///
/// # Arguments
///
/// * `storage` - The storage backend to query
/// * `window_days` - Trailing window for the posting count
///
/// # Returns
///
/// * `Ok(TideStatistics)` - Successfully loaded statistics
/// * `Err(TideError)` - Failed to query statistics
pub fn load_statistics(storage: &dyn Storage, window_days: u32) -> Result<TideStatistics, TideError> {
    let total_postings = storage.count_postings()?;
    let postings_in_window = storage
        .get_postings(chrono::Duration::days(i64::from(window_days)))?
        .len() as u64;
    let recent_sessions = storage.recent_sessions(RECENT_SESSIONS)?;

    Ok(TideStatistics {
        total_postings,
        postings_in_window,
        window_days,
        recent_sessions,
    })
}

/// Prints statistics to stdout in a formatted manner
pub fn print_statistics(stats: &TideStatistics) {
    println!("=== Job-Tide Statistics ===\n");

    println!("Postings:");
    println!("  Total stored: {}", stats.total_postings);
    println!(
        "  Scraped in the last {} days: {}",
        stats.window_days, stats.postings_in_window
    );
    println!();

    if stats.recent_sessions.is_empty() {
        println!("No crawl sessions logged yet");
        return;
    }

    println!("Recent Sessions ({}):", stats.recent_sessions.len());
    for session in &stats.recent_sessions {
        println!(
            "  #{} {} | {} pages, {} found, {} new, {} duplicates, {} errors | {}",
            session.id,
            session.timestamp,
            session.pages_scraped,
            session.jobs_found,
            session.jobs_inserted,
            session.duplicates_found,
            session.errors,
            session.status
        );
    }
    println!();

    println!("Clean sessions: {:.1}%", stats.clean_session_rate());
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::CrawlSession;
    use crate::storage::open_storage;
    use chrono::Utc;

    fn record(id: i64, status: SessionStatus) -> SessionRecord {
        SessionRecord {
            id,
            timestamp: "2024-01-01T00:00:00Z".to_string(),
            pages_scraped: 2,
            jobs_found: 10,
            jobs_inserted: 8,
            duplicates_found: 2,
            errors: 0,
            status,
        }
    }

    #[test]
    fn test_clean_session_rate() {
        let stats = TideStatistics {
            total_postings: 0,
            postings_in_window: 0,
            window_days: 7,
            recent_sessions: vec![
                record(1, SessionStatus::Completed),
                record(2, SessionStatus::CompletedWithErrors),
            ],
        };
        assert!((stats.clean_session_rate() - 50.0).abs() < f64::EPSILON);

        let empty = TideStatistics {
            recent_sessions: vec![],
            ..stats
        };
        assert_eq!(empty.clean_session_rate(), 0.0);
    }

    #[test]
    fn test_load_statistics_from_empty_database() {
        let dir = tempfile::tempdir().unwrap();
        let mut storage = open_storage(&dir.path().join("jobs.db")).unwrap();

        let stats = load_statistics(&storage, 7).unwrap();
        assert_eq!(stats.total_postings, 0);
        assert!(stats.recent_sessions.is_empty());

        let mut session = CrawlSession::new(Utc::now());
        session.errors = 1;
        storage.log_session(&session).unwrap();

        let stats = load_statistics(&storage, u32::MAX).unwrap();
        assert_eq!(stats.window_days, u32::MAX);
        assert_eq!(stats.recent_sessions.len(), 1);
        assert_eq!(
            stats.recent_sessions[0].status,
            SessionStatus::CompletedWithErrors
        );
    }
}
