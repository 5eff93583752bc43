//! Storage traits and error types
//!
//! This module defines the trait interface for storage backends and
//! associated error types.

use crate::posting::JobPosting;
use crate::state::CrawlSession;
use crate::storage::{InsertOutcome, SessionRecord, StoredPosting};
use thiserror::Error;

/// Errors that can occur during storage operations
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Invalid stored value in {column}: {value}")]
    InvalidValue { column: &'static str, value: String },

    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Trait for storage backend implementations
///
/// Writes are idempotent on the posting identity hash: a second insert of
/// the same hash reports `Duplicate` and leaves the stored row untouched.
pub trait Storage {
    // ===== Postings =====

    /// Inserts a posting and its skills in one transaction
    ///
    /// # Returns
    ///
    /// `Inserted(id)` for a new identity hash, `Duplicate` otherwise
    fn insert_posting(&mut self, posting: &JobPosting) -> StorageResult<InsertOutcome>;

    /// Gets active postings scraped within the trailing `window`
    ///
    /// Ordered by scrape time, then id.
    fn get_postings(&self, window: chrono::Duration) -> StorageResult<Vec<StoredPosting>>;

    /// Gets the total number of stored postings
    fn count_postings(&self) -> StorageResult<u64>;

    // ===== Session Log =====

    /// Appends a finished crawl session to the log
    ///
    /// # Returns
    ///
    /// The ID of the new log row
    fn log_session(&mut self, session: &CrawlSession) -> StorageResult<i64>;

    /// Gets the most recent sessions, newest first
    fn recent_sessions(&self, limit: u32) -> StorageResult<Vec<SessionRecord>>;
}
