//! Storage module for persisting postings
//!
//! This module handles all database operations, including:
//! - SQLite database initialization and schema management
//! - Idempotent posting inserts keyed by identity hash
//! - Time-windowed retrieval for downstream analysis
//! - The append-only crawl session log

mod schema;
mod sqlite;
mod traits;

pub use sqlite::SqliteStorage;
pub use traits::{Storage, StorageError, StorageResult};

use crate::posting::JobPosting;
use crate::state::SessionStatus;
use crate::TideError;

use std::path::Path;

/// Initializes or opens a storage database
///
/// # Arguments
///
/// * `path` - Path to the SQLite database file
pub fn open_storage(path: &Path) -> Result<SqliteStorage, TideError> {
    SqliteStorage::new(path)
}

/// Result of an insert attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertOutcome {
    /// A new row was written with this ID
    Inserted(i64),

    /// The identity hash already existed; nothing was written
    Duplicate,
}

impl InsertOutcome {
    pub fn is_inserted(&self) -> bool {
        matches!(self, Self::Inserted(_))
    }
}

/// A posting read back from the database
#[derive(Debug, Clone, PartialEq)]
pub struct StoredPosting {
    pub id: i64,
    pub posting: JobPosting,
}

/// Represents a row of the session log
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionRecord {
    pub id: i64,
    pub timestamp: String,
    pub pages_scraped: u32,
    pub jobs_found: u32,
    pub jobs_inserted: u32,
    pub duplicates_found: u32,
    pub errors: u32,
    pub status: SessionStatus,
}
