//! SQLite storage implementation
//!
//! This module provides a SQLite-based implementation of the Storage trait.
//! Every operation opens its own short-lived connection, so clones of one
//! `SqliteStorage` can be used from several threads; the `UNIQUE`
//! constraint on the identity hash keeps concurrent inserts correct.

use crate::extract::{ExperienceRange, Field, SalaryRange, Skill, SkillCategory};
use crate::posting::JobPosting;
use crate::state::{CrawlSession, SessionStatus};
use crate::storage::schema::initialize_schema;
use crate::storage::traits::{Storage, StorageError, StorageResult};
use crate::storage::{InsertOutcome, SessionRecord, StoredPosting};
use crate::TideError;
use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::types::Type;
use rusqlite::{params, Connection, Row, TransactionBehavior};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// How long a connection waits on a locked database before failing
const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

const POSTING_COLUMNS: &str = "id, title, company, location, experience_min, experience_max, \
     salary_min, salary_max, description, date_posted, date_scraped, url, identity_hash, is_active";

/// SQLite storage backend
#[derive(Debug, Clone)]
pub struct SqliteStorage {
    path: PathBuf,
}

impl SqliteStorage {
    /// Opens or creates the database and initializes the schema
    ///
    /// # Arguments
    ///
    /// * `path` - Path to the SQLite database file
    ///
    /// # Returns
    ///
    /// * `Ok(SqliteStorage)` - Successfully opened/created database
    /// * `Err(TideError)` - Failed to open database
    pub fn new(path: &Path) -> Result<Self, TideError> {
        let conn = Connection::open(path)?;

        // WAL is persistent, so it only needs setting once
        conn.execute_batch(
            "
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;
            PRAGMA foreign_keys = ON;
        ",
        )?;

        initialize_schema(&conn)?;

        Ok(Self {
            path: path.to_path_buf(),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn connect(&self) -> StorageResult<Connection> {
        let conn = Connection::open(&self.path)?;
        conn.busy_timeout(BUSY_TIMEOUT)?;
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        Ok(conn)
    }
}

impl Storage for SqliteStorage {
    // ===== Postings =====

    fn insert_posting(&mut self, posting: &JobPosting) -> StorageResult<InsertOutcome> {
        let mut conn = self.connect()?;
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

        let changed = tx.execute(
            "INSERT INTO job_postings (title, company, location, experience_min, experience_max,
                 salary_min, salary_max, description, date_posted, date_scraped, url,
                 identity_hash, is_active)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)
             ON CONFLICT(identity_hash) DO NOTHING",
            params![
                posting.title,
                posting.company,
                posting.location.as_option(),
                posting.experience_min(),
                posting.experience_max(),
                posting.salary_min(),
                posting.salary_max(),
                posting.description,
                posting.date_posted,
                format_timestamp(&posting.date_scraped),
                posting.source_url,
                posting.identity_hash,
                posting.is_active,
            ],
        )?;

        if changed == 0 {
            // Dropping the transaction rolls it back
            return Ok(InsertOutcome::Duplicate);
        }

        let job_id = tx.last_insert_rowid();
        {
            let mut stmt = tx.prepare(
                "INSERT OR IGNORE INTO job_skills (job_id, skill, category) VALUES (?1, ?2, ?3)",
            )?;
            for skill in &posting.skills {
                stmt.execute(params![job_id, skill.name, skill.category.to_db_string()])?;
            }
        }

        tx.commit()?;
        Ok(InsertOutcome::Inserted(job_id))
    }

    fn get_postings(&self, window: chrono::Duration) -> StorageResult<Vec<StoredPosting>> {
        let conn = self.connect()?;
        // A window reaching past the earliest representable time covers every row
        let cutoff = Utc::now()
            .checked_sub_signed(window.max(chrono::Duration::zero()))
            .map(|since| format_timestamp(&since))
            .unwrap_or_default();

        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM job_postings
             WHERE date_scraped >= ?1 AND is_active = 1
             ORDER BY date_scraped, id",
            POSTING_COLUMNS
        ))?;

        let mut postings = stmt
            .query_map(params![cutoff], row_to_posting)?
            .collect::<Result<Vec<_>, _>>()?;

        let mut skills_stmt =
            conn.prepare("SELECT skill, category FROM job_skills WHERE job_id = ?1 ORDER BY id")?;
        for stored in &mut postings {
            stored.posting.skills = skills_stmt
                .query_map(params![stored.id], |row| {
                    Ok(Skill {
                        name: row.get(0)?,
                        category: SkillCategory::from_db_string(&row.get::<_, String>(1)?),
                    })
                })?
                .collect::<Result<Vec<_>, _>>()?;
        }

        Ok(postings)
    }

    fn count_postings(&self) -> StorageResult<u64> {
        let conn = self.connect()?;
        let count: i64 = conn.query_row("SELECT COUNT(*) FROM job_postings", [], |row| row.get(0))?;
        Ok(count as u64)
    }

    // ===== Session Log =====

    fn log_session(&mut self, session: &CrawlSession) -> StorageResult<i64> {
        let conn = self.connect()?;
        conn.execute(
            "INSERT INTO scraping_log (timestamp, pages_scraped, jobs_found, jobs_inserted,
                 duplicates_found, errors, status)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                format_timestamp(&Utc::now()),
                session.pages_scraped,
                session.jobs_found,
                session.jobs_inserted,
                session.duplicates_found,
                session.errors,
                session.status().to_db_string(),
            ],
        )?;
        Ok(conn.last_insert_rowid())
    }

    fn recent_sessions(&self, limit: u32) -> StorageResult<Vec<SessionRecord>> {
        let conn = self.connect()?;
        let mut stmt = conn.prepare(
            "SELECT id, timestamp, pages_scraped, jobs_found, jobs_inserted, duplicates_found,
                    errors, status
             FROM scraping_log ORDER BY id DESC LIMIT ?1",
        )?;

        let rows = stmt
            .query_map(params![limit], |row| {
                Ok((
                    row.get::<_, i64>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, u32>(2)?,
                    row.get::<_, u32>(3)?,
                    row.get::<_, u32>(4)?,
                    row.get::<_, u32>(5)?,
                    row.get::<_, u32>(6)?,
                    row.get::<_, String>(7)?,
                ))
            })?
            .collect::<Result<Vec<_>, _>>()?;

        let mut sessions = Vec::with_capacity(rows.len());
        for (id, timestamp, pages, found, inserted, duplicates, errors, status) in rows {
            let status = SessionStatus::from_db_string(&status).ok_or(StorageError::InvalidValue {
                column: "scraping_log.status",
                value: status,
            })?;
            sessions.push(SessionRecord {
                id,
                timestamp,
                pages_scraped: pages,
                jobs_found: found,
                jobs_inserted: inserted,
                duplicates_found: duplicates,
                errors,
                status,
            });
        }

        Ok(sessions)
    }
}

/// Fixed-width RFC 3339 in UTC, so stored timestamps sort as text
fn format_timestamp(dt: &DateTime<Utc>) -> String {
    dt.to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn row_to_posting(row: &Row<'_>) -> rusqlite::Result<StoredPosting> {
    let experience = match (row.get::<_, Option<u32>>(4)?, row.get::<_, Option<u32>>(5)?) {
        (Some(min), Some(max)) => Field::Present(ExperienceRange::new(min, max)),
        _ => Field::Unknown,
    };
    let salary = match (row.get::<_, Option<f64>>(6)?, row.get::<_, Option<f64>>(7)?) {
        (Some(min), Some(max)) => Field::Present(SalaryRange::new(min, max)),
        _ => Field::Unknown,
    };

    let scraped: String = row.get(10)?;
    let date_scraped = DateTime::parse_from_rfc3339(&scraped)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(10, Type::Text, Box::new(e)))?;

    Ok(StoredPosting {
        id: row.get(0)?,
        posting: JobPosting {
            title: row.get(1)?,
            company: row.get(2)?,
            location: row.get::<_, Option<String>>(3)?.into(),
            experience,
            salary,
            description: row.get(8)?,
            skills: Vec::new(),
            date_posted: row.get(9)?,
            date_scraped,
            source_url: row.get(11)?,
            identity_hash: row.get(12)?,
            is_active: row.get(13)?,
        },
    })
}
