//! Database schema definitions
//!
//! This module contains all SQL schema definitions for the Job-Tide database.

/// SQL schema for the database
pub const SCHEMA_SQL: &str = r#"
-- One row per distinct posting, keyed by identity hash
CREATE TABLE IF NOT EXISTS job_postings (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    title TEXT NOT NULL,
    company TEXT NOT NULL,
    location TEXT,
    experience_min INTEGER,
    experience_max INTEGER,
    salary_min REAL,
    salary_max REAL,
    description TEXT NOT NULL DEFAULT '',
    date_posted TEXT,
    date_scraped TEXT NOT NULL,
    url TEXT NOT NULL,
    identity_hash TEXT NOT NULL UNIQUE,
    is_active INTEGER NOT NULL DEFAULT 1
);

CREATE INDEX IF NOT EXISTS idx_job_postings_date_scraped ON job_postings(date_scraped);

-- Skills mentioned by each posting
CREATE TABLE IF NOT EXISTS job_skills (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    job_id INTEGER NOT NULL REFERENCES job_postings(id),
    skill TEXT NOT NULL,
    category TEXT NOT NULL,
    UNIQUE(job_id, skill)
);

CREATE INDEX IF NOT EXISTS idx_job_skills_job ON job_skills(job_id);

-- Append-only crawl session log
CREATE TABLE IF NOT EXISTS scraping_log (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    timestamp TEXT NOT NULL,
    pages_scraped INTEGER NOT NULL,
    jobs_found INTEGER NOT NULL,
    jobs_inserted INTEGER NOT NULL,
    duplicates_found INTEGER NOT NULL,
    errors INTEGER NOT NULL,
    status TEXT NOT NULL
);
"#;

/// Initializes the database schema
///
/// # Arguments
///
/// * `conn` - The database connection
pub fn initialize_schema(conn: &rusqlite::Connection) -> Result<(), rusqlite::Error> {
    conn.execute_batch(SCHEMA_SQL)?;
    Ok(())
}
