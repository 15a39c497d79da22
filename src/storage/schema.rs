//! SQLite schema definitions
//!
//! Tables:
//! - users: People scanning for jobs, keyed by email
//! - jobs: Scraped postings, unique per (user_id, external_id)

use rusqlite::{Connection, Result};

/// Create all tables in the database
pub fn create_tables(conn: &Connection) -> Result<()> {
    conn.execute(
        r#"
        CREATE TABLE IF NOT EXISTS users (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            email TEXT NOT NULL UNIQUE,
            name TEXT NOT NULL DEFAULT '',
            location TEXT NOT NULL DEFAULT '',
            created_at TEXT NOT NULL
        )
        "#,
        [],
    )?;

    conn.execute(
        r#"
        CREATE TABLE IF NOT EXISTS jobs (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            user_id INTEGER NOT NULL REFERENCES users(id),
            external_id TEXT NOT NULL,
            source TEXT NOT NULL,
            url TEXT NOT NULL,
            title TEXT NOT NULL,
            company TEXT NOT NULL DEFAULT '',
            location TEXT NOT NULL DEFAULT '',
            salary TEXT NOT NULL DEFAULT '',
            job_type TEXT NOT NULL,
            status TEXT NOT NULL,
            created_at TEXT NOT NULL,
            UNIQUE(user_id, external_id)
        )
        "#,
        [],
    )?;

    conn.execute("CREATE INDEX IF NOT EXISTS idx_jobs_source ON jobs(source)", [])?;
    conn.execute("CREATE INDEX IF NOT EXISTS idx_jobs_job_type ON jobs(job_type)", [])?;
    conn.execute("CREATE INDEX IF NOT EXISTS idx_jobs_status ON jobs(status)", [])?;

    Ok(())
}
