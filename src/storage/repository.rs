//! SQLite repository for users and their scraped jobs

use anyhow::{bail, Context, Result};
use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::{ffi, params, Connection, ErrorCode, OptionalExtension, Row};
use std::path::Path;

use super::schema::create_tables;
use super::JobStore;
use crate::error::StoreError;
use crate::types::{JobStatus, JobType, PersistedJob, RawJobRecord, User};

const JOB_COLUMNS: &str = "id, user_id, source, external_id, url, title, company, location, \
                           salary, job_type, status, created_at";

/// Filters for listing a user's jobs
#[derive(Debug, Clone)]
pub struct JobFilter {
    pub status: Option<JobStatus>,
    pub job_type: Option<JobType>,
    pub limit: usize,
}

impl Default for JobFilter {
    fn default() -> Self {
        Self {
            status: None,
            job_type: None,
            limit: 10,
        }
    }
}

/// Job counts for one user
#[derive(Debug, Clone, Default, serde::Serialize)]
pub struct UserStats {
    pub total_jobs: i64,
    pub by_status: Vec<(String, i64)>,
    pub by_type: Vec<(String, i64)>,
}

impl UserStats {
    pub fn status_count(&self, status: JobStatus) -> i64 {
        lookup(&self.by_status, status.as_str())
    }

    pub fn type_count(&self, job_type: JobType) -> i64 {
        lookup(&self.by_type, job_type.as_str())
    }
}

fn lookup(counts: &[(String, i64)], key: &str) -> i64 {
    counts
        .iter()
        .find(|(name, _)| name == key)
        .map(|(_, count)| *count)
        .unwrap_or(0)
}

/// Repository for users and jobs
pub struct JobRepository {
    conn: Connection,
}

impl JobRepository {
    /// Create a new repository, initializing the database if needed
    pub fn new(db_path: &Path) -> Result<Self> {
        // Create parent directories if needed
        if let Some(parent) = db_path.parent() {
            std::fs::create_dir_all(parent).context("Failed to create database directory")?;
        }

        let conn = Connection::open(db_path).context("Failed to open database")?;

        conn.execute("PRAGMA foreign_keys = ON", [])?;
        create_tables(&conn)?;

        Ok(Self { conn })
    }

    /// Create an in-memory repository (for testing)
    #[cfg(test)]
    pub fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute("PRAGMA foreign_keys = ON", [])?;
        create_tables(&conn)?;
        Ok(Self { conn })
    }

    // ==================== User Operations ====================

    /// Return the user with this email, creating it when missing
    pub fn get_or_create_user(&self, email: &str, name: &str, location: &str) -> Result<User> {
        let email = email.trim();
        if email.is_empty() {
            bail!("user email is required");
        }

        if let Some(user) = self.get_user_by_email(email)? {
            return Ok(user);
        }

        self.conn
            .execute(
                "INSERT INTO users (email, name, location, created_at) VALUES (?1, ?2, ?3, ?4)",
                params![email, name, location, now_timestamp()],
            )
            .context("Failed to create user")?;

        self.get_user_by_email(email)?
            .context("User missing after insert")
    }

    /// Find a user by email
    pub fn get_user_by_email(&self, email: &str) -> Result<Option<User>> {
        let user = self
            .conn
            .query_row(
                "SELECT id, email, name, location, created_at FROM users WHERE email = ?1",
                [email],
                |row| {
                    Ok(User {
                        id: row.get(0)?,
                        email: row.get(1)?,
                        name: row.get(2)?,
                        location: row.get(3)?,
                        created_at: parse_timestamp(&row.get::<_, String>(4)?),
                    })
                },
            )
            .optional()?;
        Ok(user)
    }

    // ==================== Query Operations ====================

    /// List a user's jobs, newest first
    pub fn list_jobs(&self, user_id: i64, filter: &JobFilter) -> Result<Vec<PersistedJob>> {
        let sql = format!(
            r#"
            SELECT {JOB_COLUMNS}
            FROM jobs
            WHERE user_id = ?1
              AND (?2 IS NULL OR status = ?2)
              AND (?3 IS NULL OR job_type = ?3)
            ORDER BY created_at DESC, id DESC
            LIMIT ?4
            "#
        );
        let mut stmt = self.conn.prepare(&sql)?;

        let jobs = stmt
            .query_map(
                params![
                    user_id,
                    filter.status.map(|s| s.as_str()),
                    filter.job_type.map(|t| t.as_str()),
                    filter.limit as i64,
                ],
                job_from_row,
            )?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(jobs)
    }

    /// Count a user's jobs in total, per status and per job type
    pub fn user_stats(&self, user_id: i64) -> Result<UserStats> {
        let total_jobs: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM jobs WHERE user_id = ?1",
            [user_id],
            |row| row.get(0),
        )?;

        Ok(UserStats {
            total_jobs,
            by_status: self.count_by(user_id, "status")?,
            by_type: self.count_by(user_id, "job_type")?,
        })
    }

    fn count_by(&self, user_id: i64, column: &str) -> Result<Vec<(String, i64)>> {
        let sql = format!(
            "SELECT {column}, COUNT(*) FROM jobs WHERE user_id = ?1 GROUP BY {column} ORDER BY {column}"
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let counts = stmt
            .query_map([user_id], |row| Ok((row.get(0)?, row.get(1)?)))?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(counts)
    }
}

// ==================== Job Store ====================

impl JobStore for JobRepository {
    fn find_by_external_id_and_user(&self, external_id: &str, user_id: i64) -> Result<PersistedJob, StoreError> {
        let sql = format!("SELECT {JOB_COLUMNS} FROM jobs WHERE external_id = ?1 AND user_id = ?2");
        self.conn
            .query_row(&sql, params![external_id, user_id], job_from_row)
            .map_err(|e| match e {
                rusqlite::Error::QueryReturnedNoRows => StoreError::NotFound,
                other => StoreError::Database(other),
            })
    }

    fn insert(&self, user_id: i64, record: &RawJobRecord) -> Result<(), StoreError> {
        self.conn
            .execute(
                r#"
                INSERT INTO jobs
                (user_id, external_id, source, url, title, company, location,
                 salary, job_type, status, created_at)
                VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)
                "#,
                params![
                    user_id,
                    record.external_id,
                    record.source.as_str(),
                    record.url,
                    record.title,
                    record.company,
                    record.location,
                    record.salary,
                    record.job_type.as_str(),
                    record.status.as_str(),
                    now_timestamp(),
                ],
            )
            .map_err(|e| {
                if is_unique_violation(&e) {
                    StoreError::Duplicate
                } else {
                    StoreError::Database(e)
                }
            })?;
        Ok(())
    }
}

fn is_unique_violation(err: &rusqlite::Error) -> bool {
    matches!(
        err,
        rusqlite::Error::SqliteFailure(e, _)
            if e.code == ErrorCode::ConstraintViolation && e.extended_code == ffi::SQLITE_CONSTRAINT_UNIQUE
    )
}

fn job_from_row(row: &Row<'_>) -> rusqlite::Result<PersistedJob> {
    Ok(PersistedJob {
        id: row.get(0)?,
        user_id: row.get(1)?,
        source: row.get(2)?,
        external_id: row.get(3)?,
        url: row.get(4)?,
        title: row.get(5)?,
        company: row.get(6)?,
        location: row.get(7)?,
        salary: row.get(8)?,
        job_type: row.get(9)?,
        status: row.get(10)?,
        created_at: parse_timestamp(&row.get::<_, String>(11)?),
    })
}

// Fixed width so timestamps sort lexically
fn now_timestamp() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn parse_timestamp(value: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_default()
}
