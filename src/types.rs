//! Job records shared by the scraper and storage layers.

use chrono::{DateTime, Utc};
use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Job board a record was scraped from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Source {
    Seek,
    Linkedin,
    Indeed,
}

impl Source {
    /// Scan order used by the orchestrator
    pub const ALL: [Source; 3] = [Source::Seek, Source::Linkedin, Source::Indeed];

    pub fn as_str(&self) -> &'static str {
        match self {
            Source::Seek => "seek",
            Source::Linkedin => "linkedin",
            Source::Indeed => "indeed",
        }
    }
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Source {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "seek" => Ok(Source::Seek),
            "linkedin" => Ok(Source::Linkedin),
            "indeed" => Ok(Source::Indeed),
            other => anyhow::bail!("unknown job source: {}", other),
        }
    }
}

/// Employment type inferred from title, salary and URL
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum JobType {
    Contract,
    Permanent,
    Unknown,
}

impl JobType {
    pub fn as_str(&self) -> &'static str {
        match self {
            JobType::Contract => "contract",
            JobType::Permanent => "permanent",
            JobType::Unknown => "unknown",
        }
    }
}

impl fmt::Display for JobType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for JobType {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "contract" => Ok(JobType::Contract),
            "permanent" => Ok(JobType::Permanent),
            "unknown" => Ok(JobType::Unknown),
            other => anyhow::bail!("unknown job type: {}", other),
        }
    }
}

/// Application workflow status. The scraper only ever writes `Discovered`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    Discovered,
    Recommended,
    Approved,
    Applied,
    Rejected,
}

impl JobStatus {
    pub const ALL: [JobStatus; 5] = [
        JobStatus::Discovered,
        JobStatus::Recommended,
        JobStatus::Approved,
        JobStatus::Applied,
        JobStatus::Rejected,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            JobStatus::Discovered => "discovered",
            JobStatus::Recommended => "recommended",
            JobStatus::Approved => "approved",
            JobStatus::Applied => "applied",
            JobStatus::Rejected => "rejected",
        }
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for JobStatus {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        JobStatus::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| anyhow::anyhow!("unknown job status: {}", s))
    }
}

/// A job card extracted from a search results page, not yet persisted
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RawJobRecord {
    pub source: Source,
    pub url: String,
    pub title: String,
    pub company: String,
    pub location: String,
    pub salary: String,
    pub external_id: String,
    pub job_type: JobType,
    pub status: JobStatus,
}

/// A stored job owned by one user; `(user_id, external_id)` is unique
#[derive(Debug, Clone, Serialize)]
pub struct PersistedJob {
    pub id: i64,
    pub user_id: i64,
    pub source: String,
    pub external_id: String,
    pub url: String,
    pub title: String,
    pub company: String,
    pub location: String,
    pub salary: String,
    pub job_type: String,
    pub status: String,
    pub created_at: DateTime<Utc>,
}

/// Registered user of the tool
#[derive(Debug, Clone, Serialize)]
pub struct User {
    pub id: i64,
    pub email: String,
    pub name: String,
    pub location: String,
    pub created_at: DateTime<Utc>,
}
