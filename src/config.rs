//! Configuration for jobseeker.

use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;

use crate::types::Source;

/// Database configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    #[serde(default = "default_db_path")]
    pub path: String,
}

fn default_db_path() -> String {
    "./jobseeker.db".to_string()
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_db_path(),
        }
    }
}

/// Identity the scanned jobs are stored under
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UserConfig {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub location: String,
}

/// Per domain group politeness override. Unset fields keep the built-in value.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GroupOverride {
    #[serde(default)]
    pub delay_ms: Option<u64>,
    #[serde(default)]
    pub jitter_ms: Option<u64>,
    #[serde(default)]
    pub max_concurrent: Option<usize>,
}

/// Scraper configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScraperConfig {
    /// Baseline delay between requests to the same domain group
    #[serde(default = "default_delay_ms")]
    pub delay_ms: u64,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
    /// Keyed by domain group name (seek, linkedin, indeed)
    #[serde(default)]
    pub groups: HashMap<String, GroupOverride>,
}

fn default_delay_ms() -> u64 {
    2000
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_user_agent() -> String {
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36".to_string()
}

impl Default for ScraperConfig {
    fn default() -> Self {
        Self {
            delay_ms: default_delay_ms(),
            timeout_secs: default_timeout_secs(),
            user_agent: default_user_agent(),
            groups: HashMap::new(),
        }
    }
}

/// Search configuration for one job board
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct JobBoardConfig {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default)]
    pub search_urls: Vec<String>,
    /// Extra search keywords turned into SEEK search URLs
    #[serde(default)]
    pub keywords: Vec<String>,
    #[serde(default)]
    pub location: Option<String>,
}

/// Application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub user: UserConfig,
    #[serde(default)]
    pub scraper: ScraperConfig,
    #[serde(default)]
    pub job_boards: HashMap<String, JobBoardConfig>,
}

impl AppConfig {
    /// Load configuration from defaults, an optional config file and the environment
    pub fn load(config_path: &Path) -> anyhow::Result<Self> {
        // A missing .env file is the normal case
        let _ = dotenvy::dotenv();

        let config = config::Config::builder()
            .add_source(config::Config::try_from(&AppConfig::default())?)
            .add_source(config::File::from(config_path).required(false))
            // JOBSEEKER_SCRAPER__DELAY_MS, JOBSEEKER_USER__EMAIL, ...
            .add_source(
                config::Environment::with_prefix("JOBSEEKER")
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .with_context(|| format!("Failed to load configuration from {}", config_path.display()))?;

        Ok(config.try_deserialize()?)
    }

    /// Board settings for a source, if the board is configured
    pub fn board(&self, source: Source) -> Option<&JobBoardConfig> {
        self.job_boards.get(source.as_str())
    }
}
