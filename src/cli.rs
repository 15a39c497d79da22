//! CLI commands for jobseeker.
//!
//! Registers the user, scans the configured job boards and lists what was found.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::time::Duration;

use crate::config::AppConfig;
use crate::scraper::{scan_targets, HttpTransport, PoliteFetcher, PolitenessTable, ScanReport, Scanner};
use crate::storage::{JobFilter, JobRepository};
use crate::types::{JobStatus, JobType, PersistedJob, Source, User};

#[derive(Parser)]
#[command(name = "jobseeker")]
#[command(version, about = "Jobseeker: scan job boards and keep track of new postings", long_about = None)]
pub struct Cli {
    /// Config file (extension optional)
    #[arg(short, long, global = true, default_value = "config")]
    pub config: PathBuf,

    /// Database path override
    #[arg(long, global = true)]
    pub database: Option<PathBuf>,

    /// User email override
    #[arg(short, long, global = true)]
    pub user: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Create the user the scanned jobs are stored under
    Init {
        /// Display name
        #[arg(short, long)]
        name: Option<String>,

        /// Preferred location, used for keyword searches
        #[arg(short, long)]
        location: Option<String>,
    },

    /// Scan enabled job boards and save new postings
    Scan {
        /// Only scan these boards
        #[arg(short, long, value_enum)]
        source: Vec<Source>,
    },

    /// List saved jobs, newest first
    List {
        /// Filter by status
        #[arg(short, long, value_enum)]
        status: Option<JobStatus>,

        /// Filter by job type
        #[arg(short = 't', long = "type", value_enum)]
        job_type: Option<JobType>,

        /// Shorthand for --type contract
        #[arg(long, conflicts_with = "job_type")]
        contract: bool,

        /// Maximum number of jobs to show
        #[arg(short = 'n', long, default_value_t = 10)]
        limit: usize,

        /// Output format (table, json)
        #[arg(short, long, default_value = "table")]
        format: String,
    },

    /// Show job counts for the user
    Stats,
}

impl Cli {
    /// Load configuration and apply command line overrides
    pub fn load_config(&self) -> Result<AppConfig> {
        let mut config = AppConfig::load(&self.config)?;

        if let Some(ref path) = self.database {
            config.database.path = path.to_string_lossy().to_string();
        }
        if let Some(ref email) = self.user {
            config.user.email = email.clone();
        }

        Ok(config)
    }
}

fn open_repository(config: &AppConfig) -> Result<JobRepository> {
    let path = PathBuf::from(&config.database.path);
    JobRepository::new(&path).with_context(|| format!("Failed to open database at {}", path.display()))
}

fn current_user(repo: &JobRepository, config: &AppConfig) -> Result<User> {
    if config.user.email.trim().is_empty() {
        anyhow::bail!("No user email configured. Set user.email in the config file or pass --user");
    }
    repo.get_user_by_email(config.user.email.trim())?
        .with_context(|| format!("User {} not found. Run 'jobseeker init' first", config.user.email))
}

/// Create the configured user if it does not exist yet.
pub fn run_init(config: AppConfig, name: Option<String>, location: Option<String>) -> Result<()> {
    let repo = open_repository(&config)?;

    let name = name.unwrap_or_else(|| config.user.name.clone());
    let location = location.unwrap_or_else(|| config.user.location.clone());
    let user = repo.get_or_create_user(&config.user.email, &name, &location)?;

    println!("User: {} <{}> (id {})", user.name, user.email, user.id);
    println!("Database: {}", config.database.path);
    Ok(())
}

/// Scan the enabled job boards for the current user.
pub async fn run_scan(config: AppConfig, sources: Vec<Source>) -> Result<()> {
    let repo = open_repository(&config)?;
    let user = current_user(&repo, &config)?;
    println!("Scanning for user: {} ({})", user.name, user.email);

    let targets = scan_targets(&config, &sources);
    if targets.iter().all(|t| t.urls.is_empty()) {
        println!("No enabled job boards with search URLs. Check job_boards in the config file.");
        return Ok(());
    }

    let table = PolitenessTable::from_config(&config.scraper);
    let transport = HttpTransport::new(
        &config.scraper.user_agent,
        Duration::from_secs(config.scraper.timeout_secs),
        &table,
    )?;
    let fetcher = PoliteFetcher::new(transport, table);
    let scanner = Scanner::new(fetcher, &repo, user.id);

    let report = scanner.scan(&targets).await;
    print_scan_report(&report);
    Ok(())
}

fn print_scan_report(report: &ScanReport) {
    println!();
    println!("=== Scan Results ===");
    for url in &report.urls {
        match url.error {
            Some(ref e) => println!("  [{}] {}: failed ({})", url.source, url.url, e),
            None => println!(
                "  [{}] {}: found {}, saved {}, skipped {}",
                url.source, url.url, url.found, url.summary.saved, url.summary.skipped
            ),
        }
    }

    let totals = report.totals();
    println!();
    println!("Total jobs found: {}", report.total_found());
    println!("New jobs saved:   {}", totals.saved);
    println!("Skipped:          {}", totals.skipped);
    if report.failed() > 0 {
        println!("Failed URLs:      {}", report.failed());
    }
}

/// List saved jobs for the current user.
pub fn run_list(
    config: AppConfig,
    status: Option<JobStatus>,
    job_type: Option<JobType>,
    contract: bool,
    limit: usize,
    format: String,
) -> Result<()> {
    let repo = open_repository(&config)?;
    let user = current_user(&repo, &config)?;

    let filter = JobFilter {
        status,
        job_type: if contract { Some(JobType::Contract) } else { job_type },
        limit,
    };
    let jobs = repo.list_jobs(user.id, &filter)?;

    match format.as_str() {
        "json" => println!("{}", serde_json::to_string_pretty(&jobs)?),
        "table" => print_job_table(&jobs),
        _ => {
            eprintln!("Unknown format: {}. Using table.", format);
            print_job_table(&jobs);
        }
    }
    Ok(())
}

fn print_job_table(jobs: &[PersistedJob]) {
    if jobs.is_empty() {
        println!("No jobs found.");
        return;
    }

    println!(
        "{:>5}  {:<9}  {:<10}  {:<11}  {:<40}  {:<25}",
        "ID", "Source", "Type", "Status", "Title", "Company"
    );
    for job in jobs {
        println!(
            "{:>5}  {:<9}  {:<10}  {:<11}  {:<40}  {:<25}",
            job.id,
            job.source,
            job.job_type,
            job.status,
            truncate(&job.title, 40),
            truncate(&job.company, 25)
        );
        println!("       {}", job.url);
    }
    println!();
    println!("{} job(s)", jobs.len());
}

/// Show per user job counts.
pub fn run_stats(config: AppConfig) -> Result<()> {
    let repo = open_repository(&config)?;
    let user = current_user(&repo, &config)?;
    let stats = repo.user_stats(user.id)?;

    println!("Stats for {} ({})", user.name, user.email);
    println!("Total jobs: {}", stats.total_jobs);

    println!();
    println!("=== By Status ===");
    for status in JobStatus::ALL {
        println!("  {:<12} {:>5}", status.as_str(), stats.status_count(status));
    }

    println!();
    println!("=== By Type ===");
    for job_type in [JobType::Contract, JobType::Permanent, JobType::Unknown] {
        println!("  {:<12} {:>5}", job_type.as_str(), stats.type_count(job_type));
    }
    Ok(())
}

fn truncate(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    let mut out: String = text.chars().take(max_chars.saturating_sub(3)).collect();
    out.push_str("...");
    out
}
