//! SQLite storage for scraped job postings
//!
//! The scan pipeline only talks to [`JobStore`]; [`JobRepository`] is the
//! SQLite implementation used by the CLI.

pub mod gate;
pub mod repository;
pub mod schema;

pub use gate::{save_jobs, SaveSummary};
pub use repository::{JobFilter, JobRepository};

use crate::error::StoreError;
use crate::types::{PersistedJob, RawJobRecord};

/// Job persistence used by the persistence gate
pub trait JobStore {
    /// Look up a stored job by its external ID for one user
    fn find_by_external_id_and_user(&self, external_id: &str, user_id: i64) -> Result<PersistedJob, StoreError>;

    /// Store a new job for a user
    fn insert(&self, user_id: i64, record: &RawJobRecord) -> Result<(), StoreError>;
}
