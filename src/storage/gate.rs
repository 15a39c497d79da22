//! Persistence gate: check-then-insert per (external_id, user)
//!
//! A record already stored for the user is skipped. Lookup and insert
//! failures skip only the record they occurred on; the batch always runs to
//! the end. A unique constraint rejection from a concurrent writer counts as
//! a skip.

use tracing::{debug, info, warn};

use super::JobStore;
use crate::error::StoreError;
use crate::types::RawJobRecord;

/// Outcome of saving one batch
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SaveSummary {
    pub saved: usize,
    pub skipped: usize,
}

impl std::ops::AddAssign for SaveSummary {
    fn add_assign(&mut self, other: Self) {
        self.saved += other.saved;
        self.skipped += other.skipped;
    }
}

/// Save new records for a user, skipping any already stored
pub fn save_jobs(store: &dyn JobStore, records: &[RawJobRecord], user_id: i64) -> SaveSummary {
    let mut summary = SaveSummary::default();

    for record in records {
        match store.find_by_external_id_and_user(&record.external_id, user_id) {
            Ok(_) => {
                debug!("Job already exists, skipping: {}", record.external_id);
                summary.skipped += 1;
                continue;
            }
            Err(StoreError::NotFound) => {}
            Err(e) => {
                warn!("Failed to look up job {}: {}", record.external_id, e);
                summary.skipped += 1;
                continue;
            }
        }

        match store.insert(user_id, record) {
            Ok(()) => {
                info!("Saved job: {} at {}", record.title, record.company);
                summary.saved += 1;
            }
            Err(StoreError::Duplicate) => {
                debug!("Job inserted concurrently, skipping: {}", record.external_id);
                summary.skipped += 1;
            }
            Err(e) => {
                warn!("Failed to save job {}: {}", record.external_id, e);
                summary.skipped += 1;
            }
        }
    }

    summary
}
