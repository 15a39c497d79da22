//! Job board scraper for SEEK, LinkedIn and Indeed
//!
//! Provides the polite HTTP fetch layer, per-site extraction rules, job ID
//! derivation, job type classification and the scan orchestrator.

pub mod classify;
pub mod extract;
pub mod fetch;
pub mod job_id;
pub mod parsers;
pub mod politeness;
pub mod scan;
pub mod search;

pub use fetch::{HttpTransport, PoliteFetcher};
pub use politeness::PolitenessTable;
pub use scan::{ScanReport, Scanner};
pub use search::scan_targets;
