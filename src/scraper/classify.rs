//! Contract / permanent classification by keyword.

use crate::types::JobType;

const CONTRACT_KEYWORDS: [&str; 14] = [
    "contract",
    "contractor",
    "freelance",
    "hourly",
    "/hr",
    "per hour",
    "/day",
    "per day",
    "daily rate",
    "day rate",
    "temp",
    "temporary",
    "fixed term",
    "ftc",
];

const PERMANENT_KEYWORDS: [&str; 8] = [
    "permanent",
    "full-time",
    "full time",
    "perm",
    "per year",
    "per annum",
    "p.a.",
    "salary",
];

/// Classify a posting from its title, salary text and URL.
///
/// Case-insensitive substring match over all three inputs. Contract keywords
/// are checked first and win even when a permanent keyword also appears.
pub fn classify(title: &str, salary: &str, url: &str) -> JobType {
    let combined = format!("{} {} {}", title, salary, url).to_lowercase();

    if CONTRACT_KEYWORDS.iter().any(|k| combined.contains(k)) {
        return JobType::Contract;
    }
    if PERMANENT_KEYWORDS.iter().any(|k| combined.contains(k)) {
        return JobType::Permanent;
    }
    JobType::Unknown
}
