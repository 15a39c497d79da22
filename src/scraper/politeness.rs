//! Per domain group politeness: allow-list, request spacing with jitter,
//! concurrency caps and browser-like headers.

use rand::Rng;
use tokio::sync::{AcquireError, Semaphore, SemaphorePermit};
use tokio::time::Duration;

use crate::config::ScraperConfig;

const ACCEPT_HTML: &str = "text/html,application/xhtml+xml,application/xml;q=0.9,image/webp,*/*;q=0.8";

/// Headers sent with every request to a domain group
#[derive(Debug, Clone)]
pub struct SiteHeaders {
    pub referer: &'static str,
    pub origin: &'static str,
    pub accept: &'static str,
    pub accept_language: &'static str,
}

impl SiteHeaders {
    pub fn pairs(&self) -> [(&'static str, &'static str); 4] {
        [
            ("Referer", self.referer),
            ("Origin", self.origin),
            ("Accept", self.accept),
            ("Accept-Language", self.accept_language),
        ]
    }
}

/// Hosts any request may go to, redirects included
const ALLOWED_HOSTS: &[&str] = &[
    "seek.com.au",
    "www.seek.com.au",
    "linkedin.com",
    "www.linkedin.com",
    "au.linkedin.com",
    "indeed.com",
    "www.indeed.com",
    "au.indeed.com",
];

/// Politeness settings for one job board's hostnames
#[derive(Debug, Clone)]
pub struct DomainGroup {
    pub name: &'static str,
    /// Selects the group for an allow-listed host
    pub domain_glob: &'static str,
    pub delay: Duration,
    pub jitter: Duration,
    pub max_concurrent: usize,
    pub headers: SiteHeaders,
}

impl DomainGroup {
    pub fn matches(&self, host: &str) -> bool {
        glob_match(self.domain_glob, host)
    }
}

/// Built-in groups. LinkedIn and Indeed get longer jitter and a single
/// connection; both throttle automated traffic sooner than SEEK.
fn builtin_groups(delay: Duration) -> Vec<DomainGroup> {
    vec![
        DomainGroup {
            name: "seek",
            domain_glob: "*seek.com.au",
            delay,
            jitter: Duration::from_secs(1),
            max_concurrent: 2,
            headers: SiteHeaders {
                referer: "https://www.seek.com.au/",
                origin: "https://www.seek.com.au",
                accept: ACCEPT_HTML,
                accept_language: "en-AU,en;q=0.9",
            },
        },
        DomainGroup {
            name: "linkedin",
            domain_glob: "*linkedin.com",
            delay,
            jitter: Duration::from_secs(2),
            max_concurrent: 1,
            headers: SiteHeaders {
                referer: "https://www.linkedin.com/",
                origin: "https://www.linkedin.com",
                accept: ACCEPT_HTML,
                accept_language: "en-US,en;q=0.9",
            },
        },
        DomainGroup {
            name: "indeed",
            domain_glob: "*indeed.com",
            delay,
            jitter: Duration::from_secs(2),
            max_concurrent: 1,
            headers: SiteHeaders {
                referer: "https://au.indeed.com/",
                origin: "https://au.indeed.com",
                accept: ACCEPT_HTML,
                accept_language: "en-US,en;q=0.9",
            },
        },
    ]
}

/// Allow-list plus domain group table. A host must be allow-listed and
/// matched by a group's glob; anything else is refused.
#[derive(Debug, Clone)]
pub struct PolitenessTable {
    allowed_hosts: Vec<&'static str>,
    groups: Vec<DomainGroup>,
}

impl PolitenessTable {
    pub fn new(allowed_hosts: Vec<&'static str>, groups: Vec<DomainGroup>) -> Self {
        Self { allowed_hosts, groups }
    }

    /// Built-in groups with the same baseline delay
    #[cfg(test)]
    pub fn builtin(delay: Duration) -> Self {
        Self::new(ALLOWED_HOSTS.to_vec(), builtin_groups(delay))
    }

    /// Built-in groups with configured baseline delay and per group overrides
    pub fn from_config(config: &ScraperConfig) -> Self {
        let mut groups = builtin_groups(Duration::from_millis(config.delay_ms));
        for group in &mut groups {
            let Some(o) = config.groups.get(group.name) else {
                continue;
            };
            if let Some(ms) = o.delay_ms {
                group.delay = Duration::from_millis(ms);
            }
            if let Some(ms) = o.jitter_ms {
                group.jitter = Duration::from_millis(ms);
            }
            if let Some(n) = o.max_concurrent {
                group.max_concurrent = n.max(1);
            }
        }
        Self::new(ALLOWED_HOSTS.to_vec(), groups)
    }

    pub fn group_for(&self, host: &str) -> Option<&DomainGroup> {
        let host = host.to_ascii_lowercase();
        if !self.allowed_hosts.contains(&host.as_str()) {
            return None;
        }
        self.groups.iter().find(|g| g.matches(&host))
    }

    pub fn groups(&self) -> &[DomainGroup] {
        &self.groups
    }

    /// Group by name; groups are named after the source they serve
    pub fn group(&self, name: &str) -> Option<&DomainGroup> {
        self.groups.iter().find(|g| g.name == name)
    }
}

/// Limits one domain group: at most `max_concurrent` requests in flight, and
/// each slot stays taken for `delay` plus a random share of `jitter` after
/// its response arrives.
pub struct GroupLimiter {
    semaphore: Semaphore,
    delay: Duration,
    jitter: Duration,
}

impl GroupLimiter {
    pub fn new(group: &DomainGroup) -> Self {
        Self {
            semaphore: Semaphore::new(group.max_concurrent.max(1)),
            delay: group.delay,
            jitter: group.jitter,
        }
    }

    /// Wait for a free slot in the group
    pub async fn acquire(&self) -> Result<GroupPermit<'_>, AcquireError> {
        let permit = self.semaphore.acquire().await?;
        Ok(GroupPermit {
            permit,
            cooldown: self.delay + random_jitter(self.jitter),
        })
    }
}

/// A taken slot. Call [`GroupPermit::release`] once the request is done.
pub struct GroupPermit<'a> {
    permit: SemaphorePermit<'a>,
    cooldown: Duration,
}

impl GroupPermit<'_> {
    /// Keep the slot through the cooldown, then free it
    pub async fn release(self) {
        tokio::time::sleep(self.cooldown).await;
        drop(self.permit);
    }
}

fn random_jitter(max: Duration) -> Duration {
    let max_ms = max.as_millis() as u64;
    if max_ms == 0 {
        return Duration::ZERO;
    }
    Duration::from_millis(rand::rng().random_range(0..=max_ms))
}

/// Shell-style match where `*` stands for any run of characters
fn glob_match(pattern: &str, text: &str) -> bool {
    let mut parts = pattern.split('*');
    let first = parts.next().unwrap_or_default();
    let Some(mut rest) = text.strip_prefix(first) else {
        return false;
    };

    let parts: Vec<&str> = parts.collect();
    let Some((last, middle)) = parts.split_last() else {
        // No '*' in the pattern
        return rest.is_empty();
    };

    for part in middle {
        match rest.find(part) {
            Some(idx) => rest = &rest[idx + part.len()..],
            None => return false,
        }
    }
    rest.ends_with(last)
}
