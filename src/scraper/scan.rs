//! Scan orchestrator: fetch, extract and save for every search URL.
//!
//! Sources are scanned one after another. Within a source, search URLs run
//! concurrently up to the source's domain group cap. A failed URL counts as
//! zero jobs and the scan moves on; a scan always produces a report.

use futures::stream::{self, StreamExt};
use tracing::{info, warn};
use url::Url;

use crate::error::FetchError;
use crate::scraper::fetch::{PoliteFetcher, Transport};
use crate::scraper::parsers::parse_page;
use crate::scraper::search::ScanTarget;
use crate::storage::{save_jobs, JobStore, SaveSummary};
use crate::types::{RawJobRecord, Source};

/// Result of scanning one search URL
#[derive(Debug)]
pub struct UrlReport {
    pub source: Source,
    pub url: String,
    pub found: usize,
    pub summary: SaveSummary,
    pub error: Option<FetchError>,
}

/// Result of a whole scan
#[derive(Debug, Default)]
pub struct ScanReport {
    pub urls: Vec<UrlReport>,
}

impl ScanReport {
    /// Jobs extracted across every URL, duplicates included
    pub fn total_found(&self) -> usize {
        self.urls.iter().map(|r| r.found).sum()
    }

    pub fn totals(&self) -> SaveSummary {
        let mut total = SaveSummary::default();
        for report in &self.urls {
            total += report.summary;
        }
        total
    }

    pub fn failed(&self) -> usize {
        self.urls.iter().filter(|r| r.error.is_some()).count()
    }
}

/// Runs scans for one user against an injected fetcher and job store
pub struct Scanner<'a, T: Transport> {
    fetcher: PoliteFetcher<T>,
    store: &'a dyn JobStore,
    user_id: i64,
}

impl<'a, T: Transport> Scanner<'a, T> {
    pub fn new(fetcher: PoliteFetcher<T>, store: &'a dyn JobStore, user_id: i64) -> Self {
        Self {
            fetcher,
            store,
            user_id,
        }
    }

    /// Fetch one search results page and extract its job cards
    pub async fn scrape(&self, source: Source, url: &str) -> Result<Vec<RawJobRecord>, FetchError> {
        // Another board's URL would be parsed with the wrong rules
        if let Some(group) = self.fetcher.group_of(url) {
            if group != source.as_str() {
                warn!(%source, url, group, "Search URL belongs to another board, skipping");
                return Err(FetchError::Disallowed {
                    url: url.to_string(),
                });
            }
        }
        let html = self.fetcher.fetch(url).await?;
        let page_url = Url::parse(url).map_err(|_| FetchError::InvalidUrl {
            url: url.to_string(),
        })?;
        Ok(parse_page(source, &html, &page_url))
    }

    async fn scan_url(&self, source: Source, url: &str) -> UrlReport {
        let (records, error) = match self.scrape(source, url).await {
            Ok(records) => (records, None),
            // Already logged by the fetcher
            Err(e) => (Vec::new(), Some(e)),
        };

        let summary = save_jobs(self.store, &records, self.user_id);
        info!(
            %source,
            url,
            found = records.len(),
            saved = summary.saved,
            skipped = summary.skipped,
            "Scanned search URL"
        );

        UrlReport {
            source,
            url: url.to_string(),
            found: records.len(),
            summary,
            error,
        }
    }

    /// Scan every search URL of one source, in flight up to the group cap
    pub async fn scan_source(&self, source: Source, urls: &[String]) -> Vec<UrlReport> {
        let cap = self.fetcher.max_concurrent(source.as_str());
        info!(%source, urls = urls.len(), cap, "Scanning source");

        stream::iter(urls)
            .map(|url| self.scan_url(source, url))
            .buffered(cap)
            .collect()
            .await
    }

    /// Scan targets in order, each source drained before the next starts
    pub async fn scan(&self, targets: &[ScanTarget]) -> ScanReport {
        let mut report = ScanReport::default();
        for target in targets {
            let urls = self.scan_source(target.source, &target.urls).await;
            report.urls.extend(urls);
        }

        let totals = report.totals();
        info!(
            found = report.total_found(),
            saved = totals.saved,
            skipped = totals.skipped,
            failed = report.failed(),
            "Scan complete"
        );
        report
    }
}
