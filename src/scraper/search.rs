//! Search URL planning: configured URLs plus keyword-generated SEEK searches.

use std::collections::HashSet;

use crate::config::AppConfig;
use crate::types::Source;

pub const SEEK_SEARCH_URL: &str = "https://www.seek.com.au/jobs";

/// Generated keyword searches per board are capped at this many URLs
const MAX_GENERATED_URLS: usize = 10;

/// Search URLs to scan for one source
#[derive(Debug, Clone, PartialEq)]
pub struct ScanTarget {
    pub source: Source,
    pub urls: Vec<String>,
}

/// Build a SEEK keyword search URL (`+` for spaces)
pub fn seek_search_url(keyword: &str, location: &str) -> String {
    let query: String = url::form_urlencoded::Serializer::new(String::new())
        .append_pair("keywords", keyword.trim())
        .append_pair("location", location.trim())
        .finish();
    format!("{}?{}", SEEK_SEARCH_URL, query)
}

/// Static URLs first, then generated ones; empty strings and repeats dropped
pub fn merge_search_urls(static_urls: &[String], generated: &[String]) -> Vec<String> {
    let mut seen = HashSet::new();
    static_urls
        .iter()
        .chain(generated)
        .filter(|url| !url.trim().is_empty())
        .filter(|url| seen.insert(url.as_str()))
        .cloned()
        .collect()
}

/// Enabled boards in scan order, optionally restricted to `only`
pub fn scan_targets(config: &AppConfig, only: &[Source]) -> Vec<ScanTarget> {
    Source::ALL
        .into_iter()
        .filter(|source| only.is_empty() || only.contains(source))
        .filter_map(|source| {
            let board = config.board(source).filter(|b| b.enabled)?;

            let generated: Vec<String> = match source {
                Source::Seek => {
                    let location = board.location.as_deref().unwrap_or(&config.user.location);
                    board
                        .keywords
                        .iter()
                        .filter(|k| !k.trim().is_empty())
                        .take(MAX_GENERATED_URLS)
                        .map(|k| seek_search_url(k, location))
                        .collect()
                }
                _ => Vec::new(),
            };

            Some(ScanTarget {
                source,
                urls: merge_search_urls(&board.search_urls, &generated),
            })
        })
        .collect()
}
