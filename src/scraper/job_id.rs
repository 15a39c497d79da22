//! External ID derivation used as the per-user dedup key.
//!
//! IDs are always prefixed with the source tag, so postings from different
//! boards never collide even when the boards share a numeric ID.

use url::Url;

use crate::types::Source;

/// Stable, source scoped identifier for a posting.
///
/// A provider key captured from the page wins over anything parsed from the
/// URL. Otherwise the ID comes from the URL shape of each board, falling back
/// to the whole URL. Unrecognised sources get the raw URL with no prefix.
pub fn derive_id(source: &str, url: &str, provider_key: Option<&str>) -> String {
    let parsed = source.parse::<Source>().ok();

    if let Some(key) = provider_key.map(str::trim).filter(|k| !k.is_empty()) {
        let tag = parsed.map(|s| s.as_str()).unwrap_or(source);
        return format!("{}-{}", tag, key);
    }

    let Some(source) = parsed else {
        return url.to_string();
    };

    let id = match source {
        Source::Indeed => query_param(url, "jk"),
        Source::Linkedin => segment_after(url, "view"),
        Source::Seek => segment_after(url, "job"),
    };

    format!("{}-{}", source, id.unwrap_or_else(|| url.to_string()))
}

/// Raw value of a query parameter, up to the next `&`
fn query_param(url: &str, name: &str) -> Option<String> {
    let (_, query) = url.split_once('?')?;
    let query = query.split('#').next().unwrap_or(query);
    query
        .split('&')
        .find_map(|pair| pair.strip_prefix(name)?.strip_prefix('='))
        .filter(|value| !value.is_empty())
        .map(str::to_string)
}

/// Path segment following the first segment equal to `marker`
fn segment_after(url: &str, marker: &str) -> Option<String> {
    let next = match Url::parse(url) {
        Ok(parsed) => {
            let segments: Vec<String> = parsed.path_segments()?.map(str::to_string).collect();
            let idx = segments.iter().position(|s| s == marker)?;
            segments.get(idx + 1)?.clone()
        }
        // Relative or malformed: split the raw string
        Err(_) => {
            let parts: Vec<&str> = url.split('/').collect();
            let idx = parts.iter().position(|s| *s == marker)?;
            parts.get(idx + 1)?.to_string()
        }
    };

    let id = next.split('?').next().unwrap_or_default();
    (!id.is_empty()).then(|| id.to_string())
}
