//! Search results parsers, one per job board.

pub mod indeed;
pub mod linkedin;
pub mod seek;

pub use indeed::IndeedParser;
pub use linkedin::LinkedinParser;
pub use seek::SeekParser;

use url::Url;

use crate::types::{RawJobRecord, Source};

/// Parse a fetched results page with the source's rules
pub fn parse_page(source: Source, html: &str, page_url: &Url) -> Vec<RawJobRecord> {
    match source {
        Source::Seek => SeekParser::parse(html, page_url),
        Source::Linkedin => LinkedinParser::parse(html, page_url),
        Source::Indeed => IndeedParser::parse(html, page_url),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SEEK_CARD: &str = r#"<html><body>
    <article data-testid="job-card">
      <a data-testid="job-card-title" href="/job/80001234">Rust Engineer</a>
    </article>
    </body></html>"#;

    #[test]
    fn test_parse_page_uses_source_rules() {
        let page_url = Url::parse("https://www.seek.com.au/jobs?keywords=rust").unwrap();

        let records = parse_page(Source::Seek, SEEK_CARD, &page_url);
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].source, Source::Seek);
        assert_eq!(records[0].external_id, "seek-80001234");

        // Other boards' selectors find nothing in a SEEK page
        assert!(parse_page(Source::Linkedin, SEEK_CARD, &page_url).is_empty());
        assert!(parse_page(Source::Indeed, SEEK_CARD, &page_url).is_empty());
    }
}
