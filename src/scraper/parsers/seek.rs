//! SEEK search results parser.

use scraper::Html;
use std::sync::LazyLock;
use url::Url;

use crate::scraper::extract::{css, CardStrategy, Rule, SiteRules};
use crate::types::{RawJobRecord, Source};

static RULES: LazyLock<SiteRules> = LazyLock::new(|| {
    let mut card = CardStrategy::new("article[data-testid='job-card']");
    card.title = vec![
        Rule::Text(css("a[data-testid='job-card-title']")),
        Rule::Text(css("a[data-automation='jobTitle']")),
    ];
    card.url = vec![
        Rule::Link(css("a[data-testid='job-card-title']")),
        Rule::Link(css("a[data-automation='jobTitle']")),
    ];
    // Advertiser links end in -jobs or carry an advertiserid parameter
    card.company = vec![
        Rule::Text(css("a[href$='-jobs'], a[href*='advertiserid=']")),
        Rule::Text(css("a[data-automation='jobCompany']")),
    ];
    card.location = vec![
        Rule::Text(css("a[href*='/in-']:not([href*='All'])")),
        Rule::Text(css("a[data-automation='jobLocation']")),
    ];
    card.salary = vec![
        Rule::TextWhere(css("span"), |text| text.contains('$') && text.len() < 100),
        Rule::Text(css("span[data-automation='jobSalary']")),
    ];

    SiteRules {
        source: Source::Seek,
        strategies: vec![card],
    }
});

/// Parser for SEEK search result pages
pub struct SeekParser;

impl SeekParser {
    /// Parse job cards from a results page
    pub fn parse(html: &str, page_url: &Url) -> Vec<RawJobRecord> {
        let document = Html::parse_document(html);
        RULES.extract(&document, page_url).collect()
    }
}
