//! LinkedIn public job search parser.
//!
//! Only the server-rendered guest markup is visible without a browser, so
//! pages that build their results in JavaScript yield no cards.

use scraper::Html;
use std::sync::LazyLock;
use url::Url;

use crate::scraper::extract::{css, CardStrategy, Rule, SiteRules};
use crate::types::{RawJobRecord, Source};

static RULES: LazyLock<SiteRules> = LazyLock::new(|| {
    // Guest search results: base-card divs
    let mut base_card = CardStrategy::new("div.base-card");
    base_card.url = vec![Rule::Link(css(
        "a.base-card__full-link[href*='/jobs/view/'], a.base-card__full-link[href*='/jobs-guest/jobs/api/']",
    ))];
    base_card.title = vec![Rule::Text(css("h3.base-search-card__title"))];
    base_card.company = vec![Rule::Text(css("h4.base-search-card__subtitle, a.hidden-nested-link"))];
    base_card.location = vec![Rule::Text(css("span.job-search-card__location"))];
    base_card.salary = vec![Rule::Text(css("span.job-search-card__salary-info"))];

    // Older list layout
    let mut list_card = CardStrategy::new("li.jobs-search__results-list div.job-search-card");
    list_card.url = vec![Rule::Link(css("a[href*='/jobs/view/'], a[href*='/jobs-guest/']"))];
    list_card.title = vec![Rule::Text(css("h3"))];
    list_card.company = vec![Rule::Text(css("h4"))];
    list_card.location = vec![Rule::Text(css("span.job-search-card__location"))];
    list_card.salary = vec![Rule::Text(css("span.job-search-card__salary-info"))];

    SiteRules {
        source: Source::Linkedin,
        strategies: vec![base_card, list_card],
    }
});

/// Parser for LinkedIn job search pages
pub struct LinkedinParser;

impl LinkedinParser {
    /// Parse job cards from a results page
    pub fn parse(html: &str, page_url: &Url) -> Vec<RawJobRecord> {
        let document = Html::parse_document(html);
        RULES.extract(&document, page_url).collect()
    }
}
