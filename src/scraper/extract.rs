//! Declarative job card extraction.
//!
//! Each site is a list of [`CardStrategy`]s: a container selector plus an
//! ordered list of [`Rule`]s per field. For each field the first rule that
//! yields a non-empty value wins and later rules are not consulted. Cards
//! without a title or URL are skipped silently.

use scraper::{ElementRef, Html, Selector};
use tracing::debug;
use url::Url;

use crate::scraper::classify::classify;
use crate::scraper::job_id::derive_id;
use crate::types::{JobStatus, RawJobRecord, Source};

/// Compile a selector literal
pub fn css(selector: &str) -> Selector {
    Selector::parse(selector).unwrap_or_else(|e| panic!("invalid selector {:?}: {:?}", selector, e))
}

/// One candidate matcher for a field
pub enum Rule {
    /// Text of the first matching element with non-empty text
    Text(Selector),
    /// Like `Text`, but the text must also satisfy the predicate
    TextWhere(Selector, fn(&str) -> bool),
    /// First non-empty attribute value
    Attr(Selector, &'static str),
    /// Attribute value with a prefix removed; elements without the prefix are skipped
    AttrAfter(Selector, &'static str, &'static str),
    /// `href` of the first matching link, resolved against the page URL
    Link(Selector),
}

impl Rule {
    fn apply(&self, card: &ElementRef<'_>, page_url: &Url) -> Option<String> {
        match self {
            Rule::Text(selector) => card
                .select(selector)
                .map(|el| element_text(&el))
                .find(|text| !text.is_empty()),
            Rule::TextWhere(selector, accept) => card
                .select(selector)
                .map(|el| element_text(&el))
                .find(|text| !text.is_empty() && accept(text)),
            Rule::Attr(selector, name) => card
                .select(selector)
                .filter_map(|el| el.value().attr(name))
                .map(str::trim)
                .find(|value| !value.is_empty())
                .map(str::to_string),
            Rule::AttrAfter(selector, name, prefix) => card
                .select(selector)
                .filter_map(|el| el.value().attr(name)?.trim().strip_prefix(prefix))
                .find(|value| !value.is_empty())
                .map(str::to_string),
            Rule::Link(selector) => card
                .select(selector)
                .filter_map(|el| el.value().attr("href"))
                .map(str::trim)
                .filter(|href| !href.is_empty())
                .find_map(|href| page_url.join(href).ok())
                .map(String::from),
        }
    }
}

/// Whitespace-collapsed text content of an element
fn element_text(el: &ElementRef<'_>) -> String {
    el.text().flat_map(str::split_whitespace).collect::<Vec<_>>().join(" ")
}

/// First non-empty value from an ordered rule list
pub fn first_match(rules: &[Rule], card: &ElementRef<'_>, page_url: &Url) -> Option<String> {
    rules.iter().find_map(|rule| rule.apply(card, page_url))
}

/// One job card layout
pub struct CardStrategy {
    pub container: Selector,
    pub title: Vec<Rule>,
    pub url: Vec<Rule>,
    pub company: Vec<Rule>,
    pub location: Vec<Rule>,
    pub salary: Vec<Rule>,
    /// Provider-assigned job key; overrides the URL-derived ID when present
    pub job_key: Vec<Rule>,
}

impl CardStrategy {
    pub fn new(container: &str) -> Self {
        Self {
            container: css(container),
            title: Vec::new(),
            url: Vec::new(),
            company: Vec::new(),
            location: Vec::new(),
            salary: Vec::new(),
            job_key: Vec::new(),
        }
    }

    fn build(&self, source: Source, card: &ElementRef<'_>, page_url: &Url) -> Option<RawJobRecord> {
        let title = first_match(&self.title, card, page_url)?;
        let url = first_match(&self.url, card, page_url)?;
        let company = first_match(&self.company, card, page_url).unwrap_or_default();
        let location = first_match(&self.location, card, page_url).unwrap_or_default();
        let salary = first_match(&self.salary, card, page_url).unwrap_or_default();
        let job_key = first_match(&self.job_key, card, page_url);

        let external_id = derive_id(source.as_str(), &url, job_key.as_deref());
        let job_type = classify(&title, &salary, &url);

        debug!(%source, external_id = %external_id, "Found job: {} at {}", title, company);

        Some(RawJobRecord {
            source,
            url,
            title,
            company,
            location,
            salary,
            external_id,
            job_type,
            status: JobStatus::Discovered,
        })
    }
}

/// Extraction rules for one job board
pub struct SiteRules {
    pub source: Source,
    pub strategies: Vec<CardStrategy>,
}

impl SiteRules {
    /// Records in document order, strategy by strategy.
    ///
    /// A card matched by more than one strategy is emitted once per strategy;
    /// the persistence gate collapses those by external ID.
    pub fn extract<'a>(
        &'a self,
        document: &'a Html,
        page_url: &'a Url,
    ) -> impl Iterator<Item = RawJobRecord> + 'a {
        self.strategies.iter().flat_map(move |strategy| {
            document
                .select(&strategy.container)
                .filter_map(move |card| strategy.build(self.source, &card, page_url))
        })
    }
}
