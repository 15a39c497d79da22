//! Indeed search results parser.

use scraper::Html;
use std::sync::LazyLock;
use url::Url;

use crate::scraper::extract::{css, CardStrategy, Rule, SiteRules};
use crate::types::{RawJobRecord, Source};

const TITLE_LINK: &str = "h2.jobTitle a, a.jcs-JobTitle";
const KEYED_LINK: &str = "h2 a[data-jk]";

static RULES: LazyLock<SiteRules> = LazyLock::new(|| {
    // Mosaic provider cards
    let mut mosaic = CardStrategy::new("div.job_seen_beacon, div.slider_container, td.resultContent");
    mosaic.title = vec![Rule::Text(css(TITLE_LINK)), Rule::Text(css(KEYED_LINK))];
    mosaic.url = vec![Rule::Link(css(TITLE_LINK)), Rule::Link(css(KEYED_LINK))];
    mosaic.job_key = vec![
        Rule::Attr(css(TITLE_LINK), "data-jk"),
        Rule::AttrAfter(css(TITLE_LINK), "id", "job_"),
        Rule::Attr(css(KEYED_LINK), "data-jk"),
    ];
    mosaic.company = vec![Rule::Text(css("span.companyName, span[data-testid='company-name']"))];
    mosaic.location = vec![Rule::Text(css("div.companyLocation, div[data-testid='text-location']"))];
    mosaic.salary = vec![Rule::Text(css("div.salary-snippet, div.metadata.salary-snippet-container"))];

    // cardOutline layout: title lives in a span's title attribute
    let mut outline = CardStrategy::new("div.cardOutline");
    outline.url = vec![Rule::Link(css("a[data-jk]"))];
    outline.title = vec![Rule::Attr(css("h2 span[title]"), "title")];
    outline.company = vec![Rule::Text(css("span.companyName"))];
    outline.location = vec![Rule::Text(css("div.companyLocation"))];
    outline.salary = vec![Rule::Text(css("div.salary-snippet"))];

    SiteRules {
        source: Source::Indeed,
        strategies: vec![mosaic, outline],
    }
});

/// Parser for Indeed search result pages
pub struct IndeedParser;

impl IndeedParser {
    /// Parse job cards from a results page
    pub fn parse(html: &str, page_url: &Url) -> Vec<RawJobRecord> {
        let document = Html::parse_document(html);
        RULES.extract(&document, page_url).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::JobType;

    fn page_url() -> Url {
        Url::parse("https://au.indeed.com/jobs?q=rust&l=Melbourne").unwrap()
    }

    #[test]
    fn test_job_key_from_data_attribute() {
        let html = r#"<html><body>
        <div class="job_seen_beacon">
          <h2 class="jobTitle"><a class="jcs-JobTitle" data-jk="abc123xyz" href="/rc/clk?jk=ignored&amp;from=serp"><span>Rust Developer</span></a></h2>
          <span data-testid="company-name">Initech</span>
          <div data-testid="text-location">Melbourne VIC</div>
          <div class="metadata salary-snippet-container">$110 - $130 an hour</div>
        </div>
        </body></html>"#;

        let jobs = IndeedParser::parse(html, &page_url());
        assert_eq!(jobs.len(), 1);

        let job = &jobs[0];
        assert_eq!(job.source, Source::Indeed);
        assert_eq!(job.title, "Rust Developer");
        assert_eq!(job.url, "https://au.indeed.com/rc/clk?jk=ignored&from=serp");
        assert_eq!(job.external_id, "indeed-abc123xyz");
        assert_eq!(job.company, "Initech");
        assert_eq!(job.location, "Melbourne VIC");
        assert_eq!(job.salary, "$110 - $130 an hour");
    }

    #[test]
    fn test_job_key_from_id_attribute() {
        let html = r#"<html><body>
        <div class="job_seen_beacon">
          <h2 class="jobTitle"><a id="job_def456" href="/viewjob?jk=def456">Permanent Backend Engineer</a></h2>
        </div>
        </body></html>"#;

        let jobs = IndeedParser::parse(html, &page_url());
        assert_eq!(jobs[0].external_id, "indeed-def456");
        assert_eq!(jobs[0].job_type, JobType::Permanent);
    }

    #[test]
    fn test_fallback_to_url_key() {
        let html = r#"<html><body>
        <table><tr><td class="resultContent">
          <h2 class="jobTitle"><a href="/viewjob?jk=0011aa&amp;tk=zz">Engineer</a></h2>
          <span class="companyName">Hooli</span>
        </td></tr></table>
        </body></html>"#;

        let jobs = IndeedParser::parse(html, &page_url());
        assert_eq!(jobs.len(), 1);
        assert_eq!(jobs[0].external_id, "indeed-0011aa");
    }

    #[test]
    fn test_card_outline_layout() {
        let html = r#"<html><body>
        <div class="cardOutline">
          <h2><span title="Temporary Data Engineer">Temporary Data Engineer</span></h2>
          <a data-jk="778899" href="/viewjob?jk=778899"></a>
          <span class="companyName">Umbrella</span>
          <div class="companyLocation">Remote</div>
          <div class="salary-snippet">$95,000 a year</div>
        </div>
        </body></html>"#;

        let jobs = IndeedParser::parse(html, &page_url());
        assert_eq!(jobs.len(), 1);

        let job = &jobs[0];
        assert_eq!(job.title, "Temporary Data Engineer");
        assert_eq!(job.url, "https://au.indeed.com/viewjob?jk=778899");
        assert_eq!(job.external_id, "indeed-778899");
        assert_eq!(job.location, "Remote");
        assert_eq!(job.job_type, JobType::Contract);
    }

    #[test]
    fn test_nested_containers_yield_duplicates_with_one_id() {
        let html = r#"<html><body>
        <div class="job_seen_beacon"><div class="slider_container"><table><tr>
          <td class="resultContent">
            <h2 class="jobTitle"><a data-jk="k1" href="/rc/clk?jk=k1">Rust Engineer</a></h2>
          </td>
        </tr></table></div></div>
        </body></html>"#;

        let jobs = IndeedParser::parse(html, &page_url());
        assert_eq!(jobs.len(), 3);
        assert!(jobs.iter().all(|j| j.external_id == "indeed-k1"));
    }
}
