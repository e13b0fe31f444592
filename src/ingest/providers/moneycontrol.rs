// src/ingest/providers/moneycontrol.rs
use super::{HeadlineRule, HtmlRules, HtmlScraper};

/// Markets listing; the headline sits in the link's `title` attribute and
/// links are already absolute.
pub const RULES: HtmlRules = HtmlRules {
    source: "Moneycontrol",
    page_url: "https://www.moneycontrol.com/news/business/markets/",
    story_selector: "#cagetory li.clearfix",
    link_selector: "h2 a",
    headline: HeadlineRule::Attr("title"),
    base_url: None,
};

pub fn scraper(client: reqwest::Client) -> HtmlScraper {
    HtmlScraper::from_client(RULES, client)
}

pub fn from_fixture(html: &str) -> HtmlScraper {
    HtmlScraper::from_fixture(RULES, html)
}
