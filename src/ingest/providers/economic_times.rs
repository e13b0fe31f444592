// src/ingest/providers/economic_times.rs
use super::{HeadlineRule, HtmlRules, HtmlScraper};

/// Stock news listing; headline is the link text, links are site-relative.
pub const RULES: HtmlRules = HtmlRules {
    source: "The Economic Times",
    page_url: "https://economictimes.indiatimes.com/markets/stocks/news",
    story_selector: "div.eachStory",
    link_selector: "h3 a",
    headline: HeadlineRule::Text,
    base_url: Some("https://economictimes.indiatimes.com"),
};

pub fn scraper(client: reqwest::Client) -> HtmlScraper {
    HtmlScraper::from_client(RULES, client)
}

pub fn from_fixture(html: &str) -> HtmlScraper {
    HtmlScraper::from_fixture(RULES, html)
}
