// src/ingest/providers/mod.rs
//! HTML listing scrapers. Each source is described by an [`HtmlRules`]
//! value; [`HtmlScraper`] does the fetching and extraction.

pub mod economic_times;
pub mod moneycontrol;

use async_trait::async_trait;
use metrics::{counter, histogram};
use scraper::{ElementRef, Html, Selector};
use std::time::Duration;

use crate::error::ScrapeError;
use crate::ingest::normalize_headline;
use crate::ingest::types::{HeadlineRecord, NewsScraper};

/// Where the headline text of a story lives inside its link element.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HeadlineRule {
    /// Value of the given attribute (e.g. `title`).
    Attr(&'static str),
    /// Text content of the link.
    Text,
}

/// Hardcoded extraction rules for one listing page.
#[derive(Debug, Clone, Copy)]
pub struct HtmlRules {
    pub source: &'static str,
    pub page_url: &'static str,
    /// Selects each repeated story element.
    pub story_selector: &'static str,
    /// Selects the link inside a story element.
    pub link_selector: &'static str,
    pub headline: HeadlineRule,
    /// Prefix for links not starting with `http`.
    pub base_url: Option<&'static str>,
}

fn parse_selector(s: &str) -> Result<Selector, ScrapeError> {
    Selector::parse(s).map_err(|e| ScrapeError::Selector {
        selector: s.to_string(),
        reason: format!("{e:?}"),
    })
}

fn resolve_link(href: &str, base_url: Option<&str>) -> String {
    match base_url {
        Some(base) if !href.starts_with("http") => format!("{base}{href}"),
        _ => href.to_string(),
    }
}

fn extract_one(story: ElementRef<'_>, link_sel: &Selector, rules: &HtmlRules) -> Option<HeadlineRecord> {
    let link = story.select(link_sel).next()?;
    let raw_headline = match rules.headline {
        HeadlineRule::Attr(name) => link.value().attr(name)?.to_string(),
        HeadlineRule::Text => link.text().collect::<String>(),
    };
    let headline = normalize_headline(&raw_headline);
    let href = link.value().attr("href")?.trim();
    if headline.is_empty() || href.is_empty() {
        return None;
    }
    Some(HeadlineRecord {
        headline,
        url: resolve_link(href, rules.base_url),
        source: rules.source.to_string(),
    })
}

/// Extract headline records from a listing page, in document order.
/// Stories missing a headline or a link are skipped.
pub fn extract_headlines(html: &str, rules: &HtmlRules) -> Result<Vec<HeadlineRecord>, ScrapeError> {
    let t0 = std::time::Instant::now();
    let story_sel = parse_selector(rules.story_selector)?;
    let link_sel = parse_selector(rules.link_selector)?;

    let document = Html::parse_document(html);
    let out: Vec<HeadlineRecord> = document
        .select(&story_sel)
        .filter_map(|story| extract_one(story, &link_sel, rules))
        .collect();

    histogram!("ingest_scrape_ms", "source" => rules.source)
        .record(t0.elapsed().as_secs_f64() * 1_000.0);
    Ok(out)
}

enum Mode {
    Fixture(String),
    Http { client: reqwest::Client },
}

/// Scraper for one [`HtmlRules`] source, fed either over HTTP or from a fixture.
pub struct HtmlScraper {
    rules: HtmlRules,
    mode: Mode,
}

impl HtmlScraper {
    pub fn from_fixture(rules: HtmlRules, html: &str) -> Self {
        Self {
            rules,
            mode: Mode::Fixture(html.to_string()),
        }
    }

    /// Uses `client`'s timeouts for the page fetch.
    pub fn from_client(rules: HtmlRules, client: reqwest::Client) -> Self {
        Self {
            rules,
            mode: Mode::Http { client },
        }
    }

    pub fn rules(&self) -> &HtmlRules {
        &self.rules
    }

    async fn fetch_page(&self, client: &reqwest::Client) -> Result<String, ScrapeError> {
        let resp = client.get(self.rules.page_url).send().await?;
        let status = resp.status();
        if !status.is_success() {
            return Err(ScrapeError::Status {
                status: status.as_u16(),
                url: self.rules.page_url.to_string(),
            });
        }
        Ok(resp.text().await?)
    }
}

#[async_trait]
impl NewsScraper for HtmlScraper {
    async fn fetch_latest(&self) -> Result<Vec<HeadlineRecord>, ScrapeError> {
        let out = match &self.mode {
            Mode::Fixture(html) => extract_headlines(html, &self.rules)?,
            Mode::Http { client } => {
                let body = self.fetch_page(client).await?;
                extract_headlines(&body, &self.rules)?
            }
        };
        counter!("ingest_candidates_total", "source" => self.rules.source).increment(out.len() as u64);
        Ok(out)
    }

    fn name(&self) -> &'static str {
        self.rules.source
    }
}

/// Registered sources, in merge order.
pub fn default_scrapers(client: reqwest::Client) -> Vec<Box<dyn NewsScraper>> {
    vec![
        Box::new(moneycontrol::scraper(client.clone())),
        Box::new(economic_times::scraper(client)),
    ]
}

/// HTTP client shared by all scrapers.
pub fn build_http_client(timeout_secs: u64, user_agent: &str) -> Result<reqwest::Client, ScrapeError> {
    Ok(reqwest::Client::builder()
        .user_agent(user_agent)
        .connect_timeout(Duration::from_secs(timeout_secs.min(5)))
        .timeout(Duration::from_secs(timeout_secs))
        .build()?)
}
