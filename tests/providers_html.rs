// tests/providers_html.rs
use market_news_feed::ingest::providers::{economic_times, moneycontrol};
use market_news_feed::ingest::types::NewsScraper;

#[tokio::test]
async fn moneycontrol_fixture_uses_title_attribute() {
    let html: &str = include_str!("fixtures/moneycontrol.html");
    let out = moneycontrol::from_fixture(html).fetch_latest().await.unwrap();

    let headlines: Vec<&str> = out.iter().map(|r| r.headline.as_str()).collect();
    assert_eq!(
        headlines,
        vec![
            "Sensex, Nifty open higher as IT stocks gain",
            "Reliance Industries Q2 profit beats estimates & shares rise",
            "HDFC Bank slips after RBI penalty",
        ]
    );
    assert!(out.iter().all(|r| r.source == "Moneycontrol"));
    assert!(out.iter().all(|r| r.url.starts_with("https://www.moneycontrol.com/")));
}

#[tokio::test]
async fn economic_times_fixture_prefixes_relative_links() {
    let html: &str = include_str!("fixtures/economic_times.html");
    let out = economic_times::from_fixture(html).fetch_latest().await.unwrap();

    assert_eq!(out.len(), 3);
    assert_eq!(out[0].headline, "Tata Motors rallies on strong JLR sales");
    assert_eq!(
        out[0].url,
        "https://economictimes.indiatimes.com/markets/stocks/news/tata-motors-jlr-sales/articleshow/1001.cms"
    );
    assert_eq!(out[1].headline, "Infosys announces 'record' buyback");
    assert_eq!(
        out[1].url,
        "https://economictimes.indiatimes.com/markets/stocks/news/infosys-buyback/articleshow/1002.cms"
    );
    assert_eq!(out[2].headline, "Adani group stocks tumble on probe report");
    assert!(out.iter().all(|r| r.source == "The Economic Times"));
}

#[tokio::test]
async fn markup_drift_degrades_to_empty() {
    let html = "<html><body><section class=\"new-layout\"><h1>Markets</h1></section></body></html>";
    let s = economic_times::from_fixture(html);
    assert!(s.fetch().await.is_empty());
    let s = moneycontrol::from_fixture(html);
    assert!(s.fetch().await.is_empty());
}
