//! Hybrid routing and fallback behavior.

mod support;

use std::sync::Arc;

use stockdesk_core::{
    HttpClient, HttpError, HybridProvider, NewsRequest, PolygonProvider, ProviderId, RateLimiter,
    StockDataProvider, Ticker, UtcDateTime, YahooProvider,
};
use support::MockHttpClient;

fn hybrid(client: Arc<MockHttpClient>, with_polygon: bool) -> HybridProvider {
    let client: Arc<dyn HttpClient> = client;
    let rate_limiter = Arc::new(RateLimiter::new());
    let yahoo = YahooProvider::new(Arc::clone(&client), Arc::clone(&rate_limiter));
    let polygon = with_polygon.then(|| {
        PolygonProvider::new("test-key-0123456789", client, rate_limiter).expect("provider")
    });
    HybridProvider::new(yahoo, polygon)
}

fn ticker(raw: &str) -> Ticker {
    Ticker::parse(raw).expect("ticker")
}

const YAHOO_NEWS_BODY: &str = r#"{
    "news": [{
        "title": "Fallback headline",
        "link": "https://finance.example/article",
        "publisher": "Example Wire",
        "providerPublishTime": 1700000000
    }]
}"#;

#[tokio::test]
async fn news_prefers_polygon_when_configured() {
    let client = Arc::new(
        MockHttpClient::new()
            .on_json(
                "reference/news",
                r#"{
                    "results": [{
                        "title": "Premium headline",
                        "article_url": "https://polygon.example/article",
                        "published_utc": "2024-06-03T12:00:00Z"
                    }]
                }"#,
            )
            .on_json("finance/search", YAHOO_NEWS_BODY),
    );
    let provider = hybrid(Arc::clone(&client), true);

    let articles = provider
        .get_news(&NewsRequest::for_ticker(ticker("AAPL")))
        .await
        .expect("news");

    assert_eq!(articles.len(), 1);
    assert_eq!(articles[0].provider, ProviderId::Polygon);
    assert_eq!(client.calls_matching("finance/search"), 0);
}

#[tokio::test]
async fn news_falls_back_to_yahoo_on_polygon_failure() {
    let client = Arc::new(
        MockHttpClient::new()
            .on_status("reference/news", 500)
            .on_json("finance/search", YAHOO_NEWS_BODY),
    );
    let provider = hybrid(Arc::clone(&client), true);

    let articles = provider
        .get_news(&NewsRequest::for_ticker(ticker("AAPL")))
        .await
        .expect("fallback news");

    assert_eq!(articles.len(), 1);
    assert_eq!(
        articles[0].provider,
        ProviderId::Yahoo,
        "fallback results are tagged with the provider that produced them"
    );
    assert_eq!(client.calls_matching("reference/news"), 1);
    assert_eq!(client.calls_matching("finance/search"), 1);
}

#[tokio::test]
async fn news_error_surfaces_only_when_fallback_also_fails() {
    let client = Arc::new(
        MockHttpClient::new()
            .on_error("reference/news", HttpError::new("polygon unreachable"))
            .on_error("finance/search", HttpError::new("yahoo unreachable")),
    );
    let provider = hybrid(Arc::clone(&client), true);

    let err = provider
        .get_news(&NewsRequest::for_ticker(ticker("AAPL")))
        .await
        .expect_err("both upstreams down");
    assert!(err.to_string().contains("yahoo unreachable"));
}

#[tokio::test]
async fn news_without_polygon_goes_straight_to_yahoo() {
    let client = Arc::new(MockHttpClient::new().on_json("finance/search", YAHOO_NEWS_BODY));
    let provider = hybrid(Arc::clone(&client), false);

    let articles = provider
        .get_news(&NewsRequest::for_ticker(ticker("AAPL")))
        .await
        .expect("news");

    assert_eq!(articles[0].provider, ProviderId::Yahoo);
    assert_eq!(client.calls_matching("reference/news"), 0);
}

#[tokio::test]
async fn market_status_falls_back_to_yahoo_heuristic() {
    // A fresh SPY bar means the market reads as open.
    let recent = UtcDateTime::now().unix_seconds() - 30;
    let chart_body = format!(
        r#"{{
            "chart": {{
                "result": [{{
                    "timestamp": [{recent}],
                    "indicators": {{"quote": [{{}}]}}
                }}]
            }}
        }}"#
    );
    let client = Arc::new(
        MockHttpClient::new()
            .on_error("marketstatus/now", HttpError::new("polygon unreachable"))
            .on_json("finance/chart/SPY", chart_body),
    );
    let provider = hybrid(Arc::clone(&client), true);

    let status = provider.get_market_status().await.expect("status");
    assert!(status.is_open);
    assert_eq!(status.provider, ProviderId::Yahoo);
}

#[tokio::test]
async fn stale_index_bar_reads_as_closed() {
    let stale = UtcDateTime::now().unix_seconds() - 3_600;
    let chart_body = format!(
        r#"{{
            "chart": {{
                "result": [{{
                    "timestamp": [{stale}],
                    "indicators": {{"quote": [{{}}]}}
                }}]
            }}
        }}"#
    );
    let client = Arc::new(MockHttpClient::new().on_json("finance/chart/SPY", chart_body));
    let provider = hybrid(Arc::clone(&client), false);

    let status = provider.get_market_status().await.expect("status");
    assert!(!status.is_open);
}

#[tokio::test]
async fn quotes_route_to_yahoo_even_with_polygon_configured() {
    let client = Arc::new(
        MockHttpClient::new().on_json("v7/finance/quote", r#"{"currentPrice": 185.04}"#),
    );
    let provider = hybrid(Arc::clone(&client), true);

    let quote = provider.get_quote("AAPL").await.expect("quote");
    assert_eq!(quote.provider, ProviderId::Yahoo);
    assert_eq!(client.calls_matching("polygon.io"), 0);
}
