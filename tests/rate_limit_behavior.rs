//! Token-bucket enforcement observed through the provider stack.

mod support;

use std::sync::Arc;

use stockdesk_core::{
    HttpClient, PolygonProvider, ProviderError, RateLimiter, StockDataProvider, TokenBucket,
    YahooProvider,
};
use support::MockHttpClient;

const SNAPSHOT_BODY: &str = r#"{
    "ticker": {
        "lastTrade": {"p": 123.45, "t": 1700000000000000000}
    }
}"#;

#[tokio::test]
async fn fourth_call_within_the_window_is_rejected() {
    let mut limiter = RateLimiter::new();
    limiter.register("polygon", TokenBucket::new(3, 60.0));

    let client = Arc::new(MockHttpClient::new().on_json("v2/snapshot", SNAPSHOT_BODY));
    let provider = PolygonProvider::new("test-key-0123456789", client, Arc::new(limiter))
        .expect("provider");

    for _ in 0..3 {
        provider.get_quote("AAPL").await.expect("within budget");
    }

    let err = provider.get_quote("AAPL").await.expect_err("over budget");
    match err {
        ProviderError::RateLimitExceeded { limit, window_secs } => {
            assert_eq!(limit, 3);
            assert_eq!(window_secs, 60.0);
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[tokio::test]
async fn unregistered_provider_name_is_not_throttled() {
    let client = Arc::new(
        MockHttpClient::new().on_json("v7/finance/quote", r#"{"currentPrice": 10.0}"#),
    );
    // Empty registry: yahoo has no bucket and passes through.
    let provider = YahooProvider::new(
        Arc::clone(&client) as Arc<dyn HttpClient>,
        Arc::new(RateLimiter::new()),
    );

    for _ in 0..20 {
        provider.get_quote("AAPL").await.expect("unthrottled");
    }
    assert_eq!(client.call_count(), 20);
}

#[test]
fn exhausted_bucket_reports_a_positive_wait() {
    let mut bucket = TokenBucket::new(2, 10.0);
    bucket.try_consume(1).expect("first");
    bucket.try_consume(1).expect("second");
    assert!(bucket.try_consume(1).is_err());

    let wait = bucket.wait_time_secs();
    assert!(wait > 0.0);
    assert!(wait <= 5.0, "one token refills within per/rate seconds");
}

#[test]
fn registry_reports_wait_only_for_registered_names() {
    let limiter = RateLimiter::with_default_providers();
    assert!(limiter.wait_time_secs("polygon").is_some());
    assert!(limiter.wait_time_secs("bloomberg").is_none());
}

#[test]
fn concurrent_consumers_never_exceed_the_budget() {
    let rate = 20;
    let mut limiter = RateLimiter::new();
    // Hour-long window so refill during the test is negligible.
    limiter.register("polygon", TokenBucket::new(rate, 3_600.0));
    let limiter = Arc::new(limiter);

    let handles: Vec<_> = (0..(rate * 2))
        .map(|_| {
            let limiter = Arc::clone(&limiter);
            std::thread::spawn(move || limiter.check_limit("polygon").is_ok())
        })
        .collect();

    let admitted = handles
        .into_iter()
        .map(|handle| handle.join().unwrap_or(false))
        .filter(|admitted| *admitted)
        .count();
    assert_eq!(admitted as u32, rate, "tokens are conserved under contention");
}
