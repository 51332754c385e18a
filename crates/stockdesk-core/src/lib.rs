//! Core contracts for stockdesk.
//!
//! This crate contains:
//! - Canonical domain models and request validation
//! - The provider trait, identifiers and capability descriptors
//! - Concrete providers (polygon, yahoo) and the hybrid router
//! - Token-bucket rate limiting, factory, config and health checks

pub mod config;
pub mod domain;
pub mod error;
pub mod factory;
pub mod health;
pub mod provider;
pub mod providers;
pub mod rate_limit;
pub mod transport;
pub mod validation;

pub use config::AppConfig;
pub use domain::{
    FinancialData, FiscalPeriod, MarketStatus, NewsArticle, Ohlcv, Quote, Ticker, Timeframe,
    UtcDateTime,
};
pub use error::{ProviderError, ValidationError};
pub use factory::{ProviderFactory, ProviderStrategy};
pub use health::{check_provider, CheckOutcome, HealthReport, HealthState};
pub use provider::{
    with_session, CostTier, Operation, ProviderCapabilities, ProviderFuture, ProviderId,
    StockDataProvider,
};
pub use providers::{HybridProvider, PolygonProvider, YahooProvider};
pub use rate_limit::{RateLimiter, TokenBucket};
pub use transport::{
    HttpAuth, HttpClient, HttpError, HttpRequest, HttpResponse, NoopHttpClient, ReqwestHttpClient,
};
pub use validation::{
    validate_ticker, validate_tickers, FinancialsRequest, HistoricalDataRequest, NewsRequest,
    MAX_BATCH_TICKERS,
};
