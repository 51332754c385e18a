//! Provider contract: identifiers, capabilities and the data trait every
//! provider implements.

use std::collections::HashMap;
use std::fmt::{Display, Formatter};
use std::future::Future;
use std::pin::Pin;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::validation::{FinancialsRequest, HistoricalDataRequest, NewsRequest};
use crate::{
    FinancialData, MarketStatus, NewsArticle, Ohlcv, ProviderError, Quote, Ticker, ValidationError,
};

/// Concrete upstream identity. Composite providers route between these and
/// never appear here; every returned record is tagged with the concrete
/// upstream that produced it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProviderId {
    Polygon,
    Yahoo,
}

impl ProviderId {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Polygon => "polygon",
            Self::Yahoo => "yahoo",
        }
    }
}

impl Display for ProviderId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProviderId {
    type Err = ValidationError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "polygon" => Ok(Self::Polygon),
            "yahoo" | "yfinance" => Ok(Self::Yahoo),
            other => Err(ValidationError::InvalidProvider {
                value: other.to_owned(),
            }),
        }
    }
}

/// Pricing model of an upstream, surfaced in status output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CostTier {
    Free,
    Freemium,
    Paid,
}

/// Data operation used for capability checks and routing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Operation {
    Quotes,
    Historical,
    News,
    Financials,
    MarketStatus,
}

impl Operation {
    pub const ALL: [Self; 5] = [
        Self::Quotes,
        Self::Historical,
        Self::News,
        Self::Financials,
        Self::MarketStatus,
    ];

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Quotes => "quotes",
            Self::Historical => "historical",
            Self::News => "news",
            Self::Financials => "financials",
            Self::MarketStatus => "market_status",
        }
    }
}

impl Display for Operation {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Supported operation matrix plus pricing descriptors for one provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderCapabilities {
    pub quotes: bool,
    pub historical: bool,
    pub news: bool,
    pub financials: bool,
    pub market_status: bool,
    /// Local request budget (requests per window), when one is enforced.
    pub rate_limit: Option<u32>,
    pub requires_api_key: bool,
    pub cost_tier: CostTier,
}

impl ProviderCapabilities {
    pub const fn full(cost_tier: CostTier) -> Self {
        Self {
            quotes: true,
            historical: true,
            news: true,
            financials: true,
            market_status: true,
            rate_limit: None,
            requires_api_key: false,
            cost_tier,
        }
    }

    pub const fn with_rate_limit(mut self, rate_limit: u32) -> Self {
        self.rate_limit = Some(rate_limit);
        self
    }

    pub const fn with_api_key_required(mut self) -> Self {
        self.requires_api_key = true;
        self
    }

    pub const fn supports(self, operation: Operation) -> bool {
        match operation {
            Operation::Quotes => self.quotes,
            Operation::Historical => self.historical,
            Operation::News => self.news,
            Operation::Financials => self.financials,
            Operation::MarketStatus => self.market_status,
        }
    }

    pub fn supported_operations(self) -> Vec<&'static str> {
        Operation::ALL
            .into_iter()
            .filter(|operation| self.supports(*operation))
            .map(Operation::as_str)
            .collect()
    }
}

/// Boxed future returned by provider trait methods.
pub type ProviderFuture<'a, T> =
    Pin<Box<dyn Future<Output = Result<T, ProviderError>> + Send + 'a>>;

/// Contract implemented by every data provider, concrete or composite.
///
/// `get_quote` takes the raw ticker string and validates it itself, so an
/// invalid ticker fails before any token is consumed or byte is sent.
/// `get_quotes` is partial-success: failed tickers are logged and omitted
/// from the map, and only an empty batch is an error. Everything else is
/// fail-fast.
pub trait StockDataProvider: Send + Sync {
    /// Stable lowercase name, also the rate-limit bucket key for concrete
    /// providers.
    fn name(&self) -> &'static str;

    fn capabilities(&self) -> ProviderCapabilities;

    fn is_connected(&self) -> bool;

    fn connect<'a>(&'a self) -> ProviderFuture<'a, ()>;

    fn disconnect<'a>(&'a self) -> ProviderFuture<'a, ()>;

    fn get_quote<'a>(&'a self, ticker: &'a str) -> ProviderFuture<'a, Quote>;

    fn get_quotes<'a>(
        &'a self,
        tickers: &'a [String],
    ) -> ProviderFuture<'a, HashMap<Ticker, Quote>>;

    fn get_historical<'a>(
        &'a self,
        request: &'a HistoricalDataRequest,
    ) -> ProviderFuture<'a, Vec<Ohlcv>>;

    fn get_news<'a>(&'a self, request: &'a NewsRequest) -> ProviderFuture<'a, Vec<NewsArticle>>;

    fn get_financials<'a>(
        &'a self,
        request: &'a FinancialsRequest,
    ) -> ProviderFuture<'a, Vec<FinancialData>>;

    fn get_market_status<'a>(&'a self) -> ProviderFuture<'a, MarketStatus>;
}

impl std::fmt::Debug for dyn StockDataProvider {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StockDataProvider")
            .field("name", &self.name())
            .finish_non_exhaustive()
    }
}

/// Run `body` inside a connect/disconnect pair.
///
/// Disconnect always runs, even when `body` fails; the body's error wins
/// over a disconnect error.
pub async fn with_session<'a, P, T, E, Fut>(
    provider: &'a P,
    body: impl FnOnce(&'a P) -> Fut,
) -> Result<T, E>
where
    P: StockDataProvider + ?Sized,
    Fut: Future<Output = Result<T, E>> + 'a,
    E: From<ProviderError>,
{
    provider.connect().await?;
    let outcome = body(provider).await;
    let disconnect = provider.disconnect().await;

    match (outcome, disconnect) {
        (Ok(value), Ok(())) => Ok(value),
        (Ok(_), Err(error)) => Err(E::from(error)),
        (Err(error), _) => Err(error),
    }
}
