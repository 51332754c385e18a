//! Composite provider routing between yahoo (always) and polygon
//! (credential present).
//!
//! Routing is fixed: quotes, historical and financials go to yahoo
//! (free, no quota pressure); news and market status go to polygon when
//! configured because its feeds are richer. Any polygon failure falls
//! back to yahoo, and only a fallback failure reaches the caller.

use std::collections::HashMap;

use crate::validation::{FinancialsRequest, HistoricalDataRequest, NewsRequest};
use crate::{
    CostTier, FinancialData, MarketStatus, NewsArticle, Ohlcv, ProviderCapabilities, ProviderError,
    ProviderFuture, Quote, StockDataProvider, Ticker,
};

use super::{PolygonProvider, YahooProvider};

pub struct HybridProvider {
    yahoo: YahooProvider,
    polygon: Option<PolygonProvider>,
}

impl HybridProvider {
    pub fn new(yahoo: YahooProvider, polygon: Option<PolygonProvider>) -> Self {
        Self { yahoo, polygon }
    }

    pub fn has_polygon(&self) -> bool {
        self.polygon.is_some()
    }

    async fn news_routed(&self, request: &NewsRequest) -> Result<Vec<NewsArticle>, ProviderError> {
        if let Some(polygon) = &self.polygon {
            match polygon.get_news(request).await {
                Ok(articles) => return Ok(articles),
                Err(error) => {
                    tracing::warn!(
                        error = %error,
                        "polygon news failed; falling back to yahoo"
                    );
                }
            }
        }
        self.yahoo.get_news(request).await
    }

    async fn market_status_routed(&self) -> Result<MarketStatus, ProviderError> {
        if let Some(polygon) = &self.polygon {
            match polygon.get_market_status().await {
                Ok(status) => return Ok(status),
                Err(error) => {
                    tracing::warn!(
                        error = %error,
                        "polygon market status failed; falling back to yahoo"
                    );
                }
            }
        }
        self.yahoo.get_market_status().await
    }
}

impl StockDataProvider for HybridProvider {
    fn name(&self) -> &'static str {
        "hybrid"
    }

    fn capabilities(&self) -> ProviderCapabilities {
        let cost_tier = if self.polygon.is_some() {
            CostTier::Freemium
        } else {
            CostTier::Free
        };
        ProviderCapabilities::full(cost_tier)
    }

    fn is_connected(&self) -> bool {
        self.yahoo.is_connected()
    }

    fn connect<'a>(&'a self) -> ProviderFuture<'a, ()> {
        Box::pin(async move {
            self.yahoo.connect().await?;

            // A broken polygon credential degrades to yahoo-only rather
            // than failing the whole session.
            if let Some(polygon) = &self.polygon {
                if let Err(error) = polygon.connect().await {
                    tracing::warn!(
                        error = %error,
                        "polygon connect failed; hybrid continues on yahoo only"
                    );
                }
            }
            Ok(())
        })
    }

    fn disconnect<'a>(&'a self) -> ProviderFuture<'a, ()> {
        Box::pin(async move {
            let yahoo_result = self.yahoo.disconnect().await;
            if let Some(polygon) = &self.polygon {
                polygon.disconnect().await?;
            }
            yahoo_result
        })
    }

    fn get_quote<'a>(&'a self, ticker: &'a str) -> ProviderFuture<'a, Quote> {
        self.yahoo.get_quote(ticker)
    }

    fn get_quotes<'a>(
        &'a self,
        tickers: &'a [String],
    ) -> ProviderFuture<'a, HashMap<Ticker, Quote>> {
        self.yahoo.get_quotes(tickers)
    }

    fn get_historical<'a>(
        &'a self,
        request: &'a HistoricalDataRequest,
    ) -> ProviderFuture<'a, Vec<Ohlcv>> {
        self.yahoo.get_historical(request)
    }

    fn get_news<'a>(&'a self, request: &'a NewsRequest) -> ProviderFuture<'a, Vec<NewsArticle>> {
        Box::pin(self.news_routed(request))
    }

    fn get_financials<'a>(
        &'a self,
        request: &'a FinancialsRequest,
    ) -> ProviderFuture<'a, Vec<FinancialData>> {
        self.yahoo.get_financials(request)
    }

    fn get_market_status<'a>(&'a self) -> ProviderFuture<'a, MarketStatus> {
        Box::pin(self.market_status_routed())
    }
}
