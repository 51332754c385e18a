//! Polygon.io provider: credentialed, quota-constrained, rich data.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use serde::Deserialize;

use crate::rate_limit::RateLimiter;
use crate::transport::{HttpAuth, HttpClient, HttpRequest, HttpResponse};
use crate::validation::{
    validate_ticker, validate_tickers, FinancialsRequest, HistoricalDataRequest, NewsRequest,
};
use crate::{
    CostTier, FinancialData, FiscalPeriod, MarketStatus, NewsArticle, Ohlcv, ProviderCapabilities,
    ProviderError, ProviderFuture, ProviderId, Quote, StockDataProvider, Ticker, Timeframe,
    UtcDateTime,
};

use super::{status_error, transport_error};

const BASE_URL: &str = "https://api.polygon.io";

/// Pause between calls in a serial batch, keeps bursts inside the
/// free-tier per-minute budget.
const BATCH_DELAY: Duration = Duration::from_millis(200);

/// Ordered quote endpoints; the first one that yields a price wins.
const QUOTE_STRATEGIES: [QuoteStrategy; 2] = [QuoteStrategy::Snapshot, QuoteStrategy::LastTrade];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum QuoteStrategy {
    Snapshot,
    LastTrade,
}

pub struct PolygonProvider {
    api_key: String,
    http_client: Arc<dyn HttpClient>,
    rate_limiter: Arc<RateLimiter>,
    connected: AtomicBool,
}

impl PolygonProvider {
    pub fn new(
        api_key: impl Into<String>,
        http_client: Arc<dyn HttpClient>,
        rate_limiter: Arc<RateLimiter>,
    ) -> Result<Self, ProviderError> {
        let api_key = api_key.into();
        if api_key.trim().is_empty() {
            return Err(ProviderError::Configuration(String::from(
                "polygon requires a non-empty API key",
            )));
        }

        Ok(Self {
            api_key,
            http_client,
            rate_limiter,
            connected: AtomicBool::new(false),
        })
    }

    fn auth(&self) -> HttpAuth {
        HttpAuth::query_param("apiKey", self.api_key.clone())
    }

    /// Rate-limit check, transport call and status classification for one
    /// upstream request.
    async fn fetch(&self, request: HttpRequest) -> Result<HttpResponse, ProviderError> {
        self.rate_limiter.check_limit(self.name())?;

        let response = self
            .http_client
            .execute(request.with_auth(&self.auth()))
            .await
            .map_err(|error| transport_error(ProviderId::Polygon, &error))?;

        if !response.is_success() {
            return Err(status_error(ProviderId::Polygon, &response));
        }
        Ok(response)
    }

    async fn quote_via(
        &self,
        strategy: QuoteStrategy,
        ticker: &Ticker,
    ) -> Result<Quote, ProviderError> {
        match strategy {
            QuoteStrategy::Snapshot => {
                let url = format!(
                    "{BASE_URL}/v2/snapshot/locale/us/markets/stocks/tickers/{ticker}"
                );
                let response = self.fetch(HttpRequest::get(url)).await?;
                let envelope: SnapshotEnvelope = parse_body(&response.body)?;
                normalize_snapshot(ticker, envelope)
            }
            QuoteStrategy::LastTrade => {
                let url = format!("{BASE_URL}/v2/last/trade/{ticker}");
                let response = self.fetch(HttpRequest::get(url)).await?;
                let envelope: LastTradeEnvelope = parse_body(&response.body)?;
                normalize_last_trade(ticker, envelope)
            }
        }
    }

    async fn quote_inner(&self, raw_ticker: &str) -> Result<Quote, ProviderError> {
        let ticker = validate_ticker(raw_ticker)?;

        for strategy in QUOTE_STRATEGIES {
            match self.quote_via(strategy, &ticker).await {
                Ok(quote) => return Ok(quote),
                Err(error) if aborts_strategy_chain(&error) => return Err(error),
                Err(error) => {
                    tracing::debug!(
                        ticker = %ticker,
                        strategy = ?strategy,
                        error = %error,
                        "polygon quote strategy failed; trying next"
                    );
                }
            }
        }

        Err(ProviderError::not_found(format!("quote for {ticker}")))
    }
}

/// Errors that make trying the next quote endpoint pointless.
fn aborts_strategy_chain(error: &ProviderError) -> bool {
    matches!(
        error,
        ProviderError::Authentication { .. }
            | ProviderError::RateLimitExceeded { .. }
            | ProviderError::UpstreamRateLimit { .. }
    )
}

impl StockDataProvider for PolygonProvider {
    fn name(&self) -> &'static str {
        "polygon"
    }

    fn capabilities(&self) -> ProviderCapabilities {
        ProviderCapabilities::full(CostTier::Freemium)
            .with_rate_limit(5)
            .with_api_key_required()
    }

    fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }

    fn connect<'a>(&'a self) -> ProviderFuture<'a, ()> {
        Box::pin(async move {
            if self.is_connected() {
                return Ok(());
            }

            // Reachability probe doubles as a credential check.
            let url = format!("{BASE_URL}/v1/marketstatus/now");
            self.fetch(HttpRequest::get(url)).await?;
            self.connected.store(true, Ordering::SeqCst);
            Ok(())
        })
    }

    fn disconnect<'a>(&'a self) -> ProviderFuture<'a, ()> {
        Box::pin(async move {
            self.connected.store(false, Ordering::SeqCst);
            Ok(())
        })
    }

    fn get_quote<'a>(&'a self, ticker: &'a str) -> ProviderFuture<'a, Quote> {
        Box::pin(self.quote_inner(ticker))
    }

    fn get_quotes<'a>(
        &'a self,
        tickers: &'a [String],
    ) -> ProviderFuture<'a, HashMap<Ticker, Quote>> {
        Box::pin(async move {
            let validated = validate_tickers(tickers)?;

            let mut quotes = HashMap::with_capacity(validated.len());
            for (index, ticker) in validated.iter().enumerate() {
                if index > 0 {
                    tokio::time::sleep(BATCH_DELAY).await;
                }
                match self.quote_inner(ticker.as_str()).await {
                    Ok(quote) => {
                        quotes.insert(ticker.clone(), quote);
                    }
                    Err(error) => {
                        tracing::warn!(
                            ticker = %ticker,
                            error = %error,
                            "polygon batch quote failed; omitting ticker"
                        );
                    }
                }
            }
            Ok(quotes)
        })
    }

    fn get_historical<'a>(
        &'a self,
        request: &'a HistoricalDataRequest,
    ) -> ProviderFuture<'a, Vec<Ohlcv>> {
        Box::pin(async move {
            let (multiplier, timespan) = aggregate_range(request.timeframe);
            let url = format!(
                "{BASE_URL}/v2/aggs/ticker/{}/range/{}/{}/{}/{}",
                request.ticker,
                multiplier,
                timespan,
                request.start.into_inner().date(),
                request.end.into_inner().date(),
            );
            let http_request = HttpRequest::get(url)
                .with_query("adjusted", "true")
                .with_query("sort", "asc")
                .with_query("limit", "50000");

            let response = self.fetch(http_request).await?;
            let envelope: AggregatesEnvelope = parse_body(&response.body)?;

            let mut bars = envelope
                .results
                .unwrap_or_default()
                .into_iter()
                .map(|row| normalize_aggregate(&request.ticker, row))
                .collect::<Result<Vec<_>, _>>()?;
            bars.sort_by_key(|bar| bar.timestamp);
            Ok(bars)
        })
    }

    fn get_news<'a>(&'a self, request: &'a NewsRequest) -> ProviderFuture<'a, Vec<NewsArticle>> {
        Box::pin(async move {
            let mut http_request = HttpRequest::get(format!("{BASE_URL}/v2/reference/news"))
                .with_query("limit", request.limit.to_string());
            if let Some(ticker) = &request.ticker {
                http_request = http_request.with_query("ticker", ticker.as_str());
            }

            let response = self.fetch(http_request).await?;
            let envelope: NewsEnvelope = parse_body(&response.body)?;

            let mut articles = Vec::new();
            for item in envelope.results.unwrap_or_default() {
                match normalize_news_item(item) {
                    Ok(article) => articles.push(article),
                    Err(error) => {
                        tracing::debug!(error = %error, "skipping malformed polygon news item");
                    }
                }
            }
            articles.sort_by(|a, b| b.published_at.cmp(&a.published_at));
            articles.truncate(request.limit);
            Ok(articles)
        })
    }

    fn get_financials<'a>(
        &'a self,
        request: &'a FinancialsRequest,
    ) -> ProviderFuture<'a, Vec<FinancialData>> {
        Box::pin(async move {
            let http_request = HttpRequest::get(format!("{BASE_URL}/vX/reference/financials"))
                .with_query("ticker", request.ticker.as_str())
                .with_query("timeframe", "quarterly")
                .with_query("limit", request.limit.to_string());

            let response = self.fetch(http_request).await?;
            let envelope: FinancialsEnvelope = parse_body(&response.body)?;

            let mut periods = Vec::new();
            for row in envelope.results.unwrap_or_default() {
                match normalize_financials_row(&request.ticker, row) {
                    Ok(data) => periods.push(data),
                    Err(error) => {
                        tracing::debug!(
                            ticker = %request.ticker,
                            error = %error,
                            "skipping malformed polygon financials row"
                        );
                    }
                }
            }
            periods.sort_by(|a, b| b.period_end.cmp(&a.period_end));
            periods.truncate(request.limit);
            Ok(periods)
        })
    }

    fn get_market_status<'a>(&'a self) -> ProviderFuture<'a, MarketStatus> {
        Box::pin(async move {
            let url = format!("{BASE_URL}/v1/marketstatus/now");
            let response = self.fetch(HttpRequest::get(url)).await?;
            let payload: MarketStatusPayload = parse_body(&response.body)?;

            let server_time = payload
                .server_time
                .as_deref()
                .and_then(|value| UtcDateTime::parse(value).ok());
            Ok(
                MarketStatus::new(payload.market.as_deref() == Some("open"), ProviderId::Polygon)
                    .with_server_time(server_time),
            )
        })
    }
}

fn parse_body<'de, T: Deserialize<'de>>(body: &'de str) -> Result<T, ProviderError> {
    serde_json::from_str(body).map_err(|error| {
        ProviderError::upstream(
            ProviderId::Polygon,
            format!("malformed response body: {error}"),
        )
    })
}

const fn aggregate_range(timeframe: Timeframe) -> (u32, &'static str) {
    match timeframe {
        Timeframe::OneMinute => (1, "minute"),
        Timeframe::FiveMinutes => (5, "minute"),
        Timeframe::FifteenMinutes => (15, "minute"),
        Timeframe::ThirtyMinutes => (30, "minute"),
        Timeframe::OneHour => (1, "hour"),
        Timeframe::OneDay => (1, "day"),
        Timeframe::OneWeek => (1, "week"),
        Timeframe::OneMonth => (1, "month"),
    }
}

#[derive(Debug, Deserialize)]
struct SnapshotEnvelope {
    ticker: Option<SnapshotTicker>,
}

#[derive(Debug, Deserialize)]
struct SnapshotTicker {
    #[serde(rename = "lastTrade")]
    last_trade: Option<SnapshotTrade>,
    day: Option<SnapshotDay>,
    #[serde(rename = "prevDay")]
    prev_day: Option<SnapshotDay>,
}

#[derive(Debug, Deserialize)]
struct SnapshotTrade {
    p: Option<f64>,
    t: Option<i64>,
}

#[derive(Debug, Deserialize)]
struct SnapshotDay {
    o: Option<f64>,
    h: Option<f64>,
    l: Option<f64>,
    c: Option<f64>,
    v: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct LastTradeEnvelope {
    results: Option<SnapshotTrade>,
}

#[derive(Debug, Deserialize)]
struct AggregatesEnvelope {
    results: Option<Vec<AggregateRow>>,
}

#[derive(Debug, Deserialize)]
struct AggregateRow {
    t: i64,
    o: f64,
    h: f64,
    l: f64,
    c: f64,
    v: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct NewsEnvelope {
    results: Option<Vec<NewsItem>>,
}

#[derive(Debug, Deserialize)]
struct NewsItem {
    title: Option<String>,
    article_url: Option<String>,
    published_utc: Option<String>,
    description: Option<String>,
    author: Option<String>,
    publisher: Option<NewsPublisher>,
    tickers: Option<Vec<String>>,
}

#[derive(Debug, Deserialize)]
struct NewsPublisher {
    name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct FinancialsEnvelope {
    results: Option<Vec<FinancialsRow>>,
}

#[derive(Debug, Deserialize)]
struct FinancialsRow {
    start_date: Option<String>,
    end_date: Option<String>,
    fiscal_year: Option<String>,
    fiscal_period: Option<String>,
    financials: Option<FinancialStatements>,
}

#[derive(Debug, Deserialize)]
struct FinancialStatements {
    income_statement: Option<HashMap<String, Metric>>,
    balance_sheet: Option<HashMap<String, Metric>>,
    cash_flow_statement: Option<HashMap<String, Metric>>,
}

#[derive(Debug, Deserialize)]
struct Metric {
    value: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct MarketStatusPayload {
    market: Option<String>,
    #[serde(rename = "serverTime")]
    server_time: Option<String>,
}

fn normalize_snapshot(
    ticker: &Ticker,
    envelope: SnapshotEnvelope,
) -> Result<Quote, ProviderError> {
    let snapshot = envelope
        .ticker
        .ok_or_else(|| ProviderError::not_found(format!("snapshot for {ticker}")))?;

    let last_trade = snapshot.last_trade.as_ref();
    let day = snapshot.day.as_ref();
    let price = last_trade
        .and_then(|trade| trade.p)
        .or_else(|| day.and_then(|session| session.c))
        .ok_or_else(|| ProviderError::not_found(format!("snapshot price for {ticker}")))?;

    let timestamp = last_trade
        .and_then(|trade| trade.t)
        .and_then(|nanos| UtcDateTime::from_unix_nanos(nanos).ok())
        .unwrap_or_else(UtcDateTime::now);

    let quote = Quote::new(ticker.clone(), price, timestamp, ProviderId::Polygon)?
        .with_volume(day.and_then(|session| session.v).map(|volume| volume as u64))
        .with_session_range(
            day.and_then(|session| session.o),
            day.and_then(|session| session.h),
            day.and_then(|session| session.l),
        )
        .with_previous_close(snapshot.prev_day.as_ref().and_then(|session| session.c));
    Ok(quote)
}

fn normalize_last_trade(
    ticker: &Ticker,
    envelope: LastTradeEnvelope,
) -> Result<Quote, ProviderError> {
    let trade = envelope
        .results
        .ok_or_else(|| ProviderError::not_found(format!("last trade for {ticker}")))?;
    let price = trade
        .p
        .ok_or_else(|| ProviderError::not_found(format!("last trade price for {ticker}")))?;
    let timestamp = trade
        .t
        .and_then(|nanos| UtcDateTime::from_unix_nanos(nanos).ok())
        .unwrap_or_else(UtcDateTime::now);

    Ok(Quote::new(
        ticker.clone(),
        price,
        timestamp,
        ProviderId::Polygon,
    )?)
}

fn normalize_aggregate(ticker: &Ticker, row: AggregateRow) -> Result<Ohlcv, ProviderError> {
    let timestamp = UtcDateTime::from_unix_millis(row.t)?;
    Ok(Ohlcv::new(
        timestamp,
        row.o,
        row.h,
        row.l,
        row.c,
        row.v.map(|volume| volume as u64).unwrap_or_default(),
        ticker.clone(),
        ProviderId::Polygon,
    )?)
}

fn normalize_news_item(item: NewsItem) -> Result<NewsArticle, ProviderError> {
    let title = item
        .title
        .ok_or_else(|| ProviderError::not_found("news title"))?;
    let url = item
        .article_url
        .ok_or_else(|| ProviderError::not_found("news url"))?;
    let published_at = item
        .published_utc
        .as_deref()
        .map(UtcDateTime::parse)
        .transpose()?
        .unwrap_or_else(UtcDateTime::now);

    let tickers = item
        .tickers
        .unwrap_or_default()
        .iter()
        .filter_map(|raw| Ticker::parse(raw).ok())
        .collect();

    Ok(
        NewsArticle::new(title, url, published_at, ProviderId::Polygon)?
            .with_description(item.description)
            .with_source(item.publisher.and_then(|publisher| publisher.name))
            .with_author(item.author)
            .with_tickers(tickers),
    )
}

fn normalize_financials_row(
    ticker: &Ticker,
    row: FinancialsRow,
) -> Result<FinancialData, ProviderError> {
    let period_start = parse_date(
        row.start_date
            .as_deref()
            .ok_or_else(|| ProviderError::not_found("financials start_date"))?,
    )?;
    let period_end = parse_date(
        row.end_date
            .as_deref()
            .ok_or_else(|| ProviderError::not_found("financials end_date"))?,
    )?;

    let fiscal_year = row
        .fiscal_year
        .as_deref()
        .and_then(|value| value.parse::<i32>().ok())
        .unwrap_or_else(|| period_end.into_inner().year());
    let fiscal_period = row
        .fiscal_period
        .as_deref()
        .and_then(|value| value.parse::<FiscalPeriod>().ok())
        .unwrap_or_else(|| FiscalPeriod::from_month(u8::from(period_end.into_inner().month())));

    let statements = row.financials.unwrap_or(FinancialStatements {
        income_statement: None,
        balance_sheet: None,
        cash_flow_statement: None,
    });
    let income = statements.income_statement.unwrap_or_default();
    let balance = statements.balance_sheet.unwrap_or_default();
    let cash_flow = statements.cash_flow_statement.unwrap_or_default();

    Ok(FinancialData::new(
        ticker.clone(),
        period_start,
        period_end,
        fiscal_year,
        fiscal_period,
        ProviderId::Polygon,
    )?
    .with_income_statement(
        metric(&income, "revenues"),
        metric(&income, "net_income_loss"),
        metric(&income, "basic_earnings_per_share"),
    )
    .with_balance_sheet(
        metric(&balance, "assets"),
        metric(&balance, "liabilities"),
        metric(&balance, "equity"),
    )
    .with_cash_flow(metric(
        &cash_flow,
        "net_cash_flow_from_operating_activities",
    )))
}

fn metric(statement: &HashMap<String, Metric>, concept: &str) -> Option<f64> {
    statement.get(concept).and_then(|entry| entry.value)
}

/// Polygon reports reporting-period boundaries as bare dates.
fn parse_date(value: &str) -> Result<UtcDateTime, ProviderError> {
    if value.len() == 10 {
        return Ok(UtcDateTime::parse(&format!("{value}T00:00:00Z"))?);
    }
    Ok(UtcDateTime::parse(value)?)
}
