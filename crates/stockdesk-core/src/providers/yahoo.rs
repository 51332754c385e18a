//! Yahoo Finance provider: free, keyless, best-effort delayed data.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use serde_json::Value;
use time::Duration;

use crate::rate_limit::RateLimiter;
use crate::transport::{HttpClient, HttpRequest, HttpResponse};
use crate::validation::{
    validate_ticker, validate_tickers, FinancialsRequest, HistoricalDataRequest, NewsRequest,
};
use crate::{
    CostTier, FinancialData, FiscalPeriod, MarketStatus, NewsArticle, Ohlcv, ProviderCapabilities,
    ProviderError, ProviderFuture, ProviderId, Quote, StockDataProvider, Ticker, UtcDateTime,
};

use super::{status_error, transport_error};

const BASE_URL: &str = "https://query1.finance.yahoo.com";

/// The market is considered open when the reference index printed a bar
/// within this many seconds.
const MARKET_STATUS_WINDOW_SECS: i64 = 300;

/// Index symbol used for the market-status heuristic.
const MARKET_STATUS_PROBE: &str = "SPY";

/// Approximate quarter length used when the upstream reports only the
/// period end.
const QUARTER_DAYS: i64 = 90;

pub struct YahooProvider {
    http_client: Arc<dyn HttpClient>,
    rate_limiter: Arc<RateLimiter>,
    connected: AtomicBool,
}

impl YahooProvider {
    pub fn new(http_client: Arc<dyn HttpClient>, rate_limiter: Arc<RateLimiter>) -> Self {
        Self {
            http_client,
            rate_limiter,
            connected: AtomicBool::new(false),
        }
    }

    async fn fetch(&self, request: HttpRequest) -> Result<HttpResponse, ProviderError> {
        self.rate_limiter.check_limit(self.name())?;

        let response = self
            .http_client
            .execute(request)
            .await
            .map_err(|error| transport_error(ProviderId::Yahoo, &error))?;

        if !response.is_success() {
            return Err(status_error(ProviderId::Yahoo, &response));
        }
        Ok(response)
    }

    async fn quote_inner(&self, raw_ticker: &str) -> Result<Quote, ProviderError> {
        let ticker = validate_ticker(raw_ticker)?;

        let request = HttpRequest::get(format!("{BASE_URL}/v7/finance/quote"))
            .with_query("symbols", ticker.as_str());
        let response = self.fetch(request).await?;
        let payload = parse_body(&response.body)?;

        normalize_quote(&ticker, &payload)
    }

    async fn chart(
        &self,
        ticker: &str,
        start: UtcDateTime,
        end: UtcDateTime,
        interval: &str,
    ) -> Result<Value, ProviderError> {
        let request = HttpRequest::get(format!("{BASE_URL}/v8/finance/chart/{ticker}"))
            .with_query("period1", start.unix_seconds().to_string())
            .with_query("period2", end.unix_seconds().to_string())
            .with_query("interval", interval)
            .with_query("events", "history");
        let response = self.fetch(request).await?;
        parse_body(&response.body)
    }
}

impl StockDataProvider for YahooProvider {
    fn name(&self) -> &'static str {
        "yahoo"
    }

    fn capabilities(&self) -> ProviderCapabilities {
        ProviderCapabilities::full(CostTier::Free).with_rate_limit(2_000)
    }

    fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }

    fn connect<'a>(&'a self) -> ProviderFuture<'a, ()> {
        // Keyless upstream: nothing to probe or authenticate.
        Box::pin(async move {
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
            for ticker in &validated {
                match self.quote_inner(ticker.as_str()).await {
                    Ok(quote) => {
                        quotes.insert(ticker.clone(), quote);
                    }
                    Err(error) => {
                        tracing::warn!(
                            ticker = %ticker,
                            error = %error,
                            "yahoo batch quote failed; omitting ticker"
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
            let payload = self
                .chart(
                    request.ticker.as_str(),
                    request.start,
                    request.end,
                    request.timeframe.as_str(),
                )
                .await?;

            let mut bars = normalize_chart(&request.ticker, &payload)?;
            bars.sort_by_key(|bar| bar.timestamp);
            Ok(bars)
        })
    }

    fn get_news<'a>(&'a self, request: &'a NewsRequest) -> ProviderFuture<'a, Vec<NewsArticle>> {
        Box::pin(async move {
            // The search endpoint needs a query; market-wide headlines are
            // not available from this upstream.
            let Some(ticker) = &request.ticker else {
                return Ok(Vec::new());
            };

            let http_request = HttpRequest::get(format!("{BASE_URL}/v1/finance/search"))
                .with_query("q", ticker.as_str())
                .with_query("newsCount", request.limit.to_string());
            let response = self.fetch(http_request).await?;
            let payload = parse_body(&response.body)?;

            let mut articles = Vec::new();
            for item in payload
                .get("news")
                .and_then(Value::as_array)
                .into_iter()
                .flatten()
            {
                match normalize_news_item(item) {
                    Ok(article) => articles.push(article),
                    Err(error) => {
                        tracing::debug!(error = %error, "skipping malformed yahoo news item");
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
            let http_request = HttpRequest::get(format!(
                "{BASE_URL}/v10/finance/quoteSummary/{}",
                request.ticker
            ))
            .with_query(
                "modules",
                "incomeStatementHistoryQuarterly,balanceSheetHistoryQuarterly,\
                 cashflowStatementHistoryQuarterly",
            );
            let response = self.fetch(http_request).await?;
            let payload = parse_body(&response.body)?;

            let mut periods = normalize_financials(&request.ticker, &payload);
            periods.sort_by(|a, b| b.period_end.cmp(&a.period_end));
            periods.truncate(request.limit);
            Ok(periods)
        })
    }

    fn get_market_status<'a>(&'a self) -> ProviderFuture<'a, MarketStatus> {
        Box::pin(async move {
            let now = UtcDateTime::now();
            let window_start = now.saturating_sub(Duration::minutes(10));
            let payload = self
                .chart(MARKET_STATUS_PROBE, window_start, now, "1m")
                .await?;

            let is_open = latest_bar_timestamp(&payload)
                .map(|last| now.seconds_since(last) <= MARKET_STATUS_WINDOW_SECS)
                .unwrap_or(false);

            Ok(MarketStatus::new(is_open, ProviderId::Yahoo).with_server_time(Some(now)))
        })
    }
}

fn parse_body(body: &str) -> Result<Value, ProviderError> {
    serde_json::from_str(body).map_err(|error| {
        ProviderError::upstream(ProviderId::Yahoo, format!("malformed response body: {error}"))
    })
}

/// Locate the quote object: `quoteResponse.result[0]` on the documented
/// shape, the root object on the terse one.
fn quote_object(payload: &Value) -> &Value {
    payload
        .get("quoteResponse")
        .and_then(|response| response.get("result"))
        .and_then(Value::as_array)
        .and_then(|results| results.first())
        .unwrap_or(payload)
}

/// Numeric field that may be a bare number or a `{"raw": n}` wrapper.
fn num(value: &Value) -> Option<f64> {
    value
        .as_f64()
        .or_else(|| value.get("raw").and_then(Value::as_f64))
}

fn field(object: &Value, names: &[&str]) -> Option<f64> {
    names.iter().find_map(|name| object.get(*name).and_then(num))
}

fn normalize_quote(ticker: &Ticker, payload: &Value) -> Result<Quote, ProviderError> {
    let object = quote_object(payload);

    let price = field(object, &["currentPrice", "regularMarketPrice", "postMarketPrice"])
        .ok_or_else(|| ProviderError::not_found(format!("quote for {ticker}")))?;

    let timestamp = object
        .get("regularMarketTime")
        .and_then(num)
        .and_then(|seconds| UtcDateTime::from_unix_seconds(seconds as i64).ok())
        .unwrap_or_else(UtcDateTime::now);

    let quote = Quote::new(ticker.clone(), price, timestamp, ProviderId::Yahoo)?
        .with_volume(
            field(object, &["regularMarketVolume", "volume"]).map(|volume| volume as u64),
        )
        .with_spread(field(object, &["bid"]), field(object, &["ask"]))
        .with_session_range(
            field(object, &["regularMarketOpen", "open"]),
            field(object, &["regularMarketDayHigh", "dayHigh"]),
            field(object, &["regularMarketDayLow", "dayLow"]),
        )
        .with_previous_close(field(
            object,
            &["previousClose", "regularMarketPreviousClose"],
        ));
    Ok(quote)
}

fn chart_result(payload: &Value) -> Option<&Value> {
    payload
        .get("chart")?
        .get("result")?
        .as_array()?
        .first()
}

fn normalize_chart(ticker: &Ticker, payload: &Value) -> Result<Vec<Ohlcv>, ProviderError> {
    let Some(result) = chart_result(payload) else {
        return Ok(Vec::new());
    };

    let timestamps: Vec<i64> = result
        .get("timestamp")
        .and_then(Value::as_array)
        .map(|values| values.iter().filter_map(Value::as_i64).collect())
        .unwrap_or_default();
    let Some(series) = result
        .get("indicators")
        .and_then(|indicators| indicators.get("quote"))
        .and_then(Value::as_array)
        .and_then(|quotes| quotes.first())
    else {
        return Ok(Vec::new());
    };

    let column = |name: &str| -> Vec<Option<f64>> {
        series
            .get(name)
            .and_then(Value::as_array)
            .map(|values| values.iter().map(Value::as_f64).collect())
            .unwrap_or_default()
    };
    let opens = column("open");
    let highs = column("high");
    let lows = column("low");
    let closes = column("close");
    let volumes = column("volume");

    let mut bars = Vec::with_capacity(timestamps.len());
    for (index, seconds) in timestamps.iter().enumerate() {
        // Rows with missing fields are gaps (halts, partial candles);
        // skip rather than fabricate values.
        let (Some(open), Some(high), Some(low), Some(close)) = (
            opens.get(index).copied().flatten(),
            highs.get(index).copied().flatten(),
            lows.get(index).copied().flatten(),
            closes.get(index).copied().flatten(),
        ) else {
            continue;
        };

        let timestamp = UtcDateTime::from_unix_seconds(*seconds)?;
        let volume = volumes
            .get(index)
            .copied()
            .flatten()
            .map(|value| value as u64)
            .unwrap_or_default();
        bars.push(Ohlcv::new(
            timestamp,
            open,
            high,
            low,
            close,
            volume,
            ticker.clone(),
            ProviderId::Yahoo,
        )?);
    }
    Ok(bars)
}

fn latest_bar_timestamp(payload: &Value) -> Option<UtcDateTime> {
    let seconds = chart_result(payload)?
        .get("timestamp")?
        .as_array()?
        .iter()
        .filter_map(Value::as_i64)
        .max()?;
    UtcDateTime::from_unix_seconds(seconds).ok()
}

fn normalize_news_item(item: &Value) -> Result<NewsArticle, ProviderError> {
    let title = item
        .get("title")
        .and_then(Value::as_str)
        .ok_or_else(|| ProviderError::not_found("news title"))?;
    let url = item
        .get("link")
        .and_then(Value::as_str)
        .ok_or_else(|| ProviderError::not_found("news url"))?;
    let published_at = item
        .get("providerPublishTime")
        .and_then(Value::as_i64)
        .and_then(|seconds| UtcDateTime::from_unix_seconds(seconds).ok())
        .unwrap_or_else(UtcDateTime::now);

    let tickers = item
        .get("relatedTickers")
        .and_then(Value::as_array)
        .map(|values| {
            values
                .iter()
                .filter_map(Value::as_str)
                .filter_map(|raw| Ticker::parse(raw).ok())
                .collect()
        })
        .unwrap_or_default();

    Ok(
        NewsArticle::new(title, url, published_at, ProviderId::Yahoo)?
            .with_source(
                item.get("publisher")
                    .and_then(Value::as_str)
                    .map(str::to_owned),
            )
            .with_tickers(tickers),
    )
}

fn normalize_financials(ticker: &Ticker, payload: &Value) -> Vec<FinancialData> {
    let Some(result) = payload
        .get("quoteSummary")
        .and_then(|summary| summary.get("result"))
        .and_then(Value::as_array)
        .and_then(|results| results.first())
    else {
        return Vec::new();
    };

    let rows = |module: &str, list: &str| -> Vec<Value> {
        result
            .get(module)
            .and_then(|value| value.get(list))
            .and_then(Value::as_array)
            .cloned()
            .unwrap_or_default()
    };

    // Statement rows are keyed by period end; merge the three statements
    // per period.
    let mut merged: HashMap<i64, PeriodFields> = HashMap::new();
    for row in rows("incomeStatementHistoryQuarterly", "incomeStatementHistory") {
        if let Some(end) = row_end(&row) {
            let entry = merged.entry(end).or_default();
            entry.revenue = row.get("totalRevenue").and_then(num);
            entry.net_income = row.get("netIncome").and_then(num);
        }
    }
    for row in rows("balanceSheetHistoryQuarterly", "balanceSheetStatements") {
        if let Some(end) = row_end(&row) {
            let entry = merged.entry(end).or_default();
            entry.total_assets = row.get("totalAssets").and_then(num);
            entry.total_liabilities = row.get("totalLiab").and_then(num);
            entry.stockholders_equity = row.get("totalStockholderEquity").and_then(num);
        }
    }
    for row in rows("cashflowStatementHistoryQuarterly", "cashflowStatements") {
        if let Some(end) = row_end(&row) {
            let entry = merged.entry(end).or_default();
            entry.operating_cash_flow = row.get("totalCashFromOperatingActivities").and_then(num);
        }
    }

    let mut periods = Vec::with_capacity(merged.len());
    for (end_seconds, fields) in merged {
        let Ok(period_end) = UtcDateTime::from_unix_seconds(end_seconds) else {
            continue;
        };
        let period_start = period_end.saturating_sub(Duration::days(QUARTER_DAYS));
        let end_inner = period_end.into_inner();
        let fiscal_period = FiscalPeriod::from_month(u8::from(end_inner.month()));

        match FinancialData::new(
            ticker.clone(),
            period_start,
            period_end,
            end_inner.year(),
            fiscal_period,
            ProviderId::Yahoo,
        ) {
            Ok(data) => periods.push(
                data.with_income_statement(fields.revenue, fields.net_income, None)
                    .with_balance_sheet(
                        fields.total_assets,
                        fields.total_liabilities,
                        fields.stockholders_equity,
                    )
                    .with_cash_flow(fields.operating_cash_flow),
            ),
            Err(error) => {
                tracing::debug!(
                    ticker = %ticker,
                    error = %error,
                    "skipping malformed yahoo financials period"
                );
            }
        }
    }
    periods
}

#[derive(Debug, Default)]
struct PeriodFields {
    revenue: Option<f64>,
    net_income: Option<f64>,
    total_assets: Option<f64>,
    total_liabilities: Option<f64>,
    stockholders_equity: Option<f64>,
    operating_cash_flow: Option<f64>,
}

fn row_end(row: &Value) -> Option<i64> {
    row.get("endDate")?
        .get("raw")
        .and_then(Value::as_i64)
        .or_else(|| row.get("endDate").and_then(Value::as_i64))
}
