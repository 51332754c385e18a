use std::fmt::{Display, Formatter};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::provider::ProviderId;
use crate::{Ticker, UtcDateTime, ValidationError};

/// Company reporting period: one of the four quarters or the full year.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FiscalPeriod {
    Q1,
    Q2,
    Q3,
    Q4,
    #[serde(rename = "FY")]
    FullYear,
}

impl FiscalPeriod {
    /// Derive the quarter from the month of a reporting date.
    pub const fn from_month(month: u8) -> Self {
        match (month.saturating_sub(1)) / 3 {
            0 => Self::Q1,
            1 => Self::Q2,
            2 => Self::Q3,
            _ => Self::Q4,
        }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Q1 => "Q1",
            Self::Q2 => "Q2",
            Self::Q3 => "Q3",
            Self::Q4 => "Q4",
            Self::FullYear => "FY",
        }
    }
}

impl Display for FiscalPeriod {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FiscalPeriod {
    type Err = ValidationError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_uppercase().as_str() {
            "Q1" => Ok(Self::Q1),
            "Q2" => Ok(Self::Q2),
            "Q3" => Ok(Self::Q3),
            "Q4" => Ok(Self::Q4),
            "FY" => Ok(Self::FullYear),
            other => Err(ValidationError::InvalidFiscalPeriod {
                value: other.to_owned(),
            }),
        }
    }
}

/// Snapshot of current (or delayed) price data for one ticker.
///
/// `change` and `change_percent` are derived from `price` and
/// `previous_close` whenever the previous close is known; they are never
/// accepted from the wire directly.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Quote {
    pub ticker: Ticker,
    pub price: f64,
    pub timestamp: UtcDateTime,
    pub volume: Option<u64>,
    pub bid: Option<f64>,
    pub ask: Option<f64>,
    pub open: Option<f64>,
    pub high: Option<f64>,
    pub low: Option<f64>,
    pub previous_close: Option<f64>,
    pub change: Option<f64>,
    pub change_percent: Option<f64>,
    pub provider: ProviderId,
}

impl Quote {
    pub fn new(
        ticker: Ticker,
        price: f64,
        timestamp: UtcDateTime,
        provider: ProviderId,
    ) -> Result<Self, ValidationError> {
        validate_non_negative("price", price)?;

        Ok(Self {
            ticker,
            price,
            timestamp,
            volume: None,
            bid: None,
            ask: None,
            open: None,
            high: None,
            low: None,
            previous_close: None,
            change: None,
            change_percent: None,
            provider,
        })
    }

    pub fn with_volume(mut self, volume: Option<u64>) -> Self {
        self.volume = volume;
        self
    }

    pub fn with_spread(mut self, bid: Option<f64>, ask: Option<f64>) -> Self {
        self.bid = bid;
        self.ask = ask;
        self
    }

    pub fn with_session_range(
        mut self,
        open: Option<f64>,
        high: Option<f64>,
        low: Option<f64>,
    ) -> Self {
        self.open = open;
        self.high = high;
        self.low = low;
        self
    }

    /// Record the previous close and derive `change`/`change_percent`.
    pub fn with_previous_close(mut self, previous_close: Option<f64>) -> Self {
        self.previous_close = previous_close;
        if let Some(prev) = previous_close {
            let change = self.price - prev;
            self.change = Some(change);
            self.change_percent = (prev != 0.0).then(|| change / prev * 100.0);
        }
        self
    }
}

/// One news article surfaced to the caller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewsArticle {
    pub title: String,
    pub url: String,
    pub published_at: UtcDateTime,
    pub description: Option<String>,
    pub source: Option<String>,
    pub author: Option<String>,
    pub tickers: Vec<Ticker>,
    pub provider: ProviderId,
}

impl NewsArticle {
    pub fn new(
        title: impl Into<String>,
        url: impl Into<String>,
        published_at: UtcDateTime,
        provider: ProviderId,
    ) -> Result<Self, ValidationError> {
        let title = title.into();
        let url = url.into();
        if title.trim().is_empty() {
            return Err(ValidationError::EmptyArticleTitle);
        }
        if url.trim().is_empty() {
            return Err(ValidationError::EmptyArticleUrl);
        }

        Ok(Self {
            title,
            url,
            published_at,
            description: None,
            source: None,
            author: None,
            tickers: Vec::new(),
            provider,
        })
    }

    pub fn with_description(mut self, description: Option<String>) -> Self {
        self.description = description;
        self
    }

    pub fn with_source(mut self, source: Option<String>) -> Self {
        self.source = source;
        self
    }

    pub fn with_author(mut self, author: Option<String>) -> Self {
        self.author = author;
        self
    }

    pub fn with_tickers(mut self, tickers: Vec<Ticker>) -> Self {
        self.tickers = tickers;
        self
    }
}

/// One reporting period of financial statement data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FinancialData {
    pub ticker: Ticker,
    pub period_start: UtcDateTime,
    pub period_end: UtcDateTime,
    pub fiscal_year: i32,
    pub fiscal_period: FiscalPeriod,
    pub revenue: Option<f64>,
    pub net_income: Option<f64>,
    pub earnings_per_share: Option<f64>,
    pub total_assets: Option<f64>,
    pub total_liabilities: Option<f64>,
    pub stockholders_equity: Option<f64>,
    pub operating_cash_flow: Option<f64>,
    pub provider: ProviderId,
}

impl FinancialData {
    pub fn new(
        ticker: Ticker,
        period_start: UtcDateTime,
        period_end: UtcDateTime,
        fiscal_year: i32,
        fiscal_period: FiscalPeriod,
        provider: ProviderId,
    ) -> Result<Self, ValidationError> {
        if period_end <= period_start {
            return Err(ValidationError::InvalidReportingPeriod);
        }

        Ok(Self {
            ticker,
            period_start,
            period_end,
            fiscal_year,
            fiscal_period,
            revenue: None,
            net_income: None,
            earnings_per_share: None,
            total_assets: None,
            total_liabilities: None,
            stockholders_equity: None,
            operating_cash_flow: None,
            provider,
        })
    }

    pub fn with_income_statement(
        mut self,
        revenue: Option<f64>,
        net_income: Option<f64>,
        earnings_per_share: Option<f64>,
    ) -> Self {
        self.revenue = revenue;
        self.net_income = net_income;
        self.earnings_per_share = earnings_per_share;
        self
    }

    pub fn with_balance_sheet(
        mut self,
        total_assets: Option<f64>,
        total_liabilities: Option<f64>,
        stockholders_equity: Option<f64>,
    ) -> Self {
        self.total_assets = total_assets;
        self.total_liabilities = total_liabilities;
        self.stockholders_equity = stockholders_equity;
        self
    }

    pub fn with_cash_flow(mut self, operating_cash_flow: Option<f64>) -> Self {
        self.operating_cash_flow = operating_cash_flow;
        self
    }
}

/// OHLCV bar aggregated over one timeframe interval.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ohlcv {
    pub timestamp: UtcDateTime,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: u64,
    pub ticker: Ticker,
    pub provider: ProviderId,
}

impl Ohlcv {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        timestamp: UtcDateTime,
        open: f64,
        high: f64,
        low: f64,
        close: f64,
        volume: u64,
        ticker: Ticker,
        provider: ProviderId,
    ) -> Result<Self, ValidationError> {
        validate_non_negative("open", open)?;
        validate_non_negative("high", high)?;
        validate_non_negative("low", low)?;
        validate_non_negative("close", close)?;

        if high < open || high < close || high < low {
            return Err(ValidationError::InvalidBarHigh);
        }
        if low > open || low > close {
            return Err(ValidationError::InvalidBarLow);
        }

        Ok(Self {
            timestamp,
            open,
            high,
            low,
            close,
            volume,
            ticker,
            provider,
        })
    }
}

/// Whether the market is currently open, plus optional session times.
///
/// The free provider infers this from recent index trading activity rather
/// than an exchange calendar, so treat it as best-effort.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarketStatus {
    pub is_open: bool,
    pub next_open: Option<UtcDateTime>,
    pub next_close: Option<UtcDateTime>,
    pub server_time: Option<UtcDateTime>,
    pub provider: ProviderId,
}

impl MarketStatus {
    pub fn new(is_open: bool, provider: ProviderId) -> Self {
        Self {
            is_open,
            next_open: None,
            next_close: None,
            server_time: None,
            provider,
        }
    }

    pub fn with_server_time(mut self, server_time: Option<UtcDateTime>) -> Self {
        self.server_time = server_time;
        self
    }

    pub fn with_session_times(
        mut self,
        next_open: Option<UtcDateTime>,
        next_close: Option<UtcDateTime>,
    ) -> Self {
        self.next_open = next_open;
        self.next_close = next_close;
        self
    }
}

fn validate_non_negative(field: &'static str, value: f64) -> Result<(), ValidationError> {
    if !value.is_finite() {
        return Err(ValidationError::NonFiniteValue { field });
    }
    if value < 0.0 {
        return Err(ValidationError::NegativeValue { field });
    }
    Ok(())
}
