//! Request validation applied before any network call.
//!
//! Every request constructor here is all-or-nothing: a single bad field
//! rejects the whole request without consuming rate-limit tokens.

use crate::{Ticker, Timeframe, UtcDateTime, ValidationError};

/// Upper bound on a batch quote request.
pub const MAX_BATCH_TICKERS: usize = 50;

const NEWS_LIMIT_MIN: usize = 1;
const NEWS_LIMIT_MAX: usize = 100;
const NEWS_LIMIT_DEFAULT: usize = 10;

const FINANCIALS_LIMIT_MIN: usize = 1;
const FINANCIALS_LIMIT_MAX: usize = 20;
const FINANCIALS_LIMIT_DEFAULT: usize = 4;

/// Normalize a single raw ticker string.
pub fn validate_ticker(input: &str) -> Result<Ticker, ValidationError> {
    Ticker::parse(input)
}

/// Normalize a batch of raw ticker strings.
///
/// All-or-nothing: one invalid entry fails the whole batch, and batches
/// larger than [`MAX_BATCH_TICKERS`] are rejected up front.
pub fn validate_tickers(inputs: &[String]) -> Result<Vec<Ticker>, ValidationError> {
    if inputs.is_empty() {
        return Err(ValidationError::EmptyTickerBatch);
    }
    if inputs.len() > MAX_BATCH_TICKERS {
        return Err(ValidationError::TickerBatchTooLarge {
            len: inputs.len(),
            max: MAX_BATCH_TICKERS,
        });
    }
    inputs.iter().map(|input| Ticker::parse(input)).collect()
}

/// Validated historical bars request.
#[derive(Debug, Clone, PartialEq)]
pub struct HistoricalDataRequest {
    pub ticker: Ticker,
    pub start: UtcDateTime,
    pub end: UtcDateTime,
    pub timeframe: Timeframe,
}

impl HistoricalDataRequest {
    pub fn new(
        ticker: Ticker,
        start: UtcDateTime,
        end: UtcDateTime,
        timeframe: Timeframe,
    ) -> Result<Self, ValidationError> {
        if end <= start {
            return Err(ValidationError::InvalidDateRange);
        }
        Ok(Self {
            ticker,
            start,
            end,
            timeframe,
        })
    }
}

/// Validated news request. Without a ticker the request asks for
/// market-wide headlines.
#[derive(Debug, Clone, PartialEq)]
pub struct NewsRequest {
    pub ticker: Option<Ticker>,
    pub limit: usize,
}

impl NewsRequest {
    pub fn new(ticker: Option<Ticker>, limit: usize) -> Result<Self, ValidationError> {
        if !(NEWS_LIMIT_MIN..=NEWS_LIMIT_MAX).contains(&limit) {
            return Err(ValidationError::LimitOutOfRange {
                value: limit,
                min: NEWS_LIMIT_MIN,
                max: NEWS_LIMIT_MAX,
            });
        }
        Ok(Self { ticker, limit })
    }

    pub fn market_wide() -> Self {
        Self {
            ticker: None,
            limit: NEWS_LIMIT_DEFAULT,
        }
    }

    pub fn for_ticker(ticker: Ticker) -> Self {
        Self {
            ticker: Some(ticker),
            limit: NEWS_LIMIT_DEFAULT,
        }
    }
}

/// Validated financial statements request.
#[derive(Debug, Clone, PartialEq)]
pub struct FinancialsRequest {
    pub ticker: Ticker,
    pub limit: usize,
}

impl FinancialsRequest {
    pub fn new(ticker: Ticker, limit: usize) -> Result<Self, ValidationError> {
        if !(FINANCIALS_LIMIT_MIN..=FINANCIALS_LIMIT_MAX).contains(&limit) {
            return Err(ValidationError::LimitOutOfRange {
                value: limit,
                min: FINANCIALS_LIMIT_MIN,
                max: FINANCIALS_LIMIT_MAX,
            });
        }
        Ok(Self { ticker, limit })
    }

    pub fn latest(ticker: Ticker) -> Self {
        Self {
            ticker,
            limit: FINANCIALS_LIMIT_DEFAULT,
        }
    }
}
