use std::time::Duration;

use thiserror::Error;

use crate::provider::ProviderId;

/// Input validation failures.
///
/// These are raised before any network call or rate-limit consumption and
/// must never be retried with the same input.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ValidationError {
    #[error("invalid ticker '{value}': ticker must be 1-5 letters")]
    InvalidTicker { value: String },
    #[error("ticker list cannot be empty")]
    EmptyTickerBatch,
    #[error("ticker list length {len} exceeds max {max}")]
    TickerBatchTooLarge { len: usize, max: usize },

    #[error("invalid timeframe '{value}', expected one of 1m, 5m, 15m, 30m, 1h, 1d, 1wk, 1mo")]
    InvalidTimeframe { value: String },
    #[error("end date must be strictly after start date")]
    InvalidDateRange,
    #[error("limit {value} out of range [{min}, {max}]")]
    LimitOutOfRange { value: usize, min: usize, max: usize },

    #[error("timestamp must be RFC3339: '{value}'")]
    InvalidTimestamp { value: String },
    #[error("invalid fiscal period '{value}', expected Q1..Q4 or FY")]
    InvalidFiscalPeriod { value: String },
    #[error("financial period_end must be after period_start")]
    InvalidReportingPeriod,

    #[error("field '{field}' must be finite")]
    NonFiniteValue { field: &'static str },
    #[error("field '{field}' must be non-negative")]
    NegativeValue { field: &'static str },
    #[error("bar high must be >= open, close and low")]
    InvalidBarHigh,
    #[error("bar low must be <= open, close and high")]
    InvalidBarLow,
    #[error("news article title cannot be empty")]
    EmptyArticleTitle,
    #[error("news article url cannot be empty")]
    EmptyArticleUrl,

    #[error("invalid provider '{value}', expected one of polygon, yahoo")]
    InvalidProvider { value: String },
    #[error("invalid provider strategy '{value}', expected one of auto, polygon, yfinance, hybrid")]
    InvalidStrategy { value: String },
}

/// Error taxonomy shared by every provider operation.
///
/// Single-item operations propagate these; batch quote fetches swallow
/// per-ticker failures into logged omissions instead (partial-success
/// semantics).
#[derive(Debug, Error)]
pub enum ProviderError {
    /// Invalid or missing setup. Fatal to the construction attempt and
    /// never retried automatically.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// Connect-time failure: unreachable upstream, missing credential,
    /// transport timeout during the reachability probe.
    #[error("connection to {provider} failed: {reason}")]
    Connection { provider: ProviderId, reason: String },

    /// Credential rejected by the upstream.
    #[error("{provider} rejected the configured credential: {reason}")]
    Authentication { provider: ProviderId, reason: String },

    /// Upstream-reported quota exhaustion (as opposed to the local token
    /// bucket), with an optional retry-after hint.
    #[error("{provider} reported rate limit exhaustion")]
    UpstreamRateLimit {
        provider: ProviderId,
        retry_after: Option<Duration>,
    },

    /// Local token-bucket rejection. Carries the configured limit and
    /// window so callers can compute backoff without re-querying.
    #[error("rate limit exceeded: {limit} requests per {window_secs}s")]
    RateLimitExceeded { limit: u32, window_secs: f64 },

    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// Well-formed request, but the upstream has no record.
    #[error("no data found for {what}")]
    DataNotFound { what: String },

    /// Catch-all wrapping any other upstream failure; always carries the
    /// original message for diagnostics.
    #[error("{provider} upstream failure: {message}")]
    Upstream { provider: ProviderId, message: String },
}

impl ProviderError {
    pub fn not_found(what: impl Into<String>) -> Self {
        Self::DataNotFound { what: what.into() }
    }

    pub fn upstream(provider: ProviderId, message: impl Into<String>) -> Self {
        Self::Upstream {
            provider,
            message: message.into(),
        }
    }

    /// Whether a caller may reasonably retry the same request after backoff.
    pub const fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::Connection { .. }
                | Self::UpstreamRateLimit { .. }
                | Self::RateLimitExceeded { .. }
                | Self::Upstream { .. }
        )
    }
}
