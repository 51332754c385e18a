//! Provider health probing for the `health` command.

use std::time::Instant;

use serde::{Deserialize, Serialize};

use crate::StockDataProvider;

/// Probe ticker: liquid enough that "no data" means the provider is
/// broken, not the symbol.
const PROBE_TICKER: &str = "AAPL";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HealthState {
    Healthy,
    Degraded,
    Unhealthy,
}

/// Outcome of one probe call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckOutcome {
    pub ok: bool,
    pub latency_ms: u64,
    pub error: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthReport {
    pub provider: String,
    pub state: HealthState,
    pub quote_check: CheckOutcome,
    pub market_status_check: CheckOutcome,
}

/// Probe a provider with a quote fetch and a market-status fetch.
///
/// Quote failure is decisive (Unhealthy); market-status failure on its
/// own only degrades.
pub async fn check_provider(provider: &dyn StockDataProvider) -> HealthReport {
    let quote_check = timed(provider.get_quote(PROBE_TICKER)).await;
    let market_status_check = timed(provider.get_market_status()).await;

    let state = match (quote_check.ok, market_status_check.ok) {
        (true, true) => HealthState::Healthy,
        (true, false) => HealthState::Degraded,
        (false, _) => HealthState::Unhealthy,
    };

    HealthReport {
        provider: provider.name().to_owned(),
        state,
        quote_check,
        market_status_check,
    }
}

async fn timed<T, E: std::fmt::Display>(
    future: impl std::future::Future<Output = Result<T, E>>,
) -> CheckOutcome {
    let started = Instant::now();
    let result = future.await;
    let latency_ms = started.elapsed().as_millis() as u64;

    match result {
        Ok(_) => CheckOutcome {
            ok: true,
            latency_ms,
            error: None,
        },
        Err(error) => CheckOutcome {
            ok: false,
            latency_ms,
            error: Some(error.to_string()),
        },
    }
}
