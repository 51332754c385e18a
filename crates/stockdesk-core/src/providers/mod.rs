//! Concrete and composite provider implementations.

mod hybrid;
mod polygon;
mod yahoo;

pub use hybrid::HybridProvider;
pub use polygon::PolygonProvider;
pub use yahoo::YahooProvider;

use std::time::Duration;

use crate::transport::{HttpError, HttpResponse};
use crate::{ProviderError, ProviderId};

/// Map a transport failure to the provider error taxonomy.
fn transport_error(provider: ProviderId, error: &HttpError) -> ProviderError {
    ProviderError::Connection {
        provider,
        reason: error.message().to_owned(),
    }
}

/// Map a non-2xx upstream response to the provider error taxonomy.
fn status_error(provider: ProviderId, response: &HttpResponse) -> ProviderError {
    match response.status {
        401 | 403 => ProviderError::Authentication {
            provider,
            reason: format!("upstream returned status {}", response.status),
        },
        404 => ProviderError::not_found("requested resource"),
        429 => ProviderError::UpstreamRateLimit {
            provider,
            retry_after: retry_after_hint(&response.body),
        },
        status => ProviderError::upstream(provider, format!("upstream returned status {status}")),
    }
}

/// Best-effort `retry_after` extraction from a 429 body.
fn retry_after_hint(body: &str) -> Option<Duration> {
    let value: serde_json::Value = serde_json::from_str(body).ok()?;
    let seconds = value.get("retry_after")?.as_u64()?;
    Some(Duration::from_secs(seconds))
}
