//! Strategy-keyed provider construction with instance caching.

use std::collections::HashMap;
use std::fmt::{Display, Formatter};
use std::str::FromStr;
use std::sync::{Arc, Mutex};

use serde::{Deserialize, Serialize};

use crate::providers::{HybridProvider, PolygonProvider, YahooProvider};
use crate::rate_limit::RateLimiter;
use crate::transport::HttpClient;
use crate::{ProviderError, StockDataProvider, ValidationError};

/// Provider selection policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProviderStrategy {
    /// Polygon exclusively; construction fails without a credential.
    PolygonOnly,
    /// Yahoo exclusively; never needs a credential.
    YahooOnly,
    /// Best available: hybrid with a credential, yahoo without.
    Auto,
    /// Hybrid explicitly; works with or without a credential.
    Hybrid,
}

impl ProviderStrategy {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::PolygonOnly => "polygon",
            Self::YahooOnly => "yfinance",
            Self::Auto => "auto",
            Self::Hybrid => "hybrid",
        }
    }
}

impl Display for ProviderStrategy {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProviderStrategy {
    type Err = ValidationError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "polygon" => Ok(Self::PolygonOnly),
            "yfinance" | "yahoo" => Ok(Self::YahooOnly),
            "auto" => Ok(Self::Auto),
            "hybrid" => Ok(Self::Hybrid),
            other => Err(ValidationError::InvalidStrategy {
                value: other.to_owned(),
            }),
        }
    }
}

/// Builds providers and caches one instance per (strategy, credential)
/// pair. Owned by the composition root; no global state.
pub struct ProviderFactory {
    http_client: Arc<dyn HttpClient>,
    rate_limiter: Arc<RateLimiter>,
    cache: Mutex<HashMap<(ProviderStrategy, Option<String>), Arc<dyn StockDataProvider>>>,
}

impl ProviderFactory {
    pub fn new(http_client: Arc<dyn HttpClient>, rate_limiter: Arc<RateLimiter>) -> Self {
        Self {
            http_client,
            rate_limiter,
            cache: Mutex::new(HashMap::new()),
        }
    }

    /// Return the cached instance for this (strategy, credential) pair,
    /// building it first if needed.
    pub fn get_provider(
        &self,
        strategy: ProviderStrategy,
        api_key: Option<&str>,
    ) -> Result<Arc<dyn StockDataProvider>, ProviderError> {
        let key = (strategy, api_key.map(str::to_owned));

        let mut cache = self.cache.lock().map_err(|_| {
            ProviderError::Configuration(String::from("provider cache lock is poisoned"))
        })?;
        if let Some(provider) = cache.get(&key) {
            return Ok(Arc::clone(provider));
        }

        let provider = self.build(strategy, api_key)?;
        cache.insert(key, Arc::clone(&provider));
        Ok(provider)
    }

    pub fn clear_cache(&self) {
        if let Ok(mut cache) = self.cache.lock() {
            cache.clear();
        }
    }

    fn build(
        &self,
        strategy: ProviderStrategy,
        api_key: Option<&str>,
    ) -> Result<Arc<dyn StockDataProvider>, ProviderError> {
        let resolved = match strategy {
            ProviderStrategy::Auto if api_key.is_some() => ProviderStrategy::Hybrid,
            ProviderStrategy::Auto => ProviderStrategy::YahooOnly,
            other => other,
        };
        tracing::debug!(strategy = %strategy, resolved = %resolved, "building provider");

        match resolved {
            ProviderStrategy::PolygonOnly => {
                let key = api_key.ok_or_else(|| {
                    ProviderError::Configuration(String::from(
                        "polygon strategy requires POLYGON_API_KEY",
                    ))
                })?;
                Ok(Arc::new(PolygonProvider::new(
                    key,
                    Arc::clone(&self.http_client),
                    Arc::clone(&self.rate_limiter),
                )?))
            }
            ProviderStrategy::YahooOnly => Ok(Arc::new(YahooProvider::new(
                Arc::clone(&self.http_client),
                Arc::clone(&self.rate_limiter),
            ))),
            ProviderStrategy::Hybrid => {
                let yahoo = YahooProvider::new(
                    Arc::clone(&self.http_client),
                    Arc::clone(&self.rate_limiter),
                );
                let polygon = api_key
                    .map(|key| {
                        PolygonProvider::new(
                            key,
                            Arc::clone(&self.http_client),
                            Arc::clone(&self.rate_limiter),
                        )
                    })
                    .transpose()?;
                Ok(Arc::new(HybridProvider::new(yahoo, polygon)))
            }
            ProviderStrategy::Auto => unreachable!("auto resolves above"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::NoopHttpClient;

    fn factory() -> ProviderFactory {
        ProviderFactory::new(Arc::new(NoopHttpClient), Arc::new(RateLimiter::new()))
    }

    #[test]
    fn strategy_parses_aliases() {
        assert_eq!(
            "yahoo".parse::<ProviderStrategy>(),
            Ok(ProviderStrategy::YahooOnly)
        );
        assert_eq!(
            "yfinance".parse::<ProviderStrategy>(),
            Ok(ProviderStrategy::YahooOnly)
        );
        assert_eq!(
            " AUTO ".parse::<ProviderStrategy>(),
            Ok(ProviderStrategy::Auto)
        );
        assert!("bloomberg".parse::<ProviderStrategy>().is_err());
    }

    #[test]
    fn auto_without_key_resolves_to_yahoo() {
        let provider = factory()
            .get_provider(ProviderStrategy::Auto, None)
            .expect("provider");
        assert_eq!(provider.name(), "yahoo");
    }

    #[test]
    fn auto_with_key_resolves_to_hybrid() {
        let provider = factory()
            .get_provider(ProviderStrategy::Auto, Some("demo-key-0123456789"))
            .expect("provider");
        assert_eq!(provider.name(), "hybrid");
    }

    #[test]
    fn polygon_without_key_is_a_configuration_error() {
        let err = factory()
            .get_provider(ProviderStrategy::PolygonOnly, None)
            .expect_err("must fail");
        assert!(matches!(err, ProviderError::Configuration(_)));
    }

    #[test]
    fn same_pair_returns_the_cached_instance() {
        let factory = factory();
        let first = factory
            .get_provider(ProviderStrategy::YahooOnly, None)
            .expect("provider");
        let second = factory
            .get_provider(ProviderStrategy::YahooOnly, None)
            .expect("provider");
        assert!(Arc::ptr_eq(&first, &second));
    }

    #[test]
    fn different_credentials_get_distinct_instances() {
        let factory = factory();
        let first = factory
            .get_provider(ProviderStrategy::Hybrid, Some("key-aaaaaaaaaa"))
            .expect("provider");
        let second = factory
            .get_provider(ProviderStrategy::Hybrid, Some("key-bbbbbbbbbb"))
            .expect("provider");
        assert!(!Arc::ptr_eq(&first, &second));
    }

    #[test]
    fn clear_cache_drops_instances() {
        let factory = factory();
        let first = factory
            .get_provider(ProviderStrategy::YahooOnly, None)
            .expect("provider");
        factory.clear_cache();
        let second = factory
            .get_provider(ProviderStrategy::YahooOnly, None)
            .expect("provider");
        assert!(!Arc::ptr_eq(&first, &second));
    }
}
