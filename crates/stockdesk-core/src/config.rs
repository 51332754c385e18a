//! Environment-driven configuration, read once by the composition root.

use crate::{ProviderError, ProviderStrategy};

const API_KEY_VAR: &str = "POLYGON_API_KEY";
const STRATEGY_VAR: &str = "STOCKDESK_PROVIDER";
const LOG_VAR: &str = "STOCKDESK_LOG";

/// Real keys are long; anything shorter is a paste error, not a key.
const MIN_API_KEY_LEN: usize = 10;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub polygon_api_key: Option<String>,
    pub strategy: ProviderStrategy,
    pub log_filter: String,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ProviderError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ProviderError> {
        let polygon_api_key = match lookup(API_KEY_VAR) {
            Some(raw) => {
                let trimmed = raw.trim().to_owned();
                if trimmed.is_empty() {
                    None
                } else if trimmed.len() < MIN_API_KEY_LEN {
                    return Err(ProviderError::Configuration(format!(
                        "{API_KEY_VAR} looks truncated ({} chars, expected at least {MIN_API_KEY_LEN})",
                        trimmed.len()
                    )));
                } else {
                    Some(trimmed)
                }
            }
            None => None,
        };

        let strategy = match lookup(STRATEGY_VAR) {
            Some(raw) => raw.parse::<ProviderStrategy>()?,
            None => ProviderStrategy::Auto,
        };

        let log_filter = lookup(LOG_VAR).unwrap_or_else(|| String::from("info"));

        Ok(Self {
            polygon_api_key,
            strategy,
            log_filter,
        })
    }
}
