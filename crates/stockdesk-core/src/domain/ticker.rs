use std::fmt::{Display, Formatter};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::ValidationError;

const MAX_TICKER_LEN: usize = 5;

/// Normalized stock ticker: 1-5 ASCII letters, always uppercase.
///
/// Parsing an already-normalized ticker returns it unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Ticker(String);

impl Ticker {
    /// Parse and normalize a ticker symbol to uppercase.
    pub fn parse(input: &str) -> Result<Self, ValidationError> {
        let normalized = input.trim().to_ascii_uppercase();

        let valid = !normalized.is_empty()
            && normalized.len() <= MAX_TICKER_LEN
            && normalized.bytes().all(|byte| byte.is_ascii_uppercase());

        if !valid {
            return Err(ValidationError::InvalidTicker {
                value: input.to_owned(),
            });
        }

        Ok(Self(normalized))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for Ticker {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Ticker {
    type Err = ValidationError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Self::parse(value)
    }
}

impl TryFrom<String> for Ticker {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl TryFrom<&str> for Ticker {
    type Error = ValidationError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        Self::parse(value)
    }
}

impl From<Ticker> for String {
    fn from(value: Ticker) -> Self {
        value.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_and_uppercases() {
        let parsed = Ticker::parse(" nvda ").expect("ticker should parse");
        assert_eq!(parsed.as_str(), "NVDA");
    }

    #[test]
    fn parse_is_idempotent() {
        let once = Ticker::parse("aapl").expect("ticker should parse");
        let twice = Ticker::parse(once.as_str()).expect("normalized ticker should re-parse");
        assert_eq!(once, twice);
    }

    #[test]
    fn rejects_empty() {
        let err = Ticker::parse("").expect_err("must fail");
        assert!(matches!(err, ValidationError::InvalidTicker { .. }));
    }

    #[test]
    fn rejects_too_long() {
        let err = Ticker::parse("TOOLONG").expect_err("must fail");
        assert!(matches!(err, ValidationError::InvalidTicker { .. }));
    }

    #[test]
    fn rejects_digits_and_punctuation() {
        for input in ["BRK.B", "A1", "AA PL", "$SPY", "invalid123"] {
            assert!(
                Ticker::parse(input).is_err(),
                "'{input}' should be rejected"
            );
        }
    }
}
