use std::fmt::{Display, Formatter};

use serde::de::Error as DeError;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use time::format_description::well_known::Rfc3339;
use time::{Duration, OffsetDateTime, UtcOffset};

use crate::ValidationError;

/// RFC3339 timestamp normalized to UTC.
///
/// Upstream payloads carry timestamps in several encodings (RFC3339 with
/// arbitrary offsets, unix seconds, milliseconds, nanoseconds); every
/// constructor converts to UTC so comparisons and ordering are offset-free.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct UtcDateTime(OffsetDateTime);

impl UtcDateTime {
    pub fn now() -> Self {
        Self(OffsetDateTime::now_utc())
    }

    pub fn parse(input: &str) -> Result<Self, ValidationError> {
        let parsed =
            OffsetDateTime::parse(input, &Rfc3339).map_err(|_| ValidationError::InvalidTimestamp {
                value: input.to_owned(),
            })?;
        Ok(Self::from_offset(parsed))
    }

    /// Convert any offset datetime to UTC.
    pub fn from_offset(value: OffsetDateTime) -> Self {
        Self(value.to_offset(UtcOffset::UTC))
    }

    pub fn from_unix_seconds(seconds: i64) -> Result<Self, ValidationError> {
        OffsetDateTime::from_unix_timestamp(seconds)
            .map(Self)
            .map_err(|_| ValidationError::InvalidTimestamp {
                value: seconds.to_string(),
            })
    }

    pub fn from_unix_millis(millis: i64) -> Result<Self, ValidationError> {
        Self::from_unix_seconds(millis.div_euclid(1_000))
    }

    pub fn from_unix_nanos(nanos: i64) -> Result<Self, ValidationError> {
        Self::from_unix_seconds(nanos.div_euclid(1_000_000_000))
    }

    pub fn into_inner(self) -> OffsetDateTime {
        self.0
    }

    pub fn unix_seconds(self) -> i64 {
        self.0.unix_timestamp()
    }

    /// Seconds elapsed between `earlier` and `self` (negative if `self` is
    /// the earlier of the two).
    pub fn seconds_since(self, earlier: Self) -> i64 {
        (self.0 - earlier.0).whole_seconds()
    }

    pub fn saturating_sub(self, duration: Duration) -> Self {
        Self(self.0.saturating_sub(duration))
    }

    pub fn format_rfc3339(self) -> String {
        self.0
            .format(&Rfc3339)
            .expect("UtcDateTime must be RFC3339 formattable")
    }
}

impl Display for UtcDateTime {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.format_rfc3339())
    }
}

impl Serialize for UtcDateTime {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.format_rfc3339())
    }
}

impl<'de> Deserialize<'de> for UtcDateTime {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = String::deserialize(deserializer)?;
        Self::parse(&value).map_err(D::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_and_formats_utc() {
        let parsed = UtcDateTime::parse("2024-01-01T00:00:00Z").expect("must parse");
        assert_eq!(parsed.format_rfc3339(), "2024-01-01T00:00:00Z");
    }

    #[test]
    fn converts_offset_to_utc() {
        let parsed = UtcDateTime::parse("2024-06-03T12:00:00-04:00").expect("must parse");
        assert_eq!(parsed.format_rfc3339(), "2024-06-03T16:00:00Z");
    }

    #[test]
    fn converts_epoch_encodings() {
        let from_seconds = UtcDateTime::from_unix_seconds(1_700_000_000).expect("must convert");
        let from_millis = UtcDateTime::from_unix_millis(1_700_000_000_123).expect("must convert");
        let from_nanos =
            UtcDateTime::from_unix_nanos(1_700_000_000_123_456_789).expect("must convert");

        assert_eq!(from_seconds, from_millis);
        assert_eq!(from_seconds, from_nanos);
    }

    #[test]
    fn rejects_garbage() {
        let err = UtcDateTime::parse("yesterday").expect_err("must fail");
        assert!(matches!(err, ValidationError::InvalidTimestamp { .. }));
    }
}
