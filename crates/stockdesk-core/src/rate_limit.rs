//! Local token-bucket rate limiting, keyed by provider name.
//!
//! Buckets are checked before every outbound call. A rejection here is a
//! [`ProviderError::RateLimitExceeded`] and never reaches the upstream, as
//! opposed to [`ProviderError::UpstreamRateLimit`] which the upstream
//! reported itself.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Instant;

use crate::ProviderError;

/// Continuous-refill token bucket.
///
/// `allowance` refills at `rate / per_secs` tokens per second and is
/// clamped to `rate`, so an idle bucket never accumulates more than one
/// window's worth of requests.
#[derive(Debug)]
pub struct TokenBucket {
    rate: u32,
    per_secs: f64,
    allowance: f64,
    last_check: Instant,
}

impl TokenBucket {
    pub fn new(rate: u32, per_secs: f64) -> Self {
        Self {
            rate,
            per_secs,
            allowance: rate as f64,
            last_check: Instant::now(),
        }
    }

    pub const fn rate(&self) -> u32 {
        self.rate
    }

    pub const fn per_secs(&self) -> f64 {
        self.per_secs
    }

    /// Refill based on elapsed time, then consume `tokens` if the whole
    /// batch fits. All or nothing; a rejected batch leaves the allowance
    /// untouched.
    pub fn try_consume(&mut self, tokens: u32) -> Result<(), ProviderError> {
        self.refill();

        if self.allowance < tokens as f64 {
            return Err(ProviderError::RateLimitExceeded {
                limit: self.rate,
                window_secs: self.per_secs,
            });
        }

        self.allowance -= tokens as f64;
        Ok(())
    }

    /// Seconds until one full token is available. Zero when a request
    /// would be admitted right now.
    pub fn wait_time_secs(&mut self) -> f64 {
        self.refill();

        if self.allowance >= 1.0 {
            return 0.0;
        }
        (1.0 - self.allowance) * self.per_secs / self.rate as f64
    }

    fn refill(&mut self) {
        let now = Instant::now();
        let elapsed = now.duration_since(self.last_check).as_secs_f64();
        self.last_check = now;

        self.allowance += elapsed * self.rate as f64 / self.per_secs;
        if self.allowance > self.rate as f64 {
            self.allowance = self.rate as f64;
        }
    }

    /// Drain the bucket as if `n` requests had just been admitted.
    #[cfg(test)]
    pub fn drain(&mut self, n: u32) {
        self.refill();
        self.allowance = (self.allowance - n as f64).max(0.0);
    }

    /// Rewind the refill clock, as if `secs` of wall time had passed.
    #[cfg(test)]
    pub fn backdate(&mut self, secs: f64) {
        self.last_check -= std::time::Duration::from_secs_f64(secs);
    }
}

/// Registry of named token buckets.
///
/// Unknown names pass: a provider that never registered a budget is
/// assumed unthrottled, with a warning so the omission is visible.
#[derive(Debug, Default)]
pub struct RateLimiter {
    buckets: HashMap<String, Mutex<TokenBucket>>,
}

impl RateLimiter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry preloaded with the free-tier budgets of the built-in
    /// providers: polygon 5 requests/minute, yahoo 2000 requests/hour.
    pub fn with_default_providers() -> Self {
        let mut limiter = Self::new();
        limiter.register("polygon", TokenBucket::new(5, 60.0));
        limiter.register("yahoo", TokenBucket::new(2_000, 3_600.0));
        limiter
    }

    pub fn register(&mut self, name: impl Into<String>, bucket: TokenBucket) {
        self.buckets.insert(name.into(), Mutex::new(bucket));
    }

    /// Consume one token from the named bucket, or pass with a warning
    /// when no bucket is registered under that name.
    pub fn check_limit(&self, name: &str) -> Result<(), ProviderError> {
        self.check_limit_tokens(name, 1)
    }

    /// Consume `tokens` from the named bucket, all or nothing.
    pub fn check_limit_tokens(&self, name: &str, tokens: u32) -> Result<(), ProviderError> {
        match self.buckets.get(name) {
            Some(bucket) => bucket
                .lock()
                .map_err(|_| {
                    ProviderError::Configuration(format!("rate limit bucket '{name}' is poisoned"))
                })?
                .try_consume(tokens),
            None => {
                tracing::warn!(provider = name, "no rate limit registered; passing through");
                Ok(())
            }
        }
    }

    /// Seconds until the named bucket would admit a request. `None` when
    /// no bucket is registered under that name.
    pub fn wait_time_secs(&self, name: &str) -> Option<f64> {
        let bucket = self.buckets.get(name)?;
        let mut guard = bucket.lock().ok()?;
        Some(guard.wait_time_secs())
    }

    #[cfg(test)]
    pub fn drain(&self, name: &str, n: u32) {
        if let Some(bucket) = self.buckets.get(name) {
            bucket.lock().expect("bucket lock").drain(n);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fresh_bucket_admits_exactly_rate_requests() {
        let mut bucket = TokenBucket::new(3, 60.0);
        for _ in 0..3 {
            bucket.try_consume(1).expect("within budget");
        }
        let err = bucket.try_consume(1).expect_err("over budget");
        assert!(matches!(
            err,
            ProviderError::RateLimitExceeded {
                limit: 3,
                window_secs,
            } if window_secs == 60.0
        ));
    }

    #[test]
    fn drained_bucket_refills_in_proportion_to_elapsed_time() {
        let mut bucket = TokenBucket::new(10, 60.0);
        bucket.drain(10);
        assert!(bucket.try_consume(1).is_err());

        // 12 of 60 seconds elapsed: 10 * 12/60 = 2 tokens back.
        bucket.backdate(12.0);
        bucket.try_consume(1).expect("first refilled token");
        bucket.try_consume(1).expect("second refilled token");
        assert!(bucket.try_consume(1).is_err());
    }

    #[test]
    fn idle_bucket_never_refills_past_its_rate() {
        let mut bucket = TokenBucket::new(3, 60.0);
        bucket.drain(3);

        // Ten windows of idle time still caps the allowance at rate.
        bucket.backdate(600.0);
        for _ in 0..3 {
            bucket.try_consume(1).expect("within budget");
        }
        assert!(bucket.try_consume(1).is_err());
    }

    #[test]
    fn batch_consume_takes_all_tokens_or_none() {
        let mut bucket = TokenBucket::new(5, 60.0);
        bucket.try_consume(3).expect("within budget");

        // The rejected batch leaves the two remaining tokens intact.
        assert!(bucket.try_consume(3).is_err());
        bucket.try_consume(2).expect("remaining budget");
    }

    #[test]
    fn exhausted_bucket_reports_positive_wait() {
        let mut bucket = TokenBucket::new(2, 10.0);
        bucket.drain(2);

        let wait = bucket.wait_time_secs();
        assert!(wait > 0.0, "expected positive wait, got {wait}");
        assert!(wait <= 5.0, "one token refills within per/rate seconds");
    }

    #[test]
    fn available_bucket_reports_zero_wait() {
        let mut bucket = TokenBucket::new(5, 60.0);
        assert_eq!(bucket.wait_time_secs(), 0.0);
    }

    #[test]
    fn registry_batch_consume_respects_the_budget() {
        let mut limiter = RateLimiter::new();
        limiter.register("polygon", TokenBucket::new(5, 60.0));

        limiter
            .check_limit_tokens("polygon", 4)
            .expect("within budget");
        assert!(limiter.check_limit_tokens("polygon", 2).is_err());
        limiter.check_limit("polygon").expect("single token still fits");
    }

    #[test]
    fn unregistered_name_passes() {
        let limiter = RateLimiter::new();
        limiter
            .check_limit("unknown-provider")
            .expect("unregistered names are unthrottled");
    }

    #[test]
    fn default_registry_throttles_polygon() {
        let limiter = RateLimiter::with_default_providers();
        limiter.drain("polygon", 5);

        let err = limiter.check_limit("polygon").expect_err("bucket drained");
        assert!(matches!(
            err,
            ProviderError::RateLimitExceeded { limit: 5, .. }
        ));
        assert!(limiter.wait_time_secs("polygon").expect("registered") > 0.0);
    }
}
