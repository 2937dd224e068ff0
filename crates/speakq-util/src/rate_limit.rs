//! Rate limiting utilities

use std::collections::HashMap;
use std::hash::Hash;
use std::time::Duration;

use crate::MonotonicInstant;

/// Simple token-bucket rate limiter keyed by `K`
#[derive(Debug)]
pub struct RateLimiter<K> {
    /// Maximum tokens (requests) per bucket
    max_tokens: u32,
    /// How often tokens are replenished
    refill_interval: Duration,
    /// Per-key state
    buckets: HashMap<K, Bucket>,
}

#[derive(Debug)]
struct Bucket {
    tokens: u32,
    last_refill: MonotonicInstant,
}

impl<K: Eq + Hash + Clone> RateLimiter<K> {
    /// Create a new rate limiter
    ///
    /// # Arguments
    /// * `max_requests` - Maximum requests allowed per interval
    /// * `interval` - Time interval for the limit
    pub fn new(max_requests: u32, interval: Duration) -> Self {
        Self {
            max_tokens: max_requests,
            refill_interval: interval,
            buckets: HashMap::new(),
        }
    }

    /// Check if a request should be allowed for the given key at `now`
    ///
    /// Returns `true` if allowed, `false` if rate limited
    pub fn check(&mut self, key: &K, now: MonotonicInstant) -> bool {
        let bucket = self.buckets.entry(key.clone()).or_insert(Bucket {
            tokens: self.max_tokens,
            last_refill: now,
        });

        // Refill tokens if interval has passed
        let elapsed = now.duration_since(bucket.last_refill);
        if !self.refill_interval.is_zero() && elapsed >= self.refill_interval {
            let intervals = (elapsed.as_millis() / self.refill_interval.as_millis().max(1)) as u32;
            bucket.tokens = bucket
                .tokens
                .saturating_add(intervals.saturating_mul(self.max_tokens))
                .min(self.max_tokens);
            bucket.last_refill = now;
        } else if self.refill_interval.is_zero() {
            bucket.tokens = self.max_tokens;
        }

        // Try to consume a token
        if bucket.tokens > 0 {
            bucket.tokens -= 1;
            true
        } else {
            false
        }
    }

    /// Remove a key's rate limit state
    pub fn remove(&mut self, key: &K) {
        self.buckets.remove(key);
    }

    /// Clean up stale entries
    pub fn cleanup(&mut self, stale_after: Duration, now: MonotonicInstant) {
        self.buckets
            .retain(|_, bucket| now.duration_since(bucket.last_refill) < stale_after);
    }
}
