//! Request budget for upstream API calls
//!
//! Token bucket from the governor crate, shared by every request a client
//! makes.

use governor::{DefaultDirectRateLimiter, Quota, RateLimiter as Governor};
use std::num::NonZeroU32;
use std::sync::Arc;

/// Requests allowed per second, with a burst allowance
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimiterConfig {
    /// Sustained requests per second
    pub requests_per_second: u32,
    /// Requests that may go out back to back
    pub burst_size: u32,
}

impl RateLimiterConfig {
    /// `n` requests per second, bursting up to `n`
    pub fn per_second(n: u32) -> Self {
        Self {
            requests_per_second: n,
            burst_size: n,
        }
    }
}

impl Default for RateLimiterConfig {
    fn default() -> Self {
        Self::per_second(5)
    }
}

/// Shared token bucket
#[derive(Clone)]
pub struct RateLimiter {
    bucket: Arc<DefaultDirectRateLimiter>,
}

impl RateLimiter {
    /// Zero rates are raised to one
    pub fn new(config: RateLimiterConfig) -> Self {
        let rate = NonZeroU32::new(config.requests_per_second).unwrap_or(NonZeroU32::MIN);
        let burst = NonZeroU32::new(config.burst_size).unwrap_or(NonZeroU32::MIN);

        Self {
            bucket: Arc::new(Governor::direct(
                Quota::per_second(rate).allow_burst(burst),
            )),
        }
    }

    /// Wait for the next free slot
    pub async fn wait(&self) {
        self.bucket.until_ready().await;
    }
}

impl std::fmt::Debug for RateLimiter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RateLimiter").finish_non_exhaustive()
    }
}
