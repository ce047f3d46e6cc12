//! HTTP client module
//!
//! The transport used by the inventory client.
//!
//! # Features
//!
//! - **Retries**: 5xx, 429, timeouts and connect errors are retried with
//!   constant, linear or exponential backoff
//! - **Rate Limiting**: Token bucket rate limiter using governor
//! - **Bounded waits**: Server-requested pauses never exceed the policy maximum

mod client;
mod rate_limit;

pub use client::{ApiRequest, HttpClient, HttpClientConfig, RetryPolicy, USER_AGENT};
pub use rate_limit::{RateLimiter, RateLimiterConfig};
