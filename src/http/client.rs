//! Upstream API client with retries and a request budget

use super::rate_limit::{RateLimiter, RateLimiterConfig};
use crate::error::{Error, Result};
use crate::types::BackoffType;
use reqwest::{Client, Method, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, warn};

/// Sent as `User-Agent` on every request
pub const USER_AGENT: &str = concat!("vm-inventory-report/", env!("CARGO_PKG_VERSION"));

/// How failed attempts are retried
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Retries after the first attempt
    pub max_retries: u32,
    /// Growth of the pause between attempts
    pub backoff: BackoffType,
    /// Pause before the first retry
    pub initial_delay: Duration,
    /// Upper bound for any pause, including server-requested ones
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            backoff: BackoffType::Exponential,
            initial_delay: Duration::from_millis(500),
            max_delay: Duration::from_secs(30),
        }
    }
}

impl RetryPolicy {
    /// Single attempt, no retries
    pub fn none() -> Self {
        Self {
            max_retries: 0,
            ..Self::default()
        }
    }

    /// Pause before retry number `attempt` (zero-based)
    pub fn delay(&self, attempt: u32) -> Duration {
        let delay = match self.backoff {
            BackoffType::Constant => self.initial_delay,
            BackoffType::Linear => self.initial_delay.saturating_mul(attempt.saturating_add(1)),
            BackoffType::Exponential => self
                .initial_delay
                .saturating_mul(2u32.saturating_pow(attempt)),
        };
        delay.min(self.max_delay)
    }
}

/// Connection settings for one upstream API
#[derive(Debug, Clone)]
pub struct HttpClientConfig {
    /// Base URL every request path is joined onto
    pub base_url: String,
    /// Per-attempt timeout
    pub timeout: Duration,
    /// Retry behaviour
    pub retry: RetryPolicy,
    /// Request budget, `None` for unlimited
    pub rate_limit: Option<RateLimiterConfig>,
}

impl HttpClientConfig {
    /// Defaults for `base_url`: 30s timeout, default retries, 5 req/s
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            timeout: Duration::from_secs(30),
            retry: RetryPolicy::default(),
            rate_limit: Some(RateLimiterConfig::default()),
        }
    }

    /// Set the per-attempt timeout
    #[must_use]
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set the retry policy
    #[must_use]
    pub fn retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Set or disable the request budget
    #[must_use]
    pub fn rate_limit(mut self, rate_limit: Option<RateLimiterConfig>) -> Self {
        self.rate_limit = rate_limit;
        self
    }
}

/// One API call
#[derive(Debug, Clone)]
pub struct ApiRequest {
    method: Method,
    path: String,
    bearer: Option<String>,
    body: Option<Value>,
}

impl ApiRequest {
    /// `GET path`
    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::GET, path)
    }

    /// `POST path`
    pub fn post(path: impl Into<String>) -> Self {
        Self::new(Method::POST, path)
    }

    fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            bearer: None,
            body: None,
        }
    }

    /// Authenticate with a bearer token
    #[must_use]
    pub fn bearer(mut self, token: impl Into<String>) -> Self {
        self.bearer = Some(token.into());
        self
    }

    /// Send `body` as JSON
    #[must_use]
    pub fn json(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }
}

/// What to do after one attempt
enum Outcome {
    Done(Response),
    Retry { delay: Duration, error: Error },
    Fail(Error),
}

/// HTTP client with retry and rate limiting
pub struct HttpClient {
    client: Client,
    config: HttpClientConfig,
    limiter: Option<RateLimiter>,
}

impl HttpClient {
    /// Build a client for `config`
    pub fn new(config: HttpClientConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.timeout)
            .user_agent(USER_AGENT)
            .build()?;
        let limiter = config.rate_limit.map(RateLimiter::new);

        Ok(Self {
            client,
            config,
            limiter,
        })
    }

    /// Send `request` and decode the JSON response body
    pub async fn send_json<T: DeserializeOwned>(&self, request: &ApiRequest) -> Result<T> {
        let response = self.send(request).await?;
        let body = response.text().await?;
        serde_json::from_str(&body)
            .map_err(|e| Error::decode(format!("Invalid JSON from {}: {e}", request.path)))
    }

    /// Send `request`, retrying throttled, failing and timed-out attempts
    pub async fn send(&self, request: &ApiRequest) -> Result<Response> {
        let url = self.url(&request.path);
        let max_retries = self.config.retry.max_retries;
        let mut attempt = 0;

        loop {
            if let Some(limiter) = &self.limiter {
                limiter.wait().await;
            }

            let result = self.build(request, &url).send().await;
            match self.classify(result, attempt).await {
                Outcome::Done(response) => {
                    debug!("{} {} succeeded", request.method, url);
                    return Ok(response);
                }
                Outcome::Retry { delay, error } if attempt < max_retries => {
                    warn!(
                        "{} {} failed ({}), attempt {}/{}, retrying in {:?}",
                        request.method,
                        url,
                        error,
                        attempt + 1,
                        max_retries + 1,
                        delay
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Outcome::Retry { error, .. } | Outcome::Fail(error) => return Err(error),
            }
        }
    }

    fn url(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.config.base_url.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }

    fn build(&self, request: &ApiRequest, url: &str) -> RequestBuilder {
        let mut builder = self.client.request(request.method.clone(), url);
        if let Some(token) = &request.bearer {
            builder = builder.bearer_auth(token);
        }
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }
        builder
    }

    async fn classify(&self, result: reqwest::Result<Response>, attempt: u32) -> Outcome {
        let policy = &self.config.retry;
        let response = match result {
            Ok(response) => response,
            Err(e) if e.is_timeout() => {
                return Outcome::Retry {
                    delay: policy.delay(attempt),
                    error: Error::Timeout {
                        timeout_ms: self.config.timeout.as_millis() as u64,
                    },
                };
            }
            Err(e) if e.is_connect() => {
                return Outcome::Retry {
                    delay: policy.delay(attempt),
                    error: Error::Http(e),
                };
            }
            Err(e) => return Outcome::Fail(Error::Http(e)),
        };

        let status = response.status();
        if status.is_success() {
            return Outcome::Done(response);
        }

        if status == StatusCode::TOO_MANY_REQUESTS {
            let delay = retry_after(&response)
                .unwrap_or_else(|| policy.delay(attempt))
                .min(policy.max_delay);
            return Outcome::Retry {
                delay,
                error: Error::RateLimited {
                    retry_after_seconds: delay.as_secs(),
                },
            };
        }

        let body = response.text().await.unwrap_or_default();
        let error = Error::http_status(status.as_u16(), body);
        if error.is_retryable() {
            Outcome::Retry {
                delay: policy.delay(attempt),
                error,
            }
        } else {
            Outcome::Fail(error)
        }
    }
}

impl std::fmt::Debug for HttpClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpClient")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

/// `Retry-After` in seconds, when present and numeric
fn retry_after(response: &Response) -> Option<Duration> {
    response
        .headers()
        .get(reqwest::header::RETRY_AFTER)
        .and_then(|v| v.to_str().ok())
        .and_then(|s| s.trim().parse().ok())
        .map(Duration::from_secs)
}
