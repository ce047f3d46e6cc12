//! Runtime configuration
//!
//! Directories, upstream API settings and the tenant credentials a report
//! run iterates over. Credentials come either from the `CREDENTIALS`
//! environment variable or from a YAML file.

use crate::error::{Error, Result, ResultExt};
use crate::http::{HttpClientConfig, RateLimiterConfig, RetryPolicy};
use crate::types::{BackoffType, FailurePolicy};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::warn;

/// Environment variable holding `project:clientId:clientSecret` triples
pub const CREDENTIALS_ENV: &str = "CREDENTIALS";

/// Default upstream API base URL
pub const DEFAULT_API_URL: &str = "https://api.emma.ms/external";

// ============================================================================
// Tenant Credentials
// ============================================================================

/// Client credentials for one tenant
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TenantCredential {
    /// Human label written into the report's `projectName` column
    pub project_name: String,
    /// API client id
    pub client_id: String,
    /// API client secret
    pub client_secret: String,
}

impl TenantCredential {
    /// Create a credential
    pub fn new(
        project_name: impl Into<String>,
        client_id: impl Into<String>,
        client_secret: impl Into<String>,
    ) -> Self {
        Self {
            project_name: project_name.into(),
            client_id: client_id.into(),
            client_secret: client_secret.into(),
        }
    }
}

impl std::fmt::Debug for TenantCredential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TenantCredential")
            .field("project_name", &self.project_name)
            .field("client_id", &self.client_id)
            .field("client_secret", &"***")
            .finish()
    }
}

/// Parse `project:clientId:clientSecret` entries separated by commas.
///
/// The secret keeps any further `:`. Entries without all three parts are
/// skipped with a warning.
pub fn parse_credentials(raw: &str) -> Vec<TenantCredential> {
    let mut credentials = Vec::new();
    for pair in raw.split(',') {
        let pair = pair.trim();
        if pair.is_empty() {
            continue;
        }
        let mut parts = pair.splitn(3, ':');
        match (parts.next(), parts.next(), parts.next()) {
            (Some(project), Some(id), Some(secret)) => {
                credentials.push(TenantCredential::new(project, id, secret));
            }
            _ => {
                let label = pair.split(':').next().unwrap_or_default();
                warn!("Ignoring malformed credential entry for '{}'", label);
            }
        }
    }
    credentials
}

/// YAML credentials file layout
#[derive(Debug, Deserialize)]
struct CredentialsFile {
    #[serde(default)]
    tenants: Vec<TenantCredential>,
}

/// Parse credentials from YAML text
pub fn credentials_from_yaml(yaml: &str) -> Result<Vec<TenantCredential>> {
    let file: CredentialsFile = serde_yaml::from_str(yaml)?;
    Ok(file.tenants)
}

/// Load credentials from a YAML file
pub fn load_credentials_file(path: impl AsRef<Path>) -> Result<Vec<TenantCredential>> {
    let path = path.as_ref();
    let contents = std::fs::read_to_string(path).map_err(|e| match e.kind() {
        std::io::ErrorKind::NotFound => Error::FileNotFound {
            path: path.display().to_string(),
        },
        _ => Error::Io(e),
    })?;
    credentials_from_yaml(&contents)
        .with_context(|| format!("invalid credentials file {}", path.display()))
}

/// Read credentials from the `CREDENTIALS` environment variable
pub fn credentials_from_env() -> Vec<TenantCredential> {
    std::env::var(CREDENTIALS_ENV)
        .map(|raw| parse_credentials(&raw))
        .unwrap_or_default()
}

// ============================================================================
// Application Config
// ============================================================================

/// Complete configuration of a report service instance
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Where combined reports are kept
    pub reports_dir: PathBuf,
    /// Where per-tenant intermediates are written
    pub temp_dir: PathBuf,
    /// Upstream API base URL
    pub api_url: String,
    /// Upstream request timeout
    pub timeout: Duration,
    /// Retries per upstream request
    pub max_retries: u32,
    /// Delay growth between retries
    pub backoff: BackoffType,
    /// Upstream requests per second, 0 for unlimited
    pub requests_per_second: u32,
    /// Behaviour when a tenant fails
    pub failure_policy: FailurePolicy,
    /// Tenants included in each run
    pub credentials: Vec<TenantCredential>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            reports_dir: PathBuf::from("reports"),
            temp_dir: PathBuf::from("temp-reports"),
            api_url: DEFAULT_API_URL.to_string(),
            timeout: Duration::from_secs(30),
            max_retries: 3,
            backoff: BackoffType::Exponential,
            requests_per_second: 5,
            failure_policy: FailurePolicy::Abort,
            credentials: Vec::new(),
        }
    }
}

impl AppConfig {
    /// Check the parts that would otherwise fail late
    pub fn validate(&self) -> Result<()> {
        let url = url::Url::parse(&self.api_url)?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(Error::config(format!(
                "API URL must be http or https: {}",
                self.api_url
            )));
        }
        if self.timeout.is_zero() {
            return Err(Error::config("timeout must be greater than zero"));
        }
        Ok(())
    }

    /// Transport settings for the upstream API
    pub fn http_client_config(&self) -> HttpClientConfig {
        let rate_limit = (self.requests_per_second > 0)
            .then(|| RateLimiterConfig::per_second(self.requests_per_second));

        HttpClientConfig::new(self.api_url.clone())
            .timeout(self.timeout)
            .retry(RetryPolicy {
                max_retries: self.max_retries,
                backoff: self.backoff,
                ..RetryPolicy::default()
            })
            .rate_limit(rate_limit)
    }
}
