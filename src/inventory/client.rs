//! Cloud API client for tokens and VM listings

use super::InventorySource;
use crate::config::TenantCredential;
use crate::error::{Error, Result};
use crate::http::{ApiRequest, HttpClient, HttpClientConfig};
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::debug;

/// Token issuance endpoint, relative to the API base URL
pub const ISSUE_TOKEN_PATH: &str = "/v1/issue-token";
/// VM listing endpoint, relative to the API base URL
pub const VMS_PATH: &str = "/v1/vms";

/// Token endpoint response
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TokenResponse {
    access_token: String,
}

/// Inventory source backed by the Emma public API
#[derive(Debug)]
pub struct EmmaClient {
    http: HttpClient,
}

impl EmmaClient {
    /// Create a client for the API described by `config`
    pub fn new(config: HttpClientConfig) -> Result<Self> {
        Ok(Self {
            http: HttpClient::new(config)?,
        })
    }
}

#[async_trait]
impl InventorySource for EmmaClient {
    async fn issue_token(&self, credential: &TenantCredential) -> Result<String> {
        let request = ApiRequest::post(ISSUE_TOKEN_PATH).json(json!({
            "clientId": credential.client_id,
            "clientSecret": credential.client_secret,
        }));

        let response: TokenResponse = self
            .http
            .send_json(&request)
            .await
            .map_err(|e| match e {
                Error::HttpStatus { status, body } => {
                    Error::auth(format!("error fetching token ({status}): {body}"))
                }
                Error::Decode { message } => {
                    Error::auth(format!("unexpected token response: {message}"))
                }
                other => other,
            })?;

        debug!("Issued token for project {}", credential.project_name);
        Ok(response.access_token)
    }

    async fn list_vms(&self, token: &str) -> Result<Vec<Value>> {
        let body: Value = self
            .http
            .send_json(&ApiRequest::get(VMS_PATH).bearer(token))
            .await?;

        match body {
            Value::Array(vms) => Ok(vms),
            other => Err(Error::decode(format!(
                "expected a JSON array of VMs, got {}",
                json_kind(&other)
            ))),
        }
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
