//! Inventory module
//!
//! The upstream side of a report run: exchanging tenant credentials for an
//! access token and listing the tenant's virtual machines as raw JSON
//! records.

mod client;

pub use client::{EmmaClient, ISSUE_TOKEN_PATH, VMS_PATH};

use crate::config::TenantCredential;
use crate::error::Result;
use async_trait::async_trait;
use serde_json::Value;

/// Source of per-tenant VM records
#[async_trait]
pub trait InventorySource: Send + Sync {
    /// Exchange client credentials for an access token
    async fn issue_token(&self, credential: &TenantCredential) -> Result<String>;

    /// List the VMs visible to `token`, one JSON record per VM
    async fn list_vms(&self, token: &str) -> Result<Vec<Value>>;
}
