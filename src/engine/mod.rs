//! Execution engine module
//!
//! Runs one report generation across all configured tenants.
//!
//! # Overview
//!
//! For each tenant, in order: issue a token, read the tenant identity from
//! its claims, list the VMs and write them to a temp CSV. Once every tenant
//! has been handled the temp files are union-merged into the combined
//! report. File work runs on the blocking pool and is awaited before the
//! next tenant starts, so a run never has two tenants in flight. Runs on the
//! same engine are serialized, and each one gets a report name of its own.

mod types;

pub use types::{EngineConfig, ReportSummary, TenantOutcome, TenantStatus};

use crate::auth::TenantClaims;
use crate::config::TenantCredential;
use crate::error::{Error, Result};
use crate::inventory::InventorySource;
use crate::output::{
    merge_reports, next_report_path, tenant_file_name, write_tenant_csv, ExtraColumn,
    MergeOptions, TenantReportFile,
};
use crate::types::FailurePolicy;
use chrono::Utc;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

/// Column carrying the tenant label in every report row
pub const PROJECT_NAME_COLUMN: &str = "projectName";

/// Report engine
pub struct ReportEngine {
    source: Arc<dyn InventorySource>,
    config: EngineConfig,
    run_lock: Mutex<()>,
}

impl ReportEngine {
    /// Create a new engine
    pub fn new(source: Arc<dyn InventorySource>, config: EngineConfig) -> Self {
        Self {
            source,
            config,
            run_lock: Mutex::new(()),
        }
    }

    /// Engine configuration
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Produce one combined report for `credentials`
    pub async fn generate(&self, credentials: &[TenantCredential]) -> Result<ReportSummary> {
        if credentials.is_empty() {
            return Err(Error::config("no tenant credentials configured"));
        }

        let _run = self.run_lock.lock().await;
        let start = Instant::now();
        let started_at = Utc::now();
        tokio::fs::create_dir_all(&self.config.temp_dir).await?;
        tokio::fs::create_dir_all(&self.config.reports_dir).await?;

        let mut files: Vec<TenantReportFile> = Vec::new();
        let mut summary = ReportSummary::default();

        for credential in credentials {
            match self.process_tenant(credential).await {
                Ok(Some(file)) => {
                    summary.tenants.push(TenantOutcome::written(&file));
                    files.push(file);
                }
                Ok(None) => summary.tenants.push(TenantOutcome::empty(credential)),
                Err(e) => match self.config.failure_policy {
                    FailurePolicy::Abort => {
                        discard_tenant_files(&files).await;
                        return Err(e);
                    }
                    FailurePolicy::Skip => {
                        warn!("Skipping tenant {}: {}", credential.project_name, e);
                        summary
                            .tenants
                            .push(TenantOutcome::failed(credential, e.to_string()));
                    }
                },
            }
        }

        if files.is_empty() {
            info!("No tenant produced any rows, no report written");
            return Ok(summary);
        }

        let reports_dir = self.config.reports_dir.clone();
        let paths: Vec<PathBuf> = files.iter().map(|f| f.path.clone()).collect();
        let merged = tokio::task::spawn_blocking(move || {
            let output = next_report_path(&reports_dir, started_at);
            merge_reports(&paths, &output, MergeOptions::default())
        })
        .await?;
        let merged = match merged {
            Ok(merged) => merged,
            Err(e) => {
                discard_tenant_files(&files).await;
                return Err(Error::merge(e.to_string()));
            }
        };

        info!(
            "Report {} ready: {} rows from {} tenants in {:?}",
            merged.output.display(),
            merged.rows_written,
            files.len(),
            start.elapsed()
        );

        summary.report = Some(merged.output);
        summary.rows = merged.rows_written;
        summary.columns = merged.columns;
        summary.cleanup_failures = merged.cleanup_failures;
        Ok(summary)
    }

    /// Fetch one tenant's VMs and write them to a temp CSV
    async fn process_tenant(
        &self,
        credential: &TenantCredential,
    ) -> Result<Option<TenantReportFile>> {
        let tenant = credential.project_name.clone();

        let token = self.source.issue_token(credential).await.map_err(|e| {
            Error::tenant(&tenant, format!("unauthorized: {}", strip_prefix(&e)))
        })?;
        let claims = TenantClaims::from_token(&token)
            .map_err(|e| Error::tenant(&tenant, e.to_string()))?;
        let vms = self
            .source
            .list_vms(&token)
            .await
            .map_err(|e| Error::tenant(&tenant, format!("error fetching VMs data: {e}")))?;

        if vms.is_empty() {
            info!("Tenant {} has no VMs", tenant);
            return Ok(None);
        }
        debug!(
            "Tenant {} (company {}, project {}) has {} VMs",
            tenant,
            claims.company_id,
            claims.project_id,
            vms.len()
        );

        // the same project may be listed twice; never overwrite an intermediate
        let path = loop {
            let candidate = self.config.temp_dir.join(tenant_file_name(
                &claims.company_id,
                &claims.project_id,
                Utc::now(),
            ));
            if !tokio::fs::try_exists(&candidate).await? {
                break candidate;
            }
            tokio::task::yield_now().await;
        };
        let label = tenant.clone();
        tokio::task::spawn_blocking(move || {
            let extra = [ExtraColumn::new(PROJECT_NAME_COLUMN, label.as_str())];
            write_tenant_csv(&path, &label, &vms, &extra)
        })
        .await?
        .map_err(|e| Error::tenant(&tenant, format!("could not create file: {e}")))
    }
}

impl std::fmt::Debug for ReportEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReportEngine")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

/// Auth errors already read "unauthorized: ..."
fn strip_prefix(error: &Error) -> String {
    match error {
        Error::Auth { message } => message.clone(),
        other => other.to_string(),
    }
}

/// Remove temp files of a run that is being abandoned
async fn discard_tenant_files(files: &[TenantReportFile]) {
    for file in files {
        match tokio::fs::remove_file(&file.path).await {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => warn!("Failed to remove {}: {}", file.path.display(), e),
        }
    }
}

#[cfg(test)]
mod tests;
