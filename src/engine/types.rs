//! Engine configuration and run summary types

use crate::config::{AppConfig, TenantCredential};
use crate::output::TenantReportFile;
use crate::types::FailurePolicy;
use serde::Serialize;
use std::path::PathBuf;

/// Configuration for a report run
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Directory for per-tenant intermediates
    pub temp_dir: PathBuf,
    /// Directory for combined reports
    pub reports_dir: PathBuf,
    /// Behaviour when a tenant fails
    pub failure_policy: FailurePolicy,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            temp_dir: PathBuf::from("temp-reports"),
            reports_dir: PathBuf::from("reports"),
            failure_policy: FailurePolicy::Abort,
        }
    }
}

impl From<&AppConfig> for EngineConfig {
    fn from(config: &AppConfig) -> Self {
        Self {
            temp_dir: config.temp_dir.clone(),
            reports_dir: config.reports_dir.clone(),
            failure_policy: config.failure_policy,
        }
    }
}

/// What happened to one tenant during a run
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum TenantStatus {
    /// Records were written to a temp file
    Written {
        /// Data rows written
        rows: usize,
        /// Columns in the tenant file
        columns: usize,
    },
    /// The tenant has no VMs
    Empty,
    /// The tenant failed and was skipped
    Failed {
        /// Error text
        error: String,
    },
}

/// Per-tenant result line
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TenantOutcome {
    /// Tenant label
    pub project_name: String,
    /// Result
    #[serde(flatten)]
    pub status: TenantStatus,
}

impl TenantOutcome {
    pub(crate) fn written(file: &TenantReportFile) -> Self {
        Self {
            project_name: file.tenant.clone(),
            status: TenantStatus::Written {
                rows: file.rows,
                columns: file.columns,
            },
        }
    }

    pub(crate) fn empty(credential: &TenantCredential) -> Self {
        Self {
            project_name: credential.project_name.clone(),
            status: TenantStatus::Empty,
        }
    }

    pub(crate) fn failed(credential: &TenantCredential, error: String) -> Self {
        Self {
            project_name: credential.project_name.clone(),
            status: TenantStatus::Failed { error },
        }
    }
}

/// Summary of a report run
#[derive(Debug, Clone, Default, Serialize)]
pub struct ReportSummary {
    /// Combined report, absent when no tenant produced rows
    pub report: Option<PathBuf>,
    /// Data rows in the combined report
    pub rows: usize,
    /// Columns in the combined report
    pub columns: usize,
    /// Outcome per tenant, in credential order
    pub tenants: Vec<TenantOutcome>,
    /// Intermediates that could not be removed
    pub cleanup_failures: Vec<PathBuf>,
}

impl ReportSummary {
    /// File name of the combined report
    pub fn report_name(&self) -> Option<String> {
        self.report
            .as_ref()
            .and_then(|p| p.file_name())
            .map(|n| n.to_string_lossy().into_owned())
    }

    /// Number of tenants that failed and were skipped
    pub fn failed_tenants(&self) -> usize {
        self.tenants
            .iter()
            .filter(|t| matches!(t.status, TenantStatus::Failed { .. }))
            .count()
    }
}
