//! Output module
//!
//! Handles the CSV side of the report pipeline.
//!
//! # Overview
//!
//! This module provides utilities for:
//! - Writing one CSV per tenant from flattened records
//! - Reconciling the headers of several tenant files
//! - Union-merging tenant files into the combined report
//! - Naming and listing report files

mod files;
mod merge;
mod reconcile;
mod types;
mod writer;

pub use files::{
    combined_file_name, list_reports, next_report_path, resolve_report, tenant_file_name,
    REPORT_EXTENSION,
};
pub use merge::merge_reports;
pub use reconcile::{collect_headers, read_header_row};
pub use types::{
    ColumnIndex, ExtraColumn, HeaderIndex, MergeOptions, MergeSummary, ReconcileWarning,
    TenantReportFile,
};
pub use writer::{tenant_headers, write_tenant_csv};
