//! Per-tenant CSV writer
//!
//! Flattens a batch of records and writes them under the batch's own
//! header set.

use super::types::{ExtraColumn, TenantReportFile};
use crate::error::{Error, Result};
use crate::flatten::{flatten, FlatRow, HeaderSet};
use serde_json::Value;
use std::fs::File;
use std::io::BufWriter;
use std::path::Path;
use tracing::debug;

/// Write one tenant's records to `path`.
///
/// Returns `Ok(None)` without touching the filesystem when `records` is
/// empty.
pub fn write_tenant_csv(
    path: impl AsRef<Path>,
    tenant: &str,
    records: &[Value],
    extra_columns: &[ExtraColumn],
) -> Result<Option<TenantReportFile>> {
    let path = path.as_ref();
    if records.is_empty() {
        debug!("Tenant {} has no records, skipping {}", tenant, path.display());
        return Ok(None);
    }

    let rows: Vec<FlatRow> = records.iter().map(flatten).collect();
    let headers = tenant_headers(&rows, extra_columns);

    let file = File::create(path).map_err(|e| {
        Error::output(format!("Failed to create file {}: {e}", path.display()))
    })?;
    let mut writer = csv::Writer::from_writer(BufWriter::new(file));

    writer.write_record(headers.iter())?;
    for row in &rows {
        writer.write_record(project_row(row, &headers, extra_columns))?;
    }
    writer.flush().map_err(|e| {
        Error::output(format!("Failed to write file {}: {e}", path.display()))
    })?;

    debug!(
        "Wrote {} rows x {} columns for tenant {} to {}",
        rows.len(),
        headers.len(),
        tenant,
        path.display()
    );

    Ok(Some(TenantReportFile {
        path: path.to_path_buf(),
        tenant: tenant.to_string(),
        rows: rows.len(),
        columns: headers.len(),
    }))
}

/// Union of row keys in first-seen order followed by the extra columns
pub fn tenant_headers(rows: &[FlatRow], extra_columns: &[ExtraColumn]) -> HeaderSet {
    let mut headers = HeaderSet::new();
    for row in rows {
        headers.extend(row.keys());
    }
    headers.extend(extra_columns.iter().map(|c| c.name.as_str()));
    headers
}

/// Lay a row out in header order, filling absent keys with empty fields
fn project_row<'a>(
    row: &'a FlatRow,
    headers: &'a HeaderSet,
    extra_columns: &'a [ExtraColumn],
) -> Vec<&'a str> {
    headers
        .iter()
        .map(|header| {
            extra_columns
                .iter()
                .find(|c| c.name == header)
                .map(|c| c.value.as_str())
                .or_else(|| row.get(header))
                .unwrap_or("")
        })
        .collect()
}
