//! Report file naming and listing

use crate::error::{Error, Result};
use chrono::{DateTime, Utc};
use std::path::{Path, PathBuf};

/// Extension of every report file
pub const REPORT_EXTENSION: &str = "csv";

/// Temporary file name for one tenant, unique per company/project/instant
pub fn tenant_file_name(company_id: &str, project_id: &str, at: DateTime<Utc>) -> String {
    format!(
        "temp_report_{}_{}_{}.{REPORT_EXTENSION}",
        sanitize(company_id),
        sanitize(project_id),
        at.format("%Y%m%dT%H%M%S%.6fZ")
    )
}

/// Combined report file name for a run started at `at`
pub fn combined_file_name(at: DateTime<Utc>) -> String {
    format!("{}.{REPORT_EXTENSION}", combined_stem(at))
}

/// First combined report path in `dir` for `at` that is not taken yet.
///
/// Runs within the same second get `-1`, `-2`, ... appended to the stem.
pub fn next_report_path(dir: impl AsRef<Path>, at: DateTime<Utc>) -> PathBuf {
    let dir = dir.as_ref();
    let stem = combined_stem(at);
    let mut candidate = dir.join(combined_file_name(at));
    let mut suffix = 0u32;
    while candidate.exists() {
        suffix += 1;
        candidate = dir.join(format!("{stem}-{suffix}.{REPORT_EXTENSION}"));
    }
    candidate
}

fn combined_stem(at: DateTime<Utc>) -> String {
    format!("vm-report_{}", at.format("%Y-%m-%dT%H-%M-%SZ"))
}

/// Names of the CSV reports in `dir`, sorted
pub fn list_reports(dir: impl AsRef<Path>) -> Result<Vec<String>> {
    let dir = dir.as_ref();
    let entries = std::fs::read_dir(dir).map_err(|e| match e.kind() {
        std::io::ErrorKind::NotFound => Error::FileNotFound {
            path: dir.display().to_string(),
        },
        _ => Error::Io(e),
    })?;

    let mut names = Vec::new();
    for entry in entries {
        let entry = entry?;
        if !entry.file_type()?.is_file() {
            continue;
        }
        let path = entry.path();
        let is_csv = path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case(REPORT_EXTENSION));
        if is_csv {
            names.push(entry.file_name().to_string_lossy().into_owned());
        }
    }
    names.sort();
    Ok(names)
}

/// Resolve a client-supplied report name inside `dir`.
///
/// Returns `None` for names that are empty or carry path components.
pub fn resolve_report(dir: impl AsRef<Path>, name: &str) -> Option<PathBuf> {
    let candidate = Path::new(name);
    let mut components = candidate.components();
    match (components.next(), components.next()) {
        (Some(std::path::Component::Normal(file)), None) => Some(dir.as_ref().join(file)),
        _ => None,
    }
}

/// Keep file names portable
fn sanitize(part: &str) -> String {
    part.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' {
                c
            } else {
                '-'
            }
        })
        .collect()
}
