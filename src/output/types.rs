//! Report file handoff types

use crate::flatten::HeaderSet;
use serde::Serialize;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// A per-tenant CSV produced by the row writer and consumed by the merger
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TenantReportFile {
    /// Location of the temporary CSV
    pub path: PathBuf,
    /// Tenant label (project name)
    pub tenant: String,
    /// Number of data rows written
    pub rows: usize,
    /// Number of columns in the header row
    pub columns: usize,
}

impl TenantReportFile {
    /// Path of the file
    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// Constant column appended to every row of a tenant file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtraColumn {
    /// Column header
    pub name: String,
    /// Value written into every row
    pub value: String,
}

impl ExtraColumn {
    /// Create a new constant column
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}

/// A file skipped during header reconciliation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReconcileWarning {
    /// File that could not contribute headers
    pub path: PathBuf,
    /// Why it was skipped
    pub reason: String,
}

/// Column positions of one file, keyed by header name
pub type ColumnIndex = HashMap<String, usize>;

/// Result of scanning the headers of a set of CSV files
#[derive(Debug, Clone, Default)]
pub struct HeaderIndex {
    /// Global union of headers in first-seen order
    pub union: HeaderSet,
    /// Per-file header → column position
    pub per_file: HashMap<PathBuf, ColumnIndex>,
    /// Files that were skipped
    pub warnings: Vec<ReconcileWarning>,
}

impl HeaderIndex {
    /// Column positions recorded for a file
    pub fn columns_for(&self, path: &Path) -> Option<&ColumnIndex> {
        self.per_file.get(path)
    }
}

/// Options for merging tenant files
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MergeOptions {
    /// Delete the input files once the combined file is in place
    pub remove_inputs: bool,
}

impl Default for MergeOptions {
    fn default() -> Self {
        Self {
            remove_inputs: true,
        }
    }
}

impl MergeOptions {
    /// Leave the input files on disk after merging
    #[must_use]
    pub fn keep_inputs(mut self) -> Self {
        self.remove_inputs = false;
        self
    }
}

/// Outcome of a successful merge
#[derive(Debug, Clone, Default, Serialize)]
pub struct MergeSummary {
    /// Combined report location
    pub output: PathBuf,
    /// Width of the unioned header
    pub columns: usize,
    /// Total data rows written
    pub rows_written: usize,
    /// Data rows transcribed from each input, in input order
    pub rows_per_input: Vec<(PathBuf, usize)>,
    /// Inputs that could not be deleted afterwards
    pub cleanup_failures: Vec<PathBuf>,
}
