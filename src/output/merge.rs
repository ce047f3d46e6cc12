//! Union-merge of tenant CSV files into the combined report

use super::reconcile::collect_headers;
use super::types::{ColumnIndex, HeaderIndex, MergeOptions, MergeSummary};
use crate::error::{Error, Result};
use csv::{ReaderBuilder, StringRecord};
use std::fs::{self, File};
use std::io::BufWriter;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tracing::{debug, info, warn};

/// Merge `paths` into a single CSV at `output`.
///
/// Every input row is re-projected onto the union of all headers. Rows are
/// written to an anonymous sibling of `output` that is moved into place only
/// once all inputs were transcribed. An existing `output` is never replaced.
/// Inputs are deleted afterwards when `options.remove_inputs` is set.
pub fn merge_reports<P: AsRef<Path>>(
    paths: &[P],
    output: impl AsRef<Path>,
    options: MergeOptions,
) -> Result<MergeSummary> {
    let output = output.as_ref();
    if paths.is_empty() {
        return Err(Error::output("no report files to merge"));
    }

    let index = collect_headers(paths);
    let dir = match output.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };

    // removed on drop unless persisted
    let mut partial = NamedTempFile::new_in(dir).map_err(|e| {
        Error::output(format!(
            "Failed to create a temporary file in {}: {e}",
            dir.display()
        ))
    })?;
    let rows_per_input = transcribe(paths, &index, partial.as_file_mut())?;

    partial.persist_noclobber(output).map_err(|e| {
        Error::output(format!("Failed to finalize {}: {}", output.display(), e.error))
    })?;

    let rows_written: usize = rows_per_input.iter().map(|(_, n)| n).sum();
    info!(
        "Merged {} files into {} ({} rows, {} columns)",
        paths.len(),
        output.display(),
        rows_written,
        index.union.len()
    );

    let cleanup_failures = if options.remove_inputs {
        remove_inputs(paths)
    } else {
        Vec::new()
    };

    Ok(MergeSummary {
        output: output.to_path_buf(),
        columns: index.union.len(),
        rows_written,
        rows_per_input,
        cleanup_failures,
    })
}

/// Write the union header and every input's rows to `destination`
fn transcribe<P: AsRef<Path>>(
    paths: &[P],
    index: &HeaderIndex,
    destination: &mut File,
) -> Result<Vec<(PathBuf, usize)>> {
    let mut writer = csv::Writer::from_writer(BufWriter::new(destination));
    writer.write_record(index.union.iter())?;

    let no_columns = ColumnIndex::new();
    let mut counts = Vec::with_capacity(paths.len());

    for path in paths {
        let path = path.as_ref();
        let columns = index.columns_for(path).unwrap_or(&no_columns);

        let source = File::open(path)
            .map_err(|e| Error::output(format!("Failed to open {}: {e}", path.display())))?;
        let mut reader = ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .from_reader(source);

        let mut record = StringRecord::new();
        let mut rows = 0;
        while reader.read_record(&mut record)? {
            let projected: Vec<&str> = index
                .union
                .iter()
                .map(|header| {
                    columns
                        .get(header)
                        .and_then(|&position| record.get(position))
                        .unwrap_or("")
                })
                .collect();
            writer.write_record(&projected)?;
            rows += 1;
        }

        debug!("Transcribed {} rows from {}", rows, path.display());
        counts.push((path.to_path_buf(), rows));
    }

    writer
        .flush()
        .map_err(|e| Error::output(format!("Failed to write the combined report: {e}")))?;
    Ok(counts)
}

/// Best-effort deletion of consumed inputs
fn remove_inputs<P: AsRef<Path>>(paths: &[P]) -> Vec<PathBuf> {
    let mut failures = Vec::new();
    for path in paths {
        let path = path.as_ref();
        if let Err(e) = fs::remove_file(path) {
            warn!("Failed to remove {}: {}", path.display(), e);
            failures.push(path.to_path_buf());
        }
    }
    failures
}
