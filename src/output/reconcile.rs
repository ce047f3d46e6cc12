//! Header reconciliation across tenant files

use super::types::{ColumnIndex, HeaderIndex, ReconcileWarning};
use crate::error::{Error, Result};
use csv::{ReaderBuilder, StringRecord};
use std::fs::File;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Read the header row of every file and build the global union.
///
/// Files that cannot be opened or have no header row are skipped and
/// reported in [`HeaderIndex::warnings`].
pub fn collect_headers<P: AsRef<Path>>(paths: &[P]) -> HeaderIndex {
    let mut index = HeaderIndex::default();

    for path in paths {
        let path = path.as_ref();
        match read_header_row(path) {
            Ok(headers) => {
                let mut columns = ColumnIndex::with_capacity(headers.len());
                for (position, name) in headers.iter().enumerate() {
                    columns.entry(name.to_string()).or_insert(position);
                    index.union.push(name);
                }
                debug!("{} contributes {} headers", path.display(), columns.len());
                index.per_file.insert(path.to_path_buf(), columns);
            }
            Err(e) => {
                warn!("Skipping {} during header scan: {}", path.display(), e);
                index.warnings.push(ReconcileWarning {
                    path: PathBuf::from(path),
                    reason: e.to_string(),
                });
            }
        }
    }

    index
}

/// Read exactly the first record of a CSV file
pub fn read_header_row(path: &Path) -> Result<StringRecord> {
    let file = File::open(path)?;
    let mut reader = ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(file);

    let mut record = StringRecord::new();
    if reader.read_record(&mut record)? {
        Ok(record)
    } else {
        Err(Error::output(format!("{} has no header row", path.display())))
    }
}
