//! Flattening module
//!
//! Turns arbitrarily nested JSON records into single-level rows keyed by
//! dotted paths (`network.interfaces.0.ip`), plus the ordered header set
//! used to lay those rows out as CSV columns.

mod flattener;
mod types;

pub use flattener::{flatten, flatten_into, number_to_string, scalar_to_string, PATH_SEPARATOR};
pub use types::{FlatRow, HeaderSet};
