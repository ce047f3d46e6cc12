//! Recursive JSON-to-flat-row conversion

use super::types::FlatRow;
use serde_json::{Number, Value};

/// Separator placed between path segments
pub const PATH_SEPARATOR: char = '.';

/// Flatten one record into a fresh row
pub fn flatten(record: &Value) -> FlatRow {
    let mut row = FlatRow::new();
    flatten_into(record, "", &mut row);
    row
}

/// Flatten `record` into `acc`, prefixing every produced key with `prefix`.
///
/// A non-empty prefix is expected to end with [`PATH_SEPARATOR`]; the
/// trailing separator is stripped when a scalar is stored.
pub fn flatten_into(record: &Value, prefix: &str, acc: &mut FlatRow) {
    match record {
        Value::Object(map) => {
            for (key, value) in map {
                flatten_into(value, &format!("{prefix}{key}{PATH_SEPARATOR}"), acc);
            }
        }
        Value::Array(items) => {
            for (index, value) in items.iter().enumerate() {
                flatten_into(value, &format!("{prefix}{index}{PATH_SEPARATOR}"), acc);
            }
        }
        Value::Null | Value::Bool(_) | Value::Number(_) | Value::String(_) => {
            let key = prefix.strip_suffix(PATH_SEPARATOR).unwrap_or(prefix);
            acc.insert(key, scalar_to_string(record));
        }
    }
}

/// Canonical text of a scalar.
///
/// `null` is empty, booleans are `true`/`false`, numbers go through
/// [`number_to_string`] and strings are emitted verbatim. Containers fall
/// back to their compact JSON text.
pub fn scalar_to_string(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => number_to_string(n),
        Value::String(s) => s.clone(),
        Value::Array(_) | Value::Object(_) => value.to_string(),
    }
}

/// Integral numbers render without a fraction (`3.0` → `3`); other floats
/// use serde_json's shortest round-trip form.
pub fn number_to_string(n: &Number) -> String {
    if let Some(i) = n.as_i64() {
        return i.to_string();
    }
    if let Some(u) = n.as_u64() {
        return u.to_string();
    }
    match n.as_f64() {
        Some(f) if f.fract() == 0.0 && f.abs() < 1e15 => format!("{f:.0}"),
        _ => n.to_string(),
    }
}
