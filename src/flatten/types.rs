//! Flat row and header set types

use std::collections::{HashMap, HashSet};

/// Single-level projection of one nested record.
///
/// Keys are dotted paths and keep the position of their first insertion;
/// re-inserting an existing key replaces the value in place.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FlatRow {
    keys: Vec<String>,
    values: HashMap<String, String>,
}

impl FlatRow {
    /// Create an empty row
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace the value stored under `key`
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        let key = key.into();
        if !self.values.contains_key(&key) {
            self.keys.push(key.clone());
        }
        self.values.insert(key, value.into());
    }

    /// Get the value for a key
    pub fn get(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(String::as_str)
    }

    /// Check whether a key is present
    pub fn contains_key(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    /// Keys in first-insertion order
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.keys.iter().map(String::as_str)
    }

    /// Key/value pairs in first-insertion order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.keys
            .iter()
            .map(|k| (k.as_str(), self.values[k].as_str()))
    }

    /// Number of entries
    pub fn len(&self) -> usize {
        self.keys.len()
    }

    /// Check if the row has no entries
    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }
}

/// Ordered, de-duplicated list of column names.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HeaderSet {
    names: Vec<String>,
    seen: HashSet<String>,
}

impl HeaderSet {
    /// Create an empty header set
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a header unless it is already present.
    ///
    /// Returns `true` if the header was added.
    pub fn push(&mut self, name: impl Into<String>) -> bool {
        let name = name.into();
        if self.seen.contains(&name) {
            return false;
        }
        self.seen.insert(name.clone());
        self.names.push(name);
        true
    }

    /// Append every header from an iterator, keeping first-seen order
    pub fn extend<I, S>(&mut self, names: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        for name in names {
            self.push(name);
        }
    }

    /// Check membership
    pub fn contains(&self, name: &str) -> bool {
        self.seen.contains(name)
    }

    /// Zero-based position of a header
    pub fn position(&self, name: &str) -> Option<usize> {
        if !self.contains(name) {
            return None;
        }
        self.names.iter().position(|n| n == name)
    }

    /// Headers in order
    pub fn as_slice(&self) -> &[String] {
        &self.names
    }

    /// Iterate headers in order
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.names.iter().map(String::as_str)
    }

    /// Number of headers
    pub fn len(&self) -> usize {
        self.names.len()
    }

    /// Check if empty
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

impl<S: Into<String>> FromIterator<S> for HeaderSet {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        let mut set = Self::new();
        set.extend(iter);
        set
    }
}
