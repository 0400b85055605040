//! Filter values

use std::collections::BTreeMap;

use crate::column::ColumnSchema;
use crate::model::Value;

/// Filter values keyed by filter name, as passed to a remote fetch.
pub type Filters = BTreeMap<String, Value>;

/// Current filter values.
///
/// Values are opaque to the table. Every [`set`](Self::set) produces a new
/// revision, even when the value is unchanged, and the table recomputes on
/// every set without comparing values.
#[derive(Debug, Clone, Default)]
pub struct FilterStore {
    values: Filters,
    revision: u64,
}

impl FilterStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the value of a filter.
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.values.get(name)
    }

    /// Sets a filter value and returns the new revision.
    pub fn set(&mut self, name: impl Into<String>, value: impl Into<Value>) -> u64 {
        self.values.insert(name.into(), value.into());
        self.revision += 1;
        self.revision
    }

    /// Returns all filter values.
    pub fn values(&self) -> &Filters {
        &self.values
    }

    /// Returns the number of `set` calls so far.
    pub fn revision(&self) -> u64 {
        self.revision
    }
}

/// An input field offered for filtering.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterField {
    /// Filter name, equal to the column key.
    pub key: String,
    /// Label of the column.
    pub label: String,
}

/// Derives the filter inputs for a list of filter names.
///
/// Each name must match the key of a text column. Unknown names and icon
/// columns are skipped.
pub fn filter_fields<S: AsRef<str>>(schema: &ColumnSchema, names: &[S]) -> Vec<FilterField> {
    names
        .iter()
        .filter_map(|name| schema.find(name.as_ref()))
        .filter(|column| !column.is_icon())
        .map(|column| FilterField {
            key: column.key.clone(),
            label: column.label.clone(),
        })
        .collect()
}
