//! Row records

use std::borrow::Cow;
use std::collections::BTreeMap;
use std::fmt;

use serde::Deserialize;
use serde::Serialize;

use super::FieldPath;
use super::Value;
use crate::error::FieldError;

/// Stable identifier of a row.
///
/// Used as the reconciliation key for rows and cells, so it must be unique
/// within a page. Numeric ids are accepted on input and kept in their
/// decimal string form.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "RawRowId", into = "String")]
pub struct RowId(String);

impl RowId {
    /// Creates a row id from any string-like value.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the id as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RowId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for RowId {
    fn from(v: &str) -> Self {
        Self(v.to_string())
    }
}

impl From<String> for RowId {
    fn from(v: String) -> Self {
        Self(v)
    }
}

impl From<u64> for RowId {
    fn from(v: u64) -> Self {
        Self(v.to_string())
    }
}

impl From<i64> for RowId {
    fn from(v: i64) -> Self {
        Self(v.to_string())
    }
}

impl From<u32> for RowId {
    fn from(v: u32) -> Self {
        Self(v.to_string())
    }
}

impl From<usize> for RowId {
    fn from(v: usize) -> Self {
        Self(v.to_string())
    }
}

impl From<RowId> for String {
    fn from(v: RowId) -> Self {
        v.0
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawRowId {
    Text(String),
    Signed(i64),
    Unsigned(u64),
}

impl From<RawRowId> for RowId {
    fn from(raw: RawRowId) -> Self {
        match raw {
            RawRowId::Text(s) => Self(s),
            RawRowId::Signed(n) => Self(n.to_string()),
            RawRowId::Unsigned(n) => Self(n.to_string()),
        }
    }
}

/// A row displayed by the table.
///
/// Records hold an `id` plus arbitrary fields. On the wire the id sits next
/// to the fields (`{"id": 7, "name": "Ada"}`).
///
/// # Example
///
/// ```
/// use tabula_lib::model::{FieldPath, Record, Value};
///
/// let record = Record::new(7u64)
///     .set("name", "Ada")
///     .set("address", Value::map([("city", "London")]));
///
/// let city = FieldPath::parse("address.city").unwrap();
/// assert_eq!(*record.resolve(&city).unwrap(), Value::from("London"));
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    id: RowId,
    #[serde(flatten)]
    fields: BTreeMap<String, Value>,
}

impl Record {
    /// Creates a new record with no fields.
    pub fn new(id: impl Into<RowId>) -> Self {
        Self {
            id: id.into(),
            fields: BTreeMap::new(),
        }
    }

    /// Returns the row id.
    pub fn id(&self) -> &RowId {
        &self.id
    }

    /// Returns a reference to the top-level field value, if it exists.
    pub fn get(&self, field: &str) -> Option<&Value> {
        self.fields.get(field)
    }

    /// Returns a reference to all fields.
    pub fn fields(&self) -> &BTreeMap<String, Value> {
        &self.fields
    }

    /// Sets a field value (builder pattern).
    pub fn set(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.fields.insert(field.into(), value.into());
        self
    }

    /// Inserts a field value.
    pub fn insert(&mut self, field: impl Into<String>, value: impl Into<Value>) {
        self.fields.insert(field.into(), value.into());
    }

    /// Resolves a dotted field path against this record.
    ///
    /// A single `id` segment resolves to the row id when no field of that
    /// name exists. Every other segment must be present, and every segment
    /// but the last must address a [`Value::Map`].
    pub fn resolve(&self, path: &FieldPath) -> Result<Cow<'_, Value>, FieldError> {
        let segments = path.segments();
        let (first, rest) = match segments.split_first() {
            Some(split) => split,
            None => return Err(FieldError::not_found(path.as_str(), "")),
        };

        let mut current = match self.fields.get(first.as_str()) {
            Some(value) => value,
            None if rest.is_empty() && first == "id" => {
                return Ok(Cow::Owned(Value::String(self.id.0.clone())));
            }
            None => return Err(FieldError::not_found(path.as_str(), first.as_str())),
        };

        for segment in rest {
            current = match current {
                Value::Map(fields) => fields
                    .get(segment.as_str())
                    .ok_or_else(|| FieldError::not_found(path.as_str(), segment.as_str()))?,
                other => {
                    return Err(FieldError::not_traversable(
                        path.as_str(),
                        segment.as_str(),
                        other.type_name(),
                    ));
                }
            };
        }

        Ok(Cow::Borrowed(current))
    }
}
