//! Helpers for the opaque JSON records exchanged with the API.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A remote record as returned by the API.
pub type Record = Value;

/// Read a numeric id field, accepting numbers and numeric strings.
#[must_use]
pub fn field_id(record: &Value, field: &str) -> Option<u64> {
    match record.get(field)? {
        Value::Number(n) => n.as_u64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// Read the `id` field of a record.
#[must_use]
pub fn record_id(record: &Value) -> Option<u64> {
    field_id(record, "id")
}

/// Whether a record's field equals the given natural key.
///
/// String fields compare exactly; numeric fields compare by their decimal
/// representation.
#[must_use]
pub fn field_matches(record: &Value, field: &str, key: &str) -> bool {
    match record.get(field) {
        Some(Value::String(s)) => s == key,
        Some(Value::Number(n)) => n.to_string() == key,
        _ => false,
    }
}

/// How to find one record in a collection: by a known id, by name, or both.
///
/// When both are given the id wins.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Lookup {
    /// Known numeric id.
    pub id: Option<u64>,
    /// Natural name.
    pub name: Option<String>,
}

impl Lookup {
    /// Create a lookup; an empty name counts as absent.
    #[must_use]
    pub fn new(id: Option<u64>, name: Option<String>) -> Self {
        Self {
            id,
            name: name.filter(|n| !n.is_empty()),
        }
    }

    /// Look up by id only.
    #[must_use]
    pub fn by_id(id: u64) -> Self {
        Self::new(Some(id), None)
    }

    /// Look up by name only.
    #[must_use]
    pub fn by_name(name: impl Into<String>) -> Self {
        Self::new(None, Some(name.into()))
    }

    /// Whether neither an id nor a name was given.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.id.is_none() && self.name.is_none()
    }
}
