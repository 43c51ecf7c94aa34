//! Remote document representation and lenient field readers
//!
//! Remote collections hand back loosely typed JSON objects. The readers here
//! never fail: a missing or mistyped field yields the type's default.

use serde_json::{Map, Value};
use std::collections::BTreeSet;

/// Body of a remote document
pub type Fields = Map<String, Value>;

/// A document as stored in a remote collection. The id is the document key
/// and is never part of `fields`.
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    pub id: String,
    pub fields: Fields,
}

impl Document {
    pub fn new(id: impl Into<String>, fields: Fields) -> Self {
        Self {
            id: id.into(),
            fields,
        }
    }
}

pub(crate) fn read_string(fields: &Fields, key: &str) -> String {
    fields
        .get(key)
        .and_then(Value::as_str)
        .map(str::to_string)
        .unwrap_or_default()
}

/// Non-negative count such as a price or a room total
pub(crate) fn read_count(fields: &Fields, key: &str) -> u32 {
    fields
        .get(key)
        .and_then(Value::as_i64)
        .and_then(|n| u32::try_from(n).ok())
        .unwrap_or(0)
}

/// Epoch milliseconds
pub(crate) fn read_millis(fields: &Fields, key: &str) -> i64 {
    fields.get(key).and_then(Value::as_i64).unwrap_or(0)
}

/// Array of strings; non-string entries are dropped
pub(crate) fn read_string_set(fields: &Fields, key: &str) -> BTreeSet<String> {
    fields
        .get(key)
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .filter_map(Value::as_str)
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default()
}
