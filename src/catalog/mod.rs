//! The immutable in-memory record store and the dataset loader feeding it.
//!
//! The dataset is a single JSON document holding an array of objects. It is
//! loaded exactly once, before any query runs, and never mutated afterwards:
//! the store hands out shared [`Arc<Record>`] handles so result lists can be
//! built without copying record data.

mod loader;

pub use loader::{load_dataset, DatasetLocation};

use serde_json::Value;
use std::collections::HashSet;
use std::sync::Arc;

use crate::models::{normalize_identifier, Record};

/// Errors that can occur while loading the dataset
#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    /// The dataset location could not be understood
    #[error("Invalid dataset location: {0}")]
    InvalidLocation(String),

    /// IO error (file system)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Network or HTTP transport error
    #[error("Network error: {0}")]
    Network(String),

    /// The server answered with a non-success status
    #[error("HTTP error: status {status}")]
    Http { status: u16 },

    /// The document is not valid JSON
    #[error("Parse error: {0}")]
    Json(String),

    /// The document is valid JSON but not an array
    #[error("Dataset must be a JSON array of records, found {found}")]
    NotAnArray { found: &'static str },

    /// An element of the array is not a JSON object
    #[error("Record {index} is not a JSON object, found {found}")]
    NotAnObject { index: usize, found: &'static str },
}

impl From<reqwest::Error> for LoadError {
    fn from(err: reqwest::Error) -> Self {
        LoadError::Network(err.to_string())
    }
}

impl From<serde_json::Error> for LoadError {
    fn from(err: serde_json::Error) -> Self {
        LoadError::Json(err.to_string())
    }
}

/// Read-only collection of records in load order
#[derive(Debug, Clone, Default)]
pub struct RecordStore {
    records: Vec<Arc<Record>>,
}

impl RecordStore {
    /// Build a store from a parsed JSON document
    pub fn load(raw: Value) -> Result<Self, LoadError> {
        let items = match raw {
            Value::Array(items) => items,
            other => {
                return Err(LoadError::NotAnArray {
                    found: json_kind(&other),
                })
            }
        };

        let mut records = Vec::with_capacity(items.len());
        for (index, item) in items.into_iter().enumerate() {
            match item {
                Value::Object(fields) => records.push(Arc::new(Record::new(fields))),
                other => {
                    return Err(LoadError::NotAnObject {
                        index,
                        found: json_kind(&other),
                    })
                }
            }
        }

        let store = Self { records };
        store.warn_on_duplicate_identifiers();
        Ok(store)
    }

    /// Build a store from the text of a JSON document
    pub fn from_json_str(text: &str) -> Result<Self, LoadError> {
        let raw: Value = serde_json::from_str(text)?;
        Self::load(raw)
    }

    /// All records in their original load order
    pub fn all(&self) -> &[Arc<Record>] {
        &self.records
    }

    /// Record at a store position
    pub fn get(&self, position: usize) -> Option<&Arc<Record>> {
        self.records.get(position)
    }

    /// Number of records
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether the store holds no records
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// First record whose normalized identifier equals `id` (trimmed)
    pub fn find_by_identifier(&self, id: &str) -> Option<(usize, &Arc<Record>)> {
        let id = normalize_identifier(id);
        if id.is_empty() {
            return None;
        }
        self.records
            .iter()
            .enumerate()
            .find(|(_, record)| record.identifier() == id)
    }

    fn warn_on_duplicate_identifiers(&self) {
        let mut seen = HashSet::new();
        let duplicates = self
            .records
            .iter()
            .map(|r| r.identifier())
            .filter(|id| !id.is_empty())
            .filter(|id| !seen.insert(id.clone()))
            .count();
        if duplicates > 0 {
            tracing::warn!(
                "{} records share an identifier with an earlier record; exact lookups return the first",
                duplicates
            );
        }
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_load_preserves_order() {
        let store = RecordStore::load(json!([
            {"PubMed_ID": "3"},
            {"PubMed_ID": "1"},
            {"PubMed_ID": "2"}
        ]))
        .unwrap();

        let ids: Vec<String> = store.all().iter().map(|r| r.identifier()).collect();
        assert_eq!(ids, vec!["3", "1", "2"]);
        assert_eq!(store.len(), 3);
    }

    #[test]
    fn test_load_rejects_non_array() {
        let err = RecordStore::load(json!({"PubMed_ID": "1"})).unwrap_err();
        assert!(matches!(err, LoadError::NotAnArray { found: "object" }));
    }

    #[test]
    fn test_load_rejects_non_object_element() {
        let err = RecordStore::load(json!([{"PubMed_ID": "1"}, 42])).unwrap_err();
        assert!(matches!(
            err,
            LoadError::NotAnObject {
                index: 1,
                found: "number"
            }
        ));
    }

    #[test]
    fn test_from_json_str_invalid_json() {
        let err = RecordStore::from_json_str("[{").unwrap_err();
        assert!(matches!(err, LoadError::Json(_)));
    }

    #[test]
    fn test_empty_array_is_valid() {
        let store = RecordStore::from_json_str("[]").unwrap();
        assert!(store.is_empty());
    }

    #[test]
    fn test_find_by_identifier_returns_first() {
        let store = RecordStore::load(json!([
            {"PubMed_ID": " 100 ", "Title": "first"},
            {"PubMed_ID": 100, "Title": "second"}
        ]))
        .unwrap();

        let (position, record) = store.find_by_identifier("100").unwrap();
        assert_eq!(position, 0);
        assert_eq!(record.text("Title"), "first");

        assert!(store.find_by_identifier("  ").is_none());
        assert!(store.find_by_identifier("999").is_none());
    }
}
