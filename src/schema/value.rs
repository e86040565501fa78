//! Loosely-typed field values and dotted-path access
//!
//! Uploaded rows carry nested-path column names ("final_output.metadata.queryText")
//! and occasionally whole JSON fragments inside a single cell. This module models
//! that data as a small tagged union and provides a pure recursive-descent
//! accessor over it, replacing the duck-typed lookups of the source system.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A loosely-typed value extracted from an uploaded table cell
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    Null,
    Scalar(String),
    Sequence(Vec<FieldValue>),
    Mapping(BTreeMap<String, FieldValue>),
}

impl FieldValue {
    /// Empty mapping, the starting point for building a row
    pub fn empty_mapping() -> FieldValue {
        FieldValue::Mapping(BTreeMap::new())
    }

    pub fn as_scalar(&self) -> Option<&str> {
        match self {
            FieldValue::Scalar(s) => Some(s),
            _ => None,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, FieldValue::Null)
    }

    /// Convert a parsed JSON value into a FieldValue.
    ///
    /// JSON scalars are kept as their string rendering; the pipeline re-parses
    /// numbers and timestamps where the target column demands it.
    pub fn from_json(value: &serde_json::Value) -> FieldValue {
        match value {
            serde_json::Value::Null => FieldValue::Null,
            serde_json::Value::Bool(b) => FieldValue::Scalar(b.to_string()),
            serde_json::Value::Number(n) => FieldValue::Scalar(n.to_string()),
            serde_json::Value::String(s) => FieldValue::Scalar(s.clone()),
            serde_json::Value::Array(items) => {
                FieldValue::Sequence(items.iter().map(FieldValue::from_json).collect())
            }
            serde_json::Value::Object(map) => FieldValue::Mapping(
                map.iter()
                    .map(|(k, v)| (k.clone(), FieldValue::from_json(v)))
                    .collect(),
            ),
        }
    }

    /// Insert a value at a dotted path, creating intermediate mappings.
    ///
    /// Used when building rows from dotted CSV headers so that lookup and
    /// insertion share one addressing scheme. Inserting through a non-mapping
    /// replaces it.
    pub fn insert_path(&mut self, path: &str, value: FieldValue) {
        let mut current = self;
        let mut segments = path.split('.').peekable();

        while let Some(segment) = segments.next() {
            if !matches!(current, FieldValue::Mapping(_)) {
                *current = FieldValue::empty_mapping();
            }
            let FieldValue::Mapping(map) = current else {
                unreachable!("just replaced with a mapping");
            };

            if segments.peek().is_none() {
                map.insert(segment.to_string(), value);
                return;
            }
            current = map
                .entry(segment.to_string())
                .or_insert_with(FieldValue::empty_mapping);
        }
    }
}

/// Look up a scalar at a dotted path within a value.
///
/// Path segments traverse mappings by key; a numeric segment indexes into a
/// sequence. Returns None when any segment is missing, when the terminal is a
/// mapping or sequence, or when the terminal is explicitly null.
pub fn get_path<'a>(value: &'a FieldValue, path: &str) -> Option<&'a str> {
    let mut current = value;

    for segment in path.split('.') {
        current = match current {
            FieldValue::Mapping(map) => map.get(segment)?,
            FieldValue::Sequence(items) => {
                let index: usize = segment.parse().ok()?;
                items.get(index)?
            }
            _ => return None,
        };
    }

    current.as_scalar()
}
