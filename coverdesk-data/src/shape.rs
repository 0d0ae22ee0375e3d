//! Response shape normalization
//!
//! Endpoints have returned bare arrays, `{status, data: [...]}`,
//! `{status, data: {...}}` and bare single objects for "one record"
//! responses. [`ShapeNormalizer::normalize`] turns all of them into a flat
//! [`NormalizedCollection`] so callers never need to know which one occurred.
//!
//! This module also recognizes the envelope markers the backend uses to
//! declare success or failure explicitly.

use crate::alias;
use crate::types::{NormalizedCollection, RawRecord};
use serde_json::Value;
use std::collections::BTreeSet;
use thiserror::Error;

/// A well-formed JSON value that could not be interpreted as a collection
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ShapeError {
    /// An array that should hold records contains a non-object element
    #[error("element {index} of the record list is a {kind}, not an object")]
    NonObjectElement { index: usize, kind: &'static str },

    /// No recognized shape matched
    #[error("unrecognized response shape ({kind})")]
    Unrecognized { kind: &'static str },
}

/// Converts parsed JSON values into flat record collections
#[derive(Debug, Clone)]
pub struct ShapeNormalizer {
    candidate_keys: BTreeSet<&'static str>,
}

impl ShapeNormalizer {
    /// Normalizer that treats keys from any registered alias table as record-like
    pub fn for_all_tables() -> Self {
        Self {
            candidate_keys: alias::candidate_keys(),
        }
    }

    pub fn with_candidate_keys(candidate_keys: BTreeSet<&'static str>) -> Self {
        Self { candidate_keys }
    }

    /// Normalize a parsed value
    ///
    /// Decision order:
    /// 1. Array → its elements (all must be objects)
    /// 2. Success envelope with `data` → `data` array, or `data` object wrapped
    /// 3. Record-like object (holds a known alias key) → wrapped
    /// 4. Object with exactly one array-valued property → that array
    /// 5. Otherwise → [`ShapeError`]
    pub fn normalize(&self, value: Value) -> Result<NormalizedCollection, ShapeError> {
        let mut object = match value {
            Value::Array(items) => return records_from_array(items),
            Value::Object(object) => object,
            other => {
                return Err(ShapeError::Unrecognized {
                    kind: kind_of(&other),
                })
            }
        };

        if object.get("status").is_some_and(is_success_marker) && object.contains_key("data") {
            match object.remove("data") {
                Some(Value::Array(items)) => return records_from_array(items),
                Some(Value::Object(record)) => return Ok(NormalizedCollection::new(vec![record])),
                Some(Value::Null) => return Ok(NormalizedCollection::default()),
                Some(other) => {
                    return Err(ShapeError::Unrecognized {
                        kind: kind_of(&other),
                    })
                }
                None => {}
            }
        }

        if self.is_record_like(&object) {
            return Ok(NormalizedCollection::new(vec![object]));
        }

        let mut array_keys = object
            .iter()
            .filter(|(_, value)| value.is_array())
            .map(|(key, _)| key.clone());
        if let (Some(key), None) = (array_keys.next(), array_keys.next()) {
            if let Some(Value::Array(items)) = object.remove(&key) {
                return records_from_array(items);
            }
        }

        Err(ShapeError::Unrecognized { kind: "object" })
    }

    fn is_record_like(&self, object: &RawRecord) -> bool {
        object
            .keys()
            .any(|key| self.candidate_keys.contains(key.as_str()))
    }
}

impl Default for ShapeNormalizer {
    fn default() -> Self {
        Self::for_all_tables()
    }
}

fn records_from_array(items: Vec<Value>) -> Result<NormalizedCollection, ShapeError> {
    let mut records = Vec::with_capacity(items.len());
    for (index, item) in items.into_iter().enumerate() {
        match item {
            Value::Object(record) => records.push(record),
            other => {
                return Err(ShapeError::NonObjectElement {
                    index,
                    kind: kind_of(&other),
                })
            }
        }
    }
    Ok(NormalizedCollection::new(records))
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

// ============================================================================
// Envelope markers
// ============================================================================

/// `"success"`, `"ok"`, `"true"`, `"1"` (any case), `true` or `1`
pub fn is_success_marker(value: &Value) -> bool {
    match value {
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_i64() == Some(1),
        Value::String(s) => matches!(
            s.trim().to_ascii_lowercase().as_str(),
            "success" | "ok" | "true" | "1"
        ),
        _ => false,
    }
}

/// `"error"`, `"fail"`, `"failed"`, `"failure"`, `"false"`, `"0"` (any case), `false` or `0`
pub fn is_failure_marker(value: &Value) -> bool {
    match value {
        Value::Bool(b) => !*b,
        Value::Number(n) => n.as_i64() == Some(0),
        Value::String(s) => matches!(
            s.trim().to_ascii_lowercase().as_str(),
            "error" | "fail" | "failed" | "failure" | "false" | "0"
        ),
        _ => false,
    }
}

/// Object carries an explicit success marker under `status` or `success`
pub fn is_success_envelope(value: &Value) -> bool {
    let Value::Object(object) = value else {
        return false;
    };
    object.get("status").is_some_and(is_success_marker)
        || object.get("success").is_some_and(is_success_marker)
}

/// Message of an explicit error envelope, or `None` if `value` is not one
///
/// An object is an error envelope when `status` or `success` holds a failure
/// marker, or when it carries a non-empty string `error` without a success
/// marker.
pub fn business_error(value: &Value) -> Option<String> {
    let Value::Object(object) = value else {
        return None;
    };

    let declared_failure = object.get("status").is_some_and(is_failure_marker)
        || object.get("success").is_some_and(is_failure_marker);
    let bare_error = !is_success_envelope(value)
        && object
            .get("error")
            .and_then(Value::as_str)
            .is_some_and(|s| !s.trim().is_empty());

    if !(declared_failure || bare_error) {
        return None;
    }

    Some(envelope_message(object).unwrap_or_else(|| "request failed".to_string()))
}

/// First non-empty message under `message`, `msg`, `error` or `errors`
pub fn envelope_message(object: &RawRecord) -> Option<String> {
    ["message", "msg", "error", "errors"]
        .iter()
        .filter_map(|key| object.get(*key))
        .find_map(|value| match value {
            Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
            Value::Array(items) if !items.is_empty() => Some(
                items
                    .iter()
                    .map(|item| match item {
                        Value::String(s) => s.clone(),
                        other => other.to_string(),
                    })
                    .collect::<Vec<_>>()
                    .join("; "),
            ),
            Value::Object(inner) => envelope_message(inner),
            _ => None,
        })
}
