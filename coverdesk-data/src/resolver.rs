//! Field resolution across historical key names
//!
//! All functions here are pure: identical inputs always yield identical output.

use crate::types::RawRecord;
use serde_json::Value;

/// First value present under `aliases` that is neither null nor an empty string
pub fn resolve_ref<'a>(record: &'a RawRecord, aliases: &[&str]) -> Option<&'a Value> {
    aliases
        .iter()
        .filter_map(|key| record.get(*key))
        .find(|value| is_present(value))
}

/// Resolve a canonical field's value, falling back to `default`
pub fn resolve(record: &RawRecord, aliases: &[&str], default: Value) -> Value {
    resolve_ref(record, aliases).cloned().unwrap_or(default)
}

/// Resolve a field and render it as display text
///
/// Strings are returned verbatim, numbers and booleans as their JSON text,
/// arrays and objects as compact JSON.
pub fn resolve_display(record: &RawRecord, aliases: &[&str], default: &str) -> String {
    match resolve_ref(record, aliases) {
        Some(value) => display_text(value),
        None => default.to_string(),
    }
}

fn is_present(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::String(s) => !s.is_empty(),
        _ => true,
    }
}

fn display_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
