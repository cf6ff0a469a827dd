#![forbid(unsafe_code)]

//! Conversion between [`Value`] and `serde_json` documents, used to load
//! fixtures and to compare store contents in tests.
//!
//! | JSON | Value |
//! |---|---|
//! | `null` | `Absent` |
//! | bool, number, string | `Bool`, `Number`, `Text` |
//! | array | `List` |
//! | object | `Map` |
//!
//! Checkpoint triples are written as `{"backward", "current", "forward"}`
//! objects and read back as plain maps.

use bindery_core::Value;
use serde_json::{Map, Number};

/// Convert a value to JSON. Non-finite numbers become `null`.
#[must_use]
pub fn to_json(value: &Value) -> serde_json::Value {
    match value {
        Value::Absent => serde_json::Value::Null,
        Value::Bool(b) => serde_json::Value::Bool(*b),
        Value::Number(n) => Number::from_f64(*n).map_or(serde_json::Value::Null, serde_json::Value::Number),
        Value::Text(s) => serde_json::Value::String(s.clone()),
        Value::List(items) => serde_json::Value::Array(items.iter().map(to_json).collect()),
        Value::Map(map) => serde_json::Value::Object(
            map.iter()
                .map(|(key, value)| (key.clone(), to_json(value)))
                .collect::<Map<_, _>>(),
        ),
        Value::Checkpoints(ids) => serde_json::to_value(ids).unwrap_or(serde_json::Value::Null),
    }
}

/// Convert JSON to a value.
#[must_use]
pub fn from_json(json: &serde_json::Value) -> Value {
    match json {
        serde_json::Value::Null => Value::Absent,
        serde_json::Value::Bool(b) => Value::Bool(*b),
        serde_json::Value::Number(n) => n.as_f64().map_or(Value::Absent, Value::Number),
        serde_json::Value::String(s) => Value::Text(s.clone()),
        serde_json::Value::Array(items) => Value::List(items.iter().map(from_json).collect()),
        serde_json::Value::Object(map) => Value::Map(
            map.iter()
                .map(|(key, value)| (key.clone(), from_json(value)))
                .collect(),
        ),
    }
}
