//! Deterministic text encoding for logging and tests
//!
//! Objects are written with their keys sorted, independent of the field
//! order of the Rust type and of how `serde_json` was built, so equal values
//! always encode to equal text. Encoding never fails loudly: values that
//! cannot be encoded yield `None` and a warning.

use serde::Serialize;
use serde::ser::{SerializeMap, SerializeSeq, Serializer};
use serde_json::Value;

/// Encode `value` as compact JSON with sorted keys
pub fn encode<T: Serialize + ?Sized>(value: &T) -> Option<String> {
    let value = to_value(value)?;
    serde_json::to_string(&Canonical(&value))
        .map_err(|e| log::warn!("Failed to encode value: {}", e))
        .ok()
}

/// Encode `value` as indented JSON with sorted keys
pub fn encode_pretty<T: Serialize + ?Sized>(value: &T) -> Option<String> {
    let value = to_value(value)?;
    serde_json::to_string_pretty(&Canonical(&value))
        .map_err(|e| log::warn!("Failed to encode value: {}", e))
        .ok()
}

/// Convert `value` into a JSON value tree
pub fn to_value<T: Serialize + ?Sized>(value: &T) -> Option<Value> {
    serde_json::to_value(value)
        .map_err(|e| log::warn!("Failed to encode value: {}", e))
        .ok()
}

/// Serializes a JSON value with object keys in sorted order
pub(crate) struct Canonical<'a>(pub(crate) &'a Value);

impl Serialize for Canonical<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self.0 {
            Value::Object(map) => {
                let mut entries: Vec<(&String, &Value)> = map.iter().collect();
                entries.sort_unstable_by(|a, b| a.0.cmp(b.0));
                let mut out = serializer.serialize_map(Some(entries.len()))?;
                for (key, value) in entries {
                    out.serialize_entry(key, &Canonical(value))?;
                }
                out.end()
            }
            Value::Array(items) => {
                let mut out = serializer.serialize_seq(Some(items.len()))?;
                for item in items {
                    out.serialize_element(&Canonical(item))?;
                }
                out.end()
            }
            other => other.serialize(serializer),
        }
    }
}
