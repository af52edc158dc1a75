//! Payload size estimation, clipping, and truncation (spec §4.9).

use serde_json::{Map, Value};

const MAX_STRING_BYTES: usize = 256;
const MAX_CONTAINER_ENTRIES: usize = 16;

/// `size_of_serialized(data)`.
pub fn estimate_size(data: &Value) -> usize {
    serde_json::to_vec(data).map(|bytes| bytes.len()).unwrap_or(0)
}

/// Result of normalizing a broadcast payload against `max_payload_bytes`.
pub struct NormalizedPayload {
    pub data: Value,
    pub truncated: bool,
    pub dropped_keys: Vec<String>,
}

/// Normalize `data` (already validated as a JSON object) against the
/// `max_payload_bytes` budget.
pub fn normalize_payload(data: &Value, max_payload_bytes: usize) -> NormalizedPayload {
    let Value::Object(map) = data else {
        return NormalizedPayload {
            data: data.clone(),
            truncated: false,
            dropped_keys: Vec::new(),
        };
    };

    if estimate_size(data) <= max_payload_bytes {
        return NormalizedPayload {
            data: data.clone(),
            truncated: false,
            dropped_keys: Vec::new(),
        };
    }

    let mut keys: Vec<&String> = map.keys().collect();
    keys.sort();

    let mut kept = Map::new();
    let mut dropped_keys = Vec::new();
    let mut running_size = estimate_size(&Value::Object(Map::new()));

    for key in keys {
        let clipped = clip_value(&map[key]);
        let entry_size = estimate_size(&clipped) + key.len() + 2;
        if running_size + entry_size <= max_payload_bytes {
            running_size += entry_size;
            kept.insert(key.clone(), clipped);
        } else {
            dropped_keys.push(key.clone());
        }
    }

    NormalizedPayload {
        data: Value::Object(kept),
        truncated: true,
        dropped_keys,
    }
}

fn clip_value(value: &Value) -> Value {
    match value {
        Value::String(s) => Value::String(clip_string(s)),
        Value::Array(items) => Value::Array(
            items
                .iter()
                .take(MAX_CONTAINER_ENTRIES)
                .map(clip_value)
                .collect(),
        ),
        Value::Object(map) => {
            let mut keys: Vec<&String> = map.keys().collect();
            keys.sort();
            let mut out = Map::new();
            for key in keys.into_iter().take(MAX_CONTAINER_ENTRIES) {
                out.insert(key.clone(), clip_value(&map[key]));
            }
            Value::Object(out)
        }
        other => other.clone(),
    }
}

fn clip_string(s: &str) -> String {
    if s.len() <= MAX_STRING_BYTES {
        return s.to_string();
    }
    let mut end = MAX_STRING_BYTES;
    while !s.is_char_boundary(end) {
        end -= 1;
    }
    s[..end].to_string()
}

#[cfg(test)]
#[path = "payload_tests.rs"]
mod tests;
