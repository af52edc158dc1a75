use super::*;
use serde_json::json;

#[test]
fn small_payload_is_unchanged() {
    let data = json!({ "a": 1, "b": "two" });
    let normalized = normalize_payload(&data, 16384);
    assert!(!normalized.truncated);
    assert_eq!(normalized.data, data);
    assert!(normalized.dropped_keys.is_empty());
}

#[test]
fn oversized_payload_drops_overflow_keys() {
    let mut map = serde_json::Map::new();
    for i in 0..50 {
        map.insert(format!("key{i:02}"), Value::String("x".repeat(50)));
    }
    let data = Value::Object(map);

    let normalized = normalize_payload(&data, 512);
    assert!(normalized.truncated);
    assert!(!normalized.dropped_keys.is_empty());
    assert!(estimate_size(&normalized.data) <= 512 + 64);
}

#[test]
fn kept_strings_are_clipped_at_256_bytes() {
    let mut map = serde_json::Map::new();
    map.insert("huge".to_string(), Value::String("x".repeat(1000)));
    let data = Value::Object(map);

    let normalized = normalize_payload(&data, 10);
    // Budget too small to keep anything, but verify clip logic directly
    // via a payload that does fit after clipping.
    assert!(normalized.dropped_keys.contains(&"huge".to_string()) || normalized.data.get("huge").is_none());

    let mut map2 = serde_json::Map::new();
    map2.insert("huge".to_string(), Value::String("x".repeat(1000)));
    let data2 = Value::Object(map2);
    let normalized2 = normalize_payload(&data2, 300);
    let kept = normalized2.data.get("huge").expect("kept despite oversized source string");
    assert_eq!(kept.as_str().unwrap().len(), 256);
}

#[test]
fn kept_arrays_are_capped_at_16_entries() {
    let mut map = serde_json::Map::new();
    let items: Vec<Value> = (0..40).map(Value::from).collect();
    map.insert("list".to_string(), Value::Array(items));
    // Force truncation path even though this alone is small, by padding.
    map.insert("pad".to_string(), Value::String("x".repeat(20000)));
    let data = Value::Object(map);

    let normalized = normalize_payload(&data, 200);
    if let Some(Value::Array(kept_list)) = normalized.data.get("list") {
        assert!(kept_list.len() <= 16);
    }
}

#[test]
fn non_object_data_is_returned_unchanged() {
    let data = json!([1, 2, 3]);
    let normalized = normalize_payload(&data, 1);
    assert!(!normalized.truncated);
    assert_eq!(normalized.data, data);
}
