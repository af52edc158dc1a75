//! Layered configuration with deep-merge precedence (spec §6):
//! call options > session options > process-wide config > built-in
//! defaults.

use serde_json::Value;

/// A JSON-shaped configuration layer. Layers are merged with
/// [`Config::merge`], highest-precedence layer last.
#[derive(Debug, Clone, Default)]
pub struct Config(Value);

impl Config {
    pub fn new(value: Value) -> Self {
        Self(value)
    }

    pub fn empty() -> Self {
        Self(Value::Object(serde_json::Map::new()))
    }

    pub fn as_value(&self) -> &Value {
        &self.0
    }

    pub fn get(&self, pointer: &str) -> Option<&Value> {
        self.0.pointer(pointer)
    }

    /// Merge `other` on top of `self`: object keys in `other` win, nested
    /// objects merge recursively, any other type (array, scalar) is a full
    /// replacement.
    pub fn merge(&self, other: &Config) -> Config {
        Config(deep_merge(self.0.clone(), other.0.clone()))
    }

    /// Resolve the effective config from layers listed lowest to highest
    /// precedence, per spec §6: `defaults < process < session < call`.
    pub fn resolve(layers: &[&Config]) -> Config {
        layers
            .iter()
            .fold(Config::empty(), |acc, layer| acc.merge(layer))
    }
}

fn deep_merge(base: Value, overlay: Value) -> Value {
    match (base, overlay) {
        (Value::Object(mut base_map), Value::Object(overlay_map)) => {
            for (k, v) in overlay_map {
                let merged = match base_map.remove(&k) {
                    Some(existing) => deep_merge(existing, v),
                    None => v,
                };
                base_map.insert(k, merged);
            }
            Value::Object(base_map)
        }
        (_, overlay) => overlay,
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
