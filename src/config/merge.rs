//! Configuration merge logic
//!
//! Layers are flat JSON objects applied in order; the last layer that sets
//! a key wins, and the winner's origin is recorded per key.

use std::collections::BTreeMap;

use serde_json::{Map, Value};

use super::effective::ConfigOrigin;

/// One layer of settings and where it came from
#[derive(Debug, Clone)]
pub struct Layer {
    pub origin: ConfigOrigin,
    pub values: Map<String, Value>,
}

impl Layer {
    pub fn new(origin: ConfigOrigin, values: Map<String, Value>) -> Self {
        Self { origin, values }
    }
}

/// Merge layers (first is base, last has highest precedence)
///
/// Null values do not override.
pub fn merge_layers(layers: &[Layer]) -> (Map<String, Value>, BTreeMap<String, ConfigOrigin>) {
    let mut merged = Map::new();
    let mut origins = BTreeMap::new();

    for layer in layers {
        for (key, value) in &layer.values {
            if value.is_null() {
                continue;
            }
            merged.insert(key.clone(), value.clone());
            origins.insert(key.clone(), layer.origin);
        }
    }

    (merged, origins)
}
