use serde_json::Value;
use std::collections::BTreeMap;

/// Outputs of the completed steps of one chain execution
#[derive(Debug, Clone, Default)]
pub struct ChainContext {
    outputs: BTreeMap<String, Value>,
}

impl ChainContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a step output; a repeated key replaces the earlier value
    pub fn insert(&mut self, key: impl Into<String>, value: Value) {
        self.outputs.insert(key.into(), value);
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.outputs.get(key)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.outputs.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.outputs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.outputs.is_empty()
    }
}
