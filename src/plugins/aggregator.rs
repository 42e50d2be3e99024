//! Assemble a document from chain outputs

use serde_json::{Map, Value};
use super::error::PluginError;
use super::params::Params;
use super::{Plugin, PluginInput};

/// `aggregator`: returns its `fields` mapping as the widget value.
///
/// Inside a chain the mapping has already had its `@key.path` references
/// substituted, so this composes earlier step outputs into one document.
#[derive(Debug, Clone, Copy, Default)]
pub struct Aggregator;

impl Plugin for Aggregator {
    fn name(&self) -> &'static str {
        "aggregator"
    }

    fn execute(&self, _input: &PluginInput<'_>, params: &Map<String, Value>) -> Result<Value, PluginError> {
        let p = Params::new(self.name(), params);
        Ok(Value::Object(p.required_object("fields")?.clone()))
    }
}
