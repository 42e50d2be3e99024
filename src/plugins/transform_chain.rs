//! Ordered pipelines of plugins sharing a context

use serde::Deserialize;
use serde_json::{Map, Value};
use tracing::trace;
use crate::reference::ChainContext;
use super::error::PluginError;
use super::params::Params;
use super::{Plugin, PluginInput};

/// Name the chain plugin is registered under
pub const CHAIN_PLUGIN: &str = "transform_chain";

/// One step of a chain
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ChainStep {
    pub plugin: String,
    #[serde(default)]
    pub params: Map<String, Value>,
    /// Key under which later steps can reference this step's result
    pub output_key: String,
}

/// `transform_chain`
///
/// Params: `steps`, a list of `{plugin, params, output_key}`. Steps run in
/// order over the same group input; each result is stored under its
/// `output_key` and later steps may reference it as `@output_key.path`. The
/// widget value is the result of the last step. A failing step fails the
/// whole chain.
#[derive(Debug, Clone, Copy, Default)]
pub struct TransformChain;

impl TransformChain {
    fn steps(p: &Params<'_>) -> Result<Vec<ChainStep>, PluginError> {
        let steps = p.required_array("steps")?;
        if steps.is_empty() {
            return Err(p.error("steps", "a chain needs at least one step"));
        }
        steps
            .iter()
            .enumerate()
            .map(|(i, step)| {
                ChainStep::deserialize(step).map_err(|e| p.error("steps", format!("step {}: {}", i, e)))
            })
            .collect()
    }
}

impl Plugin for TransformChain {
    fn name(&self) -> &'static str {
        CHAIN_PLUGIN
    }

    fn execute(&self, input: &PluginInput<'_>, params: &Map<String, Value>) -> Result<Value, PluginError> {
        let p = Params::new(self.name(), params);
        let steps = Self::steps(&p)?;

        let mut context = ChainContext::new();
        let mut last = Value::Null;
        for step in &steps {
            trace!(group = input.group_id, step = %step.output_key, plugin = %step.plugin, "chain step");
            let result = input
                .plugins
                .execute(&step.plugin, input, &step.params, Some(&context))
                .map_err(|e| e.with_context(&format!("step '{}'", step.output_key)))?;
            context.insert(step.output_key.clone(), result.clone());
            last = result;
        }
        Ok(last)
    }

    fn nested(&self, params: &Map<String, Value>) -> Vec<(String, Map<String, Value>)> {
        let p = Params::new(self.name(), params);
        Self::steps(&p)
            .map(|steps| steps.into_iter().map(|s| (s.plugin, s.params)).collect())
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plugins::test_support::{column_table, run};
    use serde_json::json;

    #[test]
    fn test_steps_see_earlier_outputs() {
        let table = column_table("dbh", vec![json!(5), json!(15), json!(25), json!(35)]);
        let out = run(
            &TransformChain,
            &table,
            json!({"steps": [
                {"plugin": "binned_distribution", "params": {"field": "dbh", "bins": [0, 20, 40]}, "output_key": "dist"},
                {"plugin": "custom_formula", "params": {"expression": {"multiply": ["@dist.counts", 10]}}, "output_key": "scaled"},
                {"plugin": "aggregator", "params": {"fields": {"labels": "@dist.labels", "values": "@scaled", "tag": "@@raw"}}, "output_key": "doc"}
            ]}),
        )
        .unwrap();
        assert_eq!(out, json!({"labels": ["0-20", "20-40"], "values": [20.0, 20.0], "tag": "@raw"}));
    }

    #[test]
    fn test_failures() {
        let table = column_table("dbh", vec![json!(1)]);
        let err = run(&TransformChain, &table, json!({"steps": []})).unwrap_err();
        assert!(matches!(err, PluginError::Param { .. }));

        let err = run(
            &TransformChain,
            &table,
            json!({"steps": [{"plugin": "aggregator", "params": {"fields": {"x": "@missing.a"}}, "output_key": "a"}]}),
        )
        .unwrap_err();
        assert!(matches!(err, PluginError::Reference(_)));

        let err = run(
            &TransformChain,
            &table,
            json!({"steps": [{"plugin": "statistical_summary", "params": {"field": "nope"}, "output_key": "s"}]}),
        )
        .unwrap_err();
        assert!(matches!(&err, PluginError::Data { message, .. } if message.starts_with("step 's'")));
    }
}
