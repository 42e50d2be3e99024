//! Two-bucket count of a boolean field

use serde_json::{json, Map, Value};
use super::error::PluginError;
use super::params::{column, percentages, Params};
use super::{Plugin, PluginInput};

/// `binary_counter`
///
/// Params: `field`, `true_label` (default "true"), `false_label` (default
/// "false"), `include_percentages` (default false), `source`.
///
/// Only JSON booleans are counted; nulls, numbers and strings are skipped.
#[derive(Debug, Clone, Copy, Default)]
pub struct BinaryCounter;

impl Plugin for BinaryCounter {
    fn name(&self) -> &'static str {
        "binary_counter"
    }

    fn execute(&self, input: &PluginInput<'_>, params: &Map<String, Value>) -> Result<Value, PluginError> {
        let p = Params::new(self.name(), params);
        let field = p.required_str("field")?;
        let true_label = p.optional_str("true_label")?.unwrap_or("true");
        let false_label = p.optional_str("false_label")?.unwrap_or("false");
        let include_percentages = p.bool_or("include_percentages", false)?;
        let rows = input.source(self.name(), p.optional_str("source")?)?;

        let mut counts = [0u64; 2];
        for value in column(self.name(), rows, field)? {
            match value {
                Value::Bool(true) => counts[0] += 1,
                Value::Bool(false) => counts[1] += 1,
                _ => {}
            }
        }

        let mut out = json!({
            "labels": [true_label, false_label],
            "counts": counts,
        });
        if include_percentages {
            out["percentages"] = json!(percentages(&counts));
        }
        Ok(out)
    }
}
