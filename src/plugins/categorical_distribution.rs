//! Counts of a categorical field in a declared category order

use serde_json::{json, Map, Value};
use crate::table::scalars_equal;
use super::error::PluginError;
use super::params::{column, label_of, percentages, Params};
use super::{Plugin, PluginInput};

/// `categorical_distribution`
///
/// Params: `field`, `categories`, optional parallel `labels`,
/// `include_percentages` (default false), `other_label` and `source`.
///
/// Values matching no category are dropped unless `other_label` is set, in
/// which case they are counted in a trailing bucket with that label.
#[derive(Debug, Clone, Copy, Default)]
pub struct CategoricalDistribution;

impl Plugin for CategoricalDistribution {
    fn name(&self) -> &'static str {
        "categorical_distribution"
    }

    fn execute(&self, input: &PluginInput<'_>, params: &Map<String, Value>) -> Result<Value, PluginError> {
        let p = Params::new(self.name(), params);
        let field = p.required_str("field")?;
        let categories = p.required_array("categories")?;
        let mut labels = match p.optional_string_list("labels")? {
            Some(labels) if labels.len() != categories.len() => {
                return Err(p.error("labels", "must have one label per category"));
            }
            Some(labels) => labels,
            None => categories.iter().map(label_of).collect(),
        };
        let other_label = p.optional_str("other_label")?;
        let include_percentages = p.bool_or("include_percentages", false)?;
        let rows = input.source(self.name(), p.optional_str("source")?)?;

        let mut counts = vec![0u64; categories.len()];
        let mut other = 0u64;
        for value in column(self.name(), rows, field)?.filter(|v| !v.is_null()) {
            match categories.iter().position(|c| scalars_equal(c, value)) {
                Some(i) => counts[i] += 1,
                None => other += 1,
            }
        }

        let mut categories = categories.clone();
        if let Some(label) = other_label {
            counts.push(other);
            labels.push(label.to_string());
            categories.push(Value::Null);
        }

        let mut out = json!({
            "categories": categories,
            "labels": labels,
            "counts": counts,
        });
        if include_percentages {
            out["percentages"] = json!(percentages(&counts));
        }
        Ok(out)
    }
}
