//! Aggregates of a numeric field

use serde_json::{Map, Value};
use super::error::PluginError;
use super::params::{maybe_number, numeric_column, Params};
use super::{Plugin, PluginInput};

const KNOWN_STATS: [&str; 6] = ["min", "max", "mean", "sum", "count", "median"];

/// `statistical_summary`
///
/// Params: `field`, `stats` (subset of min, max, mean, sum, count, median;
/// default min/max/mean), optional `units`, `max_value`, `source`.
///
/// Nulls are ignored. With no values every requested stat is null (count 0).
#[derive(Debug, Clone, Copy, Default)]
pub struct StatisticalSummary;

impl Plugin for StatisticalSummary {
    fn name(&self) -> &'static str {
        "statistical_summary"
    }

    fn execute(&self, input: &PluginInput<'_>, params: &Map<String, Value>) -> Result<Value, PluginError> {
        let p = Params::new(self.name(), params);
        let field = p.required_str("field")?;
        let stats = p
            .optional_string_list("stats")?
            .unwrap_or_else(|| vec!["min".into(), "max".into(), "mean".into()]);
        if let Some(unknown) = stats.iter().find(|s| !KNOWN_STATS.contains(&s.as_str())) {
            return Err(p.error("stats", format!("unknown stat '{}'", unknown)));
        }
        let rows = input.source(self.name(), p.optional_str("source")?)?;
        let values = numeric_column(self.name(), rows, field)?;

        let mut out = Map::new();
        for stat in &stats {
            let value = match stat.as_str() {
                "count" => Value::from(values.len()),
                "min" => maybe_number(values.iter().copied().reduce(f64::min)),
                "max" => maybe_number(values.iter().copied().reduce(f64::max)),
                "sum" => maybe_number((!values.is_empty()).then(|| values.iter().sum())),
                "mean" => maybe_number(mean(&values)),
                _ => maybe_number(median(&values)),
            };
            out.insert(stat.clone(), value);
        }
        if let Some(units) = p.get("units") {
            out.insert("units".to_string(), units.clone());
        }
        if let Some(max_value) = p.get("max_value") {
            out.insert("max_value".to_string(), max_value.clone());
        }
        Ok(Value::Object(out))
    }
}

fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f64>() / values.len() as f64)
}

fn median(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);
    let mid = sorted.len() / 2;
    Some(if sorted.len() % 2 == 0 {
        (sorted[mid - 1] + sorted[mid]) / 2.0
    } else {
        sorted[mid]
    })
}
