//! Collect selected fields of a group into one document

use serde::Deserialize;
use serde_json::{json, Map, Value};
use super::error::PluginError;
use super::params::{column, maybe_number, numeric, Params};
use super::{Plugin, PluginInput};

#[derive(Debug, Clone, Copy, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
enum Transformation {
    #[default]
    Direct,
    Count,
    Sum,
    Mean,
    Min,
    Max,
}

#[derive(Debug, Deserialize)]
struct FieldEntry {
    field: String,
    target: String,
    source: Option<String>,
    #[serde(default)]
    transformation: Transformation,
    units: Option<Value>,
}

/// `field_aggregator`
///
/// Params: `fields`, a list of `{field, target, source?, transformation?, units?}`.
/// A `source` equal to the grouping entity reads the group's own reference row;
/// any other source names a block source. With `units`, the value is wrapped
/// as `{value, units}`.
#[derive(Debug, Clone, Copy, Default)]
pub struct FieldAggregator;

impl Plugin for FieldAggregator {
    fn name(&self) -> &'static str {
        "field_aggregator"
    }

    fn execute(&self, input: &PluginInput<'_>, params: &Map<String, Value>) -> Result<Value, PluginError> {
        let p = Params::new(self.name(), params);
        let entries: Vec<FieldEntry> = serde_json::from_value(p.required("fields")?.clone())
            .map_err(|e| p.error("fields", e.to_string()))?;

        let mut out = Map::new();
        for entry in &entries {
            let value = self.value_of(input, entry)?;
            let value = match &entry.units {
                Some(units) => json!({ "value": value, "units": units }),
                None => value,
            };
            out.insert(entry.target.clone(), value);
        }
        Ok(Value::Object(out))
    }
}

impl FieldAggregator {
    fn value_of(&self, input: &PluginInput<'_>, entry: &FieldEntry) -> Result<Value, PluginError> {
        let source = entry.source.as_deref();
        if source.is_some() && source == input.grouping {
            // the group's own reference row holds a single value per field
            let cell = input
                .group_row
                .and_then(|row| row.get(&entry.field))
                .cloned()
                .unwrap_or(Value::Null);
            return Ok(cell);
        }

        let rows = input.source(self.name(), source)?;
        let mut cells = column(self.name(), rows, &entry.field)?;
        if entry.transformation == Transformation::Direct {
            return Ok(cells.find(|v| !v.is_null()).cloned().unwrap_or(Value::Null));
        }
        if entry.transformation == Transformation::Count {
            return Ok(Value::from(cells.filter(|v| !v.is_null()).count()));
        }

        let mut values = Vec::new();
        for cell in cells {
            if let Some(v) = numeric(self.name(), &entry.field, cell)? {
                values.push(v);
            }
        }
        let result = match entry.transformation {
            Transformation::Sum => (!values.is_empty()).then(|| values.iter().sum()),
            Transformation::Mean => {
                (!values.is_empty()).then(|| values.iter().sum::<f64>() / values.len() as f64)
            }
            Transformation::Min => values.iter().copied().reduce(f64::min),
            _ => values.iter().copied().reduce(f64::max),
        };
        Ok(maybe_number(result))
    }
}
