//! Typed access to open plugin params and numeric cell helpers

use serde_json::{Map, Value};
use crate::table::RowSet;
use super::error::PluginError;

/// Read-only view of a plugin's params that reports errors under its name
#[derive(Debug, Clone, Copy)]
pub(crate) struct Params<'a> {
    plugin: &'static str,
    map: &'a Map<String, Value>,
}

impl<'a> Params<'a> {
    pub fn new(plugin: &'static str, map: &'a Map<String, Value>) -> Self {
        Self { plugin, map }
    }

    pub fn plugin(&self) -> &'static str {
        self.plugin
    }

    pub fn error(&self, key: &str, message: impl Into<String>) -> PluginError {
        PluginError::param(self.plugin, key, message)
    }

    pub fn get(&self, key: &str) -> Option<&'a Value> {
        self.map.get(key).filter(|v| !v.is_null())
    }

    pub fn required(&self, key: &str) -> Result<&'a Value, PluginError> {
        self.get(key).ok_or_else(|| self.error(key, "missing"))
    }

    pub fn required_str(&self, key: &str) -> Result<&'a str, PluginError> {
        self.required(key)?
            .as_str()
            .ok_or_else(|| self.error(key, "expected a string"))
    }

    pub fn optional_str(&self, key: &str) -> Result<Option<&'a str>, PluginError> {
        match self.get(key) {
            None => Ok(None),
            Some(v) => v.as_str().map(Some).ok_or_else(|| self.error(key, "expected a string")),
        }
    }

    pub fn bool_or(&self, key: &str, default: bool) -> Result<bool, PluginError> {
        match self.get(key) {
            None => Ok(default),
            Some(v) => v.as_bool().ok_or_else(|| self.error(key, "expected a boolean")),
        }
    }

    pub fn usize_or(&self, key: &str, default: usize) -> Result<usize, PluginError> {
        match self.get(key) {
            None => Ok(default),
            Some(v) => v
                .as_u64()
                .and_then(|n| usize::try_from(n).ok())
                .ok_or_else(|| self.error(key, "expected a non-negative integer")),
        }
    }

    pub fn required_array(&self, key: &str) -> Result<&'a Vec<Value>, PluginError> {
        self.required(key)?
            .as_array()
            .ok_or_else(|| self.error(key, "expected a list"))
    }

    pub fn required_object(&self, key: &str) -> Result<&'a Map<String, Value>, PluginError> {
        self.required(key)?
            .as_object()
            .ok_or_else(|| self.error(key, "expected a mapping"))
    }

    pub fn number_list(&self, key: &str) -> Result<Vec<f64>, PluginError> {
        self.required_array(key)?
            .iter()
            .map(|v| v.as_f64().ok_or_else(|| self.error(key, "expected a list of numbers")))
            .collect()
    }

    pub fn string_list(&self, key: &str) -> Result<Vec<String>, PluginError> {
        self.required_array(key)?
            .iter()
            .map(|v| {
                v.as_str()
                    .map(str::to_string)
                    .ok_or_else(|| self.error(key, "expected a list of strings"))
            })
            .collect()
    }

    pub fn optional_string_list(&self, key: &str) -> Result<Option<Vec<String>>, PluginError> {
        match self.get(key) {
            None => Ok(None),
            Some(_) => self.string_list(key).map(Some),
        }
    }
}

/// Numeric reading of a cell: null is `None`, numbers and numeric strings
/// are values, anything else is a data error.
///
/// Strings are trimmed before parsing (`" 3 "` reads as 3). Strings naming a
/// non-finite value (`"NaN"`, `"inf"`) are data errors.
pub(crate) fn numeric(plugin: &str, field: &str, value: &Value) -> Result<Option<f64>, PluginError> {
    match value {
        Value::Null => Ok(None),
        Value::Number(n) => Ok(n.as_f64()),
        Value::String(s) => s
            .trim()
            .parse::<f64>()
            .ok()
            .filter(|v| v.is_finite())
            .map(Some)
            .ok_or_else(|| {
                PluginError::data(plugin, format!("non-numeric value {:?} in field '{}'", s, field))
            }),
        other => Err(PluginError::data(
            plugin,
            format!("non-numeric value {} in field '{}'", other, field),
        )),
    }
}

/// Cells of a column, or a data error when the column does not exist
pub(crate) fn column<'r, 'a: 'r>(
    plugin: &str,
    rows: &'r RowSet<'a>,
    field: &str,
) -> Result<impl Iterator<Item = &'a Value> + 'r, PluginError> {
    rows.column(field).ok_or_else(|| {
        PluginError::data(
            plugin,
            format!("field '{}' not found in '{}'", field, rows.table().name()),
        )
    })
}

/// Non-null numeric values of a column, in row order
pub(crate) fn numeric_column(plugin: &str, rows: &RowSet<'_>, field: &str) -> Result<Vec<f64>, PluginError> {
    let mut values = Vec::with_capacity(rows.len());
    for cell in column(plugin, rows, field)? {
        if let Some(v) = numeric(plugin, field, cell)? {
            values.push(v);
        }
    }
    Ok(values)
}

/// Round to a number of decimals
pub(crate) fn round_to(value: f64, decimals: u32) -> f64 {
    let factor = 10f64.powi(decimals as i32);
    (value * factor).round() / factor
}

/// Share of each count in their total, as percentages with 2 decimals
pub(crate) fn percentages(counts: &[u64]) -> Vec<f64> {
    let total: u64 = counts.iter().sum();
    counts
        .iter()
        .map(|&c| {
            if total == 0 {
                0.0
            } else {
                round_to(c as f64 / total as f64 * 100.0, 2)
            }
        })
        .collect()
}

/// JSON number, or null for NaN and infinities
pub(crate) fn number(value: f64) -> Value {
    serde_json::Number::from_f64(value)
        .map(Value::Number)
        .unwrap_or(Value::Null)
}

/// JSON number from an optional value
pub(crate) fn maybe_number(value: Option<f64>) -> Value {
    value.map(number).unwrap_or(Value::Null)
}

/// Human label for a scalar category value
pub(crate) fn label_of(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => crate::table::category_key(other).unwrap_or_else(|| other.to_string()),
    }
}
