//! Monthly counts of flagged observations

use serde_json::{json, Map, Value};
use super::error::PluginError;
use super::params::{column, Params};
use super::{Plugin, PluginInput};

const MONTHS: [&str; 12] = [
    "Jan", "Feb", "Mar", "Apr", "May", "Jun", "Jul", "Aug", "Sep", "Oct", "Nov", "Dec",
];

/// `time_series_analysis`
///
/// Params: `time_field` (a month 1-12 or an ISO date), `fields` mapping an
/// output label to a column, `source`. For each label, counts the rows per
/// month whose column is `true` or a positive number. Rows without a readable
/// month are skipped.
#[derive(Debug, Clone, Copy, Default)]
pub struct TimeSeriesAnalysis;

impl Plugin for TimeSeriesAnalysis {
    fn name(&self) -> &'static str {
        "time_series_analysis"
    }

    fn execute(&self, input: &PluginInput<'_>, params: &Map<String, Value>) -> Result<Value, PluginError> {
        let p = Params::new(self.name(), params);
        let time_field = p.required_str("time_field")?;
        let fields = p.required_object("fields")?;
        let rows = input.source(self.name(), p.optional_str("source")?)?;

        let months: Vec<Option<usize>> = column(self.name(), rows, time_field)?.map(month_of).collect();

        let mut month_data = Map::new();
        for (label, field) in fields {
            let field = field
                .as_str()
                .ok_or_else(|| p.error("fields", format!("column for '{}' must be a string", label)))?;
            let mut counts = [0u64; 12];
            for (month, value) in months.iter().zip(column(self.name(), rows, field)?) {
                if let Some(m) = month {
                    if is_flagged(value) {
                        counts[*m] += 1;
                    }
                }
            }
            month_data.insert(label.clone(), json!(counts));
        }

        Ok(json!({ "labels": MONTHS, "month_data": month_data }))
    }
}

/// Zero-based month of a cell
fn month_of(value: &Value) -> Option<usize> {
    let month = match value {
        Value::Number(n) => n.as_f64().filter(|f| f.fract() == 0.0).map(|f| f as i64)?,
        Value::String(s) => {
            let s = s.trim();
            match s.parse::<i64>() {
                Ok(m) => m,
                // YYYY-MM[-DD...]
                Err(_) => s.get(5..7)?.parse::<i64>().ok()?,
            }
        }
        _ => return None,
    };
    (1..=12).contains(&month).then(|| (month - 1) as usize)
}

fn is_flagged(value: &Value) -> bool {
    match value {
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f > 0.0),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plugins::test_support::run;
    use crate::table::Table;

    #[test]
    fn test_month_of() {
        assert_eq!(month_of(&json!(3)), Some(2));
        assert_eq!(month_of(&json!("2021-11-04")), Some(10));
        assert_eq!(month_of(&json!("12")), Some(11));
        assert_eq!(month_of(&json!(13)), None);
        assert_eq!(month_of(&json!(null)), None);
    }

    #[test]
    fn test_monthly_counts() {
        let table = Table::from_rows(
            "occurrences",
            &["month", "flower", "fruit"],
            vec![
                vec![json!(1), json!(true), json!(0)],
                vec![json!("2020-01-15"), json!(1), json!(2)],
                vec![json!(3), json!(false), json!(1)],
                vec![json!(null), json!(true), json!(true)],
            ],
        );
        let out = run(
            &TimeSeriesAnalysis,
            &table,
            json!({"time_field": "month", "fields": {"fleur": "flower", "fruit": "fruit"}}),
        )
        .unwrap();
        assert_eq!(out["labels"][0], json!("Jan"));
        assert_eq!(out["month_data"]["fleur"], json!([2, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0]));
        assert_eq!(out["month_data"]["fruit"], json!([1, 0, 1, 0, 0, 0, 0, 0, 0, 0, 0, 0]));
    }
}
