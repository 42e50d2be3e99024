//! Counts of a numeric field per half-open bin

use serde_json::{json, Map, Value};
use super::error::PluginError;
use super::params::{numeric_column, percentages, Params};
use super::{Plugin, PluginInput};

/// `binned_distribution`
///
/// Params: `field`, `bins` (strictly ascending boundaries), optional `labels`
/// (one per bin), `include_percentages` (default false) and `source`.
///
/// Bin `i` is `[bins[i], bins[i+1])`. Values below the first boundary or at or
/// above the last one fall in no bin.
#[derive(Debug, Clone, Copy, Default)]
pub struct BinnedDistribution;

impl Plugin for BinnedDistribution {
    fn name(&self) -> &'static str {
        "binned_distribution"
    }

    fn execute(&self, input: &PluginInput<'_>, params: &Map<String, Value>) -> Result<Value, PluginError> {
        let p = Params::new(self.name(), params);
        let field = p.required_str("field")?;
        let bins = p.number_list("bins")?;
        if bins.len() < 2 {
            return Err(p.error("bins", "needs at least two boundaries"));
        }
        if !bins.windows(2).all(|w| w[0] < w[1]) {
            return Err(p.error("bins", "boundaries must be strictly ascending"));
        }
        let labels = match p.optional_string_list("labels")? {
            Some(labels) if labels.len() != bins.len() - 1 => {
                return Err(p.error("labels", format!("expected {} labels", bins.len() - 1)));
            }
            Some(labels) => labels,
            None => bins.windows(2).map(|w| format!("{}-{}", w[0], w[1])).collect(),
        };
        let include_percentages = p.bool_or("include_percentages", false)?;
        let rows = input.source(self.name(), p.optional_str("source")?)?;

        let last = bins[bins.len() - 1];
        let mut counts = vec![0u64; bins.len() - 1];
        for value in numeric_column(self.name(), rows, field)? {
            if value < bins[0] || value >= last {
                continue;
            }
            // Number of boundaries <= value, minus one, is the bin index
            let bin = bins
                .partition_point(|&b| b <= value)
                .checked_sub(1)
                .filter(|&bin| bin < counts.len())
                .ok_or_else(|| PluginError::data(self.name(), format!("value {} fits no bin", value)))?;
            counts[bin] += 1;
        }

        let mut out = json!({
            "bins": p.required("bins")?.clone(),
            "labels": labels,
            "counts": counts,
        });
        if include_percentages {
            out["percentages"] = json!(percentages(&counts));
        }
        Ok(out)
    }
}
