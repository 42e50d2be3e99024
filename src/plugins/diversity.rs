//! Diversity indices over a categorical field

use serde_json::{Map, Value};
use std::collections::HashMap;
use crate::table::category_key;
use super::error::PluginError;
use super::params::{column, maybe_number, Params};
use super::{Plugin, PluginInput};

/// Per-category counts of `field`, in first-seen order
fn abundances(plugin: &'static str, input: &PluginInput<'_>, params: &Map<String, Value>) -> Result<Vec<u64>, PluginError> {
    let p = Params::new(plugin, params);
    let field = p.required_str("field")?;
    let rows = input.source(plugin, p.optional_str("source")?)?;

    let mut slots: HashMap<String, usize> = HashMap::new();
    let mut counts = Vec::new();
    for value in column(plugin, rows, field)? {
        let Some(key) = category_key(value) else { continue };
        let slot = *slots.entry(key).or_insert_with(|| {
            counts.push(0);
            counts.len() - 1
        });
        counts[slot] += 1;
    }
    Ok(counts)
}

/// Relative abundances, or `None` when nothing was counted
fn proportions(counts: &[u64]) -> Option<Vec<f64>> {
    let total: u64 = counts.iter().sum();
    (total > 0).then(|| counts.iter().map(|&c| c as f64 / total as f64).collect())
}

fn shannon_index(counts: &[u64]) -> Option<f64> {
    let p = proportions(counts)?;
    let h = -p.iter().filter(|&&x| x > 0.0).map(|&x| x * x.ln()).sum::<f64>();
    // normalise -0.0
    Some(h + 0.0)
}

/// `shannon`: `-Σ pᵢ ln pᵢ` over the categories of `field`
#[derive(Debug, Clone, Copy, Default)]
pub struct Shannon;

impl Plugin for Shannon {
    fn name(&self) -> &'static str {
        "shannon"
    }

    fn execute(&self, input: &PluginInput<'_>, params: &Map<String, Value>) -> Result<Value, PluginError> {
        let counts = abundances(self.name(), input, params)?;
        Ok(maybe_number(shannon_index(&counts)))
    }
}

/// `pielou`: Shannon evenness `H' / ln S`; null with fewer than two categories
#[derive(Debug, Clone, Copy, Default)]
pub struct Pielou;

impl Plugin for Pielou {
    fn name(&self) -> &'static str {
        "pielou"
    }

    fn execute(&self, input: &PluginInput<'_>, params: &Map<String, Value>) -> Result<Value, PluginError> {
        let counts = abundances(self.name(), input, params)?;
        if counts.len() < 2 {
            return Ok(Value::Null);
        }
        Ok(maybe_number(shannon_index(&counts).map(|h| h / (counts.len() as f64).ln())))
    }
}

/// `simpson`: Gini-Simpson `1 - Σ pᵢ²`
#[derive(Debug, Clone, Copy, Default)]
pub struct Simpson;

impl Plugin for Simpson {
    fn name(&self) -> &'static str {
        "simpson"
    }

    fn execute(&self, input: &PluginInput<'_>, params: &Map<String, Value>) -> Result<Value, PluginError> {
        let counts = abundances(self.name(), input, params)?;
        let index = proportions(&counts).map(|p| 1.0 - p.iter().map(|x| x * x).sum::<f64>());
        Ok(maybe_number(index))
    }
}

/// `species_richness`: number of distinct categories
#[derive(Debug, Clone, Copy, Default)]
pub struct SpeciesRichness;

impl Plugin for SpeciesRichness {
    fn name(&self) -> &'static str {
        "species_richness"
    }

    fn execute(&self, input: &PluginInput<'_>, params: &Map<String, Value>) -> Result<Value, PluginError> {
        let counts = abundances(self.name(), input, params)?;
        Ok(Value::from(counts.len()))
    }
}
