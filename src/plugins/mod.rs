//! Plugin registry and executor (verb module)
//!
//! A plugin is a named, pure computation turning a group's rows plus params
//! into one JSON value for one widget. The registry is an explicit object
//! built once per run; nothing here is global.
//!
//! Built-in plugins:
//! - distributions: `binned_distribution`, `categorical_distribution`, `binary_counter`
//! - summaries: `statistical_summary`, `top_ranking`, `field_aggregator`, `time_series_analysis`
//! - diversity: `shannon`, `pielou`, `simpson`, `species_richness`
//! - composition: `transform_chain`, `custom_formula`, `aggregator`

mod aggregator;
mod binary_counter;
mod binned_distribution;
mod categorical_distribution;
mod custom_formula;
mod diversity;
mod error;
mod field_aggregator;
mod params;
mod statistical_summary;
mod time_series;
mod top_ranking;
mod transform_chain;

use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::fmt;
use crate::reference::{self, ChainContext};
use crate::registry::EntityRegistry;
use crate::table::{RowRef, RowSet};

pub use aggregator::Aggregator;
pub use binary_counter::BinaryCounter;
pub use binned_distribution::BinnedDistribution;
pub use categorical_distribution::CategoricalDistribution;
pub use custom_formula::{CustomFormula, FormulaArg, FormulaNode};
pub use diversity::{Pielou, Shannon, Simpson, SpeciesRichness};
pub use error::PluginError;
pub use field_aggregator::FieldAggregator;
pub use statistical_summary::StatisticalSummary;
pub use time_series::TimeSeriesAnalysis;
pub use top_ranking::TopRanking;
pub use transform_chain::{ChainStep, TransformChain, CHAIN_PLUGIN};

/// A named statistic computed from a group's rows
pub trait Plugin: Send + Sync {
    fn name(&self) -> &'static str;

    /// Compute the widget value. Must be deterministic in `(input, params)`.
    fn execute(&self, input: &PluginInput<'_>, params: &Map<String, Value>) -> Result<Value, PluginError>;

    /// Plugins invoked from inside `params`, with their own params
    fn nested(&self, _params: &Map<String, Value>) -> Vec<(String, Map<String, Value>)> {
        Vec::new()
    }
}

/// Everything a plugin may read for one group
#[derive(Clone)]
pub struct PluginInput<'a> {
    pub dimension: &'a str,
    pub group_id: &'a str,
    /// Rows of the primary source
    pub rows: RowSet<'a>,
    /// Rows of every named source, primary included
    pub sources: BTreeMap<&'a str, RowSet<'a>>,
    /// Name of the entity defining the groups
    pub grouping: Option<&'a str>,
    /// The group's own reference row
    pub group_row: Option<RowRef<'a>>,
    /// Read-only lookups beyond the group's rows
    pub entities: &'a EntityRegistry,
    pub plugins: &'a PluginRegistry,
}

impl<'a> PluginInput<'a> {
    /// Input over a bare row-set, outside any dimension
    pub fn new(rows: RowSet<'a>, entities: &'a EntityRegistry, plugins: &'a PluginRegistry) -> Self {
        Self {
            dimension: "",
            group_id: "",
            rows,
            sources: BTreeMap::new(),
            grouping: None,
            group_row: None,
            entities,
            plugins,
        }
    }

    /// Add a named source
    pub fn with_source(mut self, name: &'a str, rows: RowSet<'a>) -> Self {
        self.sources.insert(name, rows);
        self
    }

    /// Attach the group identity and its reference row
    pub fn with_group(
        mut self,
        dimension: &'a str,
        group_id: &'a str,
        grouping: &'a str,
        group_row: Option<RowRef<'a>>,
    ) -> Self {
        self.dimension = dimension;
        self.group_id = group_id;
        self.grouping = Some(grouping);
        self.group_row = group_row;
        self
    }

    /// Rows of a named source, or the primary rows when `name` is `None`
    pub fn source(&self, plugin: &str, name: Option<&str>) -> Result<&RowSet<'a>, PluginError> {
        match name {
            None => Ok(&self.rows),
            Some(name) => self
                .sources
                .get(name)
                .ok_or_else(|| PluginError::param(plugin, "source", format!("unknown source '{}'", name))),
        }
    }
}

impl fmt::Debug for PluginInput<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PluginInput")
            .field("dimension", &self.dimension)
            .field("group_id", &self.group_id)
            .field("rows", &self.rows.len())
            .field("sources", &self.sources.keys().collect::<Vec<_>>())
            .finish()
    }
}

/// Adapter registering a closure as a plugin
struct FnPlugin<F> {
    name: &'static str,
    f: F,
}

impl<F> Plugin for FnPlugin<F>
where
    F: Fn(&PluginInput<'_>, &Map<String, Value>) -> Result<Value, PluginError> + Send + Sync,
{
    fn name(&self) -> &'static str {
        self.name
    }

    fn execute(&self, input: &PluginInput<'_>, params: &Map<String, Value>) -> Result<Value, PluginError> {
        (self.f)(input, params)
    }
}

/// Plugin name -> implementation
#[derive(Default)]
pub struct PluginRegistry {
    plugins: BTreeMap<&'static str, Box<dyn Plugin>>,
}

impl PluginRegistry {
    /// An empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry holding every built-in plugin
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        registry.register(BinnedDistribution);
        registry.register(CategoricalDistribution);
        registry.register(StatisticalSummary);
        registry.register(TopRanking);
        registry.register(BinaryCounter);
        registry.register(Shannon);
        registry.register(Pielou);
        registry.register(Simpson);
        registry.register(SpeciesRichness);
        registry.register(FieldAggregator);
        registry.register(TimeSeriesAnalysis);
        registry.register(CustomFormula);
        registry.register(Aggregator);
        registry.register(TransformChain);
        registry
    }

    /// Register a plugin under its name, replacing any previous one
    pub fn register<P: Plugin + 'static>(&mut self, plugin: P) {
        self.plugins.insert(plugin.name(), Box::new(plugin));
    }

    /// Register a closure as a plugin
    pub fn register_fn<F>(&mut self, name: &'static str, f: F)
    where
        F: Fn(&PluginInput<'_>, &Map<String, Value>) -> Result<Value, PluginError> + Send + Sync + 'static,
    {
        self.register(FnPlugin { name, f });
    }

    pub fn contains(&self, name: &str) -> bool {
        self.plugins.contains_key(name)
    }

    /// Registered names, sorted
    pub fn names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.plugins.keys().copied()
    }

    pub fn get(&self, name: &str) -> Result<&dyn Plugin, PluginError> {
        self.plugins
            .get(name)
            .map(|p| p.as_ref())
            .ok_or_else(|| PluginError::UnknownPlugin(name.to_string()))
    }

    /// Check that a plugin and every plugin nested in its params exist
    pub fn check(&self, name: &str, params: &Map<String, Value>) -> Result<(), PluginError> {
        let plugin = self.get(name)?;
        for (nested, nested_params) in plugin.nested(params) {
            self.check(&nested, &nested_params)?;
        }
        Ok(())
    }

    /// Execute a plugin.
    ///
    /// With a chain context, `@key.path` references in `params` are resolved
    /// first. A nested `transform_chain` keeps its params verbatim.
    pub fn execute(
        &self,
        name: &str,
        input: &PluginInput<'_>,
        params: &Map<String, Value>,
        context: Option<&ChainContext>,
    ) -> Result<Value, PluginError> {
        let plugin = self.get(name)?;
        match context {
            Some(ctx) if name != CHAIN_PLUGIN => {
                let resolved = reference::substitute_object(params, ctx)?;
                plugin.execute(input, &resolved)
            }
            _ => plugin.execute(input, params),
        }
    }
}

impl fmt::Debug for PluginRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PluginRegistry")
            .field("plugins", &self.plugins.keys().collect::<Vec<_>>())
            .finish()
    }
}
