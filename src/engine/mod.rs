//! Transform engine (verb module)
//!
//! Runs every group of every dimension through the widgets of its block:
//!
//! 1. validate the configuration against the entity and plugin registries
//! 2. per dimension, build one relation per source
//! 3. per group, hand each widget its row-set and store the result
//!
//! Errors of one widget, panics included, never stop its siblings; errors
//! building a relation stop only that dimension. Both end up as
//! [`FailureRecord`]s in the [`RunReport`].

mod error;
mod options;
mod report;

pub use error::ValidationError;
pub use options::{CancelToken, EngineOptions};
pub use report::{FailureRecord, RunReport};

use rayon::prelude::*;
use serde_json::Value;
use std::any::Any;
use std::collections::BTreeSet;
use std::panic::{self, AssertUnwindSafe};
use tracing::{debug, info, warn};
use crate::config::{GroupBlock, Scope, TransformConfig};
use crate::groups::Group;
use crate::output::OutputStore;
use crate::plugins::{PluginError, PluginInput, PluginRegistry};
use crate::registry::EntityRegistry;
use crate::relation::{build_relation, check_relation, Relation};

/// A validated configuration bound to its registries
#[derive(Debug)]
pub struct TransformEngine<'r> {
    blocks: Vec<GroupBlock>,
    entities: &'r EntityRegistry,
    plugins: &'r PluginRegistry,
    options: EngineOptions,
}

impl<'r> TransformEngine<'r> {
    /// Validate `blocks` and build an engine over them
    pub fn new(
        blocks: Vec<GroupBlock>,
        entities: &'r EntityRegistry,
        plugins: &'r PluginRegistry,
    ) -> Result<Self, ValidationError> {
        validate(&blocks, entities, plugins)?;
        Ok(Self {
            blocks,
            entities,
            plugins,
            options: EngineOptions::default(),
        })
    }

    /// Engine for a parsed configuration, taking its `engine:` settings
    pub fn from_config(
        config: &TransformConfig,
        entities: &'r EntityRegistry,
        plugins: &'r PluginRegistry,
    ) -> Result<Self, ValidationError> {
        Ok(Self::new(config.transforms.clone(), entities, plugins)?.with_options((&config.engine).into()))
    }

    pub fn with_options(mut self, options: EngineOptions) -> Self {
        self.options = options;
        self
    }

    pub fn options(&self) -> EngineOptions {
        self.options
    }

    /// Dimension names in configuration order
    pub fn dimensions(&self) -> impl Iterator<Item = &str> {
        self.blocks.iter().map(|b| b.group_by.as_str())
    }

    /// Run every dimension
    pub fn run(&self) -> RunReport {
        self.run_with(&CancelToken::new())
    }

    /// Run every dimension, stopping early once `cancel` is set
    pub fn run_with(&self, cancel: &CancelToken) -> RunReport {
        self.execute(self.blocks.iter(), cancel)
    }

    /// Run a single dimension; `None` when it is not configured
    pub fn run_dimension(&self, dimension: &str, cancel: &CancelToken) -> Option<RunReport> {
        let block = self.blocks.iter().find(|b| b.group_by == dimension)?;
        Some(self.execute(std::iter::once(block), cancel))
    }

    fn execute<'b>(&self, blocks: impl Iterator<Item = &'b GroupBlock>, cancel: &CancelToken) -> RunReport {
        let mut report = RunReport::default();
        let pool = self.pool();

        for block in blocks {
            if cancel.is_cancelled() {
                break;
            }
            info!(dimension = %block.group_by, widgets = block.widgets_data.len(), "running dimension");
            let run = || self.run_block(block, cancel, &report.outputs);
            let (processed, failures) = match &pool {
                Some(pool) => pool.install(run),
                None => run(),
            };
            info!(dimension = %block.group_by, groups = processed, failures = failures.len(), "dimension done");
            report.groups_processed += processed;
            report.failures.extend(failures);
        }

        report.cancelled = cancel.is_cancelled();
        report.failures.sort();
        if report.cancelled {
            warn!(groups = report.groups_processed, "run cancelled");
        }
        report
    }

    /// Dedicated pool when a thread count is configured
    fn pool(&self) -> Option<rayon::ThreadPool> {
        let threads = self.options.threads.filter(|_| self.options.parallel)?;
        match rayon::ThreadPoolBuilder::new().num_threads(threads).build() {
            Ok(pool) => Some(pool),
            Err(e) => {
                warn!(threads, error = %e, "could not build thread pool, using the global one");
                None
            }
        }
    }

    /// Returns the number of groups processed and the failures
    fn run_block(&self, block: &GroupBlock, cancel: &CancelToken, store: &OutputStore) -> (usize, Vec<FailureRecord>) {
        let dimension = block.group_by.as_str();

        let mut relations: Vec<(&str, Box<dyn Relation>)> = Vec::new();
        for source in block.all_sources() {
            let built = self
                .entities
                .resolve(&source.grouping)
                .and_then(|reference| Ok((reference, self.entities.resolve(&source.data)?)))
                .map_err(|e| (e.kind(), e.to_string()))
                .and_then(|(reference, facts)| {
                    build_relation(&source.relation, reference, facts).map_err(|e| (e.kind(), e.to_string()))
                });
            match built {
                Ok(relation) => {
                    debug!(
                        dimension,
                        source = source.source_name(),
                        relation = %relation.kind(),
                        groups = relation.group_ids().len(),
                        "relation built"
                    );
                    relations.push((source.source_name(), relation));
                }
                Err((kind, message)) => {
                    warn!(dimension, source = source.source_name(), %kind, %message, "dimension failed");
                    let failure = FailureRecord {
                        dimension: dimension.to_string(),
                        group_id: None,
                        widget: None,
                        kind,
                        message,
                    };
                    return (0, vec![failure]);
                }
            }
        }

        let Some((primary_name, primary)) = relations.first() else {
            return (0, Vec::new());
        };
        let grouping = block.primary_source().map(|s| s.grouping.as_str()).unwrap_or(dimension);
        let ctx = BlockContext {
            dimension,
            block,
            grouping,
            primary_name: *primary_name,
            primary: primary.as_ref(),
            relations: &relations,
        };

        let ids = primary.group_ids();
        let outcomes: Vec<Option<Vec<FailureRecord>>> = if self.options.parallel {
            ids.par_iter()
                .map(|id| (!cancel.is_cancelled()).then(|| self.run_group(&ctx, id, store)))
                .collect()
        } else {
            ids.iter()
                .map(|id| (!cancel.is_cancelled()).then(|| self.run_group(&ctx, id, store)))
                .collect()
        };

        let processed = outcomes.iter().filter(|o| o.is_some()).count();
        (processed, outcomes.into_iter().flatten().flatten().collect())
    }

    /// Run every widget of one group
    fn run_group(&self, ctx: &BlockContext<'_>, id: &str, store: &OutputStore) -> Vec<FailureRecord> {
        let group = Group::load(ctx.primary, id);
        let others: Vec<(&str, Group<'_>)> = ctx
            .relations
            .iter()
            .skip(1)
            .map(|(name, relation)| (*name, Group::load(relation.as_ref(), id)))
            .collect();

        let input_for = |scope: Scope| {
            let mut input = PluginInput::new(group.rows(scope).clone(), self.entities, self.plugins)
                .with_group(ctx.dimension, id, ctx.grouping, group.reference_row)
                .with_source(ctx.primary_name, group.rows(scope).clone());
            for (name, other) in &others {
                input = input.with_source(name, other.rows(scope).clone());
            }
            input
        };
        let subtree = input_for(Scope::Subtree);
        // flat relations see the same rows in both scopes
        let hierarchical = ctx.relations.iter().any(|(_, r)| r.is_hierarchical());
        let own = hierarchical.then(|| input_for(Scope::Own));

        let mut failures = Vec::new();
        for (widget_key, widget) in &ctx.block.widgets_data {
            let input = match widget.scope {
                Scope::Own => own.as_ref().unwrap_or(&subtree),
                Scope::Subtree => &subtree,
            };
            let outcome = panic::catch_unwind(AssertUnwindSafe(|| {
                self.plugins.execute(&widget.plugin, input, &widget.params, None)
            }))
            .unwrap_or_else(|payload| {
                Err(PluginError::data(
                    &widget.plugin,
                    format!("plugin panicked: {}", panic_message(payload.as_ref())),
                ))
            });
            match outcome {
                Ok(value) => store.put(ctx.dimension, id, widget_key, value),
                Err(e) => failures.push(self.failure(ctx.dimension, id, widget_key, &e)),
            }
        }
        debug!(dimension = ctx.dimension, group = id, rows = group.subtree_rows.len(), "group done");
        failures
    }

    fn failure(&self, dimension: &str, group_id: &str, widget: &str, error: &PluginError) -> FailureRecord {
        warn!(dimension, group = group_id, widget, kind = %error.kind(), "{}", error);
        FailureRecord {
            dimension: dimension.to_string(),
            group_id: Some(group_id.to_string()),
            widget: Some(widget.to_string()),
            kind: error.kind(),
            message: error.to_string(),
        }
    }
}

/// Text of a panic payload raised by `panic!` with a message
fn panic_message(payload: &(dyn Any + Send)) -> &str {
    payload
        .downcast_ref::<&str>()
        .copied()
        .or_else(|| payload.downcast_ref::<String>().map(String::as_str))
        .unwrap_or("no message")
}

/// What every group of one dimension shares
struct BlockContext<'a> {
    dimension: &'a str,
    block: &'a GroupBlock,
    grouping: &'a str,
    primary_name: &'a str,
    primary: &'a dyn Relation,
    relations: &'a [(&'a str, Box<dyn Relation>)],
}

/// Check blocks against the registries without building any relation.
///
/// Verifies entity names, relation columns and plugins (chain steps
/// included), and that widgets only name sources their block declares.
pub fn validate(
    blocks: &[GroupBlock],
    entities: &EntityRegistry,
    plugins: &PluginRegistry,
) -> Result<(), ValidationError> {
    let mut dimensions = BTreeSet::new();
    for block in blocks {
        let dimension = block.group_by.as_str();
        if !dimensions.insert(dimension) {
            return Err(ValidationError::DuplicateDimension(dimension.to_string()));
        }

        let sources = block.all_sources();
        if sources.is_empty() {
            return Err(ValidationError::NoSource(dimension.to_string()));
        }
        let mut names = BTreeSet::new();
        for source in &sources {
            if !names.insert(source.source_name()) {
                return Err(ValidationError::DuplicateSource {
                    dimension: dimension.to_string(),
                    name: source.source_name().to_string(),
                });
            }
            let reference = entities.resolve(&source.grouping)?;
            let facts = entities.resolve(&source.data)?;
            check_relation(&source.relation, &reference, &facts).map_err(|e| {
                ValidationError::MalformedRelation {
                    dimension: dimension.to_string(),
                    source: e,
                }
            })?;
        }

        for (widget_key, widget) in &block.widgets_data {
            plugins.check(&widget.plugin, &widget.params).map_err(|e| {
                let plugin = match e {
                    PluginError::UnknownPlugin(name) => name,
                    other => other.to_string(),
                };
                ValidationError::UnknownPlugin {
                    dimension: dimension.to_string(),
                    widget: widget_key.clone(),
                    plugin,
                }
            })?;
            if let Some(Value::String(name)) = widget.params.get("source") {
                if !names.contains(name.as_str()) {
                    return Err(ValidationError::UnknownSource {
                        dimension: dimension.to_string(),
                        widget: widget_key.clone(),
                        name: name.clone(),
                    });
                }
            }
        }
        debug!(dimension, sources = sources.len(), widgets = block.widgets_data.len(), "dimension validated");
    }
    Ok(())
}
