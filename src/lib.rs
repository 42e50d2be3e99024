//! ecotransform - Compile ecological field data into per-group widget statistics
//!
//! This library provides:
//! - Transform configuration types (entities, group blocks, sources, widgets)
//! - Configuration parsing from YAML, entity records from JSON
//! - Relations between reference rows and fact rows (nested set, adjacency
//!   list, direct reference, stats loader)
//! - Group iteration with hierarchical roll-up
//! - A plugin registry with built-in statistics and `transform_chain` composition
//! - A parallel engine producing one JSON document per group
//!
//! # Architecture
//!
//! **Noun modules** (data structures):
//! - `config/` - transform document (EntitySpec, GroupBlock, SourceSpec, WidgetSpec)
//! - `table/` - in-memory rows (Table, RowSet, RowRef)
//! - `output/` - per-group widget values (OutputStore)
//!
//! **Verb modules** (transformations):
//! - `parser/` - YAML → TransformConfig, JSON → records
//! - `registry/` - EntitySpec + records → Entity handles
//! - `relation/` - reference + facts → Relation
//! - `groups/` - Relation → Groups
//! - `reference/` - `@key.path` + ChainContext → value
//! - `plugins/` - Group rows + params → widget value
//! - `engine/` - TransformConfig + registries → RunReport
//!
//! # Example
//!
//! ```ignore
//! use ecotransform::{parser, EntityRegistry, PluginRegistry, TransformEngine};
//!
//! let config = parser::parse_file("transform.yaml")?;
//! let data = parser::parse_data_file("data.json")?;
//! let entities = EntityRegistry::from_specs(&config.entities, &data)?;
//! let plugins = PluginRegistry::with_builtins();
//! let engine = TransformEngine::from_config(&config, &entities, &plugins)?;
//! let report = engine.run();
//! report.outputs.write_dir("out")?;
//! ```

pub mod config;
pub mod table;
pub mod output;
pub mod parser;
pub mod registry;
pub mod relation;
pub mod groups;
pub mod reference;
pub mod plugins;
pub mod engine;
pub mod error;

// Re-export commonly used types
pub use config::{EntityKind, EntitySpec, GroupBlock, RelationKind, RelationSpec, Scope, SourceSpec, TransformConfig, WidgetSpec};
pub use table::{RowRef, RowSet, Table};
pub use output::{OutputError, OutputStore};
pub use registry::{Entity, EntityHandle, EntityRegistry, RegistryError};
pub use relation::{build_relation, Relation, RelationError};
pub use groups::{iterate, Group};
pub use reference::{resolve, ChainContext, ReferenceError};
pub use plugins::{Plugin, PluginError, PluginInput, PluginRegistry};
pub use engine::{validate, CancelToken, EngineOptions, FailureRecord, RunReport, TransformEngine, ValidationError};
pub use error::{ErrorKind, ParseError};
