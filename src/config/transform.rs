//! Transform document definition

use serde::Deserialize;
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use super::entity::EntitySpec;

/// The root transform document
#[derive(Debug, Clone, Deserialize)]
pub struct TransformConfig {
    /// Engine-wide execution settings
    #[serde(default)]
    pub engine: EngineSection,
    /// Entity schemas registered before any relation is built
    #[serde(default)]
    pub entities: Vec<EntitySpec>,
    /// One block per grouping dimension
    pub transforms: Vec<GroupBlock>,
}

impl TransformConfig {
    /// Get an entity spec by name
    pub fn get_entity(&self, name: &str) -> Option<&EntitySpec> {
        self.entities.iter().find(|e| e.name == name)
    }

    /// Get a group block by its dimension name
    pub fn get_block(&self, group_by: &str) -> Option<&GroupBlock> {
        self.transforms.iter().find(|b| b.group_by == group_by)
    }
}

/// Execution settings from the optional `engine:` section
#[derive(Debug, Clone, Deserialize)]
pub struct EngineSection {
    /// Process groups on a rayon pool
    #[serde(default = "default_true")]
    pub parallel: bool,
    /// Worker count; `None` lets rayon decide
    pub threads: Option<usize>,
}

impl Default for EngineSection {
    fn default() -> Self {
        Self {
            parallel: true,
            threads: None,
        }
    }
}

fn default_true() -> bool {
    true
}

/// Statistics configuration for one grouping dimension
#[derive(Debug, Clone, Deserialize)]
pub struct GroupBlock {
    /// Dimension name (taxon, plot, shape)
    pub group_by: String,
    /// Primary source
    pub source: Option<SourceSpec>,
    /// Additional named sources
    #[serde(default)]
    pub sources: Vec<SourceSpec>,
    /// Widget key -> widget spec
    #[serde(default)]
    pub widgets_data: BTreeMap<String, WidgetSpec>,
}

impl GroupBlock {
    /// All sources, primary first
    pub fn all_sources(&self) -> Vec<&SourceSpec> {
        self.source.iter().chain(self.sources.iter()).collect()
    }

    /// The source whose rows a widget gets when it names none
    pub fn primary_source(&self) -> Option<&SourceSpec> {
        self.source.as_ref().or_else(|| self.sources.first())
    }
}

/// Where the rows of a dimension come from
#[derive(Debug, Clone, Deserialize)]
pub struct SourceSpec {
    /// Name widgets use to select this source; defaults to `data`
    pub name: Option<String>,
    /// Fact entity
    pub data: String,
    /// Reference entity whose rows define the groups
    pub grouping: String,
    pub relation: RelationSpec,
}

impl SourceSpec {
    /// The name widgets use to select this source
    pub fn source_name(&self) -> &str {
        self.name.as_deref().unwrap_or(&self.data)
    }
}

/// How fact rows map to groups
#[derive(Debug, Clone, Deserialize)]
pub struct RelationSpec {
    /// Relation variant name (nested_set, adjacency_list, direct_reference, stats_loader)
    pub plugin: String,
    /// Fact column holding the group reference
    pub key: String,
    /// Reference column matched by `key`; defaults to the reference id field
    pub ref_field: Option<String>,
    /// Hierarchy column names for nested_set / adjacency_list
    #[serde(default)]
    pub fields: HierarchyFields,
}

/// Hierarchy column names on the reference entity
#[derive(Debug, Clone, Deserialize)]
pub struct HierarchyFields {
    #[serde(default = "default_parent")]
    pub parent: String,
    #[serde(default = "default_left")]
    pub left: String,
    #[serde(default = "default_right")]
    pub right: String,
}

impl Default for HierarchyFields {
    fn default() -> Self {
        Self {
            parent: default_parent(),
            left: default_left(),
            right: default_right(),
        }
    }
}

fn default_parent() -> String {
    "parent_id".to_string()
}

fn default_left() -> String {
    "lft".to_string()
}

fn default_right() -> String {
    "rght".to_string()
}

/// Known relation variants
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelationKind {
    NestedSet,
    AdjacencyList,
    DirectReference,
    StatsLoader,
}

impl RelationKind {
    /// True for relations that expose descendants
    pub fn is_hierarchical(self) -> bool {
        matches!(self, Self::NestedSet | Self::AdjacencyList)
    }
}

impl fmt::Display for RelationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RelationKind::NestedSet => write!(f, "nested_set"),
            RelationKind::AdjacencyList => write!(f, "adjacency_list"),
            RelationKind::DirectReference => write!(f, "direct_reference"),
            RelationKind::StatsLoader => write!(f, "stats_loader"),
        }
    }
}

impl FromStr for RelationKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "nested_set" => Ok(RelationKind::NestedSet),
            "adjacency_list" => Ok(RelationKind::AdjacencyList),
            "direct_reference" => Ok(RelationKind::DirectReference),
            "stats_loader" => Ok(RelationKind::StatsLoader),
            other => Err(format!("unknown relation plugin '{}'", other)),
        }
    }
}

/// Which row-set a hierarchical relation hands to a widget
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Scope {
    /// The group's rows plus every descendant's rows
    #[default]
    Subtree,
    /// Only the rows matching the group exactly
    Own,
}

/// One widget: a plugin name and its open parameter mapping
#[derive(Debug, Clone, Deserialize)]
pub struct WidgetSpec {
    pub plugin: String,
    #[serde(default)]
    pub params: Map<String, Value>,
    #[serde(default)]
    pub scope: Scope,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_block_defaults() {
        let yaml = r#"
transforms:
  - group_by: plot
    source:
      data: occurrences
      grouping: plot_ref
      relation:
        plugin: direct_reference
        key: plot_ref_id
    widgets_data:
      dbh:
        plugin: statistical_summary
        params:
          field: dbh
"#;
        let config: TransformConfig = serde_yaml::from_str(yaml).unwrap();
        assert!(config.engine.parallel);
        assert!(config.entities.is_empty());

        let block = config.get_block("plot").unwrap();
        let source = block.primary_source().unwrap();
        assert_eq!(source.source_name(), "occurrences");
        assert_eq!(source.relation.fields.parent, "parent_id");
        assert_eq!(source.relation.plugin.parse::<RelationKind>(), Ok(RelationKind::DirectReference));

        let widget = &block.widgets_data["dbh"];
        assert_eq!(widget.scope, Scope::Subtree);
        assert_eq!(widget.params["field"], Value::String("dbh".into()));
    }

    #[test]
    fn test_unknown_relation_kind() {
        assert!("closure_table".parse::<RelationKind>().is_err());
    }
}
