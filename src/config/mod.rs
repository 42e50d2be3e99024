//! Transform configuration types (nouns)
//!
//! These types represent the parsed transform document: entity schemas,
//! group blocks with their sources and relations, and widget specs.

mod entity;
mod transform;

pub use entity::{EntityKind, EntitySpec, FieldMapping};
pub use transform::{
    EngineSection, GroupBlock, HierarchyFields, RelationKind, RelationSpec, Scope, SourceSpec,
    TransformConfig, WidgetSpec,
};
