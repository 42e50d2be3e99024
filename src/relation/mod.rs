//! Relation resolver (verb module)
//!
//! Connects the reference rows of a dimension (taxa, plots, shapes) to the fact
//! rows that belong to them. Every variant implements [`Relation`], so group
//! iteration and plugin execution never branch on the relation kind.
//!
//! - `nested_set` - hierarchy encoded as `[left, right]` intervals
//! - `adjacency_list` - hierarchy walked through parent pointers
//! - `direct_reference` - flat foreign-key match
//! - `stats_loader` - one precomputed stats row per group

mod adjacency;
mod build;
mod direct;
mod error;
mod index;
mod nested_set;
mod stats;

use std::fmt;
use crate::config::RelationKind;
use crate::registry::Entity;
use crate::table::{RowRef, RowSet, Table};

pub use adjacency::AdjacencyRelation;
pub use build::{build_relation, check_relation};
pub use direct::DirectRelation;
pub use error::RelationError;
pub use nested_set::{assign_intervals, NestedNode, NestedSetRelation};
pub use stats::StatsRelation;

/// The structural link between a dimension's groups and their fact rows
pub trait Relation: Send + Sync + fmt::Debug {
    fn kind(&self) -> RelationKind;

    /// The entity whose rows define the groups
    fn reference(&self) -> &Entity;

    /// The table holding the fact rows
    fn facts(&self) -> &Table;

    /// Group ids in iteration order
    fn group_ids(&self) -> &[String];

    /// Position of the group's own row in the reference table
    fn reference_row(&self, group_id: &str) -> Option<usize>;

    /// Fact rows matching the group exactly
    fn own_rows(&self, group_id: &str) -> RowSet<'_>;

    /// Fact rows of the group and all its descendants
    fn subtree_rows(&self, group_id: &str) -> RowSet<'_> {
        self.own_rows(group_id)
    }

    fn is_hierarchical(&self) -> bool {
        self.kind().is_hierarchical()
    }

    /// The group's reference row as a row handle
    fn reference_row_ref(&self, group_id: &str) -> Option<RowRef<'_>> {
        let row = self.reference_row(group_id)?;
        Some(RowRef::new(&self.reference().table, row))
    }
}
