//! Group iterator (verb module)
//!
//! Enumerates the groups of a relation in its stable order: pre-order for
//! nested sets, reference load order otherwise. Groups are materialized on
//! demand; calling [`iterate`] again starts over.

use crate::config::Scope;
use crate::relation::Relation;
use crate::table::{RowRef, RowSet};

/// One member of a dimension, with the fact rows it sees
#[derive(Debug, Clone)]
pub struct Group<'a> {
    pub id: &'a str,
    /// Rows matching the group exactly
    pub own_rows: RowSet<'a>,
    /// Own rows plus every descendant's rows; equal to `own_rows` for flat relations
    pub subtree_rows: RowSet<'a>,
    /// The group's row in the reference entity
    pub reference_row: Option<RowRef<'a>>,
}

impl<'a> Group<'a> {
    /// Materialize a single group
    pub fn load(relation: &'a dyn Relation, id: &'a str) -> Self {
        let own_rows = relation.own_rows(id);
        let subtree_rows = if relation.is_hierarchical() {
            relation.subtree_rows(id)
        } else {
            own_rows.clone()
        };
        Self {
            id,
            own_rows,
            subtree_rows,
            reference_row: relation.reference_row_ref(id),
        }
    }

    /// Rows for a widget scope
    pub fn rows(&self, scope: Scope) -> &RowSet<'a> {
        match scope {
            Scope::Subtree => &self.subtree_rows,
            Scope::Own => &self.own_rows,
        }
    }
}

/// Lazy, single-pass iterator over the groups of a relation
#[derive(Debug)]
pub struct GroupIter<'a> {
    relation: &'a dyn Relation,
    ids: std::slice::Iter<'a, String>,
}

impl<'a> Iterator for GroupIter<'a> {
    type Item = Group<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        let id = self.ids.next()?;
        Some(Group::load(self.relation, id))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.ids.size_hint()
    }
}

impl ExactSizeIterator for GroupIter<'_> {}

/// Iterate the groups of a relation
pub fn iterate(relation: &dyn Relation) -> GroupIter<'_> {
    GroupIter {
        relation,
        ids: relation.group_ids().iter(),
    }
}
