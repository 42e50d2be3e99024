//! Adjacency-list hierarchy
//!
//! Descendants are the transitive closure over parent pointers, computed per
//! call. The walk keeps a visited set, so it terminates on cyclic data.

use tracing::debug;
use crate::config::RelationKind;
use crate::registry::{Entity, EntityHandle};
use crate::table::{id_key, RowSet, Table};
use super::error::RelationError;
use super::index::{column, ReferenceIndex};
use super::Relation;

#[derive(Debug)]
pub struct AdjacencyRelation {
    reference: EntityHandle,
    facts: EntityHandle,
    index: ReferenceIndex,
    /// Child positions per position, in load order
    children: Vec<Vec<usize>>,
    /// Fact rows per position
    own: Vec<Vec<usize>>,
}

impl AdjacencyRelation {
    pub fn build(
        reference: EntityHandle,
        facts: EntityHandle,
        key: &str,
        ref_field: &str,
        parent_field: &str,
    ) -> Result<Self, RelationError> {
        let index = ReferenceIndex::build(&reference, ref_field)?;
        let parent_col = column(&reference, parent_field)?;
        let key_col = column(&facts, key)?;

        let mut children = vec![Vec::new(); index.len()];
        let mut roots = 0usize;
        for (position, &row) in index.rows.iter().enumerate() {
            let parent = id_key(reference.table.value(row, parent_col))
                .and_then(|p| index.by_id.get(&p).copied())
                .filter(|&p| p != position);
            match parent {
                Some(p) => children[p].push(position),
                None => roots += 1,
            }
        }
        let own = index.group_facts(&facts.table, key_col);

        debug!(reference = %reference.name(), nodes = index.len(), roots, "built adjacency list");
        Ok(Self {
            reference,
            facts,
            index,
            children,
            own,
        })
    }

    /// Positions of the node and its descendants, depth-first in load order
    fn closure(&self, start: usize) -> Vec<usize> {
        let mut visited = vec![false; self.index.len()];
        let mut out = Vec::new();
        let mut stack = vec![start];
        while let Some(node) = stack.pop() {
            if std::mem::replace(&mut visited[node], true) {
                continue;
            }
            out.push(node);
            stack.extend(self.children[node].iter().rev().filter(|&&c| !visited[c]));
        }
        out
    }

    /// Ids of the node's descendants (excluding itself)
    pub fn descendants(&self, id: &str) -> Vec<&str> {
        let Some(&start) = self.index.by_id.get(id) else {
            return Vec::new();
        };
        self.closure(start)
            .into_iter()
            .skip(1)
            .map(|p| self.index.ids[p].as_str())
            .collect()
    }

    fn position(&self, id: &str) -> Option<usize> {
        self.index.by_id.get(id).copied()
    }
}

impl Relation for AdjacencyRelation {
    fn kind(&self) -> RelationKind {
        RelationKind::AdjacencyList
    }

    fn reference(&self) -> &Entity {
        &self.reference
    }

    fn facts(&self) -> &Table {
        &self.facts.table
    }

    fn group_ids(&self) -> &[String] {
        &self.index.ids
    }

    fn reference_row(&self, group_id: &str) -> Option<usize> {
        self.position(group_id).map(|p| self.index.rows[p])
    }

    fn own_rows(&self, group_id: &str) -> RowSet<'_> {
        match self.position(group_id) {
            Some(p) => RowSet::borrowed(&self.facts.table, &self.own[p]),
            None => RowSet::empty(&self.facts.table),
        }
    }

    fn subtree_rows(&self, group_id: &str) -> RowSet<'_> {
        let Some(start) = self.position(group_id) else {
            return RowSet::empty(&self.facts.table);
        };
        let rows = self
            .closure(start)
            .into_iter()
            .flat_map(|p| self.own[p].iter().copied())
            .collect();
        RowSet::owned(&self.facts.table, rows)
    }
}
