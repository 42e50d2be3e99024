//! Nested-set hierarchy
//!
//! Intervals are assigned by one iterative depth-first walk: `left` on entry,
//! `right` on exit, both from a shared counter starting at 1. A node `d` is a
//! descendant of `n` iff `n.left < d.left < d.right < n.right`.
//!
//! Fact rows are stored sorted by the `left` of their node, so the rows of a
//! subtree are one contiguous slice found with two binary searches.

use std::collections::HashMap;
use tracing::debug;
use crate::config::RelationKind;
use crate::registry::{Entity, EntityHandle};
use crate::table::{id_key, RowSet, Table};
use super::error::RelationError;
use super::index::{column, ReferenceIndex};
use super::Relation;

/// One node of a constructed hierarchy
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NestedNode {
    pub id: String,
    pub parent: Option<String>,
    pub left: u64,
    pub right: u64,
    pub depth: usize,
    /// Row in the reference table
    pub row: usize,
}

impl NestedNode {
    /// True when `other` lies strictly inside this node's interval
    pub fn contains(&self, other: &NestedNode) -> bool {
        self.left < other.left && other.right < self.right
    }
}

/// Assign `(left, right, depth)` to every node.
///
/// `ids` and `parents` are parallel, in load order. Nodes whose parent is
/// `None` or unknown are roots; children are visited in load order.
pub fn assign_intervals(
    entity: &str,
    ids: &[String],
    parents: &[Option<String>],
) -> Result<Vec<(u64, u64, usize)>, RelationError> {
    let cyclic = |node: usize| RelationError::CyclicHierarchy {
        entity: entity.to_string(),
        node: ids[node].clone(),
    };

    let position: HashMap<&str, usize> = ids.iter().enumerate().map(|(i, id)| (id.as_str(), i)).collect();
    let mut children: Vec<Vec<usize>> = vec![Vec::new(); ids.len()];
    let mut roots = Vec::new();

    for (node, parent) in parents.iter().enumerate() {
        match parent.as_deref() {
            Some(p) if p == ids[node] => return Err(cyclic(node)),
            Some(p) => match position.get(p) {
                Some(&parent_pos) => children[parent_pos].push(node),
                None => roots.push(node),
            },
            None => roots.push(node),
        }
    }

    let mut intervals: Vec<Option<(u64, u64, usize)>> = vec![None; ids.len()];
    let mut visiting = vec![false; ids.len()];
    let mut lefts = vec![0u64; ids.len()];
    let mut counter = 1u64;

    for &root in &roots {
        if visiting[root] {
            return Err(cyclic(root));
        }
        visiting[root] = true;
        lefts[root] = counter;
        counter += 1;

        // (node, next child cursor)
        let mut stack: Vec<(usize, usize)> = vec![(root, 0)];
        while let Some(top) = stack.last_mut() {
            let node = top.0;
            if let Some(&child) = children[node].get(top.1) {
                top.1 += 1;
                if visiting[child] {
                    return Err(cyclic(child));
                }
                visiting[child] = true;
                lefts[child] = counter;
                counter += 1;
                stack.push((child, 0));
            } else {
                let depth = stack.len() - 1;
                intervals[node] = Some((lefts[node], counter, depth));
                counter += 1;
                stack.pop();
            }
        }
    }

    // Nodes on a parent cycle are never reached from a root
    intervals
        .into_iter()
        .enumerate()
        .map(|(node, interval)| interval.ok_or_else(|| cyclic(node)))
        .collect()
}

/// Relation over a nested-set hierarchy
#[derive(Debug)]
pub struct NestedSetRelation {
    reference: EntityHandle,
    facts: EntityHandle,
    /// Nodes in pre-order (ascending `left`)
    nodes: Vec<NestedNode>,
    order: Vec<String>,
    by_id: HashMap<String, usize>,
    /// Fact rows sorted by their node's `left`
    fact_order: Vec<usize>,
    /// `left` of each entry of `fact_order`
    fact_lefts: Vec<u64>,
}

impl NestedSetRelation {
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

        let parents: Vec<Option<String>> = index
            .rows
            .iter()
            .map(|&row| id_key(reference.table.value(row, parent_col)))
            .collect();
        let intervals = assign_intervals(reference.name(), &index.ids, &parents)?;

        let mut nodes: Vec<NestedNode> = index
            .ids
            .iter()
            .zip(parents)
            .zip(intervals)
            .zip(&index.rows)
            .map(|(((id, parent), (left, right, depth)), &row)| NestedNode {
                id: id.clone(),
                parent,
                left,
                right,
                depth,
                row,
            })
            .collect();

        let lefts_by_position: Vec<u64> = nodes.iter().map(|n| n.left).collect();
        let mut facts_sorted: Vec<(u64, usize)> = index
            .assign_facts(&facts.table, key_col)
            .into_iter()
            .enumerate()
            .filter_map(|(row, position)| position.map(|p| (lefts_by_position[p], row)))
            .collect();
        facts_sorted.sort_unstable();

        nodes.sort_by_key(|n| n.left);
        let order: Vec<String> = nodes.iter().map(|n| n.id.clone()).collect();
        let by_id = order.iter().enumerate().map(|(i, id)| (id.clone(), i)).collect();

        debug!(
            reference = %reference.name(),
            facts = %facts.name(),
            nodes = nodes.len(),
            matched = facts_sorted.len(),
            "built nested set"
        );

        Ok(Self {
            reference,
            facts,
            nodes,
            order,
            by_id,
            fact_lefts: facts_sorted.iter().map(|&(left, _)| left).collect(),
            fact_order: facts_sorted.into_iter().map(|(_, row)| row).collect(),
        })
    }

    /// Nodes in pre-order
    pub fn nodes(&self) -> &[NestedNode] {
        &self.nodes
    }

    pub fn node(&self, id: &str) -> Option<&NestedNode> {
        self.by_id.get(id).map(|&i| &self.nodes[i])
    }

    /// Ids of the node's descendants (excluding itself), in pre-order
    pub fn descendants(&self, id: &str) -> Vec<&str> {
        let Some(&start) = self.by_id.get(id) else {
            return Vec::new();
        };
        let right = self.nodes[start].right;
        self.nodes[start + 1..]
            .iter()
            .take_while(|n| n.left < right)
            .map(|n| n.id.as_str())
            .collect()
    }

    /// Fact rows whose node `left` falls in `[low, high]`
    fn rows_between(&self, low: u64, high: u64) -> RowSet<'_> {
        let start = self.fact_lefts.partition_point(|&l| l < low);
        let end = self.fact_lefts.partition_point(|&l| l <= high);
        RowSet::borrowed(&self.facts.table, &self.fact_order[start..end])
    }
}

impl Relation for NestedSetRelation {
    fn kind(&self) -> RelationKind {
        RelationKind::NestedSet
    }

    fn reference(&self) -> &Entity {
        &self.reference
    }

    fn facts(&self) -> &Table {
        &self.facts.table
    }

    fn group_ids(&self) -> &[String] {
        &self.order
    }

    fn reference_row(&self, group_id: &str) -> Option<usize> {
        self.node(group_id).map(|n| n.row)
    }

    fn own_rows(&self, group_id: &str) -> RowSet<'_> {
        match self.node(group_id) {
            Some(node) => self.rows_between(node.left, node.left),
            None => RowSet::empty(&self.facts.table),
        }
    }

    fn subtree_rows(&self, group_id: &str) -> RowSet<'_> {
        match self.node(group_id) {
            Some(node) => self.rows_between(node.left, node.right),
            None => RowSet::empty(&self.facts.table),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids(v: &[&str]) -> Vec<String> {
        v.iter().map(|s| s.to_string()).collect()
    }

    fn parents(v: &[Option<&str>]) -> Vec<Option<String>> {
        v.iter().map(|p| p.map(str::to_string)).collect()
    }

    #[test]
    fn test_assign_intervals_single_tree() {
        // 1 -> (2 -> 4), 3
        let result = assign_intervals(
            "taxon",
            &ids(&["1", "2", "3", "4"]),
            &parents(&[None, Some("1"), Some("1"), Some("2")]),
        )
        .unwrap();

        assert_eq!(result[0], (1, 8, 0));
        assert_eq!(result[1], (2, 5, 1));
        assert_eq!(result[3], (3, 4, 2));
        assert_eq!(result[2], (6, 7, 1));
    }

    #[test]
    fn test_unknown_parent_is_root() {
        let result = assign_intervals("taxon", &ids(&["a", "b"]), &parents(&[Some("zz"), None])).unwrap();
        assert_eq!(result, vec![(1, 2, 0), (3, 4, 0)]);
    }

    #[test]
    fn test_cycle_detected() {
        let err = assign_intervals(
            "taxon",
            &ids(&["root", "a", "b"]),
            &parents(&[None, Some("b"), Some("a")]),
        )
        .unwrap_err();
        assert!(matches!(err, RelationError::CyclicHierarchy { node, .. } if node == "a"));
    }

    #[test]
    fn test_self_parent_is_cycle() {
        let err = assign_intervals("taxon", &ids(&["a"]), &parents(&[Some("a")])).unwrap_err();
        assert!(matches!(err, RelationError::CyclicHierarchy { .. }));
    }
}
