//! Precomputed statistics relation

use tracing::debug;
use crate::config::RelationKind;
use crate::registry::{Entity, EntityHandle};
use crate::table::{RowSet, Table};
use super::error::RelationError;
use super::index::{column, ReferenceIndex};
use super::Relation;

/// Each group reads at most one row of a stats table keyed by group id
#[derive(Debug)]
pub struct StatsRelation {
    reference: EntityHandle,
    stats: EntityHandle,
    index: ReferenceIndex,
    rows: Vec<Option<usize>>,
}

impl StatsRelation {
    pub fn build(
        reference: EntityHandle,
        stats: EntityHandle,
        key: &str,
        ref_field: &str,
    ) -> Result<Self, RelationError> {
        let index = ReferenceIndex::build(&reference, ref_field)?;
        let key_col = column(&stats, key)?;

        let mut rows: Vec<Option<usize>> = vec![None; index.len()];
        for (row, position) in index.assign_facts(&stats.table, key_col).into_iter().enumerate() {
            let Some(p) = position else { continue };
            if rows[p].replace(row).is_some() {
                return Err(RelationError::AmbiguousStatsRow {
                    entity: stats.name().to_string(),
                    id: index.ids[p].clone(),
                });
            }
        }

        debug!(
            reference = %reference.name(),
            stats = %stats.name(),
            loaded = rows.iter().flatten().count(),
            "built stats loader"
        );
        Ok(Self {
            reference,
            stats,
            index,
            rows,
        })
    }
}

impl Relation for StatsRelation {
    fn kind(&self) -> RelationKind {
        RelationKind::StatsLoader
    }

    fn reference(&self) -> &Entity {
        &self.reference
    }

    fn facts(&self) -> &Table {
        &self.stats.table
    }

    fn group_ids(&self) -> &[String] {
        &self.index.ids
    }

    fn reference_row(&self, group_id: &str) -> Option<usize> {
        self.index.by_id.get(group_id).map(|&p| self.index.rows[p])
    }

    fn own_rows(&self, group_id: &str) -> RowSet<'_> {
        match self.index.by_id.get(group_id) {
            Some(&p) => RowSet::borrowed(&self.stats.table, self.rows[p].as_slice()),
            None => RowSet::empty(&self.stats.table),
        }
    }
}
