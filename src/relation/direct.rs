//! Flat foreign-key relation

use tracing::debug;
use crate::config::RelationKind;
use crate::registry::{Entity, EntityHandle};
use crate::table::{RowSet, Table};
use super::error::RelationError;
use super::index::{column, ReferenceIndex};
use super::Relation;

/// Groups are reference rows; a fact row belongs to the group whose
/// `ref_field` equals the fact's `key`. Unmatched groups are simply empty.
#[derive(Debug)]
pub struct DirectRelation {
    reference: EntityHandle,
    facts: EntityHandle,
    index: ReferenceIndex,
    own: Vec<Vec<usize>>,
}

impl DirectRelation {
    pub fn build(
        reference: EntityHandle,
        facts: EntityHandle,
        key: &str,
        ref_field: &str,
    ) -> Result<Self, RelationError> {
        let index = ReferenceIndex::build(&reference, ref_field)?;
        let key_col = column(&facts, key)?;
        let own = index.group_facts(&facts.table, key_col);

        debug!(
            reference = %reference.name(),
            facts = %facts.name(),
            groups = index.len(),
            non_empty = own.iter().filter(|r| !r.is_empty()).count(),
            "built direct reference"
        );
        Ok(Self {
            reference,
            facts,
            index,
            own,
        })
    }
}

impl Relation for DirectRelation {
    fn kind(&self) -> RelationKind {
        RelationKind::DirectReference
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
        self.index.by_id.get(group_id).map(|&p| self.index.rows[p])
    }

    fn own_rows(&self, group_id: &str) -> RowSet<'_> {
        match self.index.by_id.get(group_id) {
            Some(&p) => RowSet::borrowed(&self.facts.table, &self.own[p]),
            None => RowSet::empty(&self.facts.table),
        }
    }
}
