//! Lookup structures shared by every relation variant

use std::collections::HashMap;
use tracing::{debug, warn};
use crate::registry::Entity;
use crate::table::{id_key, Table};
use super::error::RelationError;

/// Reference rows with a usable id, in load order
#[derive(Debug)]
pub(crate) struct ReferenceIndex {
    /// Group ids, by position
    pub ids: Vec<String>,
    /// Reference table row, by position
    pub rows: Vec<usize>,
    /// Group id -> position
    pub by_id: HashMap<String, usize>,
    /// Value of the matched reference field -> position
    pub by_ref: HashMap<String, usize>,
}

impl ReferenceIndex {
    pub fn build(entity: &Entity, ref_field: &str) -> Result<Self, RelationError> {
        let table = &entity.table;
        let id_col = column(entity, entity.id_field())?;
        let ref_col = column(entity, ref_field)?;

        let mut index = Self {
            ids: Vec::with_capacity(table.len()),
            rows: Vec::with_capacity(table.len()),
            by_id: HashMap::with_capacity(table.len()),
            by_ref: HashMap::with_capacity(table.len()),
        };
        let mut skipped = 0usize;

        for row in 0..table.len() {
            let Some(id) = id_key(table.value(row, id_col)) else {
                skipped += 1;
                continue;
            };
            let position = index.ids.len();
            if index.by_id.insert(id.clone(), position).is_some() {
                return Err(RelationError::DuplicateId {
                    entity: entity.name().to_string(),
                    id,
                });
            }
            if ref_col != id_col {
                if let Some(value) = id_key(table.value(row, ref_col)) {
                    if index.by_ref.insert(value.clone(), position).is_some() {
                        return Err(RelationError::DuplicateId {
                            entity: entity.name().to_string(),
                            id: value,
                        });
                    }
                }
            }
            index.ids.push(id);
            index.rows.push(row);
        }
        if ref_col == id_col {
            index.by_ref = index.by_id.clone();
        }

        if skipped > 0 {
            warn!(entity = %entity.name(), skipped, "reference rows without an id were skipped");
        }
        Ok(index)
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    /// Position of every fact row's group, `None` for orphans
    pub fn assign_facts(&self, facts: &Table, key_col: usize) -> Vec<Option<usize>> {
        let mut orphans = 0usize;
        let assigned: Vec<Option<usize>> = (0..facts.len())
            .map(|row| {
                let position = id_key(facts.value(row, key_col)).and_then(|k| self.by_ref.get(&k).copied());
                if position.is_none() {
                    orphans += 1;
                }
                position
            })
            .collect();
        if orphans > 0 {
            debug!(facts = %facts.name(), orphans, "fact rows matched no group");
        }
        assigned
    }

    /// Fact rows grouped by position, each list in load order
    pub fn group_facts(&self, facts: &Table, key_col: usize) -> Vec<Vec<usize>> {
        let mut own = vec![Vec::new(); self.len()];
        for (row, position) in self.assign_facts(facts, key_col).into_iter().enumerate() {
            if let Some(p) = position {
                own[p].push(row);
            }
        }
        own
    }
}

/// Column position, or a `MissingField` error naming the entity
pub(crate) fn column(entity: &Entity, field: &str) -> Result<usize, RelationError> {
    entity
        .table
        .column_index(field)
        .ok_or_else(|| RelationError::MissingField {
            entity: entity.name().to_string(),
            field: field.to_string(),
        })
}
