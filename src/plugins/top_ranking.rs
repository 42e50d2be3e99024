//! Most frequent values of a field, optionally rolled up a hierarchy

use serde_json::{json, Map, Value};
use std::collections::HashMap;
use crate::registry::Entity;
use crate::table::{category_key, id_key};
use super::error::PluginError;
use super::params::{column, label_of, Params};
use super::{Plugin, PluginInput};

/// `top_ranking`
///
/// Params: `field`, `count` (default 10), `mode` (`direct` or
/// `hierarchical`), `source`. Hierarchical mode also reads `hierarchy`,
/// `target_ranks`, `rank_field`, `parent_field` and `name_field`: every value
/// of `field` is an id in `hierarchy`, and the row is counted under the name
/// of its nearest ancestor (itself included) whose rank is a target rank.
///
/// Output is `{tops, counts}`, sorted by count descending; equal counts keep
/// first-seen order.
#[derive(Debug, Clone, Copy, Default)]
pub struct TopRanking;

impl Plugin for TopRanking {
    fn name(&self) -> &'static str {
        "top_ranking"
    }

    fn execute(&self, input: &PluginInput<'_>, params: &Map<String, Value>) -> Result<Value, PluginError> {
        let p = Params::new(self.name(), params);
        let field = p.required_str("field")?;
        let limit = p.usize_or("count", 10)?;
        let rows = input.source(self.name(), p.optional_str("source")?)?;

        let mut tally = Tally::default();
        match p.optional_str("mode")?.unwrap_or("direct") {
            "direct" => {
                for value in column(self.name(), rows, field)? {
                    if let Some(key) = category_key(value) {
                        tally.add(key, || label_of(value));
                    }
                }
            }
            "hierarchical" => {
                let name = p.required_str("hierarchy")?;
                let entity = input
                    .entities
                    .resolve(name)
                    .map_err(|e| p.error("hierarchy", e.to_string()))?;
                let walker = Walker::new(&p, &entity)?;
                for value in column(self.name(), rows, field)? {
                    if let Some(label) = id_key(value).and_then(|id| walker.rank_label(&id)) {
                        tally.add(label.clone(), || label);
                    }
                }
            }
            other => return Err(p.error("mode", format!("unknown mode '{}'", other))),
        }

        let (tops, counts) = tally.top(limit);
        Ok(json!({ "tops": tops, "counts": counts }))
    }
}

/// Counts keyed by category, remembering first-seen order
#[derive(Default)]
struct Tally {
    slots: HashMap<String, usize>,
    entries: Vec<(String, u64)>,
}

impl Tally {
    fn add(&mut self, key: String, label: impl FnOnce() -> String) {
        match self.slots.get(&key) {
            Some(&slot) => self.entries[slot].1 += 1,
            None => {
                self.slots.insert(key, self.entries.len());
                self.entries.push((label(), 1));
            }
        }
    }

    fn top(mut self, limit: usize) -> (Vec<String>, Vec<u64>) {
        // stable: ties stay in first-seen order
        self.entries.sort_by(|a, b| b.1.cmp(&a.1));
        self.entries.truncate(limit);
        self.entries.into_iter().unzip()
    }
}

/// Upward walk through a reference hierarchy
struct Walker<'e> {
    entity: &'e Entity,
    targets: Vec<String>,
    rank_field: &'e str,
    parent_field: &'e str,
    name_field: &'e str,
}

impl<'e> Walker<'e> {
    fn new(p: &Params<'e>, entity: &'e Entity) -> Result<Self, PluginError> {
        let table = &entity.table;
        let rank_field = p.optional_str("rank_field")?.unwrap_or("rank_name");
        let parent_field = p.optional_str("parent_field")?.unwrap_or("parent_id");
        let name_field = p.optional_str("name_field")?.unwrap_or("full_name");
        for (param, column) in [("rank_field", rank_field), ("parent_field", parent_field), ("name_field", name_field)] {
            if !table.has_column(column) {
                return Err(p.error(param, format!("'{}' has no column '{}'", entity.name(), column)));
            }
        }

        Ok(Self {
            entity,
            targets: p.string_list("target_ranks")?,
            rank_field,
            parent_field,
            name_field,
        })
    }

    /// Name of the nearest ancestor at a target rank
    fn rank_label(&self, id: &str) -> Option<String> {
        let table = &self.entity.table;
        let mut row = self.entity.row_of(id)?;
        // bounded so a cyclic hierarchy cannot loop forever
        for _ in 0..table.len() {
            let rank = table.get(row, self.rank_field).and_then(Value::as_str);
            if rank.is_some_and(|r| self.targets.iter().any(|t| t == r)) {
                return table.get(row, self.name_field).filter(|v| !v.is_null()).map(label_of);
            }
            let parent = table.get(row, self.parent_field).and_then(id_key)?;
            row = self.entity.row_of(&parent)?;
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{EntityKind, EntitySpec};
    use crate::plugins::test_support::{column_table, run};
    use crate::plugins::{PluginInput, PluginRegistry};
    use crate::registry::EntityRegistry;
    use crate::table::Table;

    #[test]
    fn test_direct_ties_keep_first_seen_order() {
        let table = column_table(
            "family",
            vec![json!("A"), json!("B"), json!("C"), json!("B"), json!("A"), json!(null)],
        );
        let out = run(&TopRanking, &table, json!({"field": "family", "count": 2})).unwrap();
        assert_eq!(out, json!({"tops": ["A", "B"], "counts": [2, 2]}));
    }

    #[test]
    fn test_hierarchical_rolls_up_to_family() {
        let taxa = Table::from_rows(
            "taxon",
            &["id", "full_name", "rank_name", "parent_id"],
            vec![
                vec![json!(1), json!("Myrtaceae"), json!("family"), json!(null)],
                vec![json!(2), json!("Syzygium"), json!("genus"), json!(1)],
                vec![json!(3), json!("Syzygium acre"), json!("species"), json!(2)],
                vec![json!(4), json!("Arecaceae"), json!("family"), json!(null)],
                vec![json!(5), json!("Cyphokentia"), json!("genus"), json!(4)],
            ],
        );
        let mut entities = EntityRegistry::new();
        entities
            .register(
                EntitySpec::new("taxon", EntityKind::Reference, "id")
                    .with_fields(&["id", "full_name", "rank_name", "parent_id"]),
                taxa,
            )
            .unwrap();
        let plugins = PluginRegistry::with_builtins();
        let facts = column_table("taxon_ref", vec![json!(3), json!(5), json!(2), json!(99)]);
        let input = PluginInput::new(facts.all_rows(), &entities, &plugins);

        let params = json!({
            "field": "taxon_ref",
            "mode": "hierarchical",
            "hierarchy": "taxon",
            "target_ranks": ["family"]
        });
        let out = TopRanking.execute(&input, params.as_object().unwrap()).unwrap();
        assert_eq!(out, json!({"tops": ["Myrtaceae", "Arecaceae"], "counts": [2, 1]}));

        let params = json!({"field": "taxon_ref", "mode": "hierarchical", "hierarchy": "nope", "target_ranks": []});
        let err = TopRanking.execute(&input, params.as_object().unwrap()).unwrap_err();
        assert!(matches!(err, PluginError::Param { .. }));
    }
}
