//! Relation construction from a relation spec

use std::str::FromStr;
use crate::config::{RelationKind, RelationSpec};
use crate::registry::{Entity, EntityHandle};
use super::adjacency::AdjacencyRelation;
use super::direct::DirectRelation;
use super::error::RelationError;
use super::index::column;
use super::nested_set::NestedSetRelation;
use super::stats::StatsRelation;
use super::Relation;

/// Check a relation spec against the entities it connects.
///
/// Verifies the plugin name and that every named column exists. Run at
/// configuration time so malformed specs never reach group iteration.
pub fn check_relation(
    spec: &RelationSpec,
    reference: &Entity,
    facts: &Entity,
) -> Result<RelationKind, RelationError> {
    let kind = RelationKind::from_str(&spec.plugin).map_err(RelationError::Malformed)?;

    column(facts, &spec.key)?;
    column(reference, reference.id_field())?;
    if let Some(ref_field) = &spec.ref_field {
        column(reference, ref_field)?;
    }
    if kind.is_hierarchical() {
        column(reference, &spec.fields.parent)?;
    }
    Ok(kind)
}

/// Build the relation linking `reference` groups to `facts` rows
pub fn build_relation(
    spec: &RelationSpec,
    reference: EntityHandle,
    facts: EntityHandle,
) -> Result<Box<dyn Relation>, RelationError> {
    let kind = check_relation(spec, &reference, &facts)?;
    let ref_field = spec
        .ref_field
        .clone()
        .unwrap_or_else(|| reference.id_field().to_string());

    let relation: Box<dyn Relation> = match kind {
        RelationKind::NestedSet => Box::new(NestedSetRelation::build(
            reference,
            facts,
            &spec.key,
            &ref_field,
            &spec.fields.parent,
        )?),
        RelationKind::AdjacencyList => Box::new(AdjacencyRelation::build(
            reference,
            facts,
            &spec.key,
            &ref_field,
            &spec.fields.parent,
        )?),
        RelationKind::DirectReference => {
            Box::new(DirectRelation::build(reference, facts, &spec.key, &ref_field)?)
        }
        RelationKind::StatsLoader => {
            Box::new(StatsRelation::build(reference, facts, &spec.key, &ref_field)?)
        }
    };
    Ok(relation)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{EntityKind, EntitySpec, HierarchyFields};
    use crate::registry::EntityRegistry;
    use crate::table::Table;
    use serde_json::{json, Value};

    fn spec(plugin: &str, key: &str) -> RelationSpec {
        RelationSpec {
            plugin: plugin.to_string(),
            key: key.to_string(),
            ref_field: None,
            fields: HierarchyFields::default(),
        }
    }

    /// 1 Plantae -> 2 Myrtaceae -> (3 Syzygium, 4 Eugenia)
    fn registry() -> EntityRegistry {
        let mut registry = EntityRegistry::new();
        let taxa = Table::from_rows(
            "taxon",
            &["id", "parent_id", "name"],
            vec![
                vec![json!(1), Value::Null, json!("Plantae")],
                vec![json!(2), json!(1), json!("Myrtaceae")],
                vec![json!(3), json!(2), json!("Syzygium")],
                vec![json!(4), json!(2), json!("Eugenia")],
            ],
        );
        let occurrences = Table::from_rows(
            "occurrences",
            &["id", "taxon_ref_id", "dbh"],
            vec![
                vec![json!(10), json!(3), json!(12.0)],
                vec![json!(11), json!(4), json!(30.0)],
                vec![json!(12), json!(2), json!(5.0)],
                vec![json!(13), json!(3), json!(8.0)],
                vec![json!(14), json!(99), json!(1.0)],
            ],
        );
        registry
            .register(EntitySpec::new("taxon", EntityKind::Reference, "id"), taxa)
            .unwrap();
        registry
            .register(EntitySpec::new("occurrences", EntityKind::Dataset, "id"), occurrences)
            .unwrap();
        registry
    }

    fn build(plugin: &str) -> Box<dyn Relation> {
        let registry = registry();
        build_relation(
            &spec(plugin, "taxon_ref_id"),
            registry.resolve("taxon").unwrap(),
            registry.resolve("occurrences").unwrap(),
        )
        .unwrap()
    }

    #[test]
    fn test_nested_set_rows() {
        let relation = build("nested_set");
        assert_eq!(relation.group_ids(), &["1", "2", "3", "4"]);

        // Own rows keep load order
        assert_eq!(relation.own_rows("3").indices(), &[0, 3]);
        // Subtree of 2: itself, then 3, then 4
        assert_eq!(relation.subtree_rows("2").indices(), &[2, 0, 3, 1]);
        assert_eq!(relation.subtree_rows("1").len(), 4);
        assert!(relation.own_rows("1").is_empty());
        assert!(relation.subtree_rows("missing").is_empty());
    }

    #[test]
    fn test_adjacency_matches_nested_set() {
        let nested = build("nested_set");
        let adjacency = build("adjacency_list");
        for id in nested.group_ids() {
            let mut a = nested.subtree_rows(id).indices().to_vec();
            let mut b = adjacency.subtree_rows(id).indices().to_vec();
            a.sort_unstable();
            b.sort_unstable();
            assert_eq!(a, b, "subtree of {}", id);
        }
    }

    #[test]
    fn test_direct_reference_is_flat() {
        let relation = build("direct_reference");
        assert!(!relation.is_hierarchical());
        assert_eq!(relation.subtree_rows("2").indices(), &[2]);
        assert_eq!(relation.reference_row("4"), Some(3));
    }

    #[test]
    fn test_unknown_plugin_is_malformed() {
        let registry = registry();
        let err = build_relation(
            &spec("closure_table", "taxon_ref_id"),
            registry.resolve("taxon").unwrap(),
            registry.resolve("occurrences").unwrap(),
        )
        .unwrap_err();
        assert!(matches!(err, RelationError::Malformed(_)));
    }

    #[test]
    fn test_missing_key_column() {
        let registry = registry();
        let err = build_relation(
            &spec("direct_reference", "plot_ref_id"),
            registry.resolve("taxon").unwrap(),
            registry.resolve("occurrences").unwrap(),
        )
        .unwrap_err();
        assert!(matches!(err, RelationError::MissingField { field, .. } if field == "plot_ref_id"));
    }

    #[test]
    fn test_stats_loader_rejects_duplicates() {
        let mut registry = registry();
        let stats = Table::from_rows(
            "taxon_stats",
            &["taxon_id", "n"],
            vec![vec![json!(1), json!(5)], vec![json!(1), json!(6)]],
        );
        registry
            .register(EntitySpec::new("taxon_stats", EntityKind::Dataset, "taxon_id"), stats)
            .unwrap();
        let err = build_relation(
            &spec("stats_loader", "taxon_id"),
            registry.resolve("taxon").unwrap(),
            registry.resolve("taxon_stats").unwrap(),
        )
        .unwrap_err();
        assert!(matches!(err, RelationError::AmbiguousStatsRow { id, .. } if id == "1"));
    }
}
