//! Entity handles and the registry that owns them

use serde_json::{Map, Value};
use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, OnceLock};
use tracing::debug;
use crate::config::{EntityKind, EntitySpec};
use crate::table::{id_key, Table};
use super::error::RegistryError;

/// A registered entity: its schema and its rows
#[derive(Debug)]
pub struct Entity {
    pub spec: EntitySpec,
    pub table: Table,
    /// id -> row, built on first lookup
    row_index: OnceLock<HashMap<String, usize>>,
}

impl Entity {
    pub fn new(spec: EntitySpec, table: Table) -> Self {
        Self {
            spec,
            table,
            row_index: OnceLock::new(),
        }
    }

    /// Row holding `id` in the id field; the first row wins on duplicates
    pub fn row_of(&self, id: &str) -> Option<usize> {
        self.row_index
            .get_or_init(|| {
                let mut index = HashMap::with_capacity(self.table.len());
                if let Some(col) = self.table.column_index(self.id_field()) {
                    for row in 0..self.table.len() {
                        if let Some(key) = id_key(self.table.value(row, col)) {
                            index.entry(key).or_insert(row);
                        }
                    }
                }
                index
            })
            .get(id)
            .copied()
    }

    pub fn name(&self) -> &str {
        &self.spec.name
    }

    pub fn kind(&self) -> EntityKind {
        self.spec.kind
    }

    pub fn id_field(&self) -> &str {
        &self.spec.id_field
    }
}

/// Shared, immutable handle to a registered entity
pub type EntityHandle = Arc<Entity>;

/// Name -> entity map, built once per run
#[derive(Debug, Default)]
pub struct EntityRegistry {
    entities: BTreeMap<String, EntityHandle>,
}

impl EntityRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an entity with its rows.
    ///
    /// The id field must be one of the table columns or the geometry field.
    pub fn register(&mut self, spec: EntitySpec, table: Table) -> Result<EntityHandle, RegistryError> {
        if self.entities.contains_key(&spec.name) {
            return Err(RegistryError::InvalidEntitySchema {
                entity: spec.name.clone(),
                reason: "entity registered twice".to_string(),
            });
        }

        let declared = if spec.fields.is_empty() {
            table.has_column(&spec.id_field)
        } else {
            spec.field_names().any(|f| f == spec.id_field)
        };
        let is_geometry_id = spec.geometry_field.as_deref() == Some(spec.id_field.as_str());
        if !declared && !is_geometry_id {
            return Err(RegistryError::InvalidEntitySchema {
                entity: spec.name.clone(),
                reason: format!("id field '{}' is not a declared field", spec.id_field),
            });
        }

        debug!(entity = %spec.name, rows = table.len(), columns = table.columns().len(), "registered entity");
        let handle = Arc::new(Entity::new(spec, table));
        self.entities.insert(handle.name().to_string(), Arc::clone(&handle));
        Ok(handle)
    }

    /// Register an entity from raw JSON records
    pub fn register_records(
        &mut self,
        spec: EntitySpec,
        records: &[Map<String, Value>],
    ) -> Result<EntityHandle, RegistryError> {
        let table = Table::from_records(&spec, records);
        self.register(spec, table)
    }

    /// Register every entity spec, taking its records from `data` by name.
    ///
    /// Entities with no records in `data` are registered empty.
    pub fn from_specs(
        specs: &[EntitySpec],
        data: &BTreeMap<String, Vec<Map<String, Value>>>,
    ) -> Result<Self, RegistryError> {
        let mut registry = Self::new();
        for spec in specs {
            let records = data.get(&spec.name).map(Vec::as_slice).unwrap_or(&[]);
            registry.register_records(spec.clone(), records)?;
        }
        Ok(registry)
    }

    /// Look up an entity by name
    pub fn resolve(&self, name: &str) -> Result<EntityHandle, RegistryError> {
        self.entities
            .get(name)
            .cloned()
            .ok_or_else(|| RegistryError::UnknownEntity(name.to_string()))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entities.contains_key(name)
    }

    /// Registered entity names, sorted
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entities.keys().map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn taxa() -> Table {
        Table::from_rows("taxon", &["id", "parent_id"], vec![vec![json!(1), json!(null)]])
    }

    #[test]
    fn test_register_and_resolve() {
        let mut registry = EntityRegistry::new();
        let spec = EntitySpec::new("taxon", EntityKind::Reference, "id").with_fields(&["id", "parent_id"]);
        registry.register(spec, taxa()).unwrap();

        let handle = registry.resolve("taxon").unwrap();
        assert_eq!(handle.kind(), EntityKind::Reference);
        assert_eq!(handle.table.len(), 1);
        assert!(matches!(registry.resolve("plots"), Err(RegistryError::UnknownEntity(n)) if n == "plots"));
    }

    #[test]
    fn test_row_of_first_row_wins() {
        let mut registry = EntityRegistry::new();
        let spec = EntitySpec::new("taxon", EntityKind::Reference, "id").with_fields(&["id", "parent_id"]);
        let table = Table::from_rows(
            "taxon",
            &["id", "parent_id"],
            vec![
                vec![json!(1), json!(null)],
                vec![json!(2), json!(1)],
                vec![json!(2.0), json!(1)],
                vec![json!(null), json!(1)],
            ],
        );
        registry.register(spec, table).unwrap();

        let handle = registry.resolve("taxon").unwrap();
        assert_eq!(handle.row_of("1"), Some(0));
        assert_eq!(handle.row_of("2"), Some(1));
        assert_eq!(handle.row_of("2"), Some(1));
        assert_eq!(handle.row_of("9"), None);
    }

    #[test]
    fn test_id_field_must_be_declared() {
        let mut registry = EntityRegistry::new();
        let spec = EntitySpec::new("taxon", EntityKind::Reference, "taxon_id").with_fields(&["id", "parent_id"]);
        let err = registry.register(spec, taxa()).unwrap_err();
        assert!(matches!(err, RegistryError::InvalidEntitySchema { .. }));
    }

    #[test]
    fn test_geometry_field_can_be_the_id() {
        let mut registry = EntityRegistry::new();
        let mut spec = EntitySpec::new("shapes", EntityKind::Reference, "geom").with_fields(&["name"]);
        spec.geometry_field = Some("geom".to_string());
        assert!(registry.register(spec, Table::new("shapes", vec!["name".into()])).is_ok());
    }

    #[test]
    fn test_duplicate_registration_rejected() {
        let mut registry = EntityRegistry::new();
        let spec = EntitySpec::new("taxon", EntityKind::Reference, "id");
        registry.register(spec.clone(), taxa()).unwrap();
        assert!(registry.register(spec, taxa()).is_err());
    }
}
