//! Entity schema definitions

use serde::Deserialize;

/// Whether an entity holds facts or the members of a grouping dimension
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntityKind {
    /// Fact rows (occurrences, plot measurements, precomputed stats)
    #[default]
    Dataset,
    /// Rows that define groups (taxonomy nodes, plots, shapes)
    Reference,
}

/// A column mapping from a source record key to a table column
///
/// Accepts either a bare column name (`- dbh`) or an explicit
/// `{ target: dbh, source: diameter }` pair in YAML.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(from = "FieldMappingRepr")]
pub struct FieldMapping {
    /// Column name inside the loaded table
    pub target: String,
    /// Key in the raw records
    pub source: String,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum FieldMappingRepr {
    Name(String),
    Pair {
        target: String,
        source: Option<String>,
    },
}

impl From<FieldMappingRepr> for FieldMapping {
    fn from(repr: FieldMappingRepr) -> Self {
        match repr {
            FieldMappingRepr::Name(name) => FieldMapping {
                source: name.clone(),
                target: name,
            },
            FieldMappingRepr::Pair { target, source } => FieldMapping {
                source: source.unwrap_or_else(|| target.clone()),
                target,
            },
        }
    }
}

/// A named, typed source of rows
#[derive(Debug, Clone, Deserialize)]
pub struct EntitySpec {
    pub name: String,
    #[serde(default)]
    pub kind: EntityKind,
    /// Column holding the row identifier
    pub id_field: String,
    /// Ordered column list; empty means "every key found in the records"
    #[serde(default)]
    pub fields: Vec<FieldMapping>,
    /// Geometry column, for shape-like entities
    pub geometry_field: Option<String>,
}

impl EntitySpec {
    /// Convenience constructor used by tests and programmatic setups
    pub fn new(name: &str, kind: EntityKind, id_field: &str) -> Self {
        Self {
            name: name.to_string(),
            kind,
            id_field: id_field.to_string(),
            fields: Vec::new(),
            geometry_field: None,
        }
    }

    /// Declare the columns of this entity (target name equals source key)
    pub fn with_fields(mut self, fields: &[&str]) -> Self {
        self.fields = fields
            .iter()
            .map(|f| FieldMapping {
                target: f.to_string(),
                source: f.to_string(),
            })
            .collect();
        self
    }

    /// Target column names in declared order
    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|f| f.target.as_str())
    }
}
