//! Configuration parser (verb module)
//!
//! Transforms YAML files into config types and JSON data files into entity
//! records.

use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::path::Path;
use crate::config::TransformConfig;
use crate::error::ParseError;

/// Records of every entity, keyed by entity name
pub type DataSet = BTreeMap<String, Vec<Map<String, Value>>>;

/// Parse a transform config from a YAML file
pub fn parse_file<P: AsRef<Path>>(path: P) -> Result<TransformConfig, ParseError> {
    let contents = read(path.as_ref())?;
    parse_str(&contents)
}

/// Parse a transform config from a YAML string
pub fn parse_str(yaml: &str) -> Result<TransformConfig, ParseError> {
    serde_yaml::from_str(yaml).map_err(ParseError::from)
}

/// Parse entity records from a JSON file shaped `{entity: [record, ...]}`
pub fn parse_data_file<P: AsRef<Path>>(path: P) -> Result<DataSet, ParseError> {
    let contents = read(path.as_ref())?;
    parse_data_str(&contents)
}

/// Parse entity records from a JSON string
pub fn parse_data_str(json: &str) -> Result<DataSet, ParseError> {
    serde_json::from_str(json).map_err(ParseError::from)
}

fn read(path: &Path) -> Result<String, ParseError> {
    std::fs::read_to_string(path).map_err(|e| ParseError::Io {
        path: path.display().to_string(),
        source: e,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{RelationKind, Scope};

    #[test]
    fn test_parse_forest() {
        let config = parse_file("tests/test_data/forest.yaml").unwrap();

        // Entities
        assert_eq!(config.entities.len(), 5);
        let taxon = config.get_entity("taxon").unwrap();
        assert_eq!(taxon.id_field, "id");

        // Blocks
        assert_eq!(config.transforms.len(), 3);
        let block = config.get_block("taxon").unwrap();
        let source = block.primary_source().unwrap();
        assert_eq!(source.data, "occurrences");
        assert_eq!(source.grouping, "taxon");
        assert_eq!(source.relation.plugin.parse::<RelationKind>(), Ok(RelationKind::NestedSet));
        assert_eq!(source.relation.fields.parent, "parent_id");

        // Widgets
        let dbh = block.widgets_data.get("dbh_distribution").unwrap();
        assert_eq!(dbh.plugin, "binned_distribution");
        assert_eq!(dbh.scope, Scope::Subtree);

        let plot = config.get_block("plot").unwrap();
        assert_eq!(plot.all_sources().len(), 2);
    }

    #[test]
    fn test_parse_forest_data() {
        let data = parse_data_file("tests/test_data/forest_data.json").unwrap();
        assert!(data.contains_key("occurrences"));
        assert!(!data["taxon"].is_empty());
    }

    #[test]
    fn test_parse_invalid_yaml() {
        let result = parse_str("not: [valid: yaml");
        assert!(result.is_err());
    }

    #[test]
    fn test_missing_file_reports_path() {
        let err = parse_file("tests/test_data/nope.yaml").unwrap_err();
        assert!(err.to_string().contains("nope.yaml"));
    }
}
