mod common;

use common::inline;
use ecotransform::{
    CancelToken, EngineOptions, ErrorKind, PluginRegistry, RegistryError, TransformEngine, ValidationError,
};
use serde_json::json;

const PLOTS_YAML: &str = r#"
entities:
  - { name: plot, kind: reference, id_field: id }
  - { name: trees, id_field: id }
transforms:
  - group_by: plot
    source:
      data: trees
      grouping: plot
      relation: { plugin: direct_reference, key: plot_id }
    widgets_data:
      height:
        plugin: statistical_summary
        params: { field: height, stats: [max] }
      count:
        plugin: species_richness
        params: { field: species }
"#;

const PLOTS_DATA: &str = r#"{
  "plot": [{"id": "a"}, {"id": "b"}, {"id": "c"}],
  "trees": [
    {"id": 1, "plot_id": "a", "species": "x", "height": 4},
    {"id": 2, "plot_id": "b", "species": "y", "height": "broken"},
    {"id": 3, "plot_id": "b", "species": "z", "height": 7},
    {"id": 4, "plot_id": "c", "species": "x", "height": 9}
  ]
}"#;

#[test]
fn test_malformed_row_fails_one_widget() {
    let (config, entities) = inline(PLOTS_YAML, PLOTS_DATA);
    let plugins = PluginRegistry::with_builtins();
    let engine = TransformEngine::from_config(&config, &entities, &plugins).unwrap();
    let report = engine.run();

    assert_eq!(report.failures.len(), 1);
    let failure = &report.failures[0];
    assert_eq!(failure.dimension, "plot");
    assert_eq!(failure.group_id.as_deref(), Some("b"));
    assert_eq!(failure.widget.as_deref(), Some("height"));
    assert_eq!(failure.kind, ErrorKind::PluginDataError);

    // the sibling widget and the other groups are untouched
    assert_eq!(report.outputs.get("plot", "b", "count"), Some(json!(2)));
    assert_eq!(report.outputs.get("plot", "b", "height"), None);
    assert_eq!(report.outputs.get("plot", "c", "height"), Some(json!({"max": 9.0})));
    assert_eq!(report.groups_processed, 3);
}

#[test]
fn test_cancel_before_run() {
    let (config, entities) = inline(PLOTS_YAML, PLOTS_DATA);
    let plugins = PluginRegistry::with_builtins();
    let engine = TransformEngine::from_config(&config, &entities, &plugins).unwrap();

    let cancel = CancelToken::new();
    cancel.cancel();
    let report = engine.run_with(&cancel);
    assert!(report.cancelled);
    assert!(report.outputs.is_empty());
    assert_eq!(report.groups_processed, 0);
}

#[test]
fn test_cyclic_hierarchy_fails_only_its_dimension() {
    let yaml = r#"
entities:
  - { name: taxon, kind: reference, id_field: id }
  - { name: plot, kind: reference, id_field: id }
  - { name: occ, id_field: id }
transforms:
  - group_by: taxon
    source:
      data: occ
      grouping: taxon
      relation: { plugin: nested_set, key: taxon_id }
    widgets_data:
      n: { plugin: species_richness, params: { field: taxon_id } }
  - group_by: plot
    source:
      data: occ
      grouping: plot
      relation: { plugin: direct_reference, key: plot_id }
    widgets_data:
      n: { plugin: species_richness, params: { field: taxon_id } }
"#;
    let data = r#"{
  "taxon": [{"id": 1, "parent_id": 2}, {"id": 2, "parent_id": 1}],
  "plot": [{"id": 10}],
  "occ": [{"id": 1, "taxon_id": 1, "plot_id": 10}]
}"#;
    let (config, entities) = inline(yaml, data);
    let plugins = PluginRegistry::with_builtins();
    let engine = TransformEngine::from_config(&config, &entities, &plugins)
        .unwrap()
        .with_options(EngineOptions::sequential());
    let report = engine.run();

    assert_eq!(report.failures.len(), 1);
    assert_eq!(report.failures[0].dimension, "taxon");
    assert_eq!(report.failures[0].group_id, None);
    assert_eq!(report.failures[0].kind, ErrorKind::CyclicHierarchy);
    assert_eq!(report.outputs.get("plot", "10", "n"), Some(json!(1)));
    assert!(report.outputs.group_ids("taxon").is_empty());
}

#[test]
fn test_run_single_dimension() {
    let (config, entities) = inline(PLOTS_YAML, PLOTS_DATA);
    let plugins = PluginRegistry::with_builtins();
    let engine = TransformEngine::from_config(&config, &entities, &plugins).unwrap();
    let cancel = CancelToken::new();
    assert!(engine.run_dimension("shape", &cancel).is_none());
    let report = engine.run_dimension("plot", &cancel).unwrap();
    assert_eq!(report.outputs.group_ids("plot"), vec!["a", "b", "c"]);
}

#[test]
fn test_non_finite_cell_fails_one_group() {
    let yaml = r#"
entities:
  - { name: plot, kind: reference, id_field: id }
  - { name: trees, id_field: id }
transforms:
  - group_by: plot
    source:
      data: trees
      grouping: plot
      relation: { plugin: direct_reference, key: plot_id }
    widgets_data:
      dbh:
        plugin: binned_distribution
        params: { field: dbh, bins: [0, 10, 20] }
"#;
    let data = r#"{
  "plot": [{"id": "a"}, {"id": "b"}],
  "trees": [
    {"id": 1, "plot_id": "a", "dbh": 5},
    {"id": 2, "plot_id": "b", "dbh": "NaN"},
    {"id": 3, "plot_id": "b", "dbh": 12}
  ]
}"#;
    let (config, entities) = inline(yaml, data);
    let plugins = PluginRegistry::with_builtins();
    let engine = TransformEngine::from_config(&config, &entities, &plugins)
        .unwrap()
        .with_options(EngineOptions::sequential());
    let report = engine.run();

    assert_eq!(report.failures.len(), 1);
    assert_eq!(report.failures[0].group_id.as_deref(), Some("b"));
    assert_eq!(report.failures[0].kind, ErrorKind::PluginDataError);
    assert!(report.outputs.get("plot", "a", "dbh").is_some());
    assert_eq!(report.outputs.get("plot", "b", "dbh"), None);
    assert_eq!(report.groups_processed, 2);
}

#[test]
fn test_panicking_plugin_fails_one_widget() {
    let yaml = r#"
entities:
  - { name: plot, kind: reference, id_field: id }
  - { name: trees, id_field: id }
transforms:
  - group_by: plot
    source:
      data: trees
      grouping: plot
      relation: { plugin: direct_reference, key: plot_id }
    widgets_data:
      fragile: { plugin: fragile }
      count:
        plugin: species_richness
        params: { field: species }
"#;
    let (config, entities) = inline(yaml, PLOTS_DATA);
    let mut plugins = PluginRegistry::with_builtins();
    plugins.register_fn("fragile", |input, _| {
        if input.group_id == "b" {
            panic!("bad row");
        }
        Ok(json!(input.rows.len()))
    });

    for options in [EngineOptions::sequential(), EngineOptions::default()] {
        let engine = TransformEngine::from_config(&config, &entities, &plugins)
            .unwrap()
            .with_options(options);
        let report = engine.run();

        assert_eq!(report.failures.len(), 1);
        let failure = &report.failures[0];
        assert_eq!(failure.group_id.as_deref(), Some("b"));
        assert_eq!(failure.widget.as_deref(), Some("fragile"));
        assert_eq!(failure.kind, ErrorKind::PluginDataError);
        assert!(failure.message.contains("panicked"), "{}", failure.message);
        assert!(failure.message.contains("bad row"), "{}", failure.message);

        assert_eq!(report.outputs.get("plot", "a", "fragile"), Some(json!(1)));
        assert_eq!(report.outputs.get("plot", "c", "fragile"), Some(json!(1)));
        assert_eq!(report.outputs.get("plot", "b", "count"), Some(json!(2)));
        assert_eq!(report.groups_processed, 3);
    }
}

#[test]
fn test_bad_leaf_fails_its_ancestors_only() {
    let yaml = r#"
entities:
  - { name: taxon, kind: reference, id_field: id }
  - { name: occ, id_field: id }
transforms:
  - group_by: taxon
    source:
      data: occ
      grouping: taxon
      relation: { plugin: nested_set, key: taxon_id }
    widgets_data:
      height:
        plugin: statistical_summary
        params: { field: height, stats: [max] }
      own_height:
        plugin: statistical_summary
        params: { field: height, stats: [max] }
        scope: own
"#;
    // family 1 > genus 2 > species 3, 4; family 5 > species 6
    let data = r#"{
  "taxon": [
    {"id": 1, "parent_id": null},
    {"id": 2, "parent_id": 1},
    {"id": 3, "parent_id": 2},
    {"id": 4, "parent_id": 2},
    {"id": 5, "parent_id": null},
    {"id": 6, "parent_id": 5}
  ],
  "occ": [
    {"id": 1, "taxon_id": 1, "height": 2},
    {"id": 2, "taxon_id": 2, "height": 3},
    {"id": 3, "taxon_id": 3, "height": "broken"},
    {"id": 4, "taxon_id": 4, "height": 6},
    {"id": 5, "taxon_id": 6, "height": 8}
  ]
}"#;
    let (config, entities) = inline(yaml, data);
    let plugins = PluginRegistry::with_builtins();
    let engine = TransformEngine::from_config(&config, &entities, &plugins)
        .unwrap()
        .with_options(EngineOptions::sequential());
    let report = engine.run();

    let failed: Vec<(&str, &str)> = report
        .failures
        .iter()
        .map(|f| (f.group_id.as_deref().unwrap_or(""), f.widget.as_deref().unwrap_or("")))
        .collect();
    assert_eq!(
        failed,
        vec![("1", "height"), ("2", "height"), ("3", "height"), ("3", "own_height")]
    );
    assert!(report.failures.iter().all(|f| f.dimension == "taxon" && f.kind == ErrorKind::PluginDataError));

    let out = |group: &str, widget: &str| report.outputs.get("taxon", group, widget);
    // own rows of the ancestors hold no bad cell
    assert_eq!(out("1", "own_height"), Some(json!({"max": 2.0})));
    assert_eq!(out("2", "own_height"), Some(json!({"max": 3.0})));
    // sibling leaf and the other family are intact
    assert_eq!(out("4", "height"), Some(json!({"max": 6.0})));
    assert_eq!(out("4", "own_height"), Some(json!({"max": 6.0})));
    assert_eq!(out("5", "height"), Some(json!({"max": 8.0})));
    assert_eq!(out("5", "own_height"), Some(json!({"max": null})));
    assert_eq!(out("6", "height"), Some(json!({"max": 8.0})));
    assert_eq!(report.groups_processed, 6);
}

fn validate(yaml: &str) -> Result<(), ValidationError> {
    let (config, entities) = inline(yaml, PLOTS_DATA);
    let plugins = PluginRegistry::with_builtins();
    TransformEngine::from_config(&config, &entities, &plugins).map(|_| ())
}

#[test]
fn test_unknown_plugin_rejected_at_construction() {
    let yaml = PLOTS_YAML.replace("plugin: species_richness", "plugin: species_magic");
    let err = validate(&yaml).unwrap_err();
    assert!(matches!(&err, ValidationError::UnknownPlugin { plugin, .. } if plugin == "species_magic"));
    assert_eq!(err.kind(), ErrorKind::UnknownPlugin);
}

#[test]
fn test_unknown_plugin_in_chain_step() {
    let yaml = PLOTS_YAML.replace(
        "plugin: species_richness\n        params: { field: species }",
        "plugin: transform_chain\n        params: { steps: [{ plugin: nope, params: {}, output_key: a }] }",
    );
    let err = validate(&yaml).unwrap_err();
    assert!(matches!(&err, ValidationError::UnknownPlugin { plugin, widget, .. } if plugin == "nope" && widget == "count"));
}

#[test]
fn test_configuration_errors() {
    let err = validate(&PLOTS_YAML.replace("data: trees", "data: shrubs")).unwrap_err();
    assert!(matches!(err, ValidationError::Registry(RegistryError::UnknownEntity(name)) if name == "shrubs"));

    let err = validate(&PLOTS_YAML.replace("direct_reference", "hash_join")).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::MalformedRelation);

    let err = validate(&PLOTS_YAML.replace("key: plot_id", "key: plot_code")).unwrap_err();
    assert!(matches!(err, ValidationError::MalformedRelation { .. }));

    let err = validate(&PLOTS_YAML.replace("params: { field: height, stats: [max] }", "params: { field: height, source: other }"))
        .unwrap_err();
    assert!(matches!(err, ValidationError::UnknownSource { name, .. } if name == "other"));
}
