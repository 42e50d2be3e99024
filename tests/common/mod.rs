//! Shared test utilities for integration tests

#![allow(dead_code)]

use ecotransform::{
    parser, EngineOptions, EntityRegistry, PluginRegistry, RunReport, TransformConfig, TransformEngine,
};

/// Load a transform config from the tests/test_data directory
pub fn load_fixture(name: &str) -> TransformConfig {
    let path = format!("tests/test_data/{}", name);
    parser::parse_file(&path).unwrap_or_else(|e| panic!("Failed to load test data {}: {}", name, e))
}

/// Load entity records from the tests/test_data directory
pub fn load_registry(config: &TransformConfig, name: &str) -> EntityRegistry {
    let path = format!("tests/test_data/{}", name);
    let data = parser::parse_data_file(&path).unwrap_or_else(|e| panic!("Failed to load data {}: {}", name, e));
    EntityRegistry::from_specs(&config.entities, &data)
        .unwrap_or_else(|e| panic!("Failed to register entities of {}: {}", name, e))
}

/// The forest fixture: config plus registered entities
pub fn forest() -> (TransformConfig, EntityRegistry) {
    let config = load_fixture("forest.yaml");
    let registry = load_registry(&config, "forest_data.json");
    (config, registry)
}

/// Run the forest fixture with the given options
pub fn run_forest(options: EngineOptions) -> RunReport {
    let (config, entities) = forest();
    let plugins = PluginRegistry::with_builtins();
    let engine = TransformEngine::from_config(&config, &entities, &plugins)
        .unwrap_or_else(|e| panic!("forest config should validate: {}", e))
        .with_options(options);
    engine.run()
}

/// Config and data given inline as YAML and JSON
pub fn inline(yaml: &str, data: &str) -> (TransformConfig, EntityRegistry) {
    let config = parser::parse_str(yaml).unwrap_or_else(|e| panic!("bad inline config: {}", e));
    let data = parser::parse_data_str(data).unwrap_or_else(|e| panic!("bad inline data: {}", e));
    let registry = EntityRegistry::from_specs(&config.entities, &data)
        .unwrap_or_else(|e| panic!("bad inline entities: {}", e));
    (config, registry)
}
