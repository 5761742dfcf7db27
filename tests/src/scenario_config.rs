//! Scenario configuration integration tests
//!
//! Loads the shipped YAML scenario and checks how malformed or invalid
//! scenarios are reported.

use integration_tests::{
    assert_connection_counts, assert_pools_full, init_test_logging, TestResult,
};
use slicesim_common::{
    load_scenario_config, load_scenario_config_from_str, validate_scenario_config,
    ConfigValidationError, Error, ScenarioConfig,
};
use slicesim_engine::{EngineError, Scenario, Simulation};

const REFERENCE_FILE: &str = concat!(
    env!("CARGO_MANIFEST_DIR"),
    "/../config/reference-scenario.yaml"
);

#[test]
fn test_reference_file_matches_builtin() -> TestResult {
    let config = load_scenario_config(REFERENCE_FILE)?;
    assert_eq!(config, ScenarioConfig::reference());
    validate_scenario_config(&config)?;
    Ok(())
}

#[test]
fn test_reference_file_runs() {
    init_test_logging();
    let config = load_scenario_config(REFERENCE_FILE).unwrap();
    let mut sim = Simulation::from_config(&config).unwrap();
    assert_eq!(sim.clients().len(), 100);
    assert_eq!(sim.stations().len(), 2);
    assert_eq!(sim.patterns().len(), 3);

    for _ in 0..200 {
        sim.advance_tick().unwrap();
        assert_connection_counts(&sim);
        assert_pools_full(&sim);
    }

    let history = sim.stats().history();
    assert_eq!(history.len(), 200);
    assert!(history.iter().any(|s| s.connect_attempts > 0));
    assert!(history.iter().all(|s| (0.0..=1.0).contains(&s.coverage_ratio)));
}

#[test]
fn test_missing_file() {
    let err = load_scenario_config("/nonexistent/scenario.yaml").unwrap_err();
    assert!(matches!(err, Error::Io(_)));
}

#[test]
fn test_malformed_yaml() {
    let err = load_scenario_config_from_str("slices: [unterminated").unwrap_err();
    assert!(matches!(err, Error::YamlParse(_)));

    // Structurally valid YAML missing required sections
    let err = load_scenario_config_from_str("seed: 3\n").unwrap_err();
    assert!(matches!(err, Error::YamlParse(_)));
}

#[test]
fn test_optional_sections_default() {
    let mut reference = ScenarioConfig::reference();
    reference.mobility_patterns.clear();
    let mut yaml = serde_json::to_value(&reference).unwrap();
    let object = yaml.as_object_mut().unwrap();
    object.remove("seed");
    object.remove("mobility_patterns");

    // JSON is a subset of YAML
    let config = load_scenario_config_from_str(&yaml.to_string()).unwrap();
    assert_eq!(config.seed, 0);
    assert!(config.mobility_patterns.is_empty());

    init_test_logging();
    let mut sim = Simulation::from_config(&config).unwrap();
    let start: Vec<_> = sim.clients().iter().map(|c| c.position()).collect();
    sim.run(10).unwrap();
    let end: Vec<_> = sim.clients().iter().map(|c| c.position()).collect();
    assert_eq!(start, end, "clients without a pattern stay put");
}

#[test]
fn test_missing_ratio_rejected() {
    let mut config = ScenarioConfig::reference();
    config.base_stations[1].ratios.remove("URLLC");

    assert_eq!(
        validate_scenario_config(&config),
        Err(ConfigValidationError::MissingRatio {
            station: 1,
            slice: "URLLC".to_string()
        })
    );
    assert!(matches!(
        Simulation::from_config(&config),
        Err(EngineError::Config(Error::Validation(ConfigValidationError::MissingRatio { .. })))
    ));
}

#[test]
fn test_ratio_overflow_rejected() {
    let mut config = ScenarioConfig::reference();
    config.base_stations[0].ratios.insert("eMBB".to_string(), 0.8);

    assert!(matches!(
        validate_scenario_config(&config),
        Err(ConfigValidationError::RatioOverflow { station: 0, .. })
    ));
}

#[test]
fn test_unknown_distribution_rejected() {
    let mut config = ScenarioConfig::reference();
    config.mobility_patterns[0].distribution.distribution = "zipf".to_string();

    assert!(validate_scenario_config(&config).is_ok());
    assert!(matches!(
        Scenario::from_config(&config),
        Err(EngineError::Distribution(_))
    ));
}

#[test]
fn test_seed_changes_population() {
    let mut config = ScenarioConfig::reference();
    let first = Scenario::from_config(&config).unwrap();
    let again = Scenario::from_config(&config).unwrap();
    config.seed = 99;
    let other = Scenario::from_config(&config).unwrap();

    let positions = |s: &Scenario| s.clients.iter().map(|c| c.position()).collect::<Vec<_>>();
    assert_eq!(positions(&first), positions(&again));
    assert_ne!(positions(&first), positions(&other));
}
