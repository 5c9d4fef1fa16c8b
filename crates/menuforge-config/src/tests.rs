//! Tests for planner configuration.

use super::*;

#[test]
fn toml_parsing() {
    let toml = r#"
        random_seed = 42
        time_limit_ms = 1500

        [darwin]
        population_size = 16
        nb_generations = 80
        max_stalled_generations = 10
        crossover_rate = 0.5
    "#;

    let config = PlannerConfig::from_toml_str(toml).unwrap();
    assert_eq!(config.random_seed, Some(42));
    assert_eq!(config.time_limit(), Some(Duration::from_millis(1500)));
    assert_eq!(config.darwin.population_size, 16);
    assert_eq!(config.darwin.nb_generations, 80);
    assert_eq!(config.darwin.crossover_rate, 0.5);
    // Unset fields keep their defaults.
    assert_eq!(config.darwin.mutation_rate, DarwinConfig::default().mutation_rate);
}

#[test]
fn yaml_parsing() {
    let yaml = r#"
        random_seed: 42
        darwin:
          population_size: 8
    "#;

    let config = PlannerConfig::from_yaml_str(yaml).unwrap();
    assert_eq!(config.random_seed, Some(42));
    assert_eq!(config.darwin.population_size, 8);
}

#[test]
fn builder() {
    let config = PlannerConfig::new()
        .with_random_seed(123)
        .with_time_limit_ms(60_000)
        .with_darwin(DarwinConfig {
            population_size: 10,
            ..DarwinConfig::default()
        });

    assert_eq!(config.random_seed, Some(123));
    assert_eq!(config.time_limit(), Some(Duration::from_secs(60)));
    assert_eq!(config.darwin.population_size, 10);
}

#[test]
fn invalid_rate_is_rejected() {
    let toml = r#"
        [darwin]
        mutation_rate = 1.5
    "#;
    assert!(matches!(
        PlannerConfig::from_toml_str(toml),
        Err(ConfigError::Invalid(_))
    ));
}

#[test]
fn tiny_population_is_rejected() {
    let toml = r#"
        [darwin]
        population_size = 1
    "#;
    assert!(matches!(
        PlannerConfig::from_toml_str(toml),
        Err(ConfigError::Invalid(_))
    ));
}

#[test]
fn oriented_rates_ramp_with_progress() {
    let darwin = DarwinConfig::default();
    let start = darwin.oriented_mutation_rate(0.0);
    let end = darwin.oriented_mutation_rate(1.0);
    assert_eq!(start, darwin.oriented_mutation_rate_start);
    assert_eq!(end, darwin.oriented_mutation_rate_end);
    assert!(darwin.oriented_mutation_rate(0.5) > start);
    assert!(darwin.oriented_mutation_rate(0.5) < end);
}
