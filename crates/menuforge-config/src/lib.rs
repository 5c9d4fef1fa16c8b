//! Configuration system for MenuForge.
//!
//! Load planner configuration from TOML or YAML files to control the
//! stochastic search (population size, generation budget, operator rates)
//! and the runtime envelope (seed, time limit) without code changes.
//!
//! # Examples
//!
//! ```
//! use menuforge_config::PlannerConfig;
//!
//! let config = PlannerConfig::from_toml_str(r#"
//!     random_seed = 42
//!     time_limit_ms = 2000
//!
//!     [darwin]
//!     population_size = 24
//!     nb_generations = 150
//! "#).unwrap();
//!
//! assert_eq!(config.random_seed, Some(42));
//! assert_eq!(config.darwin.population_size, 24);
//! ```
//!
//! Use defaults when the file is missing:
//!
//! ```
//! use menuforge_config::PlannerConfig;
//!
//! let config = PlannerConfig::load("planner.toml").unwrap_or_default();
//! ```

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Configuration error.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("YAML parse error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("invalid configuration: {0}")]
    Invalid(String),
}

/// Top-level planner configuration.
#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq)]
#[serde(rename_all = "snake_case")]
pub struct PlannerConfig {
    /// Random seed for reproducible solves. `None` seeds from entropy.
    #[serde(default)]
    pub random_seed: Option<u64>,

    /// Soft wall-clock limit per solve, in milliseconds. On expiry the
    /// solver returns its best solution so far.
    #[serde(default)]
    pub time_limit_ms: Option<u64>,

    /// Stochastic search parameters.
    #[serde(default)]
    pub darwin: DarwinConfig,
}

impl PlannerConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads configuration from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        Self::from_toml_file(path)
    }

    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_toml_str(&contents)
    }

    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(s)?;
        config.validated()
    }

    pub fn from_yaml_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_yaml_str(&contents)
    }

    pub fn from_yaml_str(s: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_yaml::from_str(s)?;
        config.validated()
    }

    pub fn with_random_seed(mut self, seed: u64) -> Self {
        self.random_seed = Some(seed);
        self
    }

    pub fn with_time_limit_ms(mut self, millis: u64) -> Self {
        self.time_limit_ms = Some(millis);
        self
    }

    pub fn with_darwin(mut self, darwin: DarwinConfig) -> Self {
        self.darwin = darwin;
        self
    }

    /// Time limit as a `Duration`, if configured.
    pub fn time_limit(&self) -> Option<Duration> {
        self.time_limit_ms.map(Duration::from_millis)
    }

    fn validated(self) -> Result<Self, ConfigError> {
        self.darwin.validate()?;
        Ok(self)
    }
}

/// Parameters of the population search.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(rename_all = "snake_case", default)]
pub struct DarwinConfig {
    /// Individuals kept after each selection.
    pub population_size: usize,
    /// Hard generation budget.
    pub nb_generations: u64,
    /// Stop after this many generations without best-cost improvement.
    pub max_stalled_generations: u64,
    /// Fraction of the population crossed per generation.
    pub crossover_rate: f64,
    /// Fraction of the population mutated per generation.
    pub mutation_rate: f64,
    /// Oriented-crossover probability ramp over the generation budget.
    pub oriented_crossover_rate_start: f64,
    pub oriented_crossover_rate_end: f64,
    /// Oriented-mutation probability ramp over the generation budget.
    pub oriented_mutation_rate_start: f64,
    pub oriented_mutation_rate_end: f64,
}

impl Default for DarwinConfig {
    fn default() -> Self {
        DarwinConfig {
            population_size: 32,
            nb_generations: 120,
            max_stalled_generations: 25,
            crossover_rate: 0.4,
            mutation_rate: 0.6,
            oriented_crossover_rate_start: 0.1,
            oriented_crossover_rate_end: 0.9,
            oriented_mutation_rate_start: 0.2,
            oriented_mutation_rate_end: 0.9,
        }
    }
}

impl DarwinConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        if self.population_size < 2 {
            return Err(ConfigError::Invalid(
                "population_size must be at least 2".into(),
            ));
        }
        let rates = [
            ("crossover_rate", self.crossover_rate),
            ("mutation_rate", self.mutation_rate),
            (
                "oriented_crossover_rate_start",
                self.oriented_crossover_rate_start,
            ),
            (
                "oriented_crossover_rate_end",
                self.oriented_crossover_rate_end,
            ),
            (
                "oriented_mutation_rate_start",
                self.oriented_mutation_rate_start,
            ),
            (
                "oriented_mutation_rate_end",
                self.oriented_mutation_rate_end,
            ),
        ];
        for (name, rate) in rates {
            if !(0.0..=1.0).contains(&rate) {
                return Err(ConfigError::Invalid(format!(
                    "{name} must be within [0, 1], got {rate}"
                )));
            }
        }
        Ok(())
    }

    /// Oriented-crossover probability at a point of the generation budget.
    pub fn oriented_crossover_rate(&self, progress: f64) -> f64 {
        self.oriented_crossover_rate_end * progress
            + self.oriented_crossover_rate_start * (1.0 - progress)
    }

    /// Oriented-mutation probability at a point of the generation budget.
    pub fn oriented_mutation_rate(&self, progress: f64) -> f64 {
        self.oriented_mutation_rate_end * progress
            + self.oriented_mutation_rate_start * (1.0 - progress)
    }
}

#[cfg(test)]
mod tests;
