//! snlocest Configuration Management
//!
//! Provides configuration loading with support for:
//! - Global config: `~/.snlocest/config.toml`
//! - Local config: `.snlocest/config.toml` (in the working directory)
//! - CLI overrides via `ConfigOverrides`
//!
//! Configuration is merged in order: global → local → CLI overrides.

mod error;
mod loader;

pub use error::ConfigError;
pub use loader::ConfigLoader;

use serde::{Deserialize, Serialize};
use snlocest_core::{
    DistanceFormula, EdgeProbability, GraphBackend, KFold, MethodParams, VoteFilter,
    DEFAULT_CACHE_CAPACITY, DEFAULT_N_SPLITS,
};
use std::path::PathBuf;

/// Log levels accepted by `[logging] level`
pub const LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

/// Root configuration for snlocest.
///
/// Represents the fully merged configuration from all sources.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
#[serde(default)]
pub struct SnlocestConfig {
    /// Input files and graph representation
    pub data: DataConfig,

    /// Area distance settings
    pub distance: DistanceConfig,

    /// Parameters shared by the inference methods
    pub method: MethodConfig,

    /// Edge-probability curve for the probability model
    pub probability_model: ProbabilityModelConfig,

    /// Cross-validation settings
    pub crossval: CrossValConfig,

    /// Logging configuration
    pub logging: LoggingConfig,
}

/// Input data configuration.
///
/// # Example TOML
///
/// ```toml
/// [data]
/// delimiter = "\t"
/// graph_backend = "adjacency-list"
/// area_db = "/data/areas.tsv"
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct DataConfig {
    /// Column delimiter of edge and label lists
    pub delimiter: char,

    /// Graph representation to load into
    pub graph_backend: GraphBackend,

    /// Area coordinate table (`area<TAB>lon<TAB>lat[<TAB>name]`)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub area_db: Option<PathBuf>,
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            delimiter: '\t',
            graph_backend: GraphBackend::default(),
            area_db: None,
        }
    }
}

/// Distance configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct DistanceConfig {
    /// Geodesic formula (vincenty, hubeny)
    pub formula: DistanceFormula,

    /// Maximum memoized area pairs per distance cache
    pub cache_capacity: usize,
}

impl Default for DistanceConfig {
    fn default() -> Self {
        Self {
            formula: DistanceFormula::default(),
            cache_capacity: DEFAULT_CACHE_CAPACITY,
        }
    }
}

/// Method parameters.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct MethodConfig {
    /// Seed for the random-neighbor method
    pub random_state: u64,

    /// Majority vote: minimum out-degree to attempt a prediction
    pub min_friends: usize,

    /// Majority vote: maximum out-degree (unbounded when unset)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_friends: Option<usize>,

    /// Majority vote: minimum votes for the winning area
    pub min_votes: u64,
}

impl Default for MethodConfig {
    fn default() -> Self {
        Self {
            random_state: MethodParams::default().random_state,
            min_friends: 0,
            max_friends: None,
            min_votes: 0,
        }
    }
}

/// Probability model curve `p(d) = a * (d + b)^-c`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ProbabilityModelConfig {
    pub a: f64,
    pub b: f64,
    pub c: f64,

    /// Convert metric distances from meters to miles before the curve
    pub distance_in_meters: bool,
}

impl Default for ProbabilityModelConfig {
    fn default() -> Self {
        let edge = EdgeProbability::default();
        Self {
            a: edge.a,
            b: edge.b,
            c: edge.c,
            distance_in_meters: edge.distance_in_meters,
        }
    }
}

/// Cross-validation configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct CrossValConfig {
    /// Number of k-fold splits
    pub n_splits: usize,

    /// Seed for the fold shuffle
    pub random_state: u64,

    /// Shuffle labeled nodes before splitting
    pub shuffle: bool,

    /// Folds evaluated concurrently
    pub jobs: usize,
}

impl Default for CrossValConfig {
    fn default() -> Self {
        let kfold = KFold::default();
        Self {
            n_splits: DEFAULT_N_SPLITS,
            random_state: kfold.random_state,
            shuffle: kfold.shuffle,
            jobs: 1,
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

/// CLI overrides for configuration values.
///
/// Used to apply command-line arguments over file-based config.
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    /// Override column delimiter
    pub delimiter: Option<char>,

    /// Override graph backend
    pub graph_backend: Option<GraphBackend>,

    /// Override area coordinate table
    pub area_db: Option<PathBuf>,

    /// Override log level
    pub log_level: Option<String>,

    /// Override number of splits
    pub n_splits: Option<usize>,

    /// Override fold shuffle seed
    pub crossval_random_state: Option<u64>,

    /// Override fold parallelism
    pub jobs: Option<usize>,
}

impl SnlocestConfig {
    /// Apply CLI overrides to this configuration.
    pub fn apply_overrides(&mut self, overrides: &ConfigOverrides) {
        if let Some(delimiter) = overrides.delimiter {
            self.data.delimiter = delimiter;
        }

        if let Some(backend) = overrides.graph_backend {
            self.data.graph_backend = backend;
        }

        if let Some(ref path) = overrides.area_db {
            self.data.area_db = Some(path.clone());
        }

        if let Some(ref level) = overrides.log_level {
            self.logging.level = level.clone();
        }

        if let Some(n_splits) = overrides.n_splits {
            self.crossval.n_splits = n_splits;
        }

        if let Some(seed) = overrides.crossval_random_state {
            self.crossval.random_state = seed;
        }

        if let Some(jobs) = overrides.jobs {
            self.crossval.jobs = jobs;
        }
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if matches!(self.data.delimiter, '\n' | '\r') {
            return Err(ConfigError::invalid_value(
                "data.delimiter",
                "line breaks cannot separate columns",
            ));
        }

        if self.distance.cache_capacity == 0 {
            return Err(ConfigError::invalid_value(
                "distance.cache_capacity",
                "must be positive",
            ));
        }

        self.vote_filter()
            .validate()
            .map_err(|e| ConfigError::ValidationError(e.to_string()))?;
        self.edge_probability()
            .validate()
            .map_err(|e| ConfigError::ValidationError(e.to_string()))?;

        if self.crossval.n_splits < 2 {
            return Err(ConfigError::invalid_value(
                "crossval.n_splits",
                format!("must be at least 2, got {}", self.crossval.n_splits),
            ));
        }

        if self.crossval.jobs == 0 {
            return Err(ConfigError::invalid_value(
                "crossval.jobs",
                "must be at least 1",
            ));
        }

        let level = self.logging.level.to_lowercase();
        if !LOG_LEVELS.contains(&level.as_str()) {
            return Err(ConfigError::invalid_value(
                "logging.level",
                format!(
                    "unknown level '{}'. Valid values: {}",
                    self.logging.level,
                    LOG_LEVELS.join(", ")
                ),
            ));
        }

        Ok(())
    }

    /// Majority-vote thresholds from `[method]`
    pub fn vote_filter(&self) -> VoteFilter {
        VoteFilter {
            min_friends: self.method.min_friends,
            max_friends: self.method.max_friends.unwrap_or(usize::MAX),
            min_votes: self.method.min_votes,
        }
    }

    /// Edge-probability curve from `[probability_model]`
    pub fn edge_probability(&self) -> EdgeProbability {
        let pm = &self.probability_model;
        EdgeProbability {
            a: pm.a,
            b: pm.b,
            c: pm.c,
            distance_in_meters: pm.distance_in_meters,
        }
    }

    /// Parameters for building any inference method
    pub fn method_params(&self) -> MethodParams {
        MethodParams {
            random_state: self.method.random_state,
            vote_filter: self.vote_filter(),
            edge_probability: self.edge_probability(),
        }
    }

    /// K-fold splitter from `[crossval]`
    pub fn kfold(&self) -> KFold {
        KFold::new(self.crossval.n_splits)
            .with_shuffle(self.crossval.shuffle)
            .with_random_state(self.crossval.random_state)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_default_config() {
        let config = SnlocestConfig::default();
        assert_eq!(config.data.delimiter, '\t');
        assert_eq!(config.data.graph_backend, GraphBackend::Csr);
        assert_eq!(config.distance.formula, DistanceFormula::Vincenty);
        assert_eq!(config.distance.cache_capacity, 1 << 19);
        assert_eq!(config.crossval.n_splits, 10);
        assert_eq!(config.crossval.random_state, 100);
        assert!(config.crossval.shuffle);
        assert_eq!(config.logging.level, "info");
        assert!(!config.probability_model.distance_in_meters);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_default_method_params_match_core() {
        let config = SnlocestConfig::default();
        assert_eq!(config.method_params(), MethodParams::default());
        assert_eq!(config.kfold(), KFold::default());
    }

    #[test]
    fn test_apply_overrides() {
        let mut config = SnlocestConfig::default();
        let overrides = ConfigOverrides {
            delimiter: Some(','),
            graph_backend: Some(GraphBackend::AdjacencyList),
            area_db: Some(PathBuf::from("/data/areas.tsv")),
            log_level: Some("debug".to_string()),
            jobs: Some(4),
            ..Default::default()
        };

        config.apply_overrides(&overrides);

        assert_eq!(config.data.delimiter, ',');
        assert_eq!(config.data.graph_backend, GraphBackend::AdjacencyList);
        assert_eq!(config.data.area_db, Some(PathBuf::from("/data/areas.tsv")));
        assert_eq!(config.logging.level, "debug");
        assert_eq!(config.crossval.jobs, 4);
        assert_eq!(config.crossval.n_splits, 10);
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let mut config = SnlocestConfig::default();
        config.crossval.n_splits = 1;
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("crossval.n_splits"));

        let mut config = SnlocestConfig::default();
        config.method.min_friends = 10;
        config.method.max_friends = Some(5);
        assert!(config.validate().is_err());

        let mut config = SnlocestConfig::default();
        config.probability_model.c = -1.0;
        assert!(config.validate().is_err());

        let mut config = SnlocestConfig::default();
        config.logging.level = "loud".to_string();
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("loud"));

        let mut config = SnlocestConfig::default();
        config.distance.cache_capacity = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_vote_filter_unbounded_by_default() {
        let config = SnlocestConfig::default();
        assert_eq!(config.vote_filter().max_friends, usize::MAX);
    }

    #[test]
    fn test_config_toml_roundtrip() {
        let mut config = SnlocestConfig::default();
        config.data.graph_backend = GraphBackend::AdjacencyList;
        config.data.area_db = Some(PathBuf::from("areas.tsv"));
        config.distance.formula = DistanceFormula::Hubeny;
        config.method.max_friends = Some(200);
        config.probability_model.distance_in_meters = true;

        let toml_str = toml::to_string(&config).unwrap();
        assert!(toml_str.contains("graph_backend = \"adjacency-list\""));
        assert!(toml_str.contains("formula = \"hubeny\""));

        let parsed: SnlocestConfig = toml::from_str(&toml_str).unwrap();
        assert_eq!(parsed, config);
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let parsed: SnlocestConfig = toml::from_str(
            r#"
            [crossval]
            jobs = 8
            "#,
        )
        .unwrap();
        assert_eq!(parsed.crossval.jobs, 8);
        assert_eq!(parsed.crossval.n_splits, 10);
        assert_eq!(parsed.data, DataConfig::default());
    }
}
