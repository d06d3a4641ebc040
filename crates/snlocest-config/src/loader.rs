//! Configuration loader with inheritance support.
//!
//! Loads configuration from multiple sources and merges them:
//! 1. Global config: `~/.snlocest/config.toml`
//! 2. Local config: `.snlocest/config.toml` (or a file given with `--config`)
//! 3. CLI overrides
//!
//! Later sources override earlier ones.

use crate::error::ConfigError;
use crate::{
    ConfigOverrides, CrossValConfig, DataConfig, DistanceConfig, LoggingConfig, MethodConfig,
    ProbabilityModelConfig, SnlocestConfig,
};
use std::path::{Path, PathBuf};
use tracing::{debug, trace};

/// Configuration file name.
const CONFIG_FILE_NAME: &str = "config.toml";

/// Global configuration directory name.
const GLOBAL_CONFIG_DIR: &str = ".snlocest";

/// Local configuration directory name.
const LOCAL_CONFIG_DIR: &str = ".snlocest";

/// Configuration loader with caching and inheritance support.
#[derive(Debug, Clone)]
pub struct ConfigLoader {
    /// Global config directory (e.g., `~/.snlocest`)
    global_config_dir: Option<PathBuf>,

    /// Cached global config
    global_config: Option<SnlocestConfig>,
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigLoader {
    /// Create a new configuration loader.
    ///
    /// Automatically detects the global config directory (`~/.snlocest`).
    pub fn new() -> Self {
        let global_config_dir = dirs::home_dir().map(|h| h.join(GLOBAL_CONFIG_DIR));

        Self {
            global_config_dir,
            global_config: None,
        }
    }

    /// Create a loader with a custom global config directory.
    ///
    /// Useful for testing.
    pub fn with_global_dir(global_dir: impl Into<PathBuf>) -> Self {
        Self {
            global_config_dir: Some(global_dir.into()),
            global_config: None,
        }
    }

    /// Get the global config file path.
    pub fn global_config_path(&self) -> Option<PathBuf> {
        self.global_config_dir
            .as_ref()
            .map(|d| d.join(CONFIG_FILE_NAME))
    }

    /// Get the local config file path for a working directory.
    pub fn local_config_path(&self, root: &Path) -> PathBuf {
        root.join(LOCAL_CONFIG_DIR).join(CONFIG_FILE_NAME)
    }

    /// Load configuration for a working directory with optional CLI overrides.
    ///
    /// Merges config in order: global → local → overrides.
    pub fn load(
        &mut self,
        root: &Path,
        overrides: Option<&ConfigOverrides>,
    ) -> Result<SnlocestConfig, ConfigError> {
        let local = self.load_local(root)?;
        self.load_layers(local, overrides)
    }

    /// Load configuration with an explicit file in place of the local config.
    ///
    /// Unlike the local config, the file must exist.
    pub fn load_from(
        &mut self,
        path: &Path,
        overrides: Option<&ConfigOverrides>,
    ) -> Result<SnlocestConfig, ConfigError> {
        if !path.exists() {
            return Err(ConfigError::NotFound(path.to_path_buf()));
        }
        debug!("Loading config from {:?}", path);
        let file = load_config_file(path)?;
        self.load_layers(Some(file), overrides)
    }

    fn load_layers(
        &mut self,
        local: Option<SnlocestConfig>,
        overrides: Option<&ConfigOverrides>,
    ) -> Result<SnlocestConfig, ConfigError> {
        // Start with default config
        let mut config = SnlocestConfig::default();

        if let Some(global_config) = self.load_global()? {
            config = merge_configs(config, global_config);
        }

        if let Some(local_config) = local {
            config = merge_configs(config, local_config);
        }

        if let Some(ovr) = overrides {
            config.apply_overrides(ovr);
        }

        Ok(config)
    }

    /// Load only the global configuration.
    pub fn load_global(&mut self) -> Result<Option<SnlocestConfig>, ConfigError> {
        // Return cached global config if available
        if let Some(ref config) = self.global_config {
            return Ok(Some(config.clone()));
        }

        let Some(global_path) = self.global_config_path() else {
            debug!("No home directory found, skipping global config");
            return Ok(None);
        };

        if !global_path.exists() {
            trace!("Global config not found at {:?}", global_path);
            return Ok(None);
        }

        debug!("Loading global config from {:?}", global_path);
        let config = load_config_file(&global_path)?;

        self.global_config = Some(config.clone());

        Ok(Some(config))
    }

    /// Load only the local configuration for a working directory.
    pub fn load_local(&self, root: &Path) -> Result<Option<SnlocestConfig>, ConfigError> {
        let local_path = self.local_config_path(root);

        if !local_path.exists() {
            trace!("Local config not found at {:?}", local_path);
            return Ok(None);
        }

        debug!("Loading local config from {:?}", local_path);
        load_config_file(&local_path).map(Some)
    }

    /// Save configuration to the global config file.
    pub fn save_global(&self, config: &SnlocestConfig) -> Result<(), ConfigError> {
        let Some(ref global_dir) = self.global_config_dir else {
            return Err(ConfigError::NoHomeDir);
        };

        let global_path = global_dir.join(CONFIG_FILE_NAME);
        save_config_file(&global_path, config)
    }

    /// Save configuration to the local config file for a working directory.
    pub fn save_local(&self, root: &Path, config: &SnlocestConfig) -> Result<(), ConfigError> {
        let local_path = self.local_config_path(root);
        save_config_file(&local_path, config)
    }

    /// Initialize global configuration directory.
    ///
    /// Creates `~/.snlocest/config.toml` with default configuration.
    /// An existing file is left untouched.
    pub fn init_global(&self) -> Result<PathBuf, ConfigError> {
        let Some(ref global_dir) = self.global_config_dir else {
            return Err(ConfigError::NoHomeDir);
        };
        init_config_dir(global_dir)
    }

    /// Initialize local configuration for a working directory.
    ///
    /// Creates `.snlocest/config.toml` with default configuration.
    pub fn init_local(&self, root: &Path) -> Result<PathBuf, ConfigError> {
        init_config_dir(&root.join(LOCAL_CONFIG_DIR))
    }

    /// Clear cached global configuration.
    ///
    /// Forces reload on next `load_global()` call.
    pub fn clear_cache(&mut self) {
        self.global_config = None;
    }
}

fn init_config_dir(dir: &Path) -> Result<PathBuf, ConfigError> {
    if !dir.exists() {
        std::fs::create_dir_all(dir).map_err(|e| ConfigError::create_dir(dir, e))?;
    }

    let config_path = dir.join(CONFIG_FILE_NAME);
    if !config_path.exists() {
        save_config_file(&config_path, &SnlocestConfig::default())?;
    }

    Ok(config_path)
}

/// Load a configuration file from disk.
fn load_config_file(path: &Path) -> Result<SnlocestConfig, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::read_file(path, e))?;

    toml::from_str(&content).map_err(|e| ConfigError::parse_toml(path, e))
}

/// Save a configuration file to disk.
fn save_config_file(path: &Path, config: &SnlocestConfig) -> Result<(), ConfigError> {
    // Ensure parent directory exists
    if let Some(parent) = path.parent() {
        if !parent.exists() {
            std::fs::create_dir_all(parent).map_err(|e| ConfigError::create_dir(parent, e))?;
        }
    }

    let content = toml::to_string_pretty(config)?;
    std::fs::write(path, content).map_err(|e| ConfigError::write_file(path, e))
}

/// Pick `overlay` unless it equals the default, in which case keep `base`.
fn pick<T: PartialEq>(base: T, overlay: T, default: T) -> T {
    if overlay != default {
        overlay
    } else {
        base
    }
}

/// Merge two configurations, with `overlay` taking precedence.
///
/// This performs a field-by-field merge, allowing partial configs.
fn merge_configs(base: SnlocestConfig, overlay: SnlocestConfig) -> SnlocestConfig {
    SnlocestConfig {
        data: merge_data(base.data, overlay.data),
        distance: merge_distance(base.distance, overlay.distance),
        method: merge_method(base.method, overlay.method),
        probability_model: merge_probability_model(
            base.probability_model,
            overlay.probability_model,
        ),
        crossval: merge_crossval(base.crossval, overlay.crossval),
        logging: merge_logging(base.logging, overlay.logging),
    }
}

fn merge_data(base: DataConfig, overlay: DataConfig) -> DataConfig {
    let default = DataConfig::default();
    DataConfig {
        delimiter: pick(base.delimiter, overlay.delimiter, default.delimiter),
        graph_backend: pick(base.graph_backend, overlay.graph_backend, default.graph_backend),
        area_db: overlay.area_db.or(base.area_db),
    }
}

fn merge_distance(base: DistanceConfig, overlay: DistanceConfig) -> DistanceConfig {
    let default = DistanceConfig::default();
    DistanceConfig {
        formula: pick(base.formula, overlay.formula, default.formula),
        cache_capacity: pick(
            base.cache_capacity,
            overlay.cache_capacity,
            default.cache_capacity,
        ),
    }
}

fn merge_method(base: MethodConfig, overlay: MethodConfig) -> MethodConfig {
    let default = MethodConfig::default();
    MethodConfig {
        random_state: pick(base.random_state, overlay.random_state, default.random_state),
        min_friends: pick(base.min_friends, overlay.min_friends, default.min_friends),
        max_friends: overlay.max_friends.or(base.max_friends),
        min_votes: pick(base.min_votes, overlay.min_votes, default.min_votes),
    }
}

fn merge_probability_model(
    base: ProbabilityModelConfig,
    overlay: ProbabilityModelConfig,
) -> ProbabilityModelConfig {
    let default = ProbabilityModelConfig::default();
    ProbabilityModelConfig {
        a: pick(base.a, overlay.a, default.a),
        b: pick(base.b, overlay.b, default.b),
        c: pick(base.c, overlay.c, default.c),
        distance_in_meters: pick(
            base.distance_in_meters,
            overlay.distance_in_meters,
            default.distance_in_meters,
        ),
    }
}

fn merge_crossval(base: CrossValConfig, overlay: CrossValConfig) -> CrossValConfig {
    let default = CrossValConfig::default();
    CrossValConfig {
        n_splits: pick(base.n_splits, overlay.n_splits, default.n_splits),
        random_state: pick(base.random_state, overlay.random_state, default.random_state),
        shuffle: pick(base.shuffle, overlay.shuffle, default.shuffle),
        jobs: pick(base.jobs, overlay.jobs, default.jobs),
    }
}

fn merge_logging(base: LoggingConfig, overlay: LoggingConfig) -> LoggingConfig {
    LoggingConfig {
        level: pick(base.level, overlay.level, LoggingConfig::default().level),
    }
}
