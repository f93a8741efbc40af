//! CLI configuration file support.
//!
//! Configuration precedence:
//! 1. CLI arguments (handled by clap)
//! 2. Local config file (./.tuneflowrc)
//! 3. Global config file (~/.tuneflow/config.toml)
//! 4. Defaults

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tuneflow_training::{SimulationSettings, TrainingConfig};

/// CLI configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CliConfig {
    /// Log level
    #[serde(default)]
    pub log_level: Option<String>,

    /// Custom pipeline catalogue (TOML or JSON)
    #[serde(default)]
    pub catalogue: Option<PathBuf>,

    /// Output format preferences
    #[serde(default)]
    pub output: OutputConfig,

    /// Defaults for `train`
    #[serde(default)]
    pub training: TrainingOverrides,

    /// Tick timing and log sizing of the simulated job
    #[serde(default)]
    pub simulation: SimulationOverrides,
}

/// Output format configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    /// Default output format (human, json)
    #[serde(default = "default_output_format")]
    pub format: String,

    /// Always use JSON output
    #[serde(default)]
    pub always_json: bool,
}

fn default_output_format() -> String {
    "human".to_string()
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self { format: default_output_format(), always_json: false }
    }
}

impl OutputConfig {
    pub fn wants_json(&self) -> bool {
        self.always_json || self.format == "json"
    }
}

/// Per-field training defaults; unset fields keep the built-in value.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TrainingOverrides {
    pub model_name: Option<String>,
    pub dataset_path: Option<String>,
    pub learning_rate: Option<f64>,
    pub batch_size: Option<u32>,
    pub epochs: Option<u32>,
    pub beta_value: Option<f64>,
    pub warmup_steps: Option<u32>,
    pub save_steps: Option<u32>,
}

impl TrainingOverrides {
    pub fn apply(&self, config: &mut TrainingConfig) {
        if let Some(ref model_name) = self.model_name {
            config.model_name.clone_from(model_name);
        }
        if let Some(ref dataset_path) = self.dataset_path {
            config.dataset_path.clone_from(dataset_path);
        }
        if let Some(learning_rate) = self.learning_rate {
            config.learning_rate = learning_rate;
        }
        if let Some(batch_size) = self.batch_size {
            config.batch_size = batch_size;
        }
        if let Some(epochs) = self.epochs {
            config.epochs = epochs;
        }
        if let Some(beta_value) = self.beta_value {
            config.beta_value = beta_value;
        }
        if let Some(warmup_steps) = self.warmup_steps {
            config.warmup_steps = warmup_steps;
        }
        if let Some(save_steps) = self.save_steps {
            config.save_steps = save_steps;
        }
    }

    fn merge(&mut self, other: &Self) {
        if other.model_name.is_some() {
            self.model_name.clone_from(&other.model_name);
        }
        if other.dataset_path.is_some() {
            self.dataset_path.clone_from(&other.dataset_path);
        }
        self.learning_rate = other.learning_rate.or(self.learning_rate);
        self.batch_size = other.batch_size.or(self.batch_size);
        self.epochs = other.epochs.or(self.epochs);
        self.beta_value = other.beta_value.or(self.beta_value);
        self.warmup_steps = other.warmup_steps.or(self.warmup_steps);
        self.save_steps = other.save_steps.or(self.save_steps);
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SimulationOverrides {
    pub tick_ms: Option<u64>,
    pub steps_per_epoch: Option<u64>,
    pub log_every: Option<u64>,
    pub log_capacity: Option<usize>,
}

impl SimulationOverrides {
    pub fn apply(&self, settings: &mut SimulationSettings) {
        if let Some(tick_ms) = self.tick_ms {
            settings.tick_ms = tick_ms;
        }
        if let Some(steps_per_epoch) = self.steps_per_epoch {
            settings.steps_per_epoch = steps_per_epoch;
        }
        if let Some(log_every) = self.log_every {
            settings.log_every = log_every;
        }
        if let Some(log_capacity) = self.log_capacity {
            settings.log_capacity = log_capacity;
        }
    }

    fn merge(&mut self, other: &Self) {
        self.tick_ms = other.tick_ms.or(self.tick_ms);
        self.steps_per_epoch = other.steps_per_epoch.or(self.steps_per_epoch);
        self.log_every = other.log_every.or(self.log_every);
        self.log_capacity = other.log_capacity.or(self.log_capacity);
    }
}

/// Errors that can occur during configuration loading.
#[derive(Debug, Error)]
pub enum CliConfigError {
    /// Configuration file not found.
    #[error("Configuration file not found: {0}")]
    NotFound(String),

    /// Failed to read configuration file.
    #[error("Failed to read configuration file: {0}")]
    ReadError(String),

    /// Failed to parse configuration file.
    #[error("Failed to parse configuration file: {0}")]
    ParseError(String),
}

pub type CliConfigResult<T> = std::result::Result<T, CliConfigError>;

impl CliConfig {
    /// Load configuration from a TOML file.
    pub fn load_from_file(path: &Path) -> CliConfigResult<Self> {
        if !path.exists() {
            return Err(CliConfigError::NotFound(path.display().to_string()));
        }

        let content = std::fs::read_to_string(path)
            .map_err(|e| CliConfigError::ReadError(format!("{}: {}", path.display(), e)))?;

        toml::from_str(&content).map_err(|e| CliConfigError::ParseError(format!("{}: {}", path.display(), e)))
    }

    /// Get default global configuration file path.
    pub fn default_global_path() -> PathBuf {
        dirs::home_dir().unwrap_or_else(|| PathBuf::from(".")).join(".tuneflow").join("config.toml")
    }

    /// Get default local configuration file path.
    pub fn default_local_path() -> PathBuf {
        PathBuf::from(".tuneflowrc")
    }

    /// Loads the global config, then the local one on top of it.
    ///
    /// Missing files are skipped. A file that exists but cannot be parsed is
    /// reported and skipped.
    pub fn discover_and_load() -> Self {
        let mut config = Self::default();

        for path in [Self::default_global_path(), Self::default_local_path()] {
            match Self::load_from_file(&path) {
                Ok(loaded) => config.merge(&loaded),
                Err(CliConfigError::NotFound(_)) => {}
                Err(e) => eprintln!("warning: ignoring config file: {e}"),
            }
        }

        config
    }

    /// Merge another configuration into this one.
    ///
    /// Values from `other` override values in `self` if they are set.
    pub fn merge(&mut self, other: &Self) {
        if other.log_level.is_some() {
            self.log_level.clone_from(&other.log_level);
        }
        if other.catalogue.is_some() {
            self.catalogue.clone_from(&other.catalogue);
        }
        if other.output.always_json {
            self.output.always_json = true;
        }
        if other.output.format != "human" {
            self.output.format.clone_from(&other.output.format);
        }
        self.training.merge(&other.training);
        self.simulation.merge(&other.simulation);
    }
}
