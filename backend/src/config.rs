//! Service configuration.
//!
//! Configuration is read from an optional TOML file and then overridden by
//! environment variables. Every field has a default, so an empty file (or no
//! file at all) yields a working setup.
//!
//! ```toml
//! [server]
//! host = "0.0.0.0"
//! port = 8080
//!
//! [engine]
//! strict = false
//! default_page_size = 25
//! max_page_size = 500
//!
//! [score]
//! fill_rate = 0.3
//! revenue = 0.25
//! show_up = 0.25
//! consistency = 0.2
//! revenue_ceiling = 5000.0
//!
//! [rates]
//! conversion_basis = "newClients"
//! retention_basis = "newClients"
//! ```

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::engine::metrics::{MetricsConfig, RateBasis, ScoreWeights};
use crate::engine::view::ViewSettings;

/// Environment variable naming the configuration file.
pub const CONFIG_PATH_ENV: &str = "STUDIO_CONFIG";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Invalid value for {key}: '{value}'")]
    InvalidValue { key: String, value: String },

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AnalyticsConfig {
    #[serde(default)]
    pub server: ServerSettings,
    #[serde(default)]
    pub engine: EngineSettings,
    #[serde(default)]
    pub score: ScoreSettings,
    #[serde(default)]
    pub rates: RateSettings,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServerSettings {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineSettings {
    /// Reject unknown grouping, metric or direction keys instead of
    /// falling back.
    #[serde(default = "default_strict")]
    pub strict: bool,
    #[serde(default = "default_page_size")]
    pub default_page_size: usize,
    #[serde(default = "default_max_page_size")]
    pub max_page_size: usize,
    #[serde(default = "default_min_sample_size")]
    pub min_sample_size: u64,
    #[serde(default = "default_extremes")]
    pub top_n: usize,
    #[serde(default = "default_extremes")]
    pub bottom_n: usize,
    /// Number of computed views kept in memory.
    #[serde(default = "default_cache_capacity")]
    pub cache_capacity: usize,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            strict: default_strict(),
            default_page_size: default_page_size(),
            max_page_size: default_max_page_size(),
            min_sample_size: default_min_sample_size(),
            top_n: default_extremes(),
            bottom_n: default_extremes(),
            cache_capacity: default_cache_capacity(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreSettings {
    #[serde(default = "default_fill_weight")]
    pub fill_rate: f64,
    #[serde(default = "default_revenue_weight")]
    pub revenue: f64,
    #[serde(default = "default_show_up_weight")]
    pub show_up: f64,
    #[serde(default = "default_consistency_weight")]
    pub consistency: f64,
    #[serde(default = "default_revenue_ceiling")]
    pub revenue_ceiling: f64,
}

impl Default for ScoreSettings {
    fn default() -> Self {
        Self {
            fill_rate: default_fill_weight(),
            revenue: default_revenue_weight(),
            show_up: default_show_up_weight(),
            consistency: default_consistency_weight(),
            revenue_ceiling: default_revenue_ceiling(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RateSettings {
    #[serde(default)]
    pub conversion_basis: RateBasis,
    #[serde(default)]
    pub retention_basis: RateBasis,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_strict() -> bool {
    cfg!(debug_assertions)
}

fn default_page_size() -> usize {
    25
}

fn default_max_page_size() -> usize {
    500
}

fn default_min_sample_size() -> u64 {
    3
}

fn default_extremes() -> usize {
    5
}

fn default_cache_capacity() -> usize {
    64
}

fn default_fill_weight() -> f64 {
    0.3
}

fn default_revenue_weight() -> f64 {
    0.25
}

fn default_show_up_weight() -> f64 {
    0.25
}

fn default_consistency_weight() -> f64 {
    0.2
}

fn default_revenue_ceiling() -> f64 {
    5000.0
}

impl AnalyticsConfig {
    /// Load from the file named by `STUDIO_CONFIG` (if any), apply
    /// environment overrides and validate.
    ///
    /// # Environment Variables
    /// - `STUDIO_CONFIG` (optional): path to a TOML configuration file
    /// - `HOST` (optional): bind address
    /// - `PORT` (optional): bind port
    /// - `ANALYTICS_STRICT` (optional): `true`/`false`
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_with(|key| std::env::var(key).ok())
    }

    /// [`AnalyticsConfig::load`] with a custom variable lookup.
    pub fn load_with<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = match lookup(CONFIG_PATH_ENV) {
            Some(path) if !path.trim().is_empty() => Self::from_file(path.trim())?,
            _ => Self::default(),
        };
        config.apply_overrides(lookup)?;
        config.validate()?;
        Ok(config)
    }

    /// Parse a TOML file. Does not validate.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&content)
    }

    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }

    fn apply_overrides<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(host) = lookup("HOST").filter(|h| !h.trim().is_empty()) {
            self.server.host = host.trim().to_string();
        }
        if let Some(port) = lookup("PORT") {
            self.server.port = port.trim().parse().map_err(|_| ConfigError::InvalidValue {
                key: "PORT".to_string(),
                value: port.clone(),
            })?;
        }
        if let Some(strict) = lookup("ANALYTICS_STRICT") {
            self.engine.strict = parse_bool(&strict).ok_or_else(|| ConfigError::InvalidValue {
                key: "ANALYTICS_STRICT".to_string(),
                value: strict.clone(),
            })?;
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.weights().validate().map_err(ConfigError::Invalid)?;
        if !self.score.revenue_ceiling.is_finite() || self.score.revenue_ceiling < 0.0 {
            return Err(ConfigError::Invalid(format!(
                "revenue_ceiling must be a non-negative number, got {}",
                self.score.revenue_ceiling
            )));
        }
        if self.engine.default_page_size == 0 || self.engine.max_page_size == 0 {
            return Err(ConfigError::Invalid("page sizes must be positive".to_string()));
        }
        if self.engine.default_page_size > self.engine.max_page_size {
            return Err(ConfigError::Invalid(format!(
                "default_page_size ({}) exceeds max_page_size ({})",
                self.engine.default_page_size, self.engine.max_page_size
            )));
        }
        Ok(())
    }

    pub fn weights(&self) -> ScoreWeights {
        ScoreWeights {
            fill_rate: self.score.fill_rate,
            revenue: self.score.revenue,
            show_up: self.score.show_up,
            consistency: self.score.consistency,
        }
    }

    pub fn metrics_config(&self) -> MetricsConfig {
        MetricsConfig {
            weights: self.weights(),
            revenue_ceiling: self.score.revenue_ceiling,
            conversion_basis: self.rates.conversion_basis,
            retention_basis: self.rates.retention_basis,
        }
    }

    pub fn view_settings(&self) -> ViewSettings {
        ViewSettings {
            strict: self.engine.strict,
            default_page_size: self.engine.default_page_size,
            max_page_size: self.engine.max_page_size,
            min_sample_size: self.engine.min_sample_size,
            top_n: self.engine.top_n,
            bottom_n: self.engine.bottom_n,
            metrics: self.metrics_config(),
        }
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
