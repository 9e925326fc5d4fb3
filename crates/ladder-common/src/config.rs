//! Configuration for the scan engine.
//!
//! TOML deserialization with defaults suitable for simulation; production
//! deployments set the scan period explicitly.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Top-level engine configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Scan period for the cyclic scheduler.
    #[serde(with = "duration_text")]
    pub scan_period: Duration,

    /// How scan overruns are reported. Overruns never abort a scan.
    pub overrun_policy: OverrunPolicy,

    /// Metrics collection configuration.
    pub metrics: MetricsConfig,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            scan_period: Duration::from_millis(100),
            overrun_policy: OverrunPolicy::default(),
            metrics: MetricsConfig::default(),
        }
    }
}

/// Reporting policy for scan overruns.
///
/// Overruns are always counted and never fatal; the policy only controls
/// whether each one is logged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum OverrunPolicy {
    /// Log a warning per overrun.
    #[default]
    Warn,
    /// Count silently.
    Ignore,
}

/// Metrics and diagnostics configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MetricsConfig {
    /// Enable scan metrics collection.
    pub enabled: bool,

    /// Size of the latency histogram ring buffer.
    pub histogram_size: usize,

    /// Percentiles to report (e.g. [50, 90, 99]).
    pub percentiles: Vec<f64>,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            histogram_size: 10_000,
            percentiles: vec![50.0, 90.0, 99.0],
        }
    }
}

impl EngineConfig {
    /// Load configuration from a TOML file.
    pub fn from_file(path: &std::path::Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;
        Self::from_toml(&content)
    }

    /// Parse configuration from a TOML string.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        toml::from_str(content).map_err(ConfigError::Parse)
    }

    /// Serialize configuration to a TOML string.
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(self).map_err(ConfigError::Serialize)
    }
}

/// Configuration-related errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// File I/O error.
    #[error("failed to read config file {path}: {source}")]
    Io {
        /// Path to the configuration file.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// TOML parsing error.
    #[error("failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    /// TOML serialization error.
    #[error("failed to serialize TOML: {0}")]
    Serialize(#[from] toml::ser::Error),
}

/// Duration fields travel as humantime strings ("100ms", "1s 500ms").
mod duration_text {
    use serde::de::{Error, Unexpected};
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        // format_duration is Display; collect_str writes it without an
        // intermediate allocation on serializers that support it
        serializer.collect_str(&humantime::format_duration(*value))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        let text = String::deserialize(deserializer)?;
        match humantime::parse_duration(&text) {
            Ok(duration) => Ok(duration),
            Err(_) => Err(D::Error::invalid_value(
                Unexpected::Str(&text),
                &"a duration such as \"100ms\"",
            )),
        }
    }
}
