//! Configuration System
//!
//! Handles loading configuration from files and environment variables.
//! Supports TOML config files and environment variable overrides.

use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Main configuration structure
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub datasource: DataSourceConfig,

    #[serde(default)]
    pub query: QueryConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Remote query service configuration
#[derive(Debug, Clone, Deserialize)]
pub struct DataSourceConfig {
    #[serde(default = "default_datasource_url")]
    pub url: String,

    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,

    /// Data source used by metric selectors that do not name one
    #[serde(default = "default_data_source")]
    pub data_source: String,
}

fn default_datasource_url() -> String {
    "http://localhost:9897".to_string()
}

fn default_timeout_ms() -> u64 {
    30_000
}

fn default_data_source() -> String {
    "metrics".to_string()
}

impl Default for DataSourceConfig {
    fn default() -> Self {
        Self {
            url: default_datasource_url(),
            timeout_ms: default_timeout_ms(),
            data_source: default_data_source(),
        }
    }
}

/// Evaluation defaults
#[derive(Debug, Clone, Deserialize)]
pub struct QueryConfig {
    /// Buckets per evaluation interval
    #[serde(default = "default_bucket_count")]
    pub bucket_count: u32,

    /// Interval length when no start is given, as a duration literal
    #[serde(default = "default_range")]
    pub default_range: String,
}

fn default_bucket_count() -> u32 {
    1
}

fn default_range() -> String {
    "1h".to_string()
}

impl Default for QueryConfig {
    fn default() -> Self {
        Self {
            bucket_count: default_bucket_count(),
            default_range: default_range(),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,

    #[serde(default = "default_log_format")]
    pub format: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

impl Config {
    /// Load configuration from a file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.to_path_buf(),
            error: e.to_string(),
        })?;

        Self::from_toml(&content).map_err(|e| match e {
            ConfigError::Parse { error, .. } => ConfigError::Parse {
                path: path.to_path_buf(),
                error,
            },
            other => other,
        })
    }

    /// Parse configuration from TOML text
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        toml::from_str(content).map_err(|e| ConfigError::Parse {
            path: PathBuf::new(),
            error: e.to_string(),
        })
    }

    /// Load configuration from environment variables only
    pub fn from_env() -> Self {
        let mut config = Config::default();
        config.apply_env_overrides();
        config
    }

    /// Load configuration with environment variable overrides
    pub fn load_with_env(path: &Path) -> Result<Self, ConfigError> {
        let mut config = Self::load(path)?;
        config.apply_env_overrides();
        Ok(config)
    }

    /// Load from default locations or environment
    pub fn load_default() -> Self {
        let config_paths = [
            dirs::config_dir().map(|p| p.join("metric-expr").join("config.toml")),
            Some(PathBuf::from("/etc/metric-expr/config.toml")),
            Some(PathBuf::from("./config.toml")),
        ];

        for path in config_paths.iter().flatten() {
            if path.exists() {
                match Self::load_with_env(path) {
                    Ok(config) => {
                        tracing::info!("Loaded config from {:?}", path);
                        return config;
                    }
                    Err(e) => {
                        tracing::warn!("Failed to load config from {:?}: {}", path, e);
                    }
                }
            }
        }

        tracing::info!("Using default config with environment overrides");
        Self::from_env()
    }

    /// Apply environment variable overrides to an existing config
    fn apply_env_overrides(&mut self) {
        if let Ok(url) = std::env::var("METRIC_EXPR_DATASOURCE_URL") {
            self.datasource.url = url;
        }
        if let Ok(timeout) = std::env::var("METRIC_EXPR_DATASOURCE_TIMEOUT_MS") {
            if let Ok(t) = timeout.parse() {
                self.datasource.timeout_ms = t;
            }
        }

        if let Ok(buckets) = std::env::var("METRIC_EXPR_BUCKET_COUNT") {
            if let Ok(b) = buckets.parse() {
                self.query.bucket_count = b;
            }
        }

        if let Ok(level) = std::env::var("METRIC_EXPR_LOG_LEVEL") {
            self.logging.level = level;
        }
        if let Ok(format) = std::env::var("METRIC_EXPR_LOG_FORMAT") {
            self.logging.format = format;
        }
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path:?}: {error}")]
    Io { path: PathBuf, error: String },

    #[error("Failed to parse config file {path:?}: {error}")]
    Parse { path: PathBuf, error: String },
}

/// Generate a default config file content
pub fn generate_default_config() -> String {
    r#"# metric-expr Configuration
#
# Environment variables override these settings:
# - METRIC_EXPR_DATASOURCE_URL
# - METRIC_EXPR_DATASOURCE_TIMEOUT_MS
# - METRIC_EXPR_BUCKET_COUNT
# - METRIC_EXPR_LOG_LEVEL
# - METRIC_EXPR_LOG_FORMAT

[datasource]
# Base URL of the time-series query service
url = "http://localhost:9897"

# Request timeout (ms)
timeout_ms = 30000

# Data source used when a metric selector does not name one
data_source = "metrics"

[query]
# Buckets per evaluation interval
bucket_count = 1

# Interval length when no start time is given
default_range = "1h"

[logging]
# Log level: trace, debug, info, warn, error
level = "info"

# Log format: pretty (for development) or json (for production)
format = "pretty"
"#
    .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_config_parses() {
        let config = Config::from_toml(&generate_default_config()).unwrap();
        assert_eq!(config.datasource.url, "http://localhost:9897");
        assert_eq!(config.datasource.timeout_ms, 30_000);
        assert_eq!(config.query.bucket_count, 1);
        assert_eq!(config.query.default_range, "1h");
        assert_eq!(config.logging.format, "pretty");
    }

    #[test]
    fn test_partial_config_uses_defaults() {
        let config = Config::from_toml("[query]\nbucket_count = 12\n").unwrap();
        assert_eq!(config.query.bucket_count, 12);
        assert_eq!(config.datasource.data_source, "metrics");
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[datasource]\nurl = \"http://tsdb:9897\"").unwrap();

        let config = Config::load(file.path()).unwrap();
        assert_eq!(config.datasource.url, "http://tsdb:9897");
    }

    #[test]
    fn test_load_errors() {
        let missing = Config::load(Path::new("/nonexistent/metric-expr.toml"));
        assert!(matches!(missing, Err(ConfigError::Io { .. })));

        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[query]\nbucket_count = \"many\"").unwrap();
        match Config::load(file.path()) {
            Err(ConfigError::Parse { path, .. }) => assert_eq!(path, file.path()),
            other => panic!("expected parse error, got {:?}", other),
        }
    }
}
