//! Configuration management for certsweep.
//!
//! Provides TOML-based configuration with XDG-compliant paths and
//! environment variable overrides.

use crate::error::{ConfigError, ConfigResult};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

/// Main application configuration.
///
/// This is loaded from `~/.config/certsweep/config.toml` (or platform
/// equivalent). If the file doesn't exist, default values are used.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Remote lookup endpoint settings
    pub endpoint: EndpointConfig,
    /// Per-request probing behavior
    pub probe: ProbeConfig,
    /// Batch executor settings
    pub engine: EngineConfig,
    /// Output file locations
    pub output: OutputConfig,
}

impl AppConfig {
    /// Load configuration from disk, falling back to defaults if not found.
    ///
    /// # Errors
    /// Returns error if:
    /// - Config directory cannot be determined
    /// - File exists but cannot be read
    /// - File contents are not valid TOML
    pub fn load() -> ConfigResult<Self> {
        let config_path = Self::config_path()?;

        if config_path.exists() {
            tracing::debug!("Loading config from {}", config_path.display());
            let contents = fs::read_to_string(&config_path)?;
            let config = toml::from_str(&contents)?;
            Ok(config)
        } else {
            tracing::debug!("Config file not found, using defaults");
            Ok(Self::default())
        }
    }

    /// Load configuration with environment variable overrides.
    ///
    /// Supports the following environment variables:
    /// - `CERTSWEEP_BATCH_SIZE`: Override the executor batch size
    /// - `CERTSWEEP_MAX_IN_FLIGHT`: Override the concurrent request ceiling
    /// - `CERTSWEEP_TIMEOUT_SECS`: Override the per-request timeout
    pub fn load_with_env() -> ConfigResult<Self> {
        let mut config = Self::load()?;

        if let Ok(val) = std::env::var("CERTSWEEP_BATCH_SIZE") {
            if let Ok(batch_size) = val.parse() {
                config.engine.batch_size = batch_size;
                tracing::debug!("Override engine.batch_size from env: {}", batch_size);
            }
        }

        if let Ok(val) = std::env::var("CERTSWEEP_MAX_IN_FLIGHT") {
            if let Ok(max_in_flight) = val.parse() {
                config.engine.max_in_flight = max_in_flight;
                tracing::debug!("Override engine.max_in_flight from env: {}", max_in_flight);
            }
        }

        if let Ok(val) = std::env::var("CERTSWEEP_TIMEOUT_SECS") {
            if let Ok(timeout_secs) = val.parse() {
                config.probe.timeout_secs = timeout_secs;
                tracing::debug!("Override probe.timeout_secs from env: {}", timeout_secs);
            }
        }

        Ok(config)
    }

    /// Save configuration to disk.
    ///
    /// Creates the config directory if it doesn't exist.
    pub fn save(&self) -> ConfigResult<()> {
        let config_path = Self::config_path()?;
        let config_dir = config_path
            .parent()
            .ok_or_else(|| ConfigError::InvalidValue {
                field: "config_path".to_string(),
                reason: "no parent directory".to_string(),
            })?;

        fs::create_dir_all(config_dir)?;
        tracing::debug!("Saving config to {}", config_path.display());

        let contents = toml::to_string_pretty(self)?;
        fs::write(config_path, contents)?;
        Ok(())
    }

    /// Get the path to the configuration file.
    ///
    /// Uses XDG base directories: `~/.config/certsweep/config.toml`
    pub fn config_path() -> ConfigResult<PathBuf> {
        let dirs =
            ProjectDirs::from("com", "certsweep", "certsweep").ok_or(ConfigError::NoConfigDir)?;
        Ok(dirs.config_dir().join("config.toml"))
    }

    /// Get the data directory path.
    ///
    /// Uses XDG base directories: `~/.local/share/certsweep`
    pub fn data_dir() -> ConfigResult<PathBuf> {
        let dirs =
            ProjectDirs::from("com", "certsweep", "certsweep").ok_or(ConfigError::NoConfigDir)?;
        Ok(dirs.data_dir().to_path_buf())
    }
}

/// Remote lookup endpoint settings.
///
/// The operation selector is carried as URL query parameters; the subject
/// name and certificate number travel in the JSON request body.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EndpointConfig {
    /// Endpoint URL the lookup POST is sent to
    pub base_url: String,
    /// `m` query parameter (module selector)
    pub module: String,
    /// `c` query parameter (controller selector)
    pub controller: String,
    /// `a` query parameter (action selector)
    pub action: String,
    /// `v` query parameter (remote API version)
    pub api_version: String,
    /// `os_source` query parameter
    pub os_source: String,
    /// `applySource` body field
    pub apply_source: String,
}

impl Default for EndpointConfig {
    fn default() -> Self {
        Self {
            base_url: "https://www.univsport.com/index.php".to_string(),
            module: "api".to_string(),
            controller: "AthleteLevel".to_string(),
            action: "get_athlete_level_list".to_string(),
            api_version: "5.9.8".to_string(),
            os_source: "h5".to_string(),
            apply_source: "1".to_string(),
        }
    }
}

/// Per-request probing behavior.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProbeConfig {
    /// Request timeout in seconds
    pub timeout_secs: u64,
    /// Fixed delay before each request in milliseconds
    pub request_delay_ms: u64,
    /// User agent string
    pub user_agent: String,
}

impl Default for ProbeConfig {
    fn default() -> Self {
        Self {
            timeout_secs: 15,
            request_delay_ms: 50,
            user_agent:
                "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/605.1.15 (KHTML, like Gecko)"
                    .to_string(),
        }
    }
}

/// Batch executor settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Number of certificate numbers probed per batch
    pub batch_size: usize,
    /// Ceiling on simultaneous in-flight requests
    pub max_in_flight: usize,
    /// Range sizes above this require interactive confirmation
    pub large_range_threshold: u64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            batch_size: 100,
            max_in_flight: 100,
            large_range_threshold: 10_001,
        }
    }
}

/// Output file locations.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Durable outcome cache file
    pub cache_file: PathBuf,
    /// Append-only discovered-certificate ledger
    pub ledger_file: PathBuf,
    /// Directory per-run result files are written into
    pub results_dir: PathBuf,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            cache_file: PathBuf::from("history.json"),
            ledger_file: PathBuf::from("certificates.txt"),
            results_dir: PathBuf::from("logs"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.endpoint.controller, "AthleteLevel");
        assert_eq!(config.probe.timeout_secs, 15);
        assert_eq!(config.probe.request_delay_ms, 50);
        assert_eq!(config.engine.batch_size, 100);
        assert_eq!(config.engine.max_in_flight, 100);
        assert_eq!(config.output.cache_file, PathBuf::from("history.json"));
    }

    #[test]
    fn test_config_serialization() {
        let config = AppConfig::default();
        let toml_str = toml::to_string_pretty(&config).expect("serialize default config");
        assert!(toml_str.contains("[endpoint]"));
        assert!(toml_str.contains("[probe]"));
        assert!(toml_str.contains("[engine]"));
        assert!(toml_str.contains("[output]"));

        let parsed: AppConfig = toml::from_str(&toml_str).expect("parse serialized config");
        assert_eq!(parsed.endpoint.base_url, config.endpoint.base_url);
    }

    #[test]
    fn test_config_save_load() {
        let tmp = TempDir::new().expect("create temp dir");
        let config_path = tmp.path().join("config.toml");

        let mut config = AppConfig::default();
        config.engine.batch_size = 50;
        config.probe.request_delay_ms = 200;

        let contents = toml::to_string_pretty(&config).expect("serialize config");
        fs::write(&config_path, contents).expect("write config file");

        let loaded_contents = fs::read_to_string(&config_path).expect("read config file");
        let loaded: AppConfig = toml::from_str(&loaded_contents).expect("parse loaded config");

        assert_eq!(loaded.engine.batch_size, 50);
        assert_eq!(loaded.probe.request_delay_ms, 200);
    }

    #[test]
    fn test_partial_config() {
        // Partial TOML configs fill remaining fields with defaults
        let toml_str = r#"
[engine]
batch_size = 25

[output]
cache_file = "sweep-history.json"
"#;

        let config: AppConfig = toml::from_str(toml_str).expect("parse partial config");
        assert_eq!(config.engine.batch_size, 25);
        assert_eq!(config.output.cache_file, PathBuf::from("sweep-history.json"));
        // These should be defaults
        assert_eq!(config.engine.max_in_flight, 100);
        assert_eq!(config.probe.timeout_secs, 15);
    }

    #[test]
    fn test_env_overrides() {
        std::env::set_var("CERTSWEEP_BATCH_SIZE", "10");

        let mut config = AppConfig::default();
        if let Ok(val) = std::env::var("CERTSWEEP_BATCH_SIZE") {
            if let Ok(batch_size) = val.parse() {
                config.engine.batch_size = batch_size;
            }
        }
        assert_eq!(config.engine.batch_size, 10);

        std::env::remove_var("CERTSWEEP_BATCH_SIZE");
    }
}
