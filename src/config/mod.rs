//! Configuration management for unspool
//!
//! Handles loading, validation, and defaults for the TOML configuration
//! file. CLI flags override whatever is loaded here.

use crate::error::{Result, UnspoolError};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

mod validator;

pub use validator::ConfigValidator;

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(rename = "_meta")]
    pub meta: MetaConfig,
    pub api: ApiConfig,
    pub output: OutputConfig,
}

/// Metadata about the configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetaConfig {
    pub schema_version: String,
    #[serde(default = "current_timestamp")]
    pub created_at: String,
}

fn current_timestamp() -> String {
    chrono::Utc::now().to_rfc3339()
}

/// Twitter API configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Base URL of the Twitter v2 API
    pub base_url: String,
    /// Name of the environment variable holding the bearer token
    pub bearer_token_env: String,
    /// Tweets requested per page; the platform caps this at 100
    pub page_size: usize,
}

/// Output configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    /// Directory tweet files are written into
    pub directory: PathBuf,
    /// Default maximum number of tweets retrieved per user
    pub max_results: usize,
    /// Maximum number of characters taken from the tweet text for the file title
    pub title_max_chars: usize,
}

impl Config {
    /// Load configuration from a file
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(UnspoolError::ConfigNotFound {
                path: path.to_path_buf(),
            });
        }

        let content = std::fs::read_to_string(path).map_err(|e| UnspoolError::Io {
            source: e,
            context: format!("Failed to read config file: {:?}", path),
        })?;
        let mut config: Config = toml::from_str(&content)?;

        // Apply environment variable overrides
        config.apply_env_overrides();

        // Validate configuration
        ConfigValidator::validate(&config)?;

        Ok(config)
    }

    /// Save configuration to a file
    pub fn save(&self, path: &Path) -> Result<()> {
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content).map_err(|e| UnspoolError::Io {
            source: e,
            context: format!("Failed to write config file: {:?}", path),
        })?;
        Ok(())
    }

    /// Apply environment variable overrides
    /// Environment variables in format: UNSPOOL_SECTION__KEY=value
    pub fn apply_env_overrides(&mut self) {
        for (key, value) in std::env::vars() {
            if let Some(config_key) = key.strip_prefix("UNSPOOL_") {
                if let Err(e) = self.set_value_from_env(config_key, &value) {
                    tracing::warn!("Failed to apply env override {}: {}", key, e);
                }
            }
        }
    }

    fn set_value_from_env(&mut self, path: &str, value: &str) -> Result<()> {
        match path {
            "API__BASE_URL" => {
                self.api.base_url = value.to_string();
            }
            "API__PAGE_SIZE" => {
                self.api.page_size =
                    value.parse().map_err(|_| UnspoolError::Config(format!(
                        "Cannot parse '{}' as an integer for {}",
                        value, path
                    )))?;
            }
            "OUTPUT__DIRECTORY" => {
                self.output.directory = PathBuf::from(value);
            }
            "OUTPUT__MAX_RESULTS" => {
                self.output.max_results =
                    value.parse().map_err(|_| UnspoolError::Config(format!(
                        "Cannot parse '{}' as an integer for {}",
                        value, path
                    )))?;
            }
            _ => {
                tracing::debug!("Unknown env config key: {}", path);
            }
        }
        Ok(())
    }

    /// Resolve the bearer token from the configured environment variable
    pub fn bearer_token(&self) -> Result<String> {
        std::env::var(&self.api.bearer_token_env).map_err(|_| UnspoolError::MissingCredential {
            env_var: self.api.bearer_token_env.clone(),
        })
    }

    /// Get the default configuration file path
    pub fn default_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| UnspoolError::Config("Cannot determine config directory".to_string()))?;

        Ok(config_dir.join("unspool").join("config.toml"))
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            meta: MetaConfig {
                schema_version: "1.0.0".to_string(),
                created_at: current_timestamp(),
            },
            api: ApiConfig {
                base_url: "https://api.twitter.com/2".to_string(),
                bearer_token_env: "TWITTER_API_BEARER_TOKEN".to_string(),
                page_size: 100,
            },
            output: OutputConfig {
                directory: PathBuf::from("./tweets"),
                max_results: 50,
                title_max_chars: 75,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = Config::default();
        assert!(ConfigValidator::validate(&config).is_ok());
        assert_eq!(config.api.page_size, 100);
        assert_eq!(config.output.max_results, 50);
    }

    #[test]
    fn test_config_roundtrip() {
        let temp_dir = tempfile::TempDir::new().unwrap();
        let path = temp_dir.path().join("config.toml");

        let config = Config::default();
        config.save(&path).unwrap();

        let loaded = Config::load(&path).unwrap();
        assert_eq!(loaded.api.base_url, config.api.base_url);
        assert_eq!(loaded.output.directory, config.output.directory);
        assert_eq!(loaded.output.title_max_chars, 75);
    }

    #[test]
    fn test_load_missing_file() {
        let result = Config::load(Path::new("/nonexistent/config.toml"));
        assert!(matches!(result, Err(UnspoolError::ConfigNotFound { .. })));
    }
}
