use std::path::PathBuf;
use thiserror::Error;

/// Main error type for the unspool application
#[derive(Error, Debug)]
pub enum UnspoolError {
    /// Configuration related errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Configuration validation errors
    #[error("Configuration validation failed: {errors:?}")]
    ConfigValidation { errors: Vec<ValidationError> },

    /// Configuration file not found
    #[error("Configuration file not found: {path}")]
    ConfigNotFound { path: PathBuf },

    /// Bearer token missing from the environment
    #[error("{env_var} must be set in the environment")]
    MissingCredential { env_var: String },

    /// Network or protocol failure while talking to the API
    #[error("Request failed: {context}: {source}")]
    Transport {
        source: reqwest::Error,
        context: String,
    },

    /// The API answered with a non-success status
    #[error("API returned HTTP {status} for {endpoint}")]
    ApiStatus { status: u16, endpoint: String },

    /// No user record for the requested handle
    #[error("User not found: {username}")]
    UserNotFound { username: String },

    /// IO errors
    #[error("IO error: {context}: {source}")]
    Io {
        source: std::io::Error,
        context: String,
    },

    /// TOML deserialization errors
    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    /// TOML serialization errors
    #[error("TOML serialization error: {0}")]
    TomlSerialization(#[from] toml::ser::Error),

    /// JSON errors
    #[error("JSON error: {context}: {source}")]
    Json {
        source: serde_json::Error,
        context: String,
    },

    /// CSV errors
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// Regex compilation errors
    #[error("Regex error: {0}")]
    Regex(#[from] regex::Error),

    /// Generic errors
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Configuration validation error
#[derive(Debug, Clone)]
pub struct ValidationError {
    /// Path to the configuration key that failed validation
    pub path: String,
    /// Error message describing the validation failure
    pub message: String,
}

impl ValidationError {
    pub fn new(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            message: message.into(),
        }
    }
}

/// Result type for unspool operations
pub type Result<T> = std::result::Result<T, UnspoolError>;
