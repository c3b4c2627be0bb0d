//! Error types for configuration handling

use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while loading, validating or resolving configuration
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Config file could not be read
    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Config file is not valid TOML for `CreditConfig`
    #[error("Failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    /// A value is outside its allowed range
    #[error("Invalid configuration: {0}")]
    Invalid(String),

    /// No data directory could be derived
    #[error("Cannot resolve data directory: {0}")]
    DataDir(String),
}

/// Result type for configuration operations
pub type Result<T> = std::result::Result<T, ConfigError>;
