//! Error types for brokkr-core

use thiserror::Error;

/// Result type alias using brokkr-core's Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Core error types
#[derive(Error, Debug)]
pub enum Error {
    /// Configuration file could not be read
    #[error("failed to read config file {path}: {source}")]
    ConfigRead {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// Configuration file is present but unparseable
    #[error("config file {path} is malformed: {source}")]
    ConfigParse {
        path: String,
        #[source]
        source: serde_yaml_ng::Error,
    },

    /// No usable config directory on this platform
    #[error("could not determine a config directory: {reason}")]
    ConfigDir { reason: String },

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Create a config directory error
    pub fn config_dir(reason: impl Into<String>) -> Self {
        Self::ConfigDir {
            reason: reason.into(),
        }
    }
}
