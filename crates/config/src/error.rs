//! Host configuration errors.

use std::path::PathBuf;

use thiserror::Error;
use vnscript_bytecode::ArchiveError;

/// Result type for configuration operations.
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Errors that can occur when loading or validating a host configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read the configuration file.
    #[error("failed to read config file {path}: {source}")]
    Io {
        /// File that was being read.
        path: PathBuf,
        /// Underlying I/O failure.
        #[source]
        source: std::io::Error,
    },

    /// Failed to parse the configuration YAML.
    #[error("failed to parse config YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// Invalid API version.
    #[error("invalid apiVersion: expected 'vnscript/v1', got '{0}'")]
    InvalidApiVersion(String),

    /// Invalid kind.
    #[error("invalid kind: expected 'HostConfig', got '{0}'")]
    InvalidKind(String),

    /// A key table entry is malformed.
    #[error("invalid key for title '{title}': {reason}")]
    InvalidKey {
        /// Title the key is registered under.
        title: String,
        /// What is wrong with it.
        reason: String,
    },

    /// The entry scenario id is outside the archive id range.
    #[error("entry scenario {0} out of range")]
    EntryOutOfRange(u16),

    /// The call stack limit must allow at least one frame.
    #[error("callStackLimit must be at least 1")]
    InvalidCallStackLimit,

    /// The configured archive could not be opened.
    #[error(transparent)]
    Archive(#[from] ArchiveError),
}
