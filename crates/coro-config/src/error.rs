//! Error types for configuration operations.

use std::path::PathBuf;

use coro_core::CoroError;
use coro_registry::RegistryError;
use thiserror::Error;

/// Errors that can occur while loading, validating or building a patch.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read a file
    #[error("failed to read file '{path}': {source}")]
    ReadFile {
        /// Path of the file that could not be read.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// Failed to write a file
    #[error("failed to write file '{path}': {source}")]
    WriteFile {
        /// Path of the file that could not be written.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// Failed to parse TOML
    #[error("failed to parse TOML: {0}")]
    TomlParse(#[from] toml::de::Error),

    /// Failed to serialize TOML
    #[error("failed to serialize TOML: {0}")]
    TomlSerialize(#[from] toml::ser::Error),

    /// An engine setting has no meaning
    #[error("invalid engine setting '{setting}': {reason}")]
    InvalidSetting {
        /// Setting name as written in the file.
        setting: String,
        /// Why it was rejected.
        reason: String,
    },

    /// A node parameter could not be resolved
    #[error("invalid parameter '{param}' for node '{node}': {reason}")]
    InvalidParameter {
        /// Id of the node in the patch.
        node: String,
        /// Parameter name.
        param: String,
        /// Description of why the parameter is invalid.
        reason: String,
    },

    /// Validation errors
    #[error("validation failed: {0}")]
    Validation(#[from] crate::validation::ValidationError),

    /// The registry could not build a node
    #[error(transparent)]
    Registry(#[from] RegistryError),

    /// Engine or container construction failed
    #[error(transparent)]
    Core(#[from] CoroError),
}

impl ConfigError {
    /// Create a read file error.
    pub fn read_file(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        ConfigError::ReadFile {
            path: path.into(),
            source,
        }
    }

    /// Create a write file error.
    pub fn write_file(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        ConfigError::WriteFile {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn invalid_param(node: &str, param: &str, reason: impl Into<String>) -> Self {
        ConfigError::InvalidParameter {
            node: node.to_string(),
            param: param.to_string(),
            reason: reason.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error;

    fn mock_io_err() -> std::io::Error {
        std::io::Error::new(std::io::ErrorKind::NotFound, "mock")
    }

    #[test]
    fn read_file_display() {
        let err = ConfigError::read_file("/a/b.toml", mock_io_err());
        let msg = err.to_string();
        assert!(msg.contains("failed to read file"), "got: {msg}");
        assert!(msg.contains("/a/b.toml"), "got: {msg}");
        assert!(err.source().is_some());
    }

    #[test]
    fn write_file_keeps_path() {
        let err = ConfigError::write_file("/out/patch.toml", mock_io_err());
        assert!(
            matches!(err, ConfigError::WriteFile { ref path, .. } if path == std::path::Path::new("/out/patch.toml"))
        );
    }

    #[test]
    fn invalid_parameter_display() {
        let err = ConfigError::invalid_param("lfo", "freq", "not a number");
        assert_eq!(
            err.to_string(),
            "invalid parameter 'freq' for node 'lfo': not a number"
        );
        assert!(err.source().is_none());
    }

    #[test]
    fn core_errors_pass_through() {
        let err = ConfigError::from(CoroError::configuration("block size 0 outside 1..=8192"));
        assert_eq!(
            err.to_string(),
            CoroError::configuration("block size 0 outside 1..=8192").to_string()
        );
    }

    #[test]
    fn registry_errors_pass_through() {
        let err = ConfigError::from(RegistryError::UnknownNode("reverb".to_string()));
        assert_eq!(err.to_string(), "unknown node kind: reverb");
    }
}
