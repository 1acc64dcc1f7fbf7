//! Errors raised while assembling a [`HestiaConfig`](crate::HestiaConfig).

use std::path::PathBuf;
use thiserror::Error;

/// Why a configuration layer could not be loaded or the result was rejected.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// A required configuration file is missing.
    #[error("configuration file not found: {path}")]
    FileNotFound {
        /// Path that was looked up.
        path: PathBuf,
    },

    /// The file exists but could not be read.
    #[error("failed to read configuration file: {path}")]
    ReadError {
        /// Path of the file.
        path: PathBuf,
        /// I/O failure.
        #[source]
        source: std::io::Error,
    },

    /// The file or string names a format other than TOML or JSON.
    #[error("unsupported configuration format \"{format}\" in {origin}, expected toml or json")]
    UnsupportedFormat {
        /// Extension or format name as given.
        format: String,
        /// File path or `"string"` for in-memory content.
        origin: String,
    },

    /// TOML content does not match the schema.
    #[error("failed to parse TOML configuration: {0}")]
    TomlError(#[from] toml::de::Error),

    /// JSON content does not match the schema.
    #[error("failed to parse JSON configuration: {0}")]
    JsonError(#[from] serde_json::Error),

    /// A parsed layer could not be laid over the current configuration.
    #[error("failed to apply configuration layer: {0}")]
    OverlayError(#[source] serde_json::Error),

    /// A value parsed but is not acceptable.
    #[error("invalid configuration value for {field}: {reason}")]
    InvalidValue {
        /// Dotted field path, e.g. `cookies.same_site`.
        field: String,
        /// What is wrong with it.
        reason: String,
    },

    /// An environment override could not be parsed.
    #[error("failed to parse environment variable {var}: {reason}")]
    EnvParseError {
        /// Full variable name, prefix included.
        var: String,
        /// What was expected.
        reason: String,
    },
}

impl ConfigError {
    /// Create a file not found error.
    pub fn file_not_found(path: impl Into<PathBuf>) -> Self {
        Self::FileNotFound { path: path.into() }
    }

    /// Create a read error.
    pub fn read_error(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::ReadError {
            path: path.into(),
            source,
        }
    }

    /// Create an unsupported format error.
    pub fn unsupported_format(format: impl Into<String>, origin: impl Into<String>) -> Self {
        Self::UnsupportedFormat {
            format: format.into(),
            origin: origin.into(),
        }
    }

    /// Create an invalid value error.
    pub fn invalid_value(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidValue {
            field: field.into(),
            reason: reason.into(),
        }
    }

    /// Create an environment variable parse error.
    pub fn env_parse_error(var: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::EnvParseError {
            var: var.into(),
            reason: reason.into(),
        }
    }

    /// The dotted field path for [`InvalidValue`](Self::InvalidValue) errors.
    #[must_use]
    pub fn field(&self) -> Option<&str> {
        match self {
            Self::InvalidValue { field, .. } => Some(field),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_not_found_names_path() {
        let err = ConfigError::file_not_found("/etc/hestia/hestia.toml");
        assert!(err.to_string().contains("/etc/hestia/hestia.toml"));
        assert_eq!(err.field(), None);
    }

    #[test]
    fn test_unsupported_format_names_origin() {
        let err = ConfigError::unsupported_format("ini", "/etc/hestia/hestia.ini");
        let message = err.to_string();
        assert!(message.contains("\"ini\""));
        assert!(message.contains("/etc/hestia/hestia.ini"));
        assert!(!message.contains("validation"));
    }

    #[test]
    fn test_invalid_value_exposes_field() {
        let err = ConfigError::invalid_value("uploads.max_file_size", "must be greater than zero");
        assert_eq!(err.field(), Some("uploads.max_file_size"));
        assert!(err.to_string().contains("must be greater than zero"));
    }

    #[test]
    fn test_env_parse_error() {
        let err = ConfigError::env_parse_error("HESTIA__COOKIES__SECURE", "expected boolean");
        assert!(err.to_string().contains("HESTIA__COOKIES__SECURE"));
        assert!(err.to_string().contains("expected boolean"));
    }
}
