//! Structured error types for configuration loading and access.

use serde::Serialize;
use std::path::PathBuf;
use thiserror::Error;

/// Error codes for programmatic error handling.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    // File system errors
    FileNotFound,
    ReadFailed,

    // Input errors
    UnsupportedFormat,
    ParseError,
    InvalidFieldValue,

    // Resolution errors
    ExtendsCycle,

    // Internal errors
    InternalError,
}

/// Errors raised while loading, resolving or reading a configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read a configuration file.
    #[error("failed to read config file '{path}': {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// No parser is registered for the file extension.
    #[error(
        "files with extension '{extension}' are not recognized; please use one of {}",
        .supported.join(", ")
    )]
    UnsupportedFormat {
        path: PathBuf,
        extension: String,
        supported: Vec<&'static str>,
    },

    /// Failed to parse YAML.
    #[error("failed to parse config file '{path}': {source}")]
    ParseYaml {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    /// Failed to parse JSON.
    #[error("failed to parse config file '{path}': {source}")]
    ParseJson {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// An `include` entry is not a file name.
    #[error("invalid include in '{path}': expected a file name or list of file names, found {found}")]
    InvalidInclude { path: PathBuf, found: String },

    /// An `extends` value is not a path string.
    #[error("invalid extends at '{path}': expected a path string, found {found}")]
    InvalidExtends { path: String, found: String },

    /// Extends references loop back onto themselves.
    #[error("extends cycle detected: {}", .chain.join(" -> "))]
    ExtendsCycle { chain: Vec<String> },

    /// A subtree could not be converted into the requested type.
    #[error("failed to deserialize value at '{path}': {source}")]
    Deserialize {
        path: String,
        #[source]
        source: serde_json::Error,
    },

    /// A tree could not be rendered to text.
    #[error("failed to render config as {format}: {source}")]
    Render {
        format: &'static str,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
}

impl ConfigError {
    /// Creates a read error.
    pub fn read(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Read {
            path: path.into(),
            source,
        }
    }

    /// Creates a YAML parse error.
    pub fn parse_yaml(path: impl Into<PathBuf>, source: serde_yaml::Error) -> Self {
        Self::ParseYaml {
            path: path.into(),
            source,
        }
    }

    /// Creates a JSON parse error.
    pub fn parse_json(path: impl Into<PathBuf>, source: serde_json::Error) -> Self {
        Self::ParseJson {
            path: path.into(),
            source,
        }
    }

    /// Creates a render error.
    pub fn render(
        format: &'static str,
        source: impl Into<Box<dyn std::error::Error + Send + Sync>>,
    ) -> Self {
        Self::Render {
            format,
            source: source.into(),
        }
    }

    /// Whether this error stems from a missing file.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::Read { source, .. } if source.kind() == std::io::ErrorKind::NotFound)
    }

    /// Get the error code.
    pub fn code(&self) -> ErrorCode {
        match self {
            Self::Read { .. } if self.is_not_found() => ErrorCode::FileNotFound,
            Self::Read { .. } => ErrorCode::ReadFailed,
            Self::UnsupportedFormat { .. } => ErrorCode::UnsupportedFormat,
            Self::ParseYaml { .. } | Self::ParseJson { .. } => ErrorCode::ParseError,
            Self::InvalidInclude { .. }
            | Self::InvalidExtends { .. }
            | Self::Deserialize { .. } => ErrorCode::InvalidFieldValue,
            Self::ExtendsCycle { .. } => ErrorCode::ExtendsCycle,
            Self::Render { .. } => ErrorCode::InternalError,
        }
    }
}

/// Result type for configuration operations.
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;
