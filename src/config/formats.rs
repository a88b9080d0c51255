//! File format registry.
//!
//! Parsers are selected by file extension from a fixed table. Every parser
//! produces a `serde_json::Value`; YAML mapping keys that are not strings are
//! stringified on the way so all trees share one key representation.

use crate::error::{ConfigError, ConfigResult};
use serde_json::{Map, Number, Value};
use std::path::Path;
use tracing::warn;

/// Supported configuration file formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    Yaml,
    Json,
}

/// Extension to parser mapping. Add entries here to support new extensions.
const FORMATS: &[(&str, Format)] = &[
    (".yml", Format::Yaml),
    (".yaml", Format::Yaml),
    (".json", Format::Json),
];

impl Format {
    /// All recognised extensions, with the leading dot.
    pub fn supported_extensions() -> Vec<&'static str> {
        FORMATS.iter().map(|(ext, _)| *ext).collect()
    }

    /// Look up the parser for a file extension (with or without leading dot).
    pub fn from_extension(extension: &str) -> Option<Self> {
        let extension = extension.trim_start_matches('.');
        FORMATS
            .iter()
            .find(|(ext, _)| ext.trim_start_matches('.') == extension)
            .map(|(_, format)| *format)
    }

    /// Detect the format of a file from its extension.
    ///
    /// Fails before any I/O with the list of supported extensions.
    pub fn from_path(path: &Path) -> ConfigResult<Self> {
        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| format!(".{e}"))
            .unwrap_or_default();

        Self::from_extension(&extension).ok_or_else(|| ConfigError::UnsupportedFormat {
            path: path.to_path_buf(),
            extension,
            supported: Self::supported_extensions(),
        })
    }

    /// Parse file contents. Empty documents parse to `null`.
    ///
    /// A YAML document holding only comments or document markers is empty too;
    /// JSON has neither, so only whitespace counts there.
    pub fn parse(&self, content: &str, path: &Path) -> ConfigResult<Value> {
        match self {
            Format::Yaml if is_blank_yaml(content) => Ok(Value::Null),
            Format::Yaml => serde_yaml::from_str::<serde_yaml::Value>(content)
                .map(yaml_to_json)
                .map_err(|e| ConfigError::parse_yaml(path, e)),
            Format::Json if content.trim().is_empty() => Ok(Value::Null),
            Format::Json => {
                serde_json::from_str(content).map_err(|e| ConfigError::parse_json(path, e))
            }
        }
    }
}

/// Whether a YAML document holds nothing but whitespace, comments and markers.
fn is_blank_yaml(content: &str) -> bool {
    content.lines().map(str::trim).all(|line| {
        line.is_empty() || line.starts_with('#') || line == "---" || line == "..."
    })
}

/// Convert a YAML value into the JSON value model.
fn yaml_to_json(value: serde_yaml::Value) -> Value {
    match value {
        serde_yaml::Value::Null => Value::Null,
        serde_yaml::Value::Bool(b) => Value::Bool(b),
        serde_yaml::Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                Value::Number(i.into())
            } else if let Some(u) = n.as_u64() {
                Value::Number(u.into())
            } else if let Some(number) = n.as_f64().and_then(Number::from_f64) {
                Value::Number(number)
            } else {
                // JSON has no infinity or NaN; keep the YAML spelling.
                let text = n.to_string();
                warn!(value = %text, "Non-finite YAML number kept as a string");
                Value::String(text)
            }
        }
        serde_yaml::Value::String(s) => Value::String(s),
        serde_yaml::Value::Sequence(items) => {
            Value::Array(items.into_iter().map(yaml_to_json).collect())
        }
        serde_yaml::Value::Mapping(mapping) => Value::Object(
            mapping
                .into_iter()
                .map(|(key, value)| (yaml_key(key), yaml_to_json(value)))
                .collect::<Map<String, Value>>(),
        ),
        serde_yaml::Value::Tagged(tagged) => yaml_to_json(tagged.value),
    }
}

/// Canonical string form of a YAML mapping key.
fn yaml_key(key: serde_yaml::Value) -> String {
    match key {
        serde_yaml::Value::String(s) => s,
        serde_yaml::Value::Null => "null".to_string(),
        serde_yaml::Value::Bool(b) => b.to_string(),
        serde_yaml::Value::Number(n) => n.to_string(),
        serde_yaml::Value::Tagged(tagged) => yaml_key(tagged.value),
        complex => yaml_to_json(complex).to_string(),
    }
}
