//! Text rendering of configuration trees.

use crate::error::{ConfigError, ConfigResult};
use serde_json::Value;

/// Output format for rendering a tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    /// Compact single-line JSON
    #[default]
    Json,
    /// Indented JSON
    JsonPretty,
    Yaml,
}

impl OutputFormat {
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "json" => Some(OutputFormat::Json),
            "json-pretty" | "pretty" => Some(OutputFormat::JsonPretty),
            "yaml" | "yml" => Some(OutputFormat::Yaml),
            _ => None,
        }
    }
}

/// Render a value in the requested format.
pub fn render(value: &Value, format: OutputFormat) -> ConfigResult<String> {
    match format {
        OutputFormat::Json => Ok(value.to_string()),
        OutputFormat::JsonPretty => {
            serde_json::to_string_pretty(value).map_err(|e| ConfigError::render("JSON", e))
        }
        OutputFormat::Yaml => {
            serde_yaml::to_string(value).map_err(|e| ConfigError::render("YAML", e))
        }
    }
}
