//! Environment variable overrides.
//!
//! A read of `foo.bar` on a loaded config first checks the variable `FOO_BAR`.
//! When it is set and non-empty, its contents replace the whole subtree at
//! that path: JSON is parsed, anything else is returned as a plain string.

use crate::paths::KeyPath;
use serde_json::Value;
use std::collections::HashMap;
use std::fmt;
use tracing::trace;

/// Source of environment variables.
pub trait EnvSource: Send + Sync {
    fn var(&self, name: &str) -> Option<String>;
}

/// The process environment.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessEnv;

impl EnvSource for ProcessEnv {
    fn var(&self, name: &str) -> Option<String> {
        std::env::var(name).ok()
    }
}

impl EnvSource for HashMap<String, String> {
    fn var(&self, name: &str) -> Option<String> {
        self.get(name).cloned()
    }
}

/// Environment with no variables; disables overrides.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoEnv;

impl EnvSource for NoEnv {
    fn var(&self, _name: &str) -> Option<String> {
        None
    }
}

impl fmt::Debug for dyn EnvSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("EnvSource")
    }
}

/// Parse an override value: JSON if it parses, else the raw string.
pub fn parse_override(raw: &str) -> Value {
    serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.to_string()))
}

/// Look up the override for `path`, if any.
///
/// The root has no variable name and never triggers a lookup.
pub fn env_override(env: &dyn EnvSource, path: &KeyPath) -> Option<Value> {
    let name = path.env_var_name()?;
    let raw = env.var(&name).filter(|v| !v.is_empty())?;
    trace!(var = %name, path = %path, "Environment override");
    Some(parse_override(&raw))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn env(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_parse_override() {
        assert_eq!(parse_override("override2"), json!("override2"));
        assert_eq!(parse_override("42"), json!(42));
        assert_eq!(parse_override(r#"{"a": [1]}"#), json!({"a": [1]}));
        assert_eq!(parse_override("{broken"), json!("{broken"));
    }

    #[test]
    fn test_override_lookup() {
        let vars = env(&[("FOO_BAR", "true"), ("EMPTY", "")]);
        let path = KeyPath::parse("foo.bar", '.');
        assert_eq!(env_override(&vars, &path), Some(json!(true)));
        assert_eq!(env_override(&vars, &KeyPath::parse("empty", '.')), None);
        assert_eq!(env_override(&vars, &KeyPath::parse("other", '.')), None);
    }

    #[test]
    fn test_root_never_looks_up() {
        let vars = env(&[("", "x"), ("_", "y")]);
        assert_eq!(env_override(&vars, &KeyPath::parse(".", '.')), None);
        assert_eq!(env_override(&vars, &KeyPath::parse("", '.')), None);
    }

    #[test]
    fn test_no_env() {
        assert_eq!(NoEnv.var("PATH"), None);
    }
}
