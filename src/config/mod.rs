//! Layered configuration loading.
//!
//! A configuration is assembled from up to four sources, later ones winning:
//! 1. **Base file** - `name.yml`, `name.yaml` or `name.json`
//! 2. **Local override** - `name-local.<ext>` next to the base file, if present
//! 3. **Includes** - files named by a top-level `include` key, recursively
//! 4. **Environment** - `FOO_BAR` overrides reads of `foo.bar`
//!
//! After merging, mappings declaring `extends` inherit from the mapping they
//! name (see [`extends`]).
//!
//! ## Reserved keys
//! - `extends` - inheritance source, removed once resolved
//! - `base` - records the declared inheritance source
//! - `include` - file name or list of file names, removed during loading
//! - `config` - holds a file's top-level sequence

pub mod env;
pub mod extends;
mod formats;
mod loader;
mod merge;

pub use env::{EnvSource, NoEnv, ProcessEnv};
pub use extends::resolve_extends;
pub use formats::Format;
pub use loader::{ConfigLoader, local_override_path};
pub use merge::{deep_merge, deep_merge_all, deep_merged};

pub use crate::tree::ARRAY_KEY;

use crate::error::ConfigResult;
use crate::format::OutputFormat;
use crate::paths::KeyPath;
use crate::tree::{PathRead, PathedTree};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::borrow::Cow;
use std::fmt;
use std::path::Path;
use std::sync::Arc;

/// Inheritance source key.
pub const EXTENDS_KEY: &str = "extends";
/// Key recording the resolved inheritance source.
pub const BASE_KEY: &str = "base";
/// Include directive key.
pub const INCLUDE_KEY: &str = "include";

/// A loaded configuration.
///
/// Wraps a [`PathedTree`] and checks the environment before every read that
/// names a path. Whole-tree operations (`iter`, `len`, `is_empty`, `Display`)
/// go straight to the tree.
#[derive(Clone)]
pub struct Config {
    tree: PathedTree,
    env: Arc<dyn EnvSource>,
}

impl Config {
    /// Wrap an in-memory tree, reading overrides from the process environment.
    pub fn new(tree: PathedTree) -> Self {
        Self {
            tree,
            env: Arc::new(ProcessEnv),
        }
    }

    /// Build a config straight from a value.
    pub fn from_value(value: Value) -> Self {
        Self::new(PathedTree::from_value(value))
    }

    /// Replace the environment overrides are read from.
    pub fn with_env(mut self, env: impl EnvSource + 'static) -> Self {
        self.env = Arc::new(env);
        self
    }

    pub(crate) fn with_shared_env(mut self, env: Arc<dyn EnvSource>) -> Self {
        self.env = env;
        self
    }

    /// Load a file with includes and extends resolved.
    pub fn load(path: impl AsRef<Path>) -> ConfigResult<Self> {
        ConfigLoader::new().load(path)
    }

    /// Load a file, optionally leaving `extends` unresolved.
    pub fn load_with(path: impl AsRef<Path>, resolve_extends: bool) -> ConfigResult<Self> {
        ConfigLoader::new()
            .resolve_extends(resolve_extends)
            .load(path)
    }

    // Env-aware reads

    /// Value at `path`, with environment overrides applied.
    pub fn get(&self, path: &str) -> Option<Cow<'_, Value>> {
        self.lookup(path)
    }

    pub fn has(&self, path: &str) -> bool {
        self.contains(path)
    }

    pub fn get_or(&self, path: &str, default: Value) -> Value {
        self.lookup_or(path, default)
    }

    pub fn get_as<T: DeserializeOwned>(&self, path: &str) -> ConfigResult<Option<T>> {
        self.lookup_as(path)
    }

    // Writes go to the tree

    pub fn set(&mut self, path: &str, value: impl Into<Value>) {
        self.tree.set(path, value);
    }

    pub fn delete(&mut self, path: &str) -> Option<Value> {
        self.tree.delete(path)
    }

    /// Recursively merge `other` into this configuration.
    pub fn merge(&mut self, other: impl Into<Value>, overwrite: bool) {
        self.tree.merge(other, overwrite);
    }

    // Extends

    /// Resolve `extends` references in place.
    pub fn resolve_extends(&mut self) -> ConfigResult<()> {
        resolve_extends(&mut self.tree)
    }

    /// Same as [`Config::resolve_extends`] on a copy.
    pub fn resolved(&self) -> ConfigResult<Self> {
        let mut copy = self.clone();
        copy.resolve_extends()?;
        Ok(copy)
    }

    // Whole-tree access, bypassing the environment

    pub fn tree(&self) -> &PathedTree {
        &self.tree
    }

    pub fn tree_mut(&mut self) -> &mut PathedTree {
        &mut self.tree
    }

    pub fn into_tree(self) -> PathedTree {
        self.tree
    }

    pub fn iter(&self) -> serde_json::map::Iter<'_> {
        self.tree.iter()
    }

    pub fn len(&self) -> usize {
        self.tree.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tree.is_empty()
    }

    pub fn render(&self, format: OutputFormat) -> ConfigResult<String> {
        self.tree.render(format)
    }
}

impl PathRead for Config {
    fn separator(&self) -> char {
        self.tree.separator()
    }

    fn read(&self, path: &KeyPath) -> Option<Cow<'_, Value>> {
        if let Some(value) = env::env_override(self.env.as_ref(), path) {
            return Some(Cow::Owned(value));
        }
        self.tree.read(path)
    }
}

impl From<PathedTree> for Config {
    fn from(tree: PathedTree) -> Self {
        Self::new(tree)
    }
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("tree", &self.tree)
            .finish_non_exhaustive()
    }
}

impl fmt::Display for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.tree, f)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::collections::HashMap;

    fn env(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    fn config() -> Config {
        Config::from_value(json!({"foo": "bar", "baz": "quux", "nested": {"key": 1}}))
    }

    #[test]
    fn test_env_overrides_read() {
        let cfg = config().with_env(env(&[("BAZ", "override2")]));
        assert_eq!(cfg.get("foo").as_deref(), Some(&json!("bar")));
        assert_eq!(cfg.get("baz").as_deref(), Some(&json!("override2")));
        // The tree itself is untouched.
        assert_eq!(cfg.tree().get("baz"), Some(&json!("quux")));
    }

    #[test]
    fn test_env_override_replaces_subtree() {
        let cfg = config().with_env(env(&[("NESTED", r#"{"other": true}"#)]));
        assert_eq!(cfg.get("nested").as_deref(), Some(&json!({"other": true})));
        // Deeper paths use their own variable name.
        assert_eq!(cfg.get("nested.key").as_deref(), Some(&json!(1)));
    }

    #[test]
    fn test_env_override_for_nested_path() {
        let cfg = config().with_env(env(&[("NESTED_KEY", "7")]));
        assert_eq!(cfg.get("nested.key").as_deref(), Some(&json!(7)));
        assert_eq!(cfg.get_as::<u32>("nested.key").unwrap(), Some(7));
    }

    #[test]
    fn test_env_can_add_missing_keys() {
        let cfg = config().with_env(env(&[("MISSING", "here")]));
        assert!(cfg.has("missing"));
        assert!(!cfg.tree().has("missing"));
    }

    #[test]
    fn test_empty_env_value_is_ignored() {
        let cfg = config().with_env(env(&[("FOO", "")]));
        assert_eq!(cfg.get("foo").as_deref(), Some(&json!("bar")));
    }

    #[test]
    fn test_root_reads_bypass_env() {
        let cfg = config().with_env(env(&[("_", "x"), ("", "y")]));
        assert_eq!(cfg.get(".").as_deref(), Some(cfg.tree().as_value()));
        assert_eq!(cfg.get("").as_deref(), Some(cfg.tree().as_value()));
    }

    #[test]
    fn test_whole_tree_operations() {
        let cfg = config().with_env(env(&[("FOO", "ignored")]));
        assert_eq!(cfg.len(), 3);
        assert!(!cfg.is_empty());
        assert_eq!(cfg.to_string(), cfg.tree().to_string());
        assert!(cfg.to_string().contains("\"bar\""));
    }

    #[test]
    fn test_writes_and_defaults() {
        let mut cfg = config().with_env(NoEnv);
        cfg.set("new.key", "v");
        assert_eq!(cfg.get_or("new.key", json!(null)), json!("v"));
        assert_eq!(cfg.delete("new.key"), Some(json!("v")));
        assert_eq!(cfg.get_or("new.key", json!("dflt")), json!("dflt"));
    }

    #[test]
    fn test_resolved_copy() {
        let cfg = Config::from_value(json!({
            "mock": {"a": 1},
            "leaf": {"extends": "mock"}
        }))
        .with_env(NoEnv);
        let resolved = cfg.resolved().unwrap();
        assert_eq!(resolved.get("leaf.a").as_deref(), Some(&json!(1)));
        assert_eq!(cfg.get("leaf.extends").as_deref(), Some(&json!("mock")));
    }
}
