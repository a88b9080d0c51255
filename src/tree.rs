//! Path-addressed configuration tree.
//!
//! [`PathedTree`] wraps a `serde_json::Value` mapping and lets callers write
//! `tree.get("first.second")` instead of descending one mapping at a time.
//! Reads never fail because a path is missing: they return `None`.
//! Writes create intermediate mappings as needed.
//!
//! Keys are always stored as strings. Parsed documents are normalised on the
//! way in (see `config::formats`), so a key written as `1` or `true` in YAML is
//! found with the path segment `"1"` or `"true"`.

use crate::error::{ConfigError, ConfigResult};
use crate::format::{OutputFormat, render};
use crate::paths::{DEFAULT_SEPARATOR, KeyPath};
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use std::borrow::Cow;
use std::fmt;
use std::sync::LazyLock;

/// Key under which a top-level sequence (or scalar) is stored, keeping the
/// root of every tree a mapping.
pub const ARRAY_KEY: &str = "config";

static EMPTY_MAP: LazyLock<Map<String, Value>> = LazyLock::new(Map::new);

/// Turn any parsed document into a root mapping.
///
/// `null` becomes an empty mapping; sequences and scalars are wrapped under
/// [`ARRAY_KEY`].
pub fn into_root(value: Value) -> Value {
    match value {
        Value::Null => Value::Object(Map::new()),
        Value::Object(map) => Value::Object(map),
        other => {
            let mut map = Map::new();
            map.insert(ARRAY_KEY.to_string(), other);
            Value::Object(map)
        }
    }
}

/// Read interface shared by [`PathedTree`] and the env-aware `Config`.
///
/// Implementors provide [`PathRead::read`]; every other accessor goes
/// through it, so overriding `read` changes all of them at once.
pub trait PathRead {
    /// Separator used to split path strings.
    fn separator(&self) -> char;

    /// Resolve a parsed path.
    fn read(&self, path: &KeyPath) -> Option<Cow<'_, Value>>;

    /// Resolve a path string.
    fn lookup(&self, path: &str) -> Option<Cow<'_, Value>> {
        self.read(&KeyPath::parse(path, self.separator()))
    }

    /// Whether a value exists at the path.
    fn contains(&self, path: &str) -> bool {
        self.lookup(path).is_some()
    }

    /// Value at the path, or `default` when absent.
    fn lookup_or(&self, path: &str, default: Value) -> Value {
        self.lookup(path).map(Cow::into_owned).unwrap_or(default)
    }

    /// Deserialize the value at the path into `T`.
    ///
    /// Returns `Ok(None)` when nothing is stored at the path.
    fn lookup_as<T: DeserializeOwned>(&self, path: &str) -> ConfigResult<Option<T>> {
        match self.lookup(path) {
            None => Ok(None),
            Some(value) => serde_json::from_value(value.into_owned())
                .map(Some)
                .map_err(|source| ConfigError::Deserialize {
                    path: path.to_string(),
                    source,
                }),
        }
    }
}

/// A mapping addressable by separator-delimited paths.
#[derive(Debug, Clone, PartialEq)]
pub struct PathedTree {
    data: Value,
    separator: char,
}

impl PathedTree {
    /// Create an empty tree.
    pub fn new() -> Self {
        Self::from_value(Value::Null)
    }

    /// Wrap a value; see [`into_root`] for how non-mappings are handled.
    pub fn from_value(value: Value) -> Self {
        Self {
            data: into_root(value),
            separator: DEFAULT_SEPARATOR,
        }
    }

    /// Use a different path separator.
    pub fn with_separator(mut self, separator: char) -> Self {
        self.separator = separator;
        self
    }

    pub fn separator(&self) -> char {
        self.separator
    }

    pub fn set_separator(&mut self, separator: char) {
        self.separator = separator;
    }

    /// Parse a path string with this tree's separator.
    pub fn parse_path(&self, path: &str) -> KeyPath {
        KeyPath::parse(path, self.separator)
    }

    // Path-aware access

    /// Value at `path`; the empty path and a lone separator return the whole tree.
    pub fn get(&self, path: &str) -> Option<&Value> {
        self.get_path(&self.parse_path(path))
    }

    pub fn get_path(&self, path: &KeyPath) -> Option<&Value> {
        let mut current = &self.data;
        for segment in path.segments() {
            current = current.as_object()?.get(segment)?;
        }
        Some(current)
    }

    pub fn get_mut(&mut self, path: &str) -> Option<&mut Value> {
        let path = self.parse_path(path);
        self.get_path_mut(&path)
    }

    pub fn get_path_mut(&mut self, path: &KeyPath) -> Option<&mut Value> {
        let mut current = &mut self.data;
        for segment in path.segments() {
            current = current.as_object_mut()?.get_mut(segment)?;
        }
        Some(current)
    }

    pub fn has(&self, path: &str) -> bool {
        self.get(path).is_some()
    }

    pub fn has_path(&self, path: &KeyPath) -> bool {
        self.get_path(path).is_some()
    }

    /// Store `value` at `path`, replacing whatever was there.
    ///
    /// Any segment on the way that does not hold a mapping is replaced by an
    /// empty one. Setting the root replaces the entire tree.
    pub fn set(&mut self, path: &str, value: impl Into<Value>) {
        let path = self.parse_path(path);
        self.set_path(&path, value);
    }

    pub fn set_path(&mut self, path: &KeyPath, value: impl Into<Value>) {
        let value = value.into();
        let Some((leaf, parents)) = path.segments().split_last() else {
            self.data = into_root(value);
            return;
        };

        let mut current = &mut self.data;
        for segment in parents {
            current = ensure_object(current)
                .entry(segment.clone())
                .or_insert_with(|| Value::Object(Map::new()));
        }
        ensure_object(current).insert(leaf.clone(), value);
    }

    /// Remove and return the value at `path`. Deleting the root empties the tree.
    pub fn delete(&mut self, path: &str) -> Option<Value> {
        let path = self.parse_path(path);
        self.delete_path(&path)
    }

    pub fn delete_path(&mut self, path: &KeyPath) -> Option<Value> {
        let Some(leaf) = path.leaf() else {
            return Some(std::mem::replace(
                &mut self.data,
                Value::Object(Map::new()),
            ));
        };
        self.get_path_mut(&path.parent())?
            .as_object_mut()?
            .remove(leaf)
    }

    // Merging

    /// Recursively merge `other` into this tree.
    pub fn merge(&mut self, other: impl Into<Value>, overwrite: bool) {
        crate::config::deep_merge(&mut self.data, other.into(), overwrite);
    }

    /// Same as [`PathedTree::merge`] on a copy.
    pub fn merged(&self, other: impl Into<Value>, overwrite: bool) -> Self {
        let mut copy = self.clone();
        copy.merge(other, overwrite);
        copy
    }

    // Whole-tree operations; these ignore paths and act on the top level.

    pub fn as_map(&self) -> &Map<String, Value> {
        match &self.data {
            Value::Object(map) => map,
            _ => &EMPTY_MAP,
        }
    }

    pub fn as_value(&self) -> &Value {
        &self.data
    }

    pub fn into_value(self) -> Value {
        self.data
    }

    pub fn iter(&self) -> serde_json::map::Iter<'_> {
        self.as_map().iter()
    }

    pub fn keys(&self) -> serde_json::map::Keys<'_> {
        self.as_map().keys()
    }

    pub fn len(&self) -> usize {
        self.as_map().len()
    }

    pub fn is_empty(&self) -> bool {
        self.as_map().is_empty()
    }

    /// Swap keys and values of the top level. Non-string values are keyed by
    /// their JSON text; on duplicates the last key wins.
    pub fn invert(&self) -> Map<String, Value> {
        self.iter()
            .map(|(key, value)| {
                let inverted = match value {
                    Value::String(s) => s.clone(),
                    other => other.to_string(),
                };
                (inverted, Value::String(key.clone()))
            })
            .collect()
    }

    /// Render the tree as text.
    pub fn render(&self, format: OutputFormat) -> ConfigResult<String> {
        render(&self.data, format)
    }
}

fn ensure_object(value: &mut Value) -> &mut Map<String, Value> {
    if !value.is_object() {
        *value = Value::Object(Map::new());
    }
    match value {
        Value::Object(map) => map,
        _ => unreachable!("value was just replaced with a mapping"),
    }
}

impl PathRead for PathedTree {
    fn separator(&self) -> char {
        self.separator
    }

    fn read(&self, path: &KeyPath) -> Option<Cow<'_, Value>> {
        self.get_path(path).map(Cow::Borrowed)
    }
}

impl Default for PathedTree {
    fn default() -> Self {
        Self::new()
    }
}

impl From<Value> for PathedTree {
    fn from(value: Value) -> Self {
        Self::from_value(value)
    }
}

impl From<Map<String, Value>> for PathedTree {
    fn from(map: Map<String, Value>) -> Self {
        Self::from_value(Value::Object(map))
    }
}

impl From<PathedTree> for Value {
    fn from(tree: PathedTree) -> Self {
        tree.data
    }
}

impl<'a> IntoIterator for &'a PathedTree {
    type Item = (&'a String, &'a Value);
    type IntoIter = serde_json::map::Iter<'a>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl fmt::Display for PathedTree {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.data)
    }
}
