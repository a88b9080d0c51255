//! Configuration loader.
//!
//! Loads a base file, merges its `-local` sibling over it, merges every
//! included file, then wraps the result and resolves `extends`.

use super::env::{EnvSource, ProcessEnv};
use super::extends::resolve_extends;
use super::formats::Format;
use super::merge::deep_merge;
use super::{Config, INCLUDE_KEY};
use crate::error::{ConfigError, ConfigResult};
use crate::paths::DEFAULT_SEPARATOR;
use crate::tree::{PathedTree, into_root};
use serde_json::Value;
use std::collections::{HashSet, VecDeque};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::debug;

/// Suffix inserted before the extension to name the local override file.
pub const LOCAL_SUFFIX: &str = "-local";

/// Configuration loader with builder pattern.
///
/// # Example
///
/// ```no_run
/// use pathed_config::config::ConfigLoader;
///
/// let config = ConfigLoader::new()
///     .resolve_extends(false)
///     .load("config/app.yml")?;
/// # Ok::<(), pathed_config::error::ConfigError>(())
/// ```
#[derive(Debug, Clone)]
pub struct ConfigLoader {
    /// Path separator of the resulting tree.
    separator: char,

    /// Whether to resolve `extends` after merging.
    resolve_extends: bool,

    /// Environment consulted by reads on the loaded config.
    env: Arc<dyn EnvSource>,
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigLoader {
    /// Creates a new loader with default settings.
    #[must_use]
    pub fn new() -> Self {
        Self {
            separator: DEFAULT_SEPARATOR,
            resolve_extends: true,
            env: Arc::new(ProcessEnv),
        }
    }

    /// Sets the path separator.
    #[must_use]
    pub fn separator(mut self, separator: char) -> Self {
        self.separator = separator;
        self
    }

    /// Enables or disables `extends` resolution (enabled by default).
    #[must_use]
    pub fn resolve_extends(mut self, resolve: bool) -> Self {
        self.resolve_extends = resolve;
        self
    }

    /// Sets the environment used for read overrides.
    ///
    /// Useful for testing with a deterministic environment.
    #[must_use]
    pub fn with_env(mut self, env: impl EnvSource + 'static) -> Self {
        self.env = Arc::new(env);
        self
    }

    /// Loads and merges configuration starting from `path`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the extension is not recognised, if the base
    /// file or any included file cannot be read or parsed, or if `extends`
    /// resolution fails. A missing local override file is not an error.
    pub fn load(&self, path: impl AsRef<Path>) -> ConfigResult<Config> {
        let path = path.as_ref();

        // Layer 1: Base file
        let format = Format::from_path(path)?;
        let mut document = read_document(path, format)?;
        debug!(path = %path.display(), "Loaded base config");

        // Layer 2: Local override
        if let Some(local) = local_override_path(path)
            && local.exists()
        {
            let local_document = read_document(&local, format)?;
            deep_merge(&mut document, local_document, true);
            debug!(path = %local.display(), "Merged local config");
        }

        // Layer 3: Includes
        resolve_includes(path, &mut document)?;

        let mut tree = PathedTree::from_value(document).with_separator(self.separator);
        if self.resolve_extends {
            resolve_extends(&mut tree)?;
        }

        Ok(Config::new(tree).with_shared_env(Arc::clone(&self.env)))
    }
}

/// Name of the local override file for `path`: `dir/name.ext` becomes
/// `dir/name-local.ext`.
pub fn local_override_path(path: &Path) -> Option<PathBuf> {
    let stem = path.file_stem()?;
    let extension = path.extension()?;

    let mut name = stem.to_os_string();
    name.push(LOCAL_SUFFIX);
    name.push(".");
    name.push(extension);
    Some(path.with_file_name(name))
}

/// Read and parse a file into a root mapping.
fn read_document(path: &Path, format: Format) -> ConfigResult<Value> {
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::read(path, e))?;
    format.parse(&content, path).map(into_root)
}

/// Merge every file reachable through `include` keys into `document`.
///
/// Names are resolved against the directory of the file declaring them.
/// Files are merged in the order they are discovered, and each file at most
/// once; the base file itself is never merged again.
fn resolve_includes(base: &Path, document: &mut Value) -> ConfigResult<()> {
    let mut seen = HashSet::new();
    seen.insert(file_identity(base));

    let mut queue: VecDeque<PathBuf> = take_includes(document, base)?
        .into_iter()
        .map(|name| sibling(base, &name))
        .collect();

    while let Some(file) = queue.pop_front() {
        if !seen.insert(file_identity(&file)) {
            debug!(path = %file.display(), "Skipping already included config");
            continue;
        }

        let format = Format::from_path(&file)?;
        let mut included = read_document(&file, format)?;
        for name in take_includes(&mut included, &file)? {
            queue.push_back(sibling(&file, &name));
        }

        deep_merge(document, included, true);
        debug!(path = %file.display(), "Merged included config");
    }

    Ok(())
}

/// Remove the top-level `include` key and return the names it held.
fn take_includes(document: &mut Value, path: &Path) -> ConfigResult<Vec<String>> {
    let Some(map) = document.as_object_mut() else {
        return Ok(Vec::new());
    };

    let invalid = |found: &Value| ConfigError::InvalidInclude {
        path: path.to_path_buf(),
        found: found.to_string(),
    };

    match map.remove(INCLUDE_KEY) {
        None | Some(Value::Null) => Ok(Vec::new()),
        Some(Value::String(name)) => Ok(vec![name]),
        Some(Value::Array(items)) => items
            .into_iter()
            .map(|item| match item {
                Value::String(name) => Ok(name),
                other => Err(invalid(&other)),
            })
            .collect(),
        Some(other) => Err(invalid(&other)),
    }
}

/// Resolve `name` against the directory containing `file`.
fn sibling(file: &Path, name: &str) -> PathBuf {
    match file.parent() {
        Some(dir) => dir.join(name),
        None => PathBuf::from(name),
    }
}

/// Identity used to deduplicate includes reached through different names.
fn file_identity(path: &Path) -> PathBuf {
    std::fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf())
}
