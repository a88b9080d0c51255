//! Dotted key paths.
//!
//! A path string such as `drivers.mock.option` is split on a separator
//! character (default `.`) into segments. A separator preceded by the escape
//! character (`\`) is kept literally inside its segment, with the escape
//! removed, so `a\.b.c` addresses the key `a.b` and then `c`.
//!
//! Empty segments are dropped: a leading separator marks the path as absolute
//! and both `""` and a lone separator address the root.

use std::fmt;

/// Default separator between path segments.
pub const DEFAULT_SEPARATOR: char = '.';

/// Escape character that protects a following separator from splitting.
pub const ESCAPE: char = '\\';

/// A parsed path into a configuration tree.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct KeyPath {
    segments: Vec<String>,
    absolute: bool,
}

impl KeyPath {
    /// The root path (no segments).
    pub fn root() -> Self {
        Self::default()
    }

    /// Parse a path string using the given separator.
    pub fn parse(path: &str, separator: char) -> Self {
        let mut segments = Vec::new();
        let mut current = String::new();
        let mut chars = path.chars().peekable();

        while let Some(c) = chars.next() {
            if c == ESCAPE && chars.peek() == Some(&separator) {
                current.push(separator);
                chars.next();
            } else if c == separator {
                if !current.is_empty() {
                    segments.push(std::mem::take(&mut current));
                }
            } else {
                current.push(c);
            }
        }
        if !current.is_empty() {
            segments.push(current);
        }

        Self {
            segments,
            absolute: path.starts_with(separator),
        }
    }

    /// Build a path from literal segments; separators inside them are not split.
    pub fn from_segments<I, S>(segments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            segments: segments
                .into_iter()
                .map(Into::into)
                .filter(|s: &String| !s.is_empty())
                .collect(),
            absolute: true,
        }
    }

    /// Whether the path string started with the separator.
    pub fn is_absolute(&self) -> bool {
        self.absolute
    }

    /// Whether this path addresses the whole tree.
    pub fn is_root(&self) -> bool {
        self.segments.is_empty()
    }

    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    pub fn len(&self) -> usize {
        self.segments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// Last segment, if any.
    pub fn leaf(&self) -> Option<&str> {
        self.segments.last().map(String::as_str)
    }

    /// The path one level up. The root is its own parent.
    pub fn parent(&self) -> KeyPath {
        let mut segments = self.segments.clone();
        segments.pop();
        Self {
            segments,
            absolute: true,
        }
    }

    /// Append a single literal segment.
    pub fn child(&self, segment: impl Into<String>) -> KeyPath {
        let mut segments = self.segments.clone();
        let segment = segment.into();
        if !segment.is_empty() {
            segments.push(segment);
        }
        Self {
            segments,
            absolute: true,
        }
    }

    /// Append all segments of `other`.
    pub fn join(&self, other: &KeyPath) -> KeyPath {
        let mut segments = self.segments.clone();
        segments.extend(other.segments.iter().cloned());
        Self {
            segments,
            absolute: true,
        }
    }

    /// Render the path back into a string with the given separator,
    /// escaping separators that occur inside segments.
    pub fn to_path_string(&self, separator: char) -> String {
        let escaped = format!("{ESCAPE}{separator}");
        self.segments
            .iter()
            .map(|s| s.replace(separator, &escaped))
            .collect::<Vec<_>>()
            .join(&separator.to_string())
    }

    /// Name of the environment variable overriding this path.
    ///
    /// Segments are uppercased and joined with `_`, so `foo.bar` maps to
    /// `FOO_BAR`. The name is built from the parsed segments, not the raw
    /// string: a leading separator adds nothing (`.foo` reads `FOO`, not
    /// `_FOO`) and repeated separators collapse (`a..b` reads `A_B`). An
    /// escaped separator stays inside its segment, so `a\.b` reads `A.B`.
    /// The root has no variable.
    pub fn env_var_name(&self) -> Option<String> {
        if self.is_root() {
            return None;
        }
        Some(self.segments.join("_").to_uppercase())
    }
}

impl fmt::Display for KeyPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_path_string(DEFAULT_SEPARATOR))
    }
}
