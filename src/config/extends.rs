//! Resolution of `extends` inheritance.
//!
//! A mapping containing `extends: other` inherits every key of the sibling
//! mapping `other` that it does not define itself. A reference starting with
//! the separator is absolute from the root.
//!
//! Inheritance chains are resolved from the far end: for `leaf -> branch ->
//! mock`, `branch` is merged from `mock` first, then `leaf` from the resolved
//! `branch`. Each resolved mapping loses its `extends` key and gains a `base`
//! key holding the reference it declared, unless it already inherited one.
//!
//! Policies:
//! - a reference to a missing mapping records `base` and merges nothing
//! - a self reference records `base` and merges nothing
//! - a reference that loops back into the chain, or names an ancestor of the
//!   extending mapping, is an [`ConfigError::ExtendsCycle`]
//!
//! A source mapping is fully resolved before it is copied, so a source whose
//! own children extend back into it is reported as a cycle instead of being
//! copied into itself forever.

use super::merge::deep_merge;
use super::{BASE_KEY, EXTENDS_KEY};
use crate::error::{ConfigError, ConfigResult};
use crate::paths::KeyPath;
use crate::tree::PathedTree;
use serde_json::Value;
use tracing::{debug, warn};

/// Resolve every `extends` reference in the tree, in place.
pub fn resolve_extends(tree: &mut PathedTree) -> ConfigResult<()> {
    let separator = tree.separator();
    let mut resolver = Resolver {
        tree,
        separator,
        active: Vec::new(),
    };
    resolver.resolve_node(&KeyPath::root())
}

struct Resolver<'a> {
    tree: &'a mut PathedTree,
    separator: char,
    /// Nodes whose resolution is in progress, outermost first.
    active: Vec<KeyPath>,
}

impl Resolver<'_> {
    /// Resolve `node` and everything beneath it.
    ///
    /// Repeats until `node` itself carries no `extends`, re-visiting children
    /// each round since a merge can bring in new ones.
    fn resolve_node(&mut self, node: &KeyPath) -> ConfigResult<()> {
        if self.active.iter().any(|p| p.segments() == node.segments()) {
            let mut chain = self.active.clone();
            chain.push(node.clone());
            return Err(self.cycle(&chain));
        }

        self.active.push(node.clone());
        let result = self.resolve_active(node);
        self.active.pop();
        result
    }

    fn resolve_active(&mut self, node: &KeyPath) -> ConfigResult<()> {
        loop {
            for key in self.mapping_children(node) {
                self.resolve_node(&node.child(key))?;
            }

            // Follow the chain to the first mapping without a further link.
            let mut source = node.clone();
            let mut target = None;
            let mut chain = vec![node.clone()];
            while let Some(next) = self.link_of(&source)? {
                if chain.iter().any(|p| p.segments() == next.segments()) {
                    chain.push(next);
                    return Err(self.cycle(&chain));
                }
                chain.push(next.clone());
                target = Some(std::mem::replace(&mut source, next));
            }

            let Some(target) = target else {
                return Ok(());
            };
            // Inherit only from a source with nothing left to resolve.
            self.resolve_node(&source)?;
            self.merge_extension(&source, &target);
        }
    }

    /// Keys of `node` whose values are mappings.
    fn mapping_children(&self, node: &KeyPath) -> Vec<String> {
        match self.tree.get_path(node) {
            Some(Value::Object(map)) => map
                .iter()
                .filter(|(_, value)| value.is_object())
                .map(|(key, _)| key.clone())
                .collect(),
            _ => Vec::new(),
        }
    }

    /// The mapping `node` extends, if it declares one.
    fn link_of(&mut self, node: &KeyPath) -> ConfigResult<Option<KeyPath>> {
        let Some(reference) = self
            .tree
            .get_path(node)
            .and_then(Value::as_object)
            .and_then(|map| map.get(EXTENDS_KEY))
        else {
            return Ok(None);
        };
        let Some(reference) = reference.as_str() else {
            return Err(ConfigError::InvalidExtends {
                path: self.display(node),
                found: reference.to_string(),
            });
        };

        let parsed = KeyPath::parse(reference, self.separator);
        let resolved = if parsed.is_absolute() {
            parsed
        } else {
            node.parent().join(&parsed)
        };

        if resolved.segments() == node.segments() {
            self.clear_self_reference(node);
            return Ok(None);
        }
        if node.segments().starts_with(resolved.segments()) {
            return Err(self.cycle(&[node.clone(), resolved]));
        }
        Ok(Some(resolved))
    }

    fn clear_self_reference(&mut self, node: &KeyPath) {
        debug!(path = %self.display(node), "Ignoring self-referencing extends");
        if let Some(map) = self.tree.get_path_mut(node).and_then(Value::as_object_mut)
            && let Some(extends) = map.remove(EXTENDS_KEY)
            && !map.contains_key(BASE_KEY)
        {
            map.insert(BASE_KEY.to_string(), extends);
        }
    }

    /// Merge `source` into `target` without overwriting, then record `base`.
    fn merge_extension(&mut self, source: &KeyPath, target: &KeyPath) {
        let inherited = match self.tree.get_path(source) {
            Some(Value::Object(map)) => {
                let mut map = map.clone();
                map.remove(EXTENDS_KEY);
                Some(Value::Object(map))
            }
            Some(_) => {
                warn!(
                    base = %self.display(source),
                    derived = %self.display(target),
                    "Extends target is not a mapping; nothing inherited"
                );
                None
            }
            None => {
                warn!(
                    base = %self.display(source),
                    derived = %self.display(target),
                    "Extends target does not exist; nothing inherited"
                );
                None
            }
        };

        let Some(target_value) = self.tree.get_path_mut(target) else {
            return;
        };
        let extends = target_value
            .as_object_mut()
            .and_then(|map| map.remove(EXTENDS_KEY))
            .unwrap_or(Value::Null);

        if let Some(inherited) = inherited {
            deep_merge(target_value, inherited, false);
        }

        if let Some(map) = target_value.as_object_mut()
            && !map.contains_key(BASE_KEY)
        {
            map.insert(BASE_KEY.to_string(), extends);
        }

        debug!(
            base = %self.display(source),
            derived = %self.display(target),
            "Resolved extends"
        );
    }

    fn cycle(&self, chain: &[KeyPath]) -> ConfigError {
        ConfigError::ExtendsCycle {
            chain: chain.iter().map(|p| self.display(p)).collect(),
        }
    }

    fn display(&self, path: &KeyPath) -> String {
        if path.is_root() {
            self.separator.to_string()
        } else {
            path.to_path_string(self.separator)
        }
    }
}
