//! Integration tests for the public tree and merge API.

use pathed_config::config::{deep_merge, deep_merge_all};
use pathed_config::{KeyPath, OutputFormat, PathRead, PathedTree};
use serde::Deserialize;
use serde_json::{Value, json};

fn sample() -> PathedTree {
    PathedTree::from_value(json!({
        "foo": 42,
        "bar": {
            "baz": "quux",
            "blah": [1, 2]
        }
    }))
}

#[test]
fn test_construction() {
    assert!(PathedTree::new().is_empty());
    assert!(PathedTree::from_value(Value::Null).is_empty());

    let tree = PathedTree::from_value(json!({"foo": 42}));
    assert!(!tree.is_empty());
    assert_eq!(tree.get("foo"), Some(&json!(42)));
}

#[test]
fn test_recursive_reads() {
    let tree = sample();
    assert_eq!(tree.get("foo"), Some(&json!(42)));
    assert_eq!(tree.get("bar.baz"), Some(&json!("quux")));
    assert_eq!(tree.get("bar.blah"), Some(&json!([1, 2])));
    assert_eq!(tree.get("nope"), None);
    assert_eq!(tree.get("bar.nope"), None);
    // Descending through a scalar is a miss, not an error.
    assert_eq!(tree.get("foo.deeper"), None);
}

#[test]
fn test_root_paths() {
    let tree = sample();
    assert_eq!(tree.get(".").and_then(|v| v.get("foo")), Some(&json!(42)));
    assert_eq!(tree.get("").and_then(|v| v.get("foo")), Some(&json!(42)));
}

#[test]
fn test_absolute_paths() {
    let tree = sample();
    assert_eq!(tree.get(".bar.baz"), Some(&json!("quux")));
    assert_eq!(tree.get("bar.baz"), tree.get(".bar.baz"));
}

#[test]
fn test_recursive_writes() {
    let mut tree = PathedTree::new();
    tree.set("foo.bar", 42);
    assert_eq!(tree.get("foo.bar"), Some(&json!(42)));
    assert_eq!(tree.get("foo"), Some(&json!({"bar": 42})));

    // A scalar in the way is replaced by a mapping.
    tree.set("foo.bar.baz", "deep");
    assert_eq!(tree.get("foo.bar.baz"), Some(&json!("deep")));
}

#[test]
fn test_delete() {
    let mut tree = sample();
    assert_eq!(tree.delete("bar.baz"), Some(json!("quux")));
    assert!(!tree.has("bar.baz"));
    assert!(tree.has("bar.blah"));
    assert_eq!(tree.delete("bar.nope"), None);
    assert_eq!(tree.delete("foo.deeper"), None);
}

#[test]
fn test_escaped_separator_in_key() {
    let mut tree = PathedTree::new();
    tree.set(r"hosts.example\.com", "up");
    assert_eq!(tree.get("hosts"), Some(&json!({"example.com": "up"})));
    assert_eq!(tree.get(r"hosts.example\.com"), Some(&json!("up")));

    let path = KeyPath::parse(r"hosts.example\.com", '.');
    assert_eq!(path.segments(), ["hosts", "example.com"]);
    assert_eq!(path.to_path_string('.'), r"hosts.example\.com");
}

#[test]
fn test_custom_separator() {
    let mut tree = sample().with_separator('/');
    assert_eq!(tree.get("bar/baz"), Some(&json!("quux")));
    assert_eq!(tree.get("bar.baz"), None);

    tree.set("a.b/c", 1);
    assert_eq!(tree.get("a.b"), Some(&json!({"c": 1})));
}

#[test]
fn test_hash_like_operations() {
    let tree = PathedTree::from_value(json!({"foo": 42, "bar": "baz"}));
    let inverted = tree.invert();
    assert_eq!(inverted.get("42"), Some(&json!("foo")));
    assert_eq!(inverted.get("baz"), Some(&json!("bar")));

    let mut keys: Vec<_> = tree.keys().cloned().collect();
    keys.sort();
    assert_eq!(keys, vec!["bar", "foo"]);
    assert_eq!((&tree).into_iter().count(), 2);
}

#[test]
fn test_string_representation_matches_source() {
    let value = json!({"foo": 42});
    let tree = PathedTree::from_value(value.clone());
    assert_eq!(tree.to_string(), value.to_string());
}

#[test]
fn test_merge_with_overwrite() {
    let tree = PathedTree::from_value(json!({"foo": {"bar": 42, "baz": "quux"}}));
    let merged = tree.merged(json!({"foo": {"baz": "override"}}), true);
    assert_eq!(merged.get("foo.bar"), Some(&json!(42)));
    assert_eq!(merged.get("foo.baz"), Some(&json!("override")));
    // Source tree untouched.
    assert_eq!(tree.get("foo.baz"), Some(&json!("quux")));
}

#[test]
fn test_merge_without_overwrite() {
    let mut tree = PathedTree::from_value(json!({"foo": {"bar": 42, "baz": "quux"}}));
    tree.merge(json!({"foo": {"baz": "override", "new": true}}), false);
    assert_eq!(tree.get("foo.bar"), Some(&json!(42)));
    assert_eq!(tree.get("foo.baz"), Some(&json!("quux")));
    assert_eq!(tree.get("foo.new"), Some(&json!(true)));
}

#[test]
fn test_merge_concatenates_arrays() {
    let mut dst = json!({"list": [1, 2]});
    deep_merge(&mut dst, json!({"list": [2, 3]}), true);
    assert_eq!(dst, json!({"list": [1, 2, 2, 3]}));
}

#[test]
fn test_merge_all_layers() {
    let merged = deep_merge_all(
        [
            json!({"a": 1, "nested": {"x": 1}}),
            json!({"a": 2, "nested": {"y": 2}}),
            json!({"nested": {"x": 3}}),
        ],
        true,
    );
    assert_eq!(merged, json!({"a": 2, "nested": {"x": 3, "y": 2}}));
}

#[test]
fn test_typed_lookup() {
    #[derive(Debug, Deserialize, PartialEq)]
    struct Bar {
        baz: String,
        blah: Vec<u32>,
    }

    let tree = sample();
    let bar: Option<Bar> = tree.lookup_as("bar").unwrap();
    assert_eq!(
        bar,
        Some(Bar {
            baz: "quux".to_string(),
            blah: vec![1, 2]
        })
    );
    assert_eq!(tree.lookup_as::<u32>("missing").unwrap(), None);
    assert!(tree.lookup_as::<u32>("bar.baz").is_err());
}

#[test]
fn test_render_formats() {
    let tree = PathedTree::from_value(json!({"foo": {"bar": 1}}));
    assert_eq!(tree.render(OutputFormat::Json).unwrap(), r#"{"foo":{"bar":1}}"#);
    assert!(tree.render(OutputFormat::JsonPretty).unwrap().contains('\n'));
    let yaml = tree.render(OutputFormat::Yaml).unwrap();
    assert!(yaml.contains("foo:"));
    assert!(yaml.contains("bar: 1"));
}
