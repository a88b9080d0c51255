//! Deep merge of configuration trees.
//!
//! Mappings are merged recursively. Sequences are concatenated: the
//! destination's items first, then the source's. Everything else is decided by
//! the `overwrite` flag.
//!
//! Because sequences are added, merging the same source twice grows every
//! sequence it touches; the merge is deliberately not idempotent.

use serde_json::Value;

/// Merge `src` into `dst` in place.
///
/// - Both mappings: recurse key by key; keys only in `src` are added as-is
/// - Both sequences: `dst` followed by `src`, duplicates kept
/// - Anything else: `src` wins when `overwrite` is true, otherwise `dst` is kept
/// - A `null` source at the top level is treated as absent and leaves `dst` untouched
///
/// # Example
/// ```
/// use serde_json::json;
/// use pathed_config::config::deep_merge;
///
/// let mut dst = json!({ "server": { "port": 8080, "host": "localhost" }, "tags": ["a"] });
/// deep_merge(&mut dst, json!({ "server": { "port": 9000 }, "tags": ["b"] }), true);
/// assert_eq!(dst, json!({ "server": { "port": 9000, "host": "localhost" }, "tags": ["a", "b"] }));
/// ```
pub fn deep_merge(dst: &mut Value, src: Value, overwrite: bool) {
    if src.is_null() {
        return;
    }
    merge_value(dst, src, overwrite);
}

/// Same as [`deep_merge`], but merges into a copy of `dst` and returns it.
pub fn deep_merged(dst: &Value, src: Value, overwrite: bool) -> Value {
    let mut copy = dst.clone();
    deep_merge(&mut copy, src, overwrite);
    copy
}

/// Merge multiple values in order, starting from an empty mapping.
///
/// Equivalent to folding [`deep_merge`] over the list.
pub fn deep_merge_all(values: impl IntoIterator<Item = Value>, overwrite: bool) -> Value {
    values
        .into_iter()
        .fold(Value::Object(Default::default()), |mut acc, value| {
            deep_merge(&mut acc, value, overwrite);
            acc
        })
}

fn merge_value(dst: &mut Value, src: Value, overwrite: bool) {
    match (dst, src) {
        (Value::Object(dst_map), Value::Object(src_map)) => {
            for (key, src_value) in src_map {
                match dst_map.get_mut(&key) {
                    Some(dst_value) => merge_value(dst_value, src_value, overwrite),
                    None => {
                        dst_map.insert(key, src_value);
                    }
                }
            }
        }
        (Value::Array(dst_items), Value::Array(src_items)) => {
            dst_items.extend(src_items);
        }
        (dst, src) => {
            if overwrite {
                *dst = src;
            }
        }
    }
}
