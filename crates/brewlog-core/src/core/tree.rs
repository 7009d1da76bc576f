// crates/brewlog-core/src/core/tree.rs
// ============================================================================
// Module: Tree Values
// Description: Pure helpers for editing JSON trees with remote-store rules.
// Purpose: Share null pruning and path edits between tree store drivers.
// Dependencies: serde_json, crate::core::{identifiers, path}
// ============================================================================

//! ## Overview
//! The hierarchical store never persists `null` or empty objects, and removing
//! the last child of a node removes the node itself. These helpers apply those
//! rules to an in-memory JSON tree so every driver behaves alike. Arrays are
//! stored as opaque leaf values.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde_json::Map;
use serde_json::Value;

use crate::core::identifiers::IdentifierError;
use crate::core::identifiers::validate_segment;

// ============================================================================
// SECTION: Normalization
// ============================================================================

/// Removes nulls and empty objects, recursively through objects.
///
/// Returns `None` when nothing storable remains.
#[must_use]
pub fn normalize(value: Value) -> Option<Value> {
    match value {
        Value::Null => None,
        Value::Object(map) => {
            let pruned = normalize_map(map);
            if pruned.is_empty() { None } else { Some(Value::Object(pruned)) }
        }
        other => Some(other),
    }
}

/// Applies [`normalize`] to every entry of an object.
#[must_use]
pub fn normalize_map(map: Map<String, Value>) -> Map<String, Value> {
    map.into_iter().filter_map(|(key, value)| normalize(value).map(|value| (key, value))).collect()
}

/// Checks that every object key in `value` is a valid path segment.
///
/// # Errors
///
/// Returns [`IdentifierError`] for the first invalid key.
pub fn validate_keys(value: &Value) -> Result<(), IdentifierError> {
    match value {
        Value::Object(map) => {
            for (key, child) in map {
                validate_segment("object key", key)?;
                validate_keys(child)?;
            }
            Ok(())
        }
        Value::Array(items) => items.iter().try_for_each(validate_keys),
        _ => Ok(()),
    }
}

// ============================================================================
// SECTION: Path Edits
// ============================================================================

/// Returns the value stored at `segments` below `root`.
#[must_use]
pub fn value_at<'a>(root: &'a Map<String, Value>, segments: &[String]) -> Option<&'a Value> {
    let (first, rest) = segments.split_first()?;
    let mut node = root.get(first)?;
    for segment in rest {
        node = node.as_object()?.get(segment)?;
    }
    Some(node)
}

/// Stores `value` at `segments` below `root`, or removes the node for `None`.
///
/// Intermediate scalars are replaced by objects when writing. Ancestors left
/// empty by a removal are pruned. `value` must already be normalized.
pub fn set_at(root: &mut Map<String, Value>, segments: &[String], value: Option<Value>) {
    let Some((first, rest)) = segments.split_first() else {
        return;
    };
    if rest.is_empty() {
        match value {
            Some(value) => {
                root.insert(first.clone(), value);
            }
            None => {
                root.remove(first);
            }
        }
        return;
    }
    if value.is_none() && !root.get(first).is_some_and(Value::is_object) {
        return;
    }
    let child = root.entry(first.clone()).or_insert_with(|| Value::Object(Map::new()));
    if !child.is_object() {
        *child = Value::Object(Map::new());
    }
    let emptied = match child {
        Value::Object(map) => {
            set_at(map, rest, value);
            map.is_empty()
        }
        _ => false,
    };
    if emptied {
        root.remove(first);
    }
}

/// Applies a per-child patch at `segments`: each key is written or removed.
pub fn patch_at(root: &mut Map<String, Value>, segments: &[String], patch: Map<String, Value>) {
    for (key, value) in patch {
        let mut child = segments.to_vec();
        child.push(key);
        set_at(root, &child, normalize(value));
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn segments(path: &str) -> Vec<String> {
        path.split('/').map(ToString::to_string).collect()
    }

    fn tree(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            _ => Map::new(),
        }
    }

    #[test]
    fn normalize_strips_nulls_and_empty_objects() {
        let value = json!({"a": null, "b": {"c": null}, "d": [null, {}], "e": 0});
        assert_eq!(normalize(value), Some(json!({"d": [null, {}], "e": 0})));
        assert_eq!(normalize(json!({"x": {}})), None);
    }

    #[test]
    fn removing_last_child_prunes_parents() {
        let mut root = tree(json!({"batches": {"b1": {"name": "x"}}}));
        set_at(&mut root, &segments("batches/b1/name"), None);
        assert!(root.is_empty());
    }

    #[test]
    fn writes_replace_scalars_on_the_way_down() {
        let mut root = tree(json!({"a": 1}));
        set_at(&mut root, &segments("a/b"), Some(json!(2)));
        assert_eq!(Value::Object(root.clone()), json!({"a": {"b": 2}}));
        assert_eq!(value_at(&root, &segments("a/b")), Some(&json!(2)));
        assert_eq!(value_at(&root, &segments("a/b/c")), None);
    }

    #[test]
    fn removing_below_a_scalar_is_a_no_op() {
        let mut root = tree(json!({"a": 1}));
        set_at(&mut root, &segments("a/b"), None);
        assert_eq!(Value::Object(root), json!({"a": 1}));
    }

    #[test]
    fn patch_writes_and_removes_children() {
        let mut root = tree(json!({"r": {"keep": 1, "drop": 2}}));
        patch_at(&mut root, &segments("r"), tree(json!({"drop": null, "add": {"x": 1}})));
        assert_eq!(Value::Object(root), json!({"r": {"keep": 1, "add": {"x": 1}}}));
    }

    #[test]
    fn keys_must_be_segments() {
        assert!(validate_keys(&json!({"ok": {"fine": [{"also": 1}]}})).is_ok());
        assert!(validate_keys(&json!({"bad.key": 1})).is_err());
    }
}
