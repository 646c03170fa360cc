//! Snapshot normalization.
//!
//! Turns a raw [`Value`] into a comparable [`Node`] tree:
//!
//! - a non-mapping root degrades to an empty mapping
//! - mapping entries holding `Null` are dropped, so "present with null" and
//!   "missing" compare the same (both absent)
//! - excluded subtrees are removed, matched from the root and from beneath
//!   the wrapper key
//! - sequence elements keep their input index, so an excluded element
//!   leaves a gap instead of shifting its neighbours; the diff engine
//!   compares sequences as multisets

use crate::path::{ExcludedPathSet, FieldPath};
use crate::value::{Node, Value};
use std::collections::BTreeMap;

/// Outcome of normalizing one snapshot.
#[derive(Debug, Clone, PartialEq)]
pub struct Normalized {
    pub tree: Node,
    /// True when the raw root was not a mapping and was replaced by `{}`
    pub degraded: bool,
}

/// Normalize a snapshot's fields.
///
/// Never fails; input shape problems are reported through
/// [`Normalized::degraded`].
pub fn normalize(fields: &Value, excluded: &ExcludedPathSet, wrapper_key: &str) -> Normalized {
    match fields {
        Value::Mapping(map) => Normalized {
            tree: normalize_mapping(map, &FieldPath::root(), excluded, wrapper_key),
            degraded: false,
        },
        _ => Normalized {
            tree: Node::Mapping(BTreeMap::new()),
            degraded: true,
        },
    }
}

fn normalize_mapping(
    map: &BTreeMap<String, Value>,
    path: &FieldPath,
    excluded: &ExcludedPathSet,
    wrapper_key: &str,
) -> Node {
    let mut out = BTreeMap::new();
    for (key, value) in map {
        if matches!(value, Value::Null) {
            continue;
        }
        let child_path = path.key(key);
        if excluded.matches(&child_path, wrapper_key) {
            continue;
        }
        out.insert(
            key.clone(),
            normalize_value(value, &child_path, excluded, wrapper_key),
        );
    }
    Node::Mapping(out)
}

fn normalize_value(
    value: &Value,
    path: &FieldPath,
    excluded: &ExcludedPathSet,
    wrapper_key: &str,
) -> Node {
    match value {
        Value::Null => Node::Null,
        Value::Scalar(s) => Node::Scalar(s.clone()),
        Value::Mapping(map) => normalize_mapping(map, path, excluded, wrapper_key),
        Value::Sequence(items) => {
            // Index exclusions refer to input positions.
            let nodes = items
                .iter()
                .enumerate()
                .filter(|(i, _)| !excluded.matches(&path.index(*i), wrapper_key))
                .map(|(i, item)| {
                    let child = path.index(i);
                    (i, normalize_value(item, &child, excluded, wrapper_key))
                })
                .collect();
            Node::Sequence(nodes)
        }
    }
}
