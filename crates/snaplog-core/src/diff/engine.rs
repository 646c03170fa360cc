//! Recursive lock-step comparator over [`Node`] trees.

use crate::diff::model::{ChangeKind, ChangedLeaf};
use crate::path::FieldPath;
use crate::value::Node;
use std::collections::{BTreeMap, BTreeSet, HashMap, VecDeque};

static ABSENT: Node = Node::Absent;

/// Compute every changed leaf between `base` and `other`.
pub fn diff(base: &Node, other: &Node) -> Vec<ChangedLeaf> {
    let mut out = Vec::new();
    diff_at(&FieldPath::root(), base, other, &mut out);
    out
}

fn diff_at(path: &FieldPath, base: &Node, other: &Node, out: &mut Vec<ChangedLeaf>) {
    match (base, other) {
        (Node::Mapping(a), Node::Mapping(b)) => diff_mappings(path, a, b, out),
        (Node::Sequence(a), Node::Sequence(b)) => diff_sequences(path, a, b, out),
        (Node::Absent, Node::Absent) | (Node::Null, Node::Null) => {}
        (Node::Absent, _) => push(out, path, ChangeKind::Added, base, other),
        (_, Node::Absent) => push(out, path, ChangeKind::Removed, base, other),
        (Node::Scalar(a), Node::Scalar(b)) => {
            if a != b {
                push(out, path, ChangeKind::ValueChanged, base, other);
            }
        }
        (
            Node::Null | Node::Scalar(_) | Node::Sequence(_) | Node::Mapping(_),
            Node::Null | Node::Scalar(_) | Node::Sequence(_) | Node::Mapping(_),
        ) => push(out, path, ChangeKind::ValueChanged, base, other),
    }
}

fn diff_mappings(
    path: &FieldPath,
    base: &BTreeMap<String, Node>,
    other: &BTreeMap<String, Node>,
    out: &mut Vec<ChangedLeaf>,
) {
    let keys: BTreeSet<&String> = base.keys().chain(other.keys()).collect();
    for key in keys {
        let a = base.get(key).unwrap_or(&ABSENT);
        let b = other.get(key).unwrap_or(&ABSENT);
        diff_at(&path.key(key), a, b, out);
    }
}

/// Multiset comparison.
///
/// Elements with equal canonical keys cancel out regardless of position.
/// What is left on each side is paired up in order; each pair is compared
/// recursively at the base element's input index, and any surplus is
/// reported as added or removed at its own input index.
fn diff_sequences(
    path: &FieldPath,
    base: &[(usize, Node)],
    other: &[(usize, Node)],
    out: &mut Vec<ChangedLeaf>,
) {
    let mut available: HashMap<String, VecDeque<usize>> = HashMap::new();
    for (slot, (_, node)) in other.iter().enumerate() {
        available.entry(node.canonical_key()).or_default().push_back(slot);
    }

    let mut unmatched_base = Vec::new();
    for (slot, (_, node)) in base.iter().enumerate() {
        let matched = available
            .get_mut(&node.canonical_key())
            .and_then(VecDeque::pop_front);
        if matched.is_none() {
            unmatched_base.push(slot);
        }
    }

    let mut unmatched_other: Vec<usize> = available.into_values().flatten().collect();
    unmatched_other.sort_unstable();

    for (&b, &o) in unmatched_base.iter().zip(unmatched_other.iter()) {
        let (index, old) = &base[b];
        diff_at(&path.index(*index), old, &other[o].1, out);
    }
    for &b in unmatched_base.iter().skip(unmatched_other.len()) {
        let (index, old) = &base[b];
        push(out, &path.index(*index), ChangeKind::Removed, old, &ABSENT);
    }
    for &o in unmatched_other.iter().skip(unmatched_base.len()) {
        let (index, new) = &other[o];
        push(out, &path.index(*index), ChangeKind::Added, &ABSENT, new);
    }
}

fn push(out: &mut Vec<ChangedLeaf>, path: &FieldPath, kind: ChangeKind, old: &Node, new: &Node) {
    out.push(ChangedLeaf {
        path: path.clone(),
        kind,
        old: old.clone(),
        new: new.clone(),
    });
}
