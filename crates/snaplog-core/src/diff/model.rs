//! Diff output types.

use crate::path::FieldPath;
use crate::value::Node;
use serde::{Deserialize, Serialize};

/// How a leaf differs between base and other.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChangeKind {
    /// Present on both sides with different values (or different types)
    ValueChanged,
    /// Absent in base, present in other
    Added,
    /// Present in base, absent in other
    Removed,
}

/// One changed location.
///
/// For `Added` the `old` side is [`Node::Absent`]; for `Removed` the `new`
/// side is.
#[derive(Debug, Clone, PartialEq)]
pub struct ChangedLeaf {
    pub path: FieldPath,
    pub kind: ChangeKind,
    pub old: Node,
    pub new: Node,
}
