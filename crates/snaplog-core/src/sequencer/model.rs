//! Sequencer input and output records.

use crate::diff::ChangeKind;
use crate::value::{Node, Value};
use serde::Serialize;

/// One ingested version of an entity.
#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot {
    pub entity_key: String,
    pub fields: Value,
    /// 1-based rank within the entity's chronological snapshot list
    pub sequence_position: u32,
}

impl Snapshot {
    pub fn new(entity_key: impl Into<String>, fields: Value, sequence_position: u32) -> Self {
        Self {
            entity_key: entity_key.into(),
            fields,
            sequence_position,
        }
    }
}

/// One field-level difference between two snapshots of the same entity.
///
/// `old_value` comes from the comparison base, `new_value` from the later
/// snapshot. Timestamps are `None` when the snapshot had no usable
/// candidate field.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChangeEvent {
    pub entity_key: String,
    /// Rank of the later snapshot, starting at 2
    pub compare_sequence: u32,
    pub field_path: String,
    pub kind: ChangeKind,
    pub old_value: Node,
    pub new_value: Node,
    pub base_timestamp: Option<String>,
    pub change_timestamp: Option<String>,
}

/// Diagnostics for one entity chain.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct EntityStats {
    pub comparisons: usize,
    /// Comparisons skipped because both normalized trees had the same digest
    pub identical_pairs: usize,
    /// Snapshots whose root was not a mapping
    pub malformed_snapshots: usize,
    /// Snapshots with no usable timestamp candidate
    pub missing_timestamps: usize,
    /// Added/removed leaves not emitted as events
    pub suppressed_structural: usize,
}

/// Finalized change log of one entity.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EntityChangeLog {
    pub entity_key: String,
    pub snapshot_count: u32,
    pub events: Vec<ChangeEvent>,
    pub stats: EntityStats,
}
