//! Change sequencer.
//!
//! Consumes one entity's snapshots in chronological order and chains
//! pairwise diffs into a change log:
//!
//! ```text
//! AwaitingBase --first snapshot--> HaveBase --k-th snapshot--> HaveBase
//!                                      |
//!                                   finish
//!                                      v
//!                                    Done
//! ```
//!
//! In [`ChainMode::Previous`] the base rolls forward after every
//! comparison, so the event for snapshot `k` always carries the value from
//! snapshot `k - 1`. [`ChainMode::First`] pins the base to the first
//! snapshot. Only the current base and the in-flight snapshot are held.

pub mod model;

pub use model::{ChangeEvent, EntityChangeLog, EntityStats, Snapshot};

use crate::config::{ChainMode, SequencerConfig, StructuralChanges};
use crate::diff::{diff, ChangeKind};
use crate::errors::SnaplogError;
use crate::normalize::normalize;
use crate::path::{format_path, PathSegment};
use crate::value::{Node, Value};

/// Observable lifecycle phase of a [`ChangeSequencer`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SequencerPhase {
    AwaitingBase,
    HaveBase,
    Done,
}

#[derive(Debug)]
enum SequencerState {
    AwaitingBase,
    HaveBase(Base),
    Done,
}

#[derive(Debug)]
struct Base {
    tree: Node,
    digest: String,
    timestamp: Option<String>,
    /// Raw snapshot was not a mapping
    degraded: bool,
}

/// Single-entity state machine.
#[derive(Debug)]
pub struct ChangeSequencer<'a> {
    config: &'a SequencerConfig,
    entity_key: String,
    state: SequencerState,
    received: u32,
    events: Vec<ChangeEvent>,
    stats: EntityStats,
}

impl<'a> ChangeSequencer<'a> {
    pub fn new(config: &'a SequencerConfig, entity_key: impl Into<String>) -> Self {
        Self {
            config,
            entity_key: entity_key.into(),
            state: SequencerState::AwaitingBase,
            received: 0,
            events: Vec::new(),
            stats: EntityStats::default(),
        }
    }

    pub fn entity_key(&self) -> &str {
        &self.entity_key
    }

    pub fn phase(&self) -> SequencerPhase {
        match self.state {
            SequencerState::AwaitingBase => SequencerPhase::AwaitingBase,
            SequencerState::HaveBase(_) => SequencerPhase::HaveBase,
            SequencerState::Done => SequencerPhase::Done,
        }
    }

    /// Events emitted so far.
    pub fn events(&self) -> &[ChangeEvent] {
        &self.events
    }

    /// Consume the next snapshot and return how many events it produced.
    ///
    /// The compare sequence is the number of snapshots received, so the
    /// caller must push in chronological order.
    ///
    /// # Errors
    ///
    /// - `EntityKeyMismatch` when the snapshot belongs to another entity
    /// - `SequencerFinished` after [`finish`](Self::finish)
    pub fn push(&mut self, snapshot: Snapshot) -> Result<usize, SnaplogError> {
        if matches!(self.state, SequencerState::Done) {
            return Err(SnaplogError::SequencerFinished {
                entity_key: self.entity_key.clone(),
            });
        }
        if snapshot.entity_key != self.entity_key {
            return Err(SnaplogError::EntityKeyMismatch {
                expected: self.entity_key.clone(),
                found: snapshot.entity_key,
            });
        }

        self.received += 1;
        let incoming = self.prepare(&snapshot);

        let state = std::mem::replace(&mut self.state, SequencerState::AwaitingBase);
        let (next, emitted) = match state {
            SequencerState::AwaitingBase => (SequencerState::HaveBase(incoming), 0),
            SequencerState::HaveBase(base) => {
                let emitted = self.compare(&base, &incoming);
                let next_base = match self.config.chain_mode() {
                    ChainMode::Previous => incoming,
                    ChainMode::First => base,
                };
                (SequencerState::HaveBase(next_base), emitted)
            }
            SequencerState::Done => (SequencerState::Done, 0),
        };
        self.state = next;
        Ok(emitted)
    }

    /// Finalize the entity's change log.
    ///
    /// # Errors
    ///
    /// `SequencerFinished` when called twice.
    pub fn finish(&mut self) -> Result<EntityChangeLog, SnaplogError> {
        if matches!(self.state, SequencerState::Done) {
            return Err(SnaplogError::SequencerFinished {
                entity_key: self.entity_key.clone(),
            });
        }
        self.state = SequencerState::Done;

        let log = EntityChangeLog {
            entity_key: self.entity_key.clone(),
            snapshot_count: self.received,
            events: std::mem::take(&mut self.events),
            stats: self.stats,
        };
        tracing::debug!(
            entity_key = %log.entity_key,
            snapshot_count = log.snapshot_count,
            event_count = log.events.len(),
            "entity chain finished"
        );
        Ok(log)
    }

    fn prepare(&mut self, snapshot: &Snapshot) -> Base {
        let normalized = normalize(
            &snapshot.fields,
            self.config.excluded(),
            self.config.wrapper_key(),
        );
        if normalized.degraded {
            self.stats.malformed_snapshots += 1;
            tracing::warn!(
                entity_key = %self.entity_key,
                sequence_position = snapshot.sequence_position,
                "snapshot is not a mapping, comparing as empty"
            );
        }

        let timestamp = self.config.timestamps().resolve(&snapshot.fields);
        if timestamp.is_none() {
            self.stats.missing_timestamps += 1;
            tracing::debug!(
                entity_key = %self.entity_key,
                sequence_position = snapshot.sequence_position,
                "no timestamp candidate resolved"
            );
        }

        Base {
            digest: normalized.tree.digest(),
            tree: normalized.tree,
            timestamp,
            degraded: normalized.degraded,
        }
    }

    fn compare(&mut self, base: &Base, other: &Base) -> usize {
        self.stats.comparisons += 1;
        if base.digest == other.digest {
            self.stats.identical_pairs += 1;
            return 0;
        }

        let wrapper_key = self.config.wrapper_key();
        let mut emitted = 0;
        for leaf in diff(&base.tree, &other.tree) {
            if self.suppressed(leaf.kind, leaf.path.segments(), base, other) {
                self.stats.suppressed_structural += 1;
                continue;
            }
            self.events.push(ChangeEvent {
                entity_key: self.entity_key.clone(),
                compare_sequence: self.received,
                field_path: format_path(&leaf.path, wrapper_key),
                kind: leaf.kind,
                old_value: leaf.old,
                new_value: leaf.new,
                base_timestamp: base.timestamp.clone(),
                change_timestamp: other.timestamp.clone(),
            });
            emitted += 1;
        }
        emitted
    }

    /// Whether an added or removed leaf stays out of the log.
    ///
    /// Only a mapping key appearing or disappearing is structural; sequence
    /// elements are content. Leaves against a degraded snapshot are always
    /// kept.
    fn suppressed(
        &self,
        kind: ChangeKind,
        path: &[PathSegment],
        base: &Base,
        other: &Base,
    ) -> bool {
        let structural = match kind {
            ChangeKind::ValueChanged => return false,
            ChangeKind::Removed => !other.degraded,
            ChangeKind::Added => !base.degraded,
        };
        structural
            && self.config.structural_changes() == StructuralChanges::Ignore
            && !matches!(path.last(), Some(PathSegment::Index(_)))
    }
}

/// Run a whole entity chain over already-ordered snapshot payloads.
///
/// # Errors
///
/// Only fails on sequencer misuse, which this wrapper never triggers; the
/// `Result` is kept so callers handle it like [`ChangeSequencer::push`].
pub fn sequence_entity<I>(
    config: &SequencerConfig,
    entity_key: &str,
    snapshots: I,
) -> Result<EntityChangeLog, SnaplogError>
where
    I: IntoIterator<Item = Value>,
{
    let mut sequencer = ChangeSequencer::new(config, entity_key);
    for (position, fields) in (1u32..).zip(snapshots) {
        sequencer.push(Snapshot::new(entity_key, fields, position))?;
    }
    sequencer.finish()
}
