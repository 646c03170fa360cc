//! Worker-pool scheduler over entity chains.
//!
//! Entity chains share no mutable state, so each worker pulls the next
//! group index from an atomic cursor and runs a whole chain on its own.
//! Results are merged back into input order after all workers join.
//! Cancellation is observed between entities only; a chain that started
//! always completes, so the outcome never holds a partial entity.

#![allow(clippy::result_large_err)]

use crate::config::SequencerConfig;
use crate::errors::{ExError, ExErrorKind, SnaplogError};
use crate::sequencer::{sequence_entity, EntityChangeLog};
use crate::value::Value;
use crate::{log_op_end, log_op_start};
use serde::Serialize;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Instant;

/// Scheduler tuning.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SchedulerOptions {
    pub workers: usize,
}

impl Default for SchedulerOptions {
    fn default() -> Self {
        Self {
            workers: thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(1),
        }
    }
}

/// All snapshots of one entity, ascending by time.
#[derive(Debug, Clone, PartialEq)]
pub struct EntityGroup {
    pub entity_key: String,
    pub snapshots: Vec<Value>,
}

impl EntityGroup {
    pub fn new(entity_key: impl Into<String>, snapshots: Vec<Value>) -> Self {
        Self {
            entity_key: entity_key.into(),
            snapshots,
        }
    }
}

/// Shared cancellation signal.
#[derive(Debug, Clone, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Totals across every completed entity.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RunStats {
    pub entities: usize,
    pub snapshots: usize,
    pub comparisons: usize,
    pub events: usize,
    pub identical_pairs: usize,
    pub malformed_snapshots: usize,
    pub missing_timestamps: usize,
    pub suppressed_structural: usize,
}

impl RunStats {
    fn absorb(&mut self, log: &EntityChangeLog) {
        self.entities += 1;
        self.snapshots += log.snapshot_count as usize;
        self.events += log.events.len();
        self.comparisons += log.stats.comparisons;
        self.identical_pairs += log.stats.identical_pairs;
        self.malformed_snapshots += log.stats.malformed_snapshots;
        self.missing_timestamps += log.stats.missing_timestamps;
        self.suppressed_structural += log.stats.suppressed_structural;
    }
}

/// Result of a scheduler run.
#[derive(Debug, Clone, PartialEq)]
pub struct RunOutcome {
    /// Completed entity logs in input order
    pub logs: Vec<EntityChangeLog>,
    pub stats: RunStats,
    /// True when the flag stopped the run before every entity completed
    pub cancelled: bool,
}

impl RunOutcome {
    /// Into the error form, for callers that treat cancellation as failure.
    ///
    /// # Errors
    ///
    /// `Cancelled` when the run did not complete.
    pub fn into_complete(self, total: usize) -> Result<Self, ExError> {
        if self.cancelled {
            return Err(SnaplogError::Cancelled {
                completed: self.logs.len(),
                total,
            }
            .into());
        }
        Ok(self)
    }
}

/// Sequence every group on a pool of `options.workers` threads.
///
/// # Errors
///
/// `Internal` when a worker thread panics.
pub fn run_entities(
    config: &SequencerConfig,
    groups: &[EntityGroup],
    options: &SchedulerOptions,
    cancel: &CancelFlag,
) -> Result<RunOutcome, ExError> {
    run_entities_with(config, groups, options, cancel, &|_: usize| {})
}

/// `run_entities` with a callback after each completed group index.
pub(crate) fn run_entities_with(
    config: &SequencerConfig,
    groups: &[EntityGroup],
    options: &SchedulerOptions,
    cancel: &CancelFlag,
    on_complete: &(dyn Fn(usize) + Sync),
) -> Result<RunOutcome, ExError> {
    let start = Instant::now();
    let workers = options.workers.clamp(1, groups.len().max(1));
    log_op_start!("run_entities", entity_count = groups.len(), workers = workers);

    let cursor = AtomicUsize::new(0);
    let batches = thread::scope(|scope| {
        let handles: Vec<_> = (0..workers)
            .map(|_| scope.spawn(|| run_worker(config, groups, &cursor, cancel, on_complete)))
            .collect();
        handles
            .into_iter()
            .map(|handle| {
                handle.join().map_err(|_| {
                    ExError::new(ExErrorKind::Internal)
                        .with_op("run_entities")
                        .with_message("worker thread panicked")
                })
            })
            .collect::<Result<Vec<_>, ExError>>()
    })?;

    let mut indexed = Vec::with_capacity(groups.len());
    for batch in batches {
        indexed.extend(batch.map_err(|e| ExError::from(e).with_op("run_entities"))?);
    }
    indexed.sort_by_key(|(index, _)| *index);

    let mut stats = RunStats::default();
    let logs: Vec<EntityChangeLog> = indexed
        .into_iter()
        .map(|(_, log)| {
            stats.absorb(&log);
            log
        })
        .collect();
    let cancelled = logs.len() < groups.len();

    log_op_end!(
        "run_entities",
        duration_ms = start.elapsed().as_millis() as u64,
        entity_count = logs.len(),
        event_count = stats.events,
        cancelled = cancelled
    );

    Ok(RunOutcome {
        logs,
        stats,
        cancelled,
    })
}

fn run_worker(
    config: &SequencerConfig,
    groups: &[EntityGroup],
    cursor: &AtomicUsize,
    cancel: &CancelFlag,
    on_complete: &(dyn Fn(usize) + Sync),
) -> Result<Vec<(usize, EntityChangeLog)>, SnaplogError> {
    let mut done = Vec::new();
    loop {
        if cancel.is_cancelled() {
            break;
        }
        let index = cursor.fetch_add(1, Ordering::Relaxed);
        let Some(group) = groups.get(index) else {
            break;
        };
        let log = sequence_entity(config, &group.entity_key, group.snapshots.iter().cloned())?;
        done.push((index, log));
        on_complete(index);
    }
    Ok(done)
}
