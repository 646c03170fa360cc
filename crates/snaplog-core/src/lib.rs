//! Snaplog Core - change-log reconstruction from duplicate snapshots
//!
//! This crate turns repeated, time-ordered snapshots of the same entity
//! into a field-level change log:
//! - Closed value model for loosely-typed payloads (`value`)
//! - Normalization with excluded-path stripping (`normalize`)
//! - Order-insensitive structural diffing (`diff`)
//! - Path parsing and formatting (`path`)
//! - "As-of" timestamp resolution (`timestamp`)
//! - Chained per-entity sequencing (`sequencer`) and a worker pool over
//!   entities (`scheduler`)
//!
//! The crate performs no I/O; loaders and sinks live in `snaplog-store`.

pub mod config;
pub mod diff;
pub mod errors;
pub mod logging_facility;
pub mod normalize;
pub mod path;
pub mod scheduler;
pub mod sequencer;
pub mod timestamp;
pub mod value;

// Macro support
#[doc(hidden)]
pub use snaplog_core_types;
#[doc(hidden)]
pub use tracing;

// Re-export commonly used types
pub use config::{ChainMode, SequencerConfig, SnaplogConfig, StructuralChanges, ValidatedConfig};
pub use errors::{ExError, ExErrorKind, Result, SnaplogError};
pub use scheduler::{run_entities, CancelFlag, EntityGroup, RunOutcome, RunStats, SchedulerOptions};
pub use sequencer::{sequence_entity, ChangeEvent, ChangeSequencer, EntityChangeLog, Snapshot};
pub use value::{Node, Scalar, Value};
