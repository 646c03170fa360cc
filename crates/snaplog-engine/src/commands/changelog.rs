//! Change-log command with boundary logging.
//!
//! Validates configuration, loads duplicated snapshots, and sequences every
//! entity on the worker pool.
//!
//! ## Logging Ownership
//!
//! The engine layer owns lifecycle logging for the command:
//! - `log_op_start!` at entry
//! - `log_op_end!` on success
//! - `log_op_error!` on failure
//!
//! Lower layers (store, core) use `tracing::debug!()`/`warn!()` for
//! per-entity details.

#![allow(clippy::result_large_err)]

use snaplog_core::config::SnaplogConfig;
use snaplog_core::errors::Result;
use snaplog_core::scheduler::{run_entities, CancelFlag, RunStats};
use snaplog_core::sequencer::{ChangeEvent, EntityChangeLog};
use snaplog_core::{log_op_end, log_op_error, log_op_start};
use snaplog_core_types::RunId;
use snaplog_store::errors::io_error;
use snaplog_store::loader::jsonl::{load_groups, JsonlSource};
use snaplog_store::loader::sqlite::{load_duplicate_groups, LandingSource};
use snaplog_store::loader::{LoadStats, LoadedGroups};
use std::fs::File;
use std::io::BufReader;
use std::path::PathBuf;

/// Where snapshots come from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChangelogSource {
    /// SQLite database holding the landing table
    Sqlite { path: PathBuf, landing: LandingSource },
    /// JSON Lines export
    Jsonl { path: PathBuf, layout: JsonlSource },
}

impl ChangelogSource {
    fn kind(&self) -> &'static str {
        match self {
            ChangelogSource::Sqlite { .. } => "sqlite",
            ChangelogSource::Jsonl { .. } => "jsonl",
        }
    }
}

/// Run options
#[derive(Debug, Clone, Default)]
pub struct ChangelogOptions {
    /// Checked between entities
    pub cancel: CancelFlag,
}

/// Result of a change-log run
#[derive(Debug, Clone)]
pub struct ChangelogReport {
    pub run_id: RunId,
    /// Per-entity logs in entity-key order
    pub logs: Vec<EntityChangeLog>,
    pub run_stats: RunStats,
    pub load_stats: LoadStats,
    pub cancelled: bool,
}

impl ChangelogReport {
    /// Every event, entity by entity, in emission order.
    pub fn events(&self) -> impl Iterator<Item = &ChangeEvent> {
        self.logs.iter().flat_map(|log| log.events.iter())
    }

    pub fn event_count(&self) -> usize {
        self.run_stats.events
    }
}

/// Build the change log for every duplicated entity in `source`.
///
/// Configuration is validated before the source is opened, so an invalid
/// setting never produces partial output.
///
/// ## Errors
///
/// - `InvalidConfig`: a setting failed validation
/// - `Persistence`: the landing database could not be queried
/// - `Io`: the JSONL file could not be read
pub fn run_changelog(
    source: &ChangelogSource,
    config: &SnaplogConfig,
    options: &ChangelogOptions,
) -> Result<ChangelogReport> {
    let run_id = RunId::new();
    log_op_start!("changelog", run_id = %run_id, source = source.kind());
    let start = std::time::Instant::now();

    let report = run_changelog_impl(source, config, options, run_id.clone()).map_err(|e| {
        let e = e.with_run_id(run_id.clone());
        log_op_error!(
            "changelog",
            e.clone(),
            duration_ms = start.elapsed().as_millis() as u64,
            run_id = %run_id
        );
        e
    })?;

    log_op_end!(
        "changelog",
        duration_ms = start.elapsed().as_millis() as u64,
        run_id = %run_id,
        entity_count = report.run_stats.entities,
        event_count = report.run_stats.events,
        cancelled = report.cancelled
    );

    Ok(report)
}

fn run_changelog_impl(
    source: &ChangelogSource,
    config: &SnaplogConfig,
    options: &ChangelogOptions,
    run_id: RunId,
) -> Result<ChangelogReport> {
    let validated = config.validate()?;
    let loaded = load(source)?;

    let outcome = run_entities(
        &validated.sequencer,
        &loaded.groups,
        &validated.scheduler,
        &options.cancel,
    )?;

    Ok(ChangelogReport {
        run_id,
        logs: outcome.logs,
        run_stats: outcome.stats,
        load_stats: loaded.stats,
        cancelled: outcome.cancelled,
    })
}

fn load(source: &ChangelogSource) -> Result<LoadedGroups> {
    match source {
        ChangelogSource::Sqlite { path, landing } => {
            let conn = snaplog_store::db::open_read_only(path)?;
            load_duplicate_groups(&conn, landing)
        }
        ChangelogSource::Jsonl { path, layout } => {
            let file = File::open(path).map_err(|e| io_error("load_jsonl", e))?;
            load_groups(BufReader::new(file), layout)
        }
    }
}
