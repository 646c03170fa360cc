//! Run configuration.
//!
//! [`SnaplogConfig`] is the serializable, unchecked form read from a config
//! file or assembled by the CLI. [`SnaplogConfig::validate`] turns it into a
//! [`ValidatedConfig`] or fails with an `InvalidConfig` error naming the
//! rejected setting. Validation happens once, before any entity is
//! processed, since a bad excluded path would skew every entity's output.

#![allow(clippy::result_large_err)]

use crate::errors::{ExError, SnaplogError};
use crate::path::{ExcludedPathSet, FieldPath};
use crate::scheduler::SchedulerOptions;
use crate::timestamp::{TimestampResolver, DEFAULT_TIMESTAMP_FIELDS};
use serde::{Deserialize, Serialize};

/// Envelope field holding the raw upstream payload.
pub const DEFAULT_WRAPPER_KEY: &str = "raw_json";

/// Volatile bookkeeping fields never reported as changes.
pub const DEFAULT_EXCLUDED_PATHS: &[&str] = &[
    "lastMdfcnDt",
    "frstRegDt",
    "ingested_at",
    "record_hash",
    "raw_ingest_id",
];

/// Which snapshot each comparison uses as its base.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChainMode {
    /// Compare each snapshot with its immediate predecessor (change log)
    #[default]
    Previous,
    /// Compare every snapshot with the entity's first snapshot
    First,
}

/// Whether added/removed leaves become change events.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StructuralChanges {
    /// Only value changes are reported; additions and removals are counted
    #[default]
    Ignore,
    /// Additions and removals are reported with an absent side
    Report,
}

/// Unchecked run configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SnaplogConfig {
    pub excluded_paths: Vec<String>,
    pub timestamp_fields: Vec<String>,
    pub wrapper_key: String,
    pub chain_mode: ChainMode,
    pub structural_changes: StructuralChanges,
    pub workers: usize,
}

impl Default for SnaplogConfig {
    fn default() -> Self {
        Self {
            excluded_paths: DEFAULT_EXCLUDED_PATHS.iter().map(|s| s.to_string()).collect(),
            timestamp_fields: DEFAULT_TIMESTAMP_FIELDS.iter().map(|s| s.to_string()).collect(),
            wrapper_key: DEFAULT_WRAPPER_KEY.to_string(),
            chain_mode: ChainMode::default(),
            structural_changes: StructuralChanges::default(),
            workers: SchedulerOptions::default().workers,
        }
    }
}

impl SnaplogConfig {
    /// Check every setting.
    ///
    /// # Errors
    ///
    /// `InvalidConfig` with `setting()` set to one of `wrapper_key`,
    /// `excluded_paths`, `timestamp_fields` or `workers`.
    pub fn validate(&self) -> Result<ValidatedConfig, ExError> {
        let reject = |e: SnaplogError| ExError::from(e).with_op("validate_config");

        if self.wrapper_key.trim().is_empty() {
            return Err(reject(SnaplogError::EmptyWrapperKey));
        }
        let excluded = ExcludedPathSet::parse(&self.excluded_paths).map_err(reject)?;
        let timestamps = TimestampResolver::new(self.timestamp_fields.iter().cloned(), &self.wrapper_key)
            .map_err(reject)?;
        if self.workers == 0 {
            return Err(reject(SnaplogError::ZeroWorkers));
        }

        Ok(ValidatedConfig {
            sequencer: SequencerConfig {
                excluded,
                timestamps,
                wrapper_key: self.wrapper_key.clone(),
                chain_mode: self.chain_mode,
                structural_changes: self.structural_changes,
            },
            scheduler: SchedulerOptions {
                workers: self.workers,
            },
        })
    }
}

/// Configuration that passed validation.
#[derive(Debug, Clone)]
pub struct ValidatedConfig {
    pub sequencer: SequencerConfig,
    pub scheduler: SchedulerOptions,
}

/// Immutable per-comparison settings shared by every entity chain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SequencerConfig {
    excluded: ExcludedPathSet,
    timestamps: TimestampResolver,
    wrapper_key: String,
    chain_mode: ChainMode,
    structural_changes: StructuralChanges,
}

impl SequencerConfig {
    pub fn excluded(&self) -> &ExcludedPathSet {
        &self.excluded
    }

    pub fn timestamps(&self) -> &TimestampResolver {
        &self.timestamps
    }

    pub fn wrapper_key(&self) -> &str {
        &self.wrapper_key
    }

    pub fn chain_mode(&self) -> ChainMode {
        self.chain_mode
    }

    pub fn structural_changes(&self) -> StructuralChanges {
        self.structural_changes
    }

    pub fn with_excluded(mut self, excluded: ExcludedPathSet) -> Self {
        self.excluded = excluded;
        self
    }

    pub fn with_chain_mode(mut self, mode: ChainMode) -> Self {
        self.chain_mode = mode;
        self
    }

    pub fn with_structural_changes(mut self, mode: StructuralChanges) -> Self {
        self.structural_changes = mode;
        self
    }
}

impl Default for SequencerConfig {
    fn default() -> Self {
        let excluded_paths = DEFAULT_EXCLUDED_PATHS.iter().map(|name| FieldPath::root().key(name));
        Self {
            excluded: ExcludedPathSet::from_paths(excluded_paths),
            timestamps: TimestampResolver::default(),
            wrapper_key: DEFAULT_WRAPPER_KEY.to_string(),
            chain_mode: ChainMode::default(),
            structural_changes: StructuralChanges::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::ExErrorKind;

    #[test]
    fn test_default_config_validates() {
        let validated = SnaplogConfig::default().validate().unwrap();
        assert_eq!(validated.sequencer, SequencerConfig::default());
        assert!(validated.scheduler.workers >= 1);
    }

    #[test]
    fn test_bad_excluded_path_names_setting() {
        let config = SnaplogConfig {
            excluded_paths: vec!["root['unterminated".to_string()],
            ..SnaplogConfig::default()
        };
        let err = config.validate().unwrap_err();
        assert_eq!(err.kind(), ExErrorKind::InvalidConfig);
        assert_eq!(err.setting(), Some("excluded_paths"));
        assert_eq!(err.op(), Some("validate_config"));
    }

    #[test]
    fn test_empty_timestamp_fields_rejected() {
        let config = SnaplogConfig {
            timestamp_fields: vec![],
            ..SnaplogConfig::default()
        };
        let err = config.validate().unwrap_err();
        assert_eq!(err.setting(), Some("timestamp_fields"));
    }

    #[test]
    fn test_blank_wrapper_rejected() {
        let config = SnaplogConfig {
            wrapper_key: " ".to_string(),
            ..SnaplogConfig::default()
        };
        assert_eq!(config.validate().unwrap_err().setting(), Some("wrapper_key"));
    }

    #[test]
    fn test_zero_workers_rejected() {
        let config = SnaplogConfig {
            workers: 0,
            ..SnaplogConfig::default()
        };
        assert_eq!(config.validate().unwrap_err().setting(), Some("workers"));
    }

    #[test]
    fn test_modes_deserialize_snake_case() {
        let mode: ChainMode = serde_json::from_str("\"first\"").unwrap();
        assert_eq!(mode, ChainMode::First);
        let structural: StructuralChanges = serde_json::from_str("\"report\"").unwrap();
        assert_eq!(structural, StructuralChanges::Report);
    }
}
