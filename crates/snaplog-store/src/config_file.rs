//! YAML configuration file.
//!
//! ```yaml
//! changelog:
//!   excluded_paths: [lastMdfcnDt, frstRegDt, ingested_at, record_hash, raw_ingest_id]
//!   timestamp_fields: [lastMdfcnDt, ingested_at]
//!   chain_mode: previous
//! landing:
//!   table: youthpolicy_landing
//!   key_column: policy_id
//! ```
//!
//! Every section and key is optional; omitted values take their defaults.
//! Unknown keys are rejected so a typo cannot silently fall back to a
//! default.

#![allow(clippy::result_large_err)]

use crate::errors::{config_file_error, Result};
use crate::loader::jsonl::JsonlSource;
use crate::loader::sqlite::LandingSource;
use serde::{Deserialize, Serialize};
use snaplog_core::config::SnaplogConfig;
use std::fs;
use std::path::Path;

/// Parsed configuration file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ConfigFile {
    pub changelog: SnaplogConfig,
    pub landing: LandingSource,
    pub jsonl: JsonlSource,
}

/// Load a configuration file from disk.
///
/// # Errors
///
/// `InvalidConfig` (setting `config_file`) when the file cannot be read or
/// parsed.
pub fn load_config_file(path: &Path) -> Result<ConfigFile> {
    let display = path.display().to_string();
    let content = fs::read_to_string(path)
        .map_err(|e| config_file_error(&display, &format!("cannot read file: {}", e)))?;
    parse_yaml(&content).map_err(|reason| config_file_error(&display, &reason))
}

/// Parse configuration YAML.
///
/// # Errors
///
/// `InvalidConfig` when the YAML is malformed or has unknown keys.
pub fn parse_config_str(content: &str) -> Result<ConfigFile> {
    parse_yaml(content).map_err(|reason| config_file_error("<inline>", &reason))
}

fn parse_yaml(content: &str) -> std::result::Result<ConfigFile, String> {
    if content.trim().is_empty() {
        return Ok(ConfigFile::default());
    }
    serde_yaml::from_str(content).map_err(|e| format!("YAML parse error: {}", e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use snaplog_core::config::ChainMode;

    #[test]
    fn test_empty_is_default() {
        assert_eq!(parse_config_str("").unwrap(), ConfigFile::default());
    }

    #[test]
    fn test_partial_sections() {
        let file = parse_config_str(
            "changelog:\n  chain_mode: first\n  workers: 2\nlanding:\n  table: stg.landing\n",
        )
        .unwrap();
        assert_eq!(file.changelog.chain_mode, ChainMode::First);
        assert_eq!(file.changelog.workers, 2);
        assert_eq!(file.changelog.wrapper_key, "raw_json");
        assert_eq!(file.landing.table, "stg.landing");
        assert_eq!(file.landing.key_column, "policy_id");
    }

    #[test]
    fn test_unknown_key_rejected() {
        let err = parse_config_str("changelog:\n  excluded: [a]\n").unwrap_err();
        assert_eq!(err.setting(), Some("config_file"));
    }
}
