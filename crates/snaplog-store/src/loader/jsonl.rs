//! JSON Lines loader.
//!
//! One JSON object per line. Lines are grouped by the key field, groups come
//! out in ascending key order, and each group is stable-sorted by the
//! ingestion instant (lines without one sort first, in file order).

#![allow(clippy::result_large_err)]

use crate::errors::{io_error, Result};
use crate::loader::{
    decode_payload, empty_payload, entity_key_of, parse_instant, sort_chronologically, LoadStats,
    LoadedGroups,
};
use serde::{Deserialize, Serialize};
use snaplog_core::scheduler::EntityGroup;
use snaplog_core::value::{Scalar, Value};
use std::collections::BTreeMap;
use std::io::BufRead;

/// Field layout of a JSON Lines export.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct JsonlSource {
    pub key_field: String,
    pub order_field: String,
    /// Fields that may hold a JSON document encoded as a string
    pub json_fields: Vec<String>,
}

impl Default for JsonlSource {
    fn default() -> Self {
        Self {
            key_field: "policy_id".to_string(),
            order_field: "ingested_at".to_string(),
            json_fields: vec!["raw_json".to_string()],
        }
    }
}

/// Load and group every line of `reader`.
///
/// # Errors
///
/// `Io` when reading fails. Malformed lines are skipped, not errors.
pub fn load_groups<R: BufRead>(reader: R, source: &JsonlSource) -> Result<LoadedGroups> {
    let mut stats = LoadStats::default();
    let mut by_key: BTreeMap<String, Vec<Value>> = BTreeMap::new();

    for (line_no, line) in reader.lines().enumerate() {
        let line = line.map_err(|e| io_error("load_jsonl", e))?;
        if line.trim().is_empty() {
            continue;
        }
        let Some(Value::Mapping(mut fields)) = decode_payload(&line) else {
            stats.skipped_lines += 1;
            tracing::warn!(line = line_no + 1, "line is not a JSON object, skipped");
            continue;
        };
        let Some(key) = fields.get(&source.key_field).and_then(entity_key_of) else {
            stats.skipped_lines += 1;
            tracing::warn!(line = line_no + 1, "line has no entity key, skipped");
            continue;
        };

        for name in &source.json_fields {
            if let Some(Value::Scalar(Scalar::Text(encoded))) = fields.get(name) {
                let decoded = decode_payload(encoded).unwrap_or_else(|| {
                    stats.undecodable_payloads += 1;
                    tracing::warn!(line = line_no + 1, field = %name, "payload field is not JSON, loading as empty");
                    empty_payload()
                });
                fields.insert(name.clone(), decoded);
            }
        }
        if let Some(Value::Scalar(Scalar::Text(text))) = fields.get(&source.order_field) {
            let typed = parse_instant(text);
            fields.insert(source.order_field.clone(), typed);
        }

        stats.rows += 1;
        by_key.entry(key).or_default().push(Value::Mapping(fields));
    }

    let groups: Vec<EntityGroup> = by_key
        .into_iter()
        .map(|(key, mut snapshots)| {
            sort_chronologically(&mut snapshots, &source.order_field);
            EntityGroup::new(key, snapshots)
        })
        .collect();

    tracing::debug!(
        entity_count = groups.len(),
        rows = stats.rows,
        skipped_lines = stats.skipped_lines,
        "jsonl lines loaded"
    );
    Ok(LoadedGroups { groups, stats })
}
