//! Landing-table loader.
//!
//! Selects every row of every entity that was ingested more than once,
//! ordered by entity key and ingestion column. Every column becomes a
//! top-level snapshot field; JSON payload columns are decoded in place.

#![allow(clippy::result_large_err)]

use crate::errors::{from_rusqlite, invalid_identifier, Result};
use crate::loader::{
    decode_payload, empty_payload, entity_key_of, parse_instant, sort_chronologically, LoadStats,
    LoadedGroups,
};
use rusqlite::types::ValueRef;
use rusqlite::Connection;
use serde::{Deserialize, Serialize};
use snaplog_core::scheduler::EntityGroup;
use snaplog_core::value::{Fields, Scalar, Value};

/// Where duplicated snapshots live.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LandingSource {
    /// Table name, optionally schema-qualified (`stg.youthpolicy_landing`)
    pub table: String,
    pub key_column: String,
    pub order_column: String,
    /// Text columns holding JSON documents
    pub json_columns: Vec<String>,
}

impl Default for LandingSource {
    fn default() -> Self {
        Self {
            table: "youthpolicy_landing".to_string(),
            key_column: "policy_id".to_string(),
            order_column: "ingested_at".to_string(),
            json_columns: vec!["raw_json".to_string()],
        }
    }
}

impl LandingSource {
    fn duplicate_rows_query(&self) -> Result<String> {
        let table = quote_qualified("landing.table", &self.table)?;
        let key = quote_identifier("landing.key_column", &self.key_column)?;
        let order = quote_identifier("landing.order_column", &self.order_column)?;
        Ok(format!(
            "SELECT * FROM {table} \
             WHERE {key} IN (SELECT {key} FROM {table} GROUP BY {key} HAVING COUNT(*) > 1) \
             ORDER BY {key}, {order}"
        ))
    }
}

/// Load every entity with more than one landing row.
///
/// # Errors
///
/// - `InvalidConfig` when a table or column name is not a plain identifier
/// - `Persistence` when the query fails
pub fn load_duplicate_groups(conn: &Connection, source: &LandingSource) -> Result<LoadedGroups> {
    let sql = source.duplicate_rows_query()?;
    let mut stmt = conn.prepare(&sql).map_err(from_rusqlite)?;
    let columns: Vec<String> = stmt.column_names().iter().map(|c| c.to_string()).collect();

    let mut stats = LoadStats::default();
    let mut groups: Vec<EntityGroup> = Vec::new();
    let mut rows = stmt.query([]).map_err(from_rusqlite)?;

    while let Some(row) = rows.next().map_err(from_rusqlite)? {
        let mut fields = Fields::new();
        for (index, name) in columns.iter().enumerate() {
            let raw = row.get_ref(index).map_err(from_rusqlite)?;
            let value = if source.json_columns.contains(name) {
                json_column(raw, name, &mut stats)
            } else if *name == source.order_column {
                match raw {
                    ValueRef::Text(bytes) => parse_instant(&String::from_utf8_lossy(bytes)),
                    other => plain_column(other),
                }
            } else {
                plain_column(raw)
            };
            fields.insert(name.clone(), value);
        }

        let Some(key) = fields.get(&source.key_column).and_then(entity_key_of) else {
            continue;
        };
        stats.rows += 1;
        match groups.last_mut() {
            Some(group) if group.entity_key == key => group.snapshots.push(Value::Mapping(fields)),
            _ => groups.push(EntityGroup::new(key, vec![Value::Mapping(fields)])),
        }
    }

    // SQL orders the column as stored text; reorder by instant.
    for group in &mut groups {
        sort_chronologically(&mut group.snapshots, &source.order_column);
    }

    tracing::debug!(
        table = %source.table,
        entity_count = groups.len(),
        rows = stats.rows,
        undecodable_payloads = stats.undecodable_payloads,
        "landing rows loaded"
    );
    Ok(LoadedGroups { groups, stats })
}

fn plain_column(raw: ValueRef<'_>) -> Value {
    match raw {
        ValueRef::Null => Value::Null,
        ValueRef::Integer(i) => Value::Scalar(Scalar::Number(i.into())),
        ValueRef::Real(f) => serde_json::Number::from_f64(f)
            .map(|n| Value::Scalar(Scalar::Number(n)))
            .unwrap_or(Value::Null),
        ValueRef::Text(bytes) | ValueRef::Blob(bytes) => {
            Value::text(String::from_utf8_lossy(bytes).into_owned())
        }
    }
}

fn json_column(raw: ValueRef<'_>, name: &str, stats: &mut LoadStats) -> Value {
    match raw {
        ValueRef::Null => Value::Null,
        ValueRef::Text(bytes) | ValueRef::Blob(bytes) => {
            match decode_payload(&String::from_utf8_lossy(bytes)) {
                Some(value) => value,
                None => {
                    stats.undecodable_payloads += 1;
                    tracing::warn!(column = name, "payload column is not JSON, loading as empty");
                    empty_payload()
                }
            }
        }
        other => plain_column(other),
    }
}

fn quote_identifier(setting: &str, name: &str) -> Result<String> {
    let mut chars = name.chars();
    let valid = chars
        .next()
        .is_some_and(|c| c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_');
    if !valid {
        return Err(invalid_identifier(setting, name));
    }
    Ok(format!("\"{}\"", name))
}

fn quote_qualified(setting: &str, name: &str) -> Result<String> {
    let parts = name
        .split('.')
        .map(|part| quote_identifier(setting, part))
        .collect::<Result<Vec<_>>>()?;
    Ok(parts.join("."))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_query_quotes_identifiers() {
        let sql = LandingSource::default().duplicate_rows_query().unwrap();
        assert!(sql.starts_with("SELECT * FROM \"youthpolicy_landing\""));
        assert!(sql.ends_with("ORDER BY \"policy_id\", \"ingested_at\""));
    }

    #[test]
    fn test_rejects_injection_in_identifiers() {
        let source = LandingSource {
            table: "landing; DROP TABLE x".to_string(),
            ..LandingSource::default()
        };
        let err = source.duplicate_rows_query().unwrap_err();
        assert_eq!(err.setting(), Some("landing.table"));

        let source = LandingSource {
            key_column: "1abc".to_string(),
            ..LandingSource::default()
        };
        assert!(source.duplicate_rows_query().is_err());
    }

    #[test]
    fn test_schema_qualified_table() {
        let source = LandingSource {
            table: "stg.youthpolicy_landing".to_string(),
            ..LandingSource::default()
        };
        let sql = source.duplicate_rows_query().unwrap();
        assert!(sql.contains("\"stg\".\"youthpolicy_landing\""));
    }
}
