//! Snapshot loaders.
//!
//! Both loaders hand the core one [`EntityGroup`] per entity key, snapshots
//! ascending by ingestion time. Payload problems never fail a load: an
//! undecodable JSON column becomes an empty mapping and is counted in
//! [`LoadStats`].

pub mod jsonl;
pub mod sqlite;

use chrono::{DateTime, NaiveDateTime, NaiveTime};
use serde::Serialize;
use snaplog_core::scheduler::EntityGroup;
use snaplog_core::value::{Fields, Scalar, Value};
use std::cmp::Ordering;

/// Loader diagnostics.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct LoadStats {
    /// Rows or lines that became snapshots
    pub rows: usize,
    /// JSON payload columns that could not be decoded
    pub undecodable_payloads: usize,
    /// Input lines dropped entirely (not JSON, or no entity key)
    pub skipped_lines: usize,
}

/// Loader output.
#[derive(Debug, Clone, PartialEq)]
pub struct LoadedGroups {
    pub groups: Vec<EntityGroup>,
    pub stats: LoadStats,
}

const NAIVE_FORMATS: &[&str] = &["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S%.f"];

/// Typed instant for an ingestion column, or the text unchanged.
pub(crate) fn parse_instant(text: &str) -> Value {
    let trimmed = text.trim();
    if let Ok(ts) = DateTime::parse_from_rfc3339(trimmed) {
        return Value::Scalar(Scalar::Timestamp(ts));
    }
    for format in NAIVE_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(trimmed, format) {
            return Value::Scalar(Scalar::DateTime(dt));
        }
    }
    Value::text(text)
}

/// Chronological sort key of an ingestion value.
///
/// Instants compare in UTC; naive date-times and dates are taken as UTC.
/// Missing values sort first, then instants, numbers, and finally text.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum OrderKey {
    Missing,
    Instant(NaiveDateTime),
    Number(f64),
    Text(String),
}

impl OrderKey {
    pub(crate) fn of(value: Option<&Value>) -> Self {
        match value {
            Some(Value::Scalar(scalar)) => match scalar {
                Scalar::Timestamp(ts) => OrderKey::Instant(ts.naive_utc()),
                Scalar::DateTime(dt) => OrderKey::Instant(*dt),
                Scalar::Date(d) => OrderKey::Instant(d.and_time(NaiveTime::MIN)),
                Scalar::Number(n) => n
                    .as_f64()
                    .map(OrderKey::Number)
                    .unwrap_or_else(|| OrderKey::Text(n.to_string())),
                Scalar::Text(t) if t.trim().is_empty() => OrderKey::Missing,
                Scalar::Text(t) => OrderKey::Text(t.trim().to_string()),
                Scalar::Bool(b) => OrderKey::Text(b.to_string()),
            },
            Some(Value::Null | Value::Sequence(_) | Value::Mapping(_)) | None => {
                OrderKey::Missing
            }
        }
    }

    fn rank(&self) -> u8 {
        match self {
            OrderKey::Missing => 0,
            OrderKey::Instant(_) => 1,
            OrderKey::Number(_) => 2,
            OrderKey::Text(_) => 3,
        }
    }

    pub(crate) fn chronological(&self, other: &Self) -> Ordering {
        match (self, other) {
            (OrderKey::Instant(a), OrderKey::Instant(b)) => a.cmp(b),
            (OrderKey::Number(a), OrderKey::Number(b)) => a.total_cmp(b),
            (OrderKey::Text(a), OrderKey::Text(b)) => a.cmp(b),
            _ => self.rank().cmp(&other.rank()),
        }
    }
}

/// Stable-sort one entity's snapshots by their `order_field`.
pub(crate) fn sort_chronologically(snapshots: &mut [Value], order_field: &str) {
    snapshots.sort_by(|a, b| {
        OrderKey::of(a.get(order_field)).chronological(&OrderKey::of(b.get(order_field)))
    });
}

/// Decode a JSON payload column; `None` when the text is not JSON.
pub(crate) fn decode_payload(text: &str) -> Option<Value> {
    serde_json::from_str::<serde_json::Value>(text)
        .ok()
        .map(Value::from)
}

/// Payload placeholder for an undecodable column.
pub(crate) fn empty_payload() -> Value {
    Value::Mapping(Fields::new())
}

/// Textual entity key; `None` for null and structures.
pub(crate) fn entity_key_of(value: &Value) -> Option<String> {
    match value {
        Value::Scalar(Scalar::Text(s)) if !s.trim().is_empty() => Some(s.clone()),
        Value::Scalar(Scalar::Text(_)) => None,
        Value::Scalar(scalar) => Some(scalar.render()),
        Value::Null | Value::Sequence(_) | Value::Mapping(_) => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_instant_variants() {
        assert!(matches!(
            parse_instant("2024-01-01T09:00:00+09:00"),
            Value::Scalar(Scalar::Timestamp(_))
        ));
        assert!(matches!(
            parse_instant("2024-01-01 09:00:00.123"),
            Value::Scalar(Scalar::DateTime(_))
        ));
        assert_eq!(parse_instant("yesterday"), Value::text("yesterday"));
    }

    #[test]
    fn test_order_key_compares_instants_across_offsets() {
        let early = parse_instant("2024-01-01T10:00:00+09:00");
        let late = parse_instant("2024-01-01T02:00:00+00:00");
        assert_eq!(
            OrderKey::of(Some(&early)).chronological(&OrderKey::of(Some(&late))),
            Ordering::Less
        );
    }

    #[test]
    fn test_order_key_compares_numbers_by_value() {
        let short = Value::from(json!(999));
        let long = Value::from(json!(1000));
        assert_eq!(
            OrderKey::of(Some(&short)).chronological(&OrderKey::of(Some(&long))),
            Ordering::Less
        );
    }

    fn snapshot(at: Option<&str>, v: i64) -> Value {
        let mut fields = Fields::new();
        if let Some(at) = at {
            fields.insert("at".to_string(), parse_instant(at));
        }
        fields.insert("v".to_string(), Value::from(json!(v)));
        Value::Mapping(fields)
    }

    #[test]
    fn test_missing_order_sorts_first() {
        let mut snapshots = vec![
            snapshot(Some("2024-01-02T00:00:00"), 2),
            snapshot(None, 0),
            snapshot(Some("2024-01-01 00:00:00"), 1),
        ];
        sort_chronologically(&mut snapshots, "at");
        let order: Vec<_> = snapshots.iter().map(|s| s.get("v").cloned()).collect();
        assert_eq!(
            order,
            vec![
                Some(Value::from(json!(0))),
                Some(Value::from(json!(1))),
                Some(Value::from(json!(2)))
            ]
        );
    }

    #[test]
    fn test_decode_payload() {
        assert_eq!(
            decode_payload(r#"{"a": 1}"#),
            Some(Value::from(json!({"a": 1})))
        );
        assert_eq!(decode_payload("{broken"), None);
    }

    #[test]
    fn test_entity_key_of() {
        assert_eq!(entity_key_of(&Value::text("P001")), Some("P001".to_string()));
        assert_eq!(entity_key_of(&Value::from(json!(42))), Some("42".to_string()));
        assert_eq!(entity_key_of(&Value::text("  ")), None);
        assert_eq!(entity_key_of(&Value::Null), None);
    }
}
