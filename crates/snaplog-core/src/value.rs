//! Snapshot value model.
//!
//! Two closed tagged types carry snapshot data through the core:
//!
//! - [`Value`] is the raw payload as handed over by a loader. Typed time
//!   values (`Timestamp`, `DateTime`, `Date`) survive alongside JSON scalars.
//! - [`Node`] is the normalized comparison tree produced by
//!   [`normalize`](crate::normalize::normalize). It adds `Absent` for "this
//!   side has nothing at this path", which the diff engine and change events
//!   use instead of an out-of-band `Option`.
//!
//! Equality is raw: `Number(1)` and `Text("1")` differ, and so do
//! `Number(1)` and `Number(1.0)`. Timestamps are equal only when both the
//! instant and the offset match, in step with the canonical key.

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, SecondsFormat};
use serde::{Serialize, Serializer};
use serde_json::Number;
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;
use std::fmt;

/// Raw mapping from field name to value.
pub type Fields = BTreeMap<String, Value>;

/// A leaf value.
#[derive(Debug, Clone)]
pub enum Scalar {
    Bool(bool),
    Number(Number),
    Text(String),
    /// Instant with a UTC offset (e.g. a `timestamptz` column)
    Timestamp(DateTime<FixedOffset>),
    /// Wall-clock date and time without offset
    DateTime(NaiveDateTime),
    /// Calendar date
    Date(NaiveDate),
}

impl Scalar {
    /// Textual form used for rendering and for timestamp resolution.
    ///
    /// Time values use ISO-8601: `2024-01-01T09:30:00+09:00`,
    /// `2024-01-01T09:30:00`, `2024-01-01`.
    pub fn render(&self) -> String {
        match self {
            Scalar::Bool(b) => b.to_string(),
            Scalar::Number(n) => n.to_string(),
            Scalar::Text(s) => s.clone(),
            Scalar::Timestamp(ts) => ts.to_rfc3339_opts(SecondsFormat::AutoSi, false),
            Scalar::DateTime(dt) => dt.format("%Y-%m-%dT%H:%M:%S%.f").to_string(),
            Scalar::Date(d) => d.format("%Y-%m-%d").to_string(),
        }
    }

    fn canonical_key(&self) -> String {
        match self {
            Scalar::Bool(b) => b.to_string(),
            Scalar::Number(n) => n.to_string(),
            Scalar::Text(s) => quote(s),
            Scalar::Timestamp(_) => format!("@ts{}", quote(&self.render())),
            Scalar::DateTime(_) => format!("@dt{}", quote(&self.render())),
            Scalar::Date(_) => format!("@d{}", quote(&self.render())),
        }
    }

    fn to_json(&self) -> serde_json::Value {
        match self {
            Scalar::Bool(b) => serde_json::Value::Bool(*b),
            Scalar::Number(n) => serde_json::Value::Number(n.clone()),
            Scalar::Text(s) => serde_json::Value::String(s.clone()),
            Scalar::Timestamp(_) | Scalar::DateTime(_) | Scalar::Date(_) => {
                serde_json::Value::String(self.render())
            }
        }
    }
}

impl PartialEq for Scalar {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Scalar::Bool(a), Scalar::Bool(b)) => a == b,
            (Scalar::Number(a), Scalar::Number(b)) => a == b,
            (Scalar::Text(a), Scalar::Text(b)) => a == b,
            // chrono compares instants only
            (Scalar::Timestamp(a), Scalar::Timestamp(b)) => a == b && a.offset() == b.offset(),
            (Scalar::DateTime(a), Scalar::DateTime(b)) => a == b,
            (Scalar::Date(a), Scalar::Date(b)) => a == b,
            _ => false,
        }
    }
}

/// Raw snapshot payload value.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Scalar(Scalar),
    Sequence(Vec<Value>),
    Mapping(Fields),
}

impl Value {
    /// Shorthand for a text scalar.
    pub fn text(s: impl Into<String>) -> Self {
        Value::Scalar(Scalar::Text(s.into()))
    }

    /// The mapping behind this value, if it is one.
    pub fn as_mapping(&self) -> Option<&Fields> {
        match self {
            Value::Mapping(fields) => Some(fields),
            _ => None,
        }
    }

    /// Look up a direct child of a mapping.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.as_mapping().and_then(|fields| fields.get(key))
    }
}

impl From<serde_json::Value> for Value {
    fn from(json: serde_json::Value) -> Self {
        match json {
            serde_json::Value::Null => Value::Null,
            serde_json::Value::Bool(b) => Value::Scalar(Scalar::Bool(b)),
            serde_json::Value::Number(n) => Value::Scalar(Scalar::Number(n)),
            serde_json::Value::String(s) => Value::Scalar(Scalar::Text(s)),
            serde_json::Value::Array(items) => {
                Value::Sequence(items.into_iter().map(Value::from).collect())
            }
            serde_json::Value::Object(map) => {
                Value::Mapping(map.into_iter().map(|(k, v)| (k, Value::from(v))).collect())
            }
        }
    }
}

impl From<Fields> for Value {
    fn from(fields: Fields) -> Self {
        Value::Mapping(fields)
    }
}

/// Normalized comparison tree.
///
/// Sequence elements keep their input position (excluded elements leave
/// gaps) and are compared as multisets; see [`Node::canonical_key`].
#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    /// Nothing at this path (missing key, or a mapping entry that was null)
    Absent,
    /// Explicit null, only reachable as a sequence element or snapshot root
    Null,
    Scalar(Scalar),
    /// `(input index, element)` pairs in input order
    Sequence(Vec<(usize, Node)>),
    Mapping(BTreeMap<String, Node>),
}

impl Node {
    /// Sequence of consecutively indexed elements.
    pub fn sequence(items: Vec<Node>) -> Self {
        Node::Sequence(items.into_iter().enumerate().collect())
    }

    pub fn is_absent(&self) -> bool {
        matches!(self, Node::Absent)
    }

    /// Order-insensitive canonical encoding.
    ///
    /// Two nodes have the same key iff they are equal with every sequence
    /// treated as a multiset. Text is always quoted, so `"1"` and `1` never
    /// collide.
    pub fn canonical_key(&self) -> String {
        match self {
            Node::Absent => "~".to_string(),
            Node::Null => "null".to_string(),
            Node::Scalar(s) => s.canonical_key(),
            Node::Sequence(items) => {
                let mut keys: Vec<String> = items.iter().map(|(_, n)| n.canonical_key()).collect();
                keys.sort();
                format!("[{}]", keys.join(","))
            }
            Node::Mapping(map) => {
                let entries: Vec<String> = map
                    .iter()
                    .map(|(k, v)| format!("{}:{}", quote(k), v.canonical_key()))
                    .collect();
                format!("{{{}}}", entries.join(","))
            }
        }
    }

    /// Hex SHA-256 of [`canonical_key`](Node::canonical_key).
    pub fn digest(&self) -> String {
        let mut hasher = Sha256::new();
        hasher.update(self.canonical_key().as_bytes());
        hex::encode(hasher.finalize())
    }

    /// JSON rendering; `Absent` becomes `null`.
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Node::Absent | Node::Null => serde_json::Value::Null,
            Node::Scalar(s) => s.to_json(),
            Node::Sequence(items) => {
                serde_json::Value::Array(items.iter().map(|(_, n)| n.to_json()).collect())
            }
            Node::Mapping(map) => serde_json::Value::Object(
                map.iter().map(|(k, v)| (k.clone(), v.to_json())).collect(),
            ),
        }
    }
}

impl fmt::Display for Node {
    /// Scalars render bare, structures as compact JSON, `Absent` as nothing.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Node::Absent => Ok(()),
            Node::Null => write!(f, "null"),
            Node::Scalar(s) => write!(f, "{}", s.render()),
            Node::Sequence(_) | Node::Mapping(_) => write!(f, "{}", self.to_json()),
        }
    }
}

impl Serialize for Node {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_json().serialize(serializer)
    }
}

fn quote(s: &str) -> String {
    serde_json::Value::String(s.to_string()).to_string()
}
