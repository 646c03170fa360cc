//! "As-of" timestamp resolution for snapshots.
//!
//! A snapshot may carry several candidate time fields. The resolver tries
//! them in priority order and returns the first usable one, normalized to
//! ISO-8601 text by [`to_iso`]. A missing or blank candidate falls through to
//! the next; when none is usable the snapshot has no timestamp, which is not
//! an error.

use crate::errors::SnaplogError;
use crate::value::{Scalar, Value};

/// Default candidate fields: last-modified first, ingestion time second.
pub const DEFAULT_TIMESTAMP_FIELDS: &[&str] = &["lastMdfcnDt", "ingested_at"];

/// Normalize a time representation to text.
///
/// Typed timestamps, date-times and dates use their ISO-8601 form. Text is
/// trimmed and passed through without calendar validation. Numbers and
/// booleans use their textual form. Blank text, null and structures yield
/// `None`.
pub fn to_iso(value: &Value) -> Option<String> {
    match value {
        Value::Scalar(Scalar::Text(s)) => {
            let trimmed = s.trim();
            if trimmed.is_empty() {
                None
            } else {
                Some(trimmed.to_string())
            }
        }
        Value::Scalar(scalar) => Some(scalar.render()),
        Value::Null | Value::Sequence(_) | Value::Mapping(_) => None,
    }
}

/// Priority-ordered timestamp lookup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimestampResolver {
    candidates: Vec<String>,
    wrapper_key: String,
}

impl TimestampResolver {
    /// Build a resolver over `candidates`, searched top-level first and then
    /// beneath `wrapper_key`.
    ///
    /// # Errors
    ///
    /// - `NoTimestampFields` when `candidates` is empty
    /// - `EmptyTimestampField` when a candidate name is blank
    pub fn new<I, S>(candidates: I, wrapper_key: impl Into<String>) -> Result<Self, SnaplogError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let candidates: Vec<String> = candidates.into_iter().map(Into::into).collect();
        if candidates.is_empty() {
            return Err(SnaplogError::NoTimestampFields);
        }
        if let Some(position) = candidates.iter().position(|c| c.trim().is_empty()) {
            return Err(SnaplogError::EmptyTimestampField { position });
        }
        Ok(Self {
            candidates,
            wrapper_key: wrapper_key.into(),
        })
    }

    pub fn candidates(&self) -> &[String] {
        &self.candidates
    }

    /// Resolve the snapshot's as-of instant.
    pub fn resolve(&self, fields: &Value) -> Option<String> {
        self.candidates.iter().find_map(|name| {
            fields.get(name).and_then(to_iso).or_else(|| {
                fields
                    .get(&self.wrapper_key)
                    .and_then(|wrapped| wrapped.get(name))
                    .and_then(to_iso)
            })
        })
    }
}

impl Default for TimestampResolver {
    fn default() -> Self {
        Self {
            candidates: DEFAULT_TIMESTAMP_FIELDS.iter().map(|s| s.to_string()).collect(),
            wrapper_key: crate::config::DEFAULT_WRAPPER_KEY.to_string(),
        }
    }
}
