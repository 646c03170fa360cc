//! Structural field paths.
//!
//! A [`FieldPath`] is the sequence of mapping keys and sequence indices from
//! the snapshot root down to a value. Paths are parsed from configuration
//! text ([`parse_path`]) and rendered for output ([`format_path`]).
//!
//! ## Text forms
//!
//! Parsing accepts dotted and bracketed notation, optionally prefixed with
//! `root`:
//!
//! ```text
//! lastMdfcnDt
//! raw_json.meta.tags[0]
//! root['raw_json']['meta']
//! root["a.b"]
//! ```
//!
//! Formatting joins keys with `.` and writes indices as `[n]`. A key that
//! would be ambiguous in dotted form (contains `.`, `[`, `]`, `'` or `\`, is
//! empty, or is a leading `root`) is written as `['escaped']`, so distinct
//! paths never format to the same string.

use crate::errors::SnaplogError;
use std::collections::BTreeSet;
use std::fmt;

/// Marker rendered for the empty path.
pub const ROOT_MARKER: &str = "root";

/// One step in a structural path.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum PathSegment {
    Key(String),
    Index(usize),
}

/// Sequence of segments from the snapshot root.
#[derive(Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct FieldPath(Vec<PathSegment>);

impl FieldPath {
    pub fn root() -> Self {
        Self(Vec::new())
    }

    pub fn from_segments(segments: Vec<PathSegment>) -> Self {
        Self(segments)
    }

    pub fn segments(&self) -> &[PathSegment] {
        &self.0
    }

    pub fn is_root(&self) -> bool {
        self.0.is_empty()
    }

    /// Path extended by a mapping key.
    pub fn key(&self, key: &str) -> Self {
        let mut segments = self.0.clone();
        segments.push(PathSegment::Key(key.to_string()));
        Self(segments)
    }

    /// Path extended by a sequence index.
    pub fn index(&self, index: usize) -> Self {
        let mut segments = self.0.clone();
        segments.push(PathSegment::Index(index));
        Self(segments)
    }

    /// Remaining segments when the path starts with `Key(key)`.
    pub fn strip_leading_key(&self, key: &str) -> Option<&[PathSegment]> {
        match self.0.split_first() {
            Some((PathSegment::Key(first), rest)) if first == key => Some(rest),
            _ => None,
        }
    }
}

impl fmt::Display for FieldPath {
    /// Unstripped rendering; use [`format_path`] for output.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", render_segments(&self.0))
    }
}

/// Render a path for output, dropping a leading `wrapper_key` segment.
///
/// An empty result renders as [`ROOT_MARKER`].
pub fn format_path(path: &FieldPath, wrapper_key: &str) -> String {
    let segments = path.strip_leading_key(wrapper_key).unwrap_or(path.segments());
    render_segments(segments)
}

fn render_segments(segments: &[PathSegment]) -> String {
    let mut out = String::new();
    for segment in segments {
        match segment {
            PathSegment::Key(key) if needs_quoting(key, out.is_empty()) => {
                out.push_str("['");
                for c in key.chars() {
                    if c == '\'' || c == '\\' {
                        out.push('\\');
                    }
                    out.push(c);
                }
                out.push_str("']");
            }
            PathSegment::Key(key) => {
                if !out.is_empty() {
                    out.push('.');
                }
                out.push_str(key);
            }
            PathSegment::Index(i) => {
                out.push('[');
                out.push_str(&i.to_string());
                out.push(']');
            }
        }
    }
    if out.is_empty() {
        ROOT_MARKER.to_string()
    } else {
        out
    }
}

fn needs_quoting(key: &str, leading: bool) -> bool {
    key.is_empty()
        || (leading && key == ROOT_MARKER)
        || key.chars().any(|c| matches!(c, '.' | '[' | ']' | '\'' | '\\'))
}

/// Parse dotted or bracketed path text.
///
/// # Errors
///
/// Returns `SnaplogError::InvalidExcludedPath` when the text is empty, names
/// only `root`, has an empty segment, an unterminated quote or bracket, or a
/// non-numeric unquoted index.
pub fn parse_path(text: &str) -> Result<FieldPath, SnaplogError> {
    let invalid = |reason: &str| SnaplogError::InvalidExcludedPath {
        path: text.to_string(),
        reason: reason.to_string(),
    };

    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Err(invalid("path is empty"));
    }

    let chars: Vec<char> = trimmed.chars().collect();
    let mut pos = 0;

    if trimmed.starts_with(ROOT_MARKER) {
        match chars.get(ROOT_MARKER.len()) {
            None => return Err(invalid("path must name a field below root")),
            Some('[') => pos = ROOT_MARKER.len(),
            Some('.') => pos = ROOT_MARKER.len() + 1,
            Some(_) => {}
        }
    }

    let mut segments = Vec::new();
    loop {
        match chars.get(pos) {
            None => return Err(invalid("empty segment")),
            Some('[') => {
                let (segment, next) = parse_bracket(&chars, pos + 1).map_err(|r| invalid(&r))?;
                segments.push(segment);
                pos = next;
            }
            Some(_) => {
                let start = pos;
                while let Some(c) = chars.get(pos) {
                    match c {
                        '.' | '[' => break,
                        ']' => return Err(invalid("unbalanced ']'")),
                        _ => pos += 1,
                    }
                }
                if pos == start {
                    return Err(invalid("empty segment"));
                }
                segments.push(PathSegment::Key(chars[start..pos].iter().collect()));
            }
        }

        match chars.get(pos) {
            None => break,
            Some('.') => pos += 1,
            Some('[') => {}
            Some(c) => return Err(invalid(&format!("unexpected '{}' after segment", c))),
        }
    }

    Ok(FieldPath(segments))
}

/// Parse the inside of `[...]` starting just after `[`.
fn parse_bracket(chars: &[char], mut pos: usize) -> Result<(PathSegment, usize), String> {
    match chars.get(pos) {
        Some(&quote @ ('\'' | '"')) => {
            pos += 1;
            let mut key = String::new();
            loop {
                match chars.get(pos) {
                    None => return Err("unterminated quoted key".to_string()),
                    Some('\\') => {
                        let escaped = chars
                            .get(pos + 1)
                            .ok_or_else(|| "dangling escape".to_string())?;
                        key.push(*escaped);
                        pos += 2;
                    }
                    Some(&c) if c == quote => {
                        pos += 1;
                        break;
                    }
                    Some(&c) => {
                        key.push(c);
                        pos += 1;
                    }
                }
            }
            if chars.get(pos) != Some(&']') {
                return Err("expected ']' after quoted key".to_string());
            }
            Ok((PathSegment::Key(key), pos + 1))
        }
        _ => {
            let start = pos;
            while chars.get(pos).is_some_and(|c| *c != ']') {
                pos += 1;
            }
            if chars.get(pos).is_none() {
                return Err("unterminated '['".to_string());
            }
            let digits: String = chars[start..pos].iter().collect();
            let index = digits
                .parse::<usize>()
                .map_err(|_| format!("index '{}' is not a non-negative integer", digits))?;
            Ok((PathSegment::Index(index), pos + 1))
        }
    }
}

/// Immutable set of structural paths whose changes are never reported.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExcludedPathSet {
    paths: BTreeSet<FieldPath>,
}

impl ExcludedPathSet {
    pub fn empty() -> Self {
        Self::default()
    }

    /// Parse every entry, failing on the first malformed one.
    ///
    /// # Errors
    ///
    /// Returns `SnaplogError::InvalidExcludedPath` naming the offending entry.
    pub fn parse<I, S>(entries: I) -> Result<Self, SnaplogError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let paths = entries
            .into_iter()
            .map(|entry| parse_path(entry.as_ref()))
            .collect::<Result<BTreeSet<_>, _>>()?;
        Ok(Self { paths })
    }

    pub fn from_paths(paths: impl IntoIterator<Item = FieldPath>) -> Self {
        Self {
            paths: paths.into_iter().collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.paths.len()
    }

    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &FieldPath> {
        self.paths.iter()
    }

    /// True when `path` is excluded, either from the snapshot root or from
    /// just beneath `wrapper_key`.
    pub fn matches(&self, path: &FieldPath, wrapper_key: &str) -> bool {
        if self.paths.contains(path) {
            return true;
        }
        match path.strip_leading_key(wrapper_key) {
            Some(rest) if !rest.is_empty() => self.paths.iter().any(|p| p.segments() == rest),
            _ => false,
        }
    }
}
