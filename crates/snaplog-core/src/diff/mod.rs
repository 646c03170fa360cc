//! Structural diff engine.
//!
//! Compares two normalized snapshot trees and yields every changed leaf
//! with its old and new value.
//!
//! ## Entry point
//!
//! ```
//! use snaplog_core::diff::diff;
//! use snaplog_core::normalize::normalize;
//! use snaplog_core::path::ExcludedPathSet;
//! use snaplog_core::value::Value;
//! use serde_json::json;
//!
//! let excluded = ExcludedPathSet::empty();
//! let a = normalize(&Value::from(json!({"status": "open"})), &excluded, "raw_json");
//! let b = normalize(&Value::from(json!({"status": "closed"})), &excluded, "raw_json");
//! let changes = diff(&a.tree, &b.tree);
//! assert_eq!(changes.len(), 1);
//! ```
//!
//! ## Guarantees
//!
//! - **Determinism**: mapping keys are walked in ascending order and
//!   unmatched sequence elements in base order.
//! - **Order-insensitive sequences**: sequences are compared as multisets.
//! - **Raw equality**: `1` and `"1"` are different values.
//! - **Total**: every pair of nodes is comparable; a type mismatch is a
//!   single value change.

pub mod engine;
pub mod model;

pub use engine::diff;
pub use model::{ChangeKind, ChangedLeaf};
