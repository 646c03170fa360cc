//! Command orchestration layer.
//!
//! Provides high-level command functions that coordinate between
//! core domain logic and the loaders in `snaplog-store`.

pub mod changelog;
