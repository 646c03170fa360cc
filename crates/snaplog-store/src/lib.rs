//! Snaplog Store - snapshot loaders, config files and report sinks
//!
//! Provides:
//! - Landing-table loader over SQLite and a JSON Lines loader
//! - YAML configuration file parsing
//! - CSV and console renderings of a change log

pub mod config_file;
pub mod db;
pub mod errors;
pub mod loader;
pub mod report;

// Re-export key types
pub use errors::Result;
pub use loader::jsonl::JsonlSource;
pub use loader::sqlite::LandingSource;
pub use loader::{LoadStats, LoadedGroups};
