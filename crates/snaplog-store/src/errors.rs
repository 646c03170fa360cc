//! Error handling for snaplog-store
//!
//! Wraps snaplog-core ExError with store-specific helpers

use snaplog_core::errors::{ExError, ExErrorKind};

/// Result type alias using ExError
pub type Result<T> = std::result::Result<T, ExError>;

/// Create a database error from rusqlite::Error
pub fn from_rusqlite(err: rusqlite::Error) -> ExError {
    ExError::new(ExErrorKind::Persistence)
        .with_op("sqlite")
        .with_message(err.to_string())
}

/// Create an IO error
pub fn io_error(operation: &str, err: std::io::Error) -> ExError {
    ExError::new(ExErrorKind::Io)
        .with_op(operation.to_string())
        .with_message(err.to_string())
}

/// Create a CSV writer error
pub fn from_csv(err: csv::Error) -> ExError {
    ExError::new(ExErrorKind::Io)
        .with_op("write_csv")
        .with_message(err.to_string())
}

/// Create a config file error naming the file that was rejected
pub fn config_file_error(path: &str, reason: &str) -> ExError {
    ExError::new(ExErrorKind::InvalidConfig)
        .with_op("load_config")
        .with_setting("config_file")
        .with_message(format!("{}: {}", path, reason))
}

/// Create an error for a table or column name that is not a plain identifier
pub fn invalid_identifier(setting: &str, name: &str) -> ExError {
    ExError::new(ExErrorKind::InvalidConfig)
        .with_op("load_duplicate_groups")
        .with_setting(setting.to_string())
        .with_message(format!("'{}' is not a valid SQL identifier", name))
}
