use snaplog_core_types::RunId;
use thiserror::Error;

/// Result type alias using ExError
pub type Result<T> = std::result::Result<T, ExError>;

// ========== Error Facility ==========

/// Canonical error kind taxonomy
///
/// Only configuration, I/O and persistence problems ever surface as errors.
/// Per-snapshot and per-field anomalies are absorbed by the sequencer and
/// show up as diagnostics instead.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExErrorKind {
    // Configuration (fatal before any entity is processed)
    InvalidConfig,

    // Input
    InvalidInput,

    // Integration/IO
    Io,
    Serialization,
    Persistence,

    // Run control
    Cancelled,

    // Internal
    Internal,
}

impl ExErrorKind {
    /// Get the stable error code for this kind
    pub fn code(&self) -> &'static str {
        match self {
            ExErrorKind::InvalidConfig => "ERR_INVALID_CONFIG",
            ExErrorKind::InvalidInput => "ERR_INVALID_INPUT",
            ExErrorKind::Io => "ERR_IO",
            ExErrorKind::Serialization => "ERR_SERIALIZATION",
            ExErrorKind::Persistence => "ERR_PERSISTENCE",
            ExErrorKind::Cancelled => "ERR_CANCELLED",
            ExErrorKind::Internal => "ERR_INTERNAL",
        }
    }
}

/// Canonical structured error type
///
/// Carries a stable kind for programmatic handling plus the context needed
/// to tell an operator what to fix (which setting, which entity).
#[derive(Debug, Clone)]
pub struct ExError {
    kind: ExErrorKind,
    op: Option<String>,
    setting: Option<String>,
    entity_key: Option<String>,
    run_id: Option<RunId>,
    message: String,
}

impl ExError {
    /// Create a new error with the specified kind
    pub fn new(kind: ExErrorKind) -> Self {
        Self {
            kind,
            op: None,
            setting: None,
            entity_key: None,
            run_id: None,
            message: String::new(),
        }
    }

    /// Add operation context
    pub fn with_op(mut self, op: impl Into<String>) -> Self {
        self.op = Some(op.into());
        self
    }

    /// Name the configuration setting that was rejected
    pub fn with_setting(mut self, setting: impl Into<String>) -> Self {
        self.setting = Some(setting.into());
        self
    }

    /// Add entity key context
    pub fn with_entity_key(mut self, key: impl Into<String>) -> Self {
        self.entity_key = Some(key.into());
        self
    }

    /// Add run id context
    pub fn with_run_id(mut self, run_id: RunId) -> Self {
        self.run_id = Some(run_id);
        self
    }

    /// Add custom message
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = message.into();
        self
    }

    /// Get the error kind
    pub fn kind(&self) -> ExErrorKind {
        self.kind
    }

    /// Get the stable error code
    pub fn code(&self) -> &'static str {
        self.kind.code()
    }

    /// Get the operation context, if any
    pub fn op(&self) -> Option<&str> {
        self.op.as_deref()
    }

    /// Get the rejected setting, if any
    pub fn setting(&self) -> Option<&str> {
        self.setting.as_deref()
    }

    /// Get the entity key context, if any
    pub fn entity_key(&self) -> Option<&str> {
        self.entity_key.as_deref()
    }

    /// Get the run id context, if any
    pub fn run_id(&self) -> Option<&RunId> {
        self.run_id.as_ref()
    }

    /// Get the error message
    pub fn message(&self) -> &str {
        &self.message
    }
}

impl std::fmt::Display for ExError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}]", self.code())?;
        if let Some(op) = &self.op {
            write!(f, " in operation '{}'", op)?;
        }
        if let Some(setting) = &self.setting {
            write!(f, " (setting: {})", setting)?;
        }
        if !self.message.is_empty() {
            write!(f, ": {}", self.message)?;
        }
        if let Some(entity_key) = &self.entity_key {
            write!(f, " (entity_key: {})", entity_key)?;
        }
        Ok(())
    }
}

impl std::error::Error for ExError {}

// ========== End Error Facility ==========

/// Domain error taxonomy for snaplog configuration and decoding
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SnaplogError {
    /// An excluded path could not be parsed
    #[error("Invalid excluded path '{path}': {reason}")]
    InvalidExcludedPath { path: String, reason: String },

    /// A timestamp candidate field name is empty
    #[error("Invalid timestamp field at position {position}: name cannot be empty")]
    EmptyTimestampField { position: usize },

    /// No timestamp candidates were configured
    #[error("At least one timestamp field must be configured")]
    NoTimestampFields,

    /// The wrapper key is empty
    #[error("Wrapper key cannot be empty")]
    EmptyWrapperKey,

    /// Worker count is zero
    #[error("Worker count must be at least 1")]
    ZeroWorkers,

    /// A snapshot was pushed to a sequencer owned by another entity
    #[error("Snapshot for entity '{found}' pushed to sequencer for '{expected}'")]
    EntityKeyMismatch { expected: String, found: String },

    /// A sequencer received input after it finished
    #[error("Sequencer for entity '{entity_key}' already finished")]
    SequencerFinished { entity_key: String },

    /// The run was cancelled between entities
    #[error("Run cancelled after {completed} of {total} entities")]
    Cancelled { completed: usize, total: usize },

    /// Serialization error (JSON/YAML encoding/decoding)
    #[error("Serialization error: {message}")]
    Serialization { message: String },

    /// Generic internal error
    #[error("Internal error: {message}")]
    Internal { message: String },
}

/// Conversion from SnaplogError to ExError
///
/// Configuration variants keep the name of the offending setting so the CLI
/// can report exactly what to fix.
impl From<SnaplogError> for ExError {
    fn from(err: SnaplogError) -> Self {
        let message = err.to_string();
        match err {
            SnaplogError::InvalidExcludedPath { .. } => ExError::new(ExErrorKind::InvalidConfig)
                .with_setting("excluded_paths")
                .with_message(message),

            SnaplogError::EmptyTimestampField { .. } | SnaplogError::NoTimestampFields => {
                ExError::new(ExErrorKind::InvalidConfig)
                    .with_setting("timestamp_fields")
                    .with_message(message)
            }

            SnaplogError::EmptyWrapperKey => ExError::new(ExErrorKind::InvalidConfig)
                .with_setting("wrapper_key")
                .with_message(message),

            SnaplogError::ZeroWorkers => ExError::new(ExErrorKind::InvalidConfig)
                .with_setting("workers")
                .with_message(message),

            SnaplogError::EntityKeyMismatch { found, .. } => ExError::new(ExErrorKind::InvalidInput)
                .with_entity_key(found)
                .with_message(message),

            SnaplogError::SequencerFinished { entity_key } => ExError::new(ExErrorKind::Internal)
                .with_entity_key(entity_key)
                .with_message(message),

            SnaplogError::Cancelled { .. } => {
                ExError::new(ExErrorKind::Cancelled).with_message(message)
            }

            SnaplogError::Serialization { .. } => {
                ExError::new(ExErrorKind::Serialization).with_message(message)
            }

            SnaplogError::Internal { .. } => {
                ExError::new(ExErrorKind::Internal).with_message(message)
            }
        }
    }
}

/// Conversion from serde_json::Error to SnaplogError
impl From<serde_json::Error> for SnaplogError {
    fn from(err: serde_json::Error) -> Self {
        SnaplogError::Serialization {
            message: err.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_kind_codes() {
        let cases = [
            (ExErrorKind::InvalidConfig, "ERR_INVALID_CONFIG"),
            (ExErrorKind::InvalidInput, "ERR_INVALID_INPUT"),
            (ExErrorKind::Io, "ERR_IO"),
            (ExErrorKind::Serialization, "ERR_SERIALIZATION"),
            (ExErrorKind::Persistence, "ERR_PERSISTENCE"),
            (ExErrorKind::Cancelled, "ERR_CANCELLED"),
            (ExErrorKind::Internal, "ERR_INTERNAL"),
        ];
        for (kind, expected_code) in cases {
            assert_eq!(kind.code(), expected_code, "Wrong code for {:?}", kind);
        }
    }

    #[test]
    fn test_display_includes_setting_and_message() {
        let err = ExError::new(ExErrorKind::InvalidConfig)
            .with_op("validate_config")
            .with_setting("excluded_paths")
            .with_message("bad path");
        let rendered = err.to_string();
        assert!(rendered.starts_with("[ERR_INVALID_CONFIG]"));
        assert!(rendered.contains("in operation 'validate_config'"));
        assert!(rendered.contains("(setting: excluded_paths)"));
        assert!(rendered.ends_with(": bad path"));
    }

    #[test]
    fn test_run_id_none_by_default() {
        let err = ExError::new(ExErrorKind::Io);
        assert!(err.run_id().is_none());
        assert!(err.entity_key().is_none());
    }
}
