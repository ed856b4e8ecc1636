use labthings_core::error::AppError;

/// Errors raised while resolving configuration before a [`crate::thing::Thing`]
/// reaches `setup` — slot resolution, settings load, or descriptor
/// construction. Bridges into [`AppError::Configuration`] at the HTTP
/// boundary, mirroring the teacher's `map_error!` pattern in
/// `labthings_core::error`.
#[derive(Debug, thiserror::Error)]
pub enum ConfigurationError {
    #[error("slot '{0}' has no matching instance")]
    SlotUnresolved(String),

    #[error("slot '{0}' matched {1} candidate instances, expected exactly one")]
    SlotAmbiguous(String, usize),

    #[error("slot '{0}' requested type does not match the configured instance")]
    SlotTypeMismatch(String),

    #[error("setting '{0}' failed validation: {1}")]
    InvalidSetting(String, String),

    #[error("failed to read or write settings file: {0}")]
    SettingsIo(String),

    #[error("{0}")]
    Other(String),
}

labthings_core::map_error!(ConfigurationError => AppError::Configuration);

/// Errors raised during action execution, distinct from `ConfigurationError`
/// because they happen after a Thing is already serving traffic.
#[derive(Debug, thiserror::Error)]
pub enum ActionError {
    #[error("invocation was cancelled")]
    Cancelled,

    #[error("action body failed: {0}")]
    Failed(String),

    #[error("action input failed validation: {0}")]
    InvalidInput(serde_json::Value),
}

impl From<ActionError> for AppError {
    fn from(err: ActionError) -> Self {
        match err {
            ActionError::Cancelled => AppError::ConflictOrUnavailable("invocation cancelled".into()),
            ActionError::Failed(msg) => AppError::Internal(msg),
            ActionError::InvalidInput(details) => AppError::ValidationFailed(details),
        }
    }
}
