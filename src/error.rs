//! Error types for the coach plan builder

use thiserror::Error;
use uuid::Uuid;

/// Result type alias for coach operations
pub type Result<T> = std::result::Result<T, CoachError>;

#[derive(Error, Debug)]
pub enum CoachError {

    // =============================
    // Generation Errors
    // =============================

    #[error("LLM error: {0}")]
    LlmError(String),

    #[error("Invalid plan: {0}")]
    InvalidPlan(String),

    // =============================
    // Session Errors
    // =============================

    #[error("Session is busy: a previous message is still being answered")]
    SessionBusy,

    #[error("Turn not found: {0}")]
    TurnNotFound(Uuid),

    #[error("Turn {0} has no plan attached")]
    NoPlanAttached(Uuid),

    #[error("Plan storage error: {0}")]
    StorageError(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Session task failed: {0}")]
    TaskFailed(String),

    // =============================
    // External Library Conversions
    // =============================

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("HTTP client error: {0}")]
    HttpError(#[from] reqwest::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_json_error_conversion() {
        let err: CoachError = serde_json::from_str::<serde_json::Value>("{")
            .unwrap_err()
            .into();
        assert!(err.to_string().starts_with("Serialization error"));
    }
}
