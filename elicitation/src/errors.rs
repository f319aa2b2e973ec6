//! Crate-wide error hierarchy for the elicitation engine.
//!
//! Only input and storage problems surface here. Backend failures never do:
//! they are absorbed by the retry/fallback paths and show up in logs only.

use thiserror::Error;

/// Convenient alias for crate-wide results.
pub type ElicitationResult<T> = Result<T, ElicitationError>;

/// Root error type for the elicitation crate.
#[derive(Debug, Error)]
pub enum ElicitationError {
    /// Caller sent something we refuse to process (blank topic, bad id, bad brief).
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// No seed record exists for the given session id.
    #[error("session not found: {0}")]
    SessionNotFound(String),

    /// Seed/research/job persistence failure.
    #[error(transparent)]
    Store(#[from] StoreError),

    /// Invalid engine configuration (startup only).
    #[error("config error: {0}")]
    Config(String),
}

/// Persistence errors for seeds, research cache entries, and jobs.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serde error: {0}")]
    Serde(#[from] serde_json::Error),

    /// A record that must be written once already exists.
    #[error("record already exists: {0}")]
    Conflict(String),
}

impl ElicitationError {
    /// `true` when the caller is at fault (maps to a 4xx on the HTTP surface).
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            ElicitationError::InvalidInput(_) | ElicitationError::SessionNotFound(_)
        )
    }
}
