//! Error types for Groundwork.
//!
//! This module defines a unified error enum that covers all error categories
//! in the application, including configuration, I/O, generation backends,
//! retrieval, prompts and session handling.

use thiserror::Error;

/// Unified error type for Groundwork.
///
/// All fallible functions in the workspace return `Result<T, AppError>`.
#[derive(Error, Debug)]
pub enum AppError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// I/O and filesystem errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Generation backend errors (HTTP failures, malformed replies)
    #[error("LLM error: {0}")]
    Llm(String),

    /// Knowledge base, embedding and retrieval errors
    #[error("Knowledge error: {0}")]
    Knowledge(String),

    /// Prompt system errors
    #[error("Prompt error: {0}")]
    Prompt(String),

    /// Session store and history errors
    #[error("Session error: {0}")]
    Session(String),

    /// A backend call or turn exceeded its deadline
    #[error("Timed out: {0}")]
    Timeout(String),

    /// The caller cancelled the turn
    #[error("Cancelled: {0}")]
    Cancelled(String),

    /// Serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Generic errors
    #[error("{0}")]
    Other(String),
}

impl AppError {
    /// Whether this error aborts a turn outright instead of being recovered
    /// with a fallback answer.
    pub fn is_transport(&self) -> bool {
        matches!(
            self,
            AppError::Timeout(_) | AppError::Cancelled(_) | AppError::Session(_)
        )
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::Serialization(err.to_string())
    }
}

impl From<serde_yaml::Error> for AppError {
    fn from(err: serde_yaml::Error) -> Self {
        AppError::Serialization(err.to_string())
    }
}

/// Convenience type alias for Results with AppError.
pub type AppResult<T> = Result<T, AppError>;
