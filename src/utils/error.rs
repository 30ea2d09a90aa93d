//! Error handling module
//!
//! Defines error types and handling logic used in the project

use crate::models::ActionKind;
use thiserror::Error;

/// Application error types
#[derive(Error, Debug)]
pub enum AppError {
    /// No credentials configured for an action
    #[error("Configuration error: no credentials available for action '{0}'")]
    NoCredentials(ActionKind),

    /// Serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Flat-file storage error
    #[error("Storage error: {0}")]
    Storage(#[from] std::io::Error),

    /// Provider returned a 5xx-class failure
    #[error("Service temporarily unavailable: {0}")]
    TransientService(String),

    /// Rate-limit retries hit the attempt or time cap
    #[error("Retries exhausted after {attempts} attempts: {last_error}")]
    RetryExhausted { attempts: u32, last_error: String },

    /// Provider failure that is neither a rate limit nor a server error
    #[error("Unclassified provider error: {0}")]
    Unclassified(String),

    /// Caller cancelled the call
    #[error("Request cancelled")]
    Cancelled,

    /// Resource not found
    #[error("Resource not found: {0}")]
    NotFound(String),
}

impl AppError {
    /// Get error type string
    pub fn error_type(&self) -> &'static str {
        match self {
            AppError::NoCredentials(_) => "configuration_error",
            AppError::TransientService(_) => "transient_service_error",
            AppError::RetryExhausted { .. } => "retry_exhausted_error",
            AppError::Unclassified(_) => "unclassified_error",
            AppError::Cancelled => "cancelled",
            AppError::NotFound(_) => "not_found_error",
            AppError::Serialization(_) | AppError::Storage(_) => "storage_error",
        }
    }
}

/// Result type alias
pub type AppResult<T> = Result<T, AppError>;
