//! Provider module
//!
//! Defines the Provider trait and provider implementations

pub mod openai;

use crate::models::openai::{ChatCompletionRequest, ChatCompletionResponse};
use async_trait::async_trait;
use std::fmt;
use std::time::Duration;

/// Failure reported by an upstream provider
///
/// Carries whatever structure the provider exposed so the completion client can
/// classify on status and error code before falling back to the message text.
#[derive(Debug, Clone, PartialEq)]
pub struct ProviderError {
    /// HTTP status, `None` for transport failures
    pub status: Option<u16>,
    /// Provider error code, e.g. `rate_limit_exceeded`
    pub code: Option<String>,
    pub message: String,
    /// Wait suggested by a `Retry-After` header
    pub retry_after: Option<Duration>,
}

impl ProviderError {
    pub fn new(status: Option<u16>, message: impl Into<String>) -> Self {
        Self {
            status,
            code: None,
            message: message.into(),
            retry_after: None,
        }
    }

    /// Failure before any HTTP status was received
    pub fn transport(message: impl Into<String>) -> Self {
        Self::new(None, message)
    }

    pub fn with_code(mut self, code: impl Into<String>) -> Self {
        self.code = Some(code.into());
        self
    }

    pub fn with_retry_after(mut self, retry_after: Duration) -> Self {
        self.retry_after = Some(retry_after);
        self
    }
}

impl fmt::Display for ProviderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.status, &self.code) {
            (Some(status), Some(code)) => write!(f, "Error code: {} ({}) - {}", status, code, self.message),
            (Some(status), None) => write!(f, "Error code: {} - {}", status, self.message),
            (None, _) => f.write_str(&self.message),
        }
    }
}

impl std::error::Error for ProviderError {}

/// Provider trait for upstream chat completion APIs
#[async_trait]
pub trait Provider: Send + Sync {
    /// Get the provider name
    fn name(&self) -> &str;

    /// Send one chat completion request authenticated with `api_key`
    async fn chat_complete(
        &self,
        request: &ChatCompletionRequest,
        api_key: &str,
    ) -> Result<ChatCompletionResponse, ProviderError>;
}

pub use openai::OpenAIProvider;
