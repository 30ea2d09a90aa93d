//! OpenAI Provider implementation
//!
//! Standard OpenAI-compatible API provider (Groq, OpenAI, local gateways)

use super::{Provider, ProviderError};
use crate::config::ProviderSettings;
use crate::models::openai::*;
use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::header::{HeaderMap, RETRY_AFTER};
use reqwest::Client;
use std::time::Duration;
use tracing::{debug, error};

/// OpenAI Provider
pub struct OpenAIProvider {
    client: Client,
    base_url: String,
}

impl OpenAIProvider {
    /// Create a new provider for a base URL with the default timeout
    pub fn new(base_url: impl Into<String>) -> Result<Self> {
        Self::with_timeout(base_url, 60)
    }

    /// Create a new provider with a custom request timeout
    pub fn with_timeout(base_url: impl Into<String>, timeout_secs: u64) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .user_agent(concat!("consultant/", env!("CARGO_PKG_VERSION")))
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            client,
            base_url: base_url.into(),
        })
    }

    /// Create a provider from configured provider settings
    pub fn from_settings(settings: &ProviderSettings) -> Result<Self> {
        Self::with_timeout(settings.base_url.clone(), settings.timeout)
    }

    /// Build the request URL
    fn build_url(&self) -> String {
        let base_url = self.base_url.trim_end_matches('/');
        format!("{}/chat/completions", base_url)
    }
}

/// Read a `Retry-After` header given in (possibly fractional) seconds
fn parse_retry_after(headers: &HeaderMap) -> Option<Duration> {
    let value = headers.get(RETRY_AFTER)?.to_str().ok()?;
    let secs: f64 = value.trim().parse().ok()?;
    Duration::try_from_secs_f64(secs).ok()
}

#[async_trait]
impl Provider for OpenAIProvider {
    fn name(&self) -> &str {
        "openai"
    }

    async fn chat_complete(
        &self,
        request: &ChatCompletionRequest,
        api_key: &str,
    ) -> Result<ChatCompletionResponse, ProviderError> {
        debug!("Sending chat completion request for model {}", request.model);

        let response = self.client
            .post(self.build_url())
            .bearer_auth(api_key)
            .header("Content-Type", "application/json")
            .json(request)
            .send()
            .await
            .map_err(|e| ProviderError::transport(format!("Failed to send request: {}", e)))?;

        let status = response.status();

        if status.is_success() {
            let chat_response: ChatCompletionResponse = response
                .json()
                .await
                .map_err(|e| ProviderError::new(Some(status.as_u16()), format!("Failed to parse response: {}", e)))?;

            debug!("Chat completion request completed successfully");
            return Ok(chat_response);
        }

        let retry_after = parse_retry_after(response.headers());
        let error_text = response.text().await.unwrap_or_default();

        let mut provider_error = match serde_json::from_str::<ErrorResponse>(&error_text) {
            Ok(error_response) => {
                let detail = error_response.error;
                let mut err = ProviderError::new(Some(status.as_u16()), detail.message);
                if let Some(code) = detail.code.or(detail.error_type) {
                    err = err.with_code(code);
                }
                err
            }
            Err(_) => ProviderError::new(Some(status.as_u16()), error_text),
        };
        if let Some(wait) = retry_after {
            provider_error = provider_error.with_retry_after(wait);
        }

        error!("Provider request failed: {}", provider_error);
        Err(provider_error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::header::HeaderValue;

    #[test]
    fn test_provider_name() {
        let provider = OpenAIProvider::new("https://api.groq.com/openai/v1").unwrap();
        assert_eq!(provider.name(), "openai");
    }

    #[test]
    fn test_build_url() {
        let provider = OpenAIProvider::new("https://api.groq.com/openai/v1").unwrap();
        assert_eq!(provider.build_url(), "https://api.groq.com/openai/v1/chat/completions");

        // Test with trailing slash
        let provider = OpenAIProvider::new("https://api.groq.com/openai/v1/").unwrap();
        assert_eq!(provider.build_url(), "https://api.groq.com/openai/v1/chat/completions");
    }

    #[test]
    fn test_parse_retry_after() {
        let mut headers = HeaderMap::new();
        assert_eq!(parse_retry_after(&headers), None);

        headers.insert(RETRY_AFTER, HeaderValue::from_static("7"));
        assert_eq!(parse_retry_after(&headers), Some(Duration::from_secs(7)));

        headers.insert(RETRY_AFTER, HeaderValue::from_static("1.5"));
        assert_eq!(parse_retry_after(&headers), Some(Duration::from_millis(1500)));

        headers.insert(RETRY_AFTER, HeaderValue::from_static("Wed, 21 Oct 2015 07:28:00 GMT"));
        assert_eq!(parse_retry_after(&headers), None);
    }
}
