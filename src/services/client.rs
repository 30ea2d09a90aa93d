//! Resilient completion client
//!
//! Wraps one chat completion with credential rotation, rate-limit backoff and
//! usage telemetry. Every attempt takes the next credential from the action's
//! pool, so a throttled key is followed by a different one.

use super::key_pool::KeyPool;
use super::rate_limit::{classify, Backoff, FailureKind};
use crate::config::AppConfig;
use crate::models::{ActionKind, CompletionRequest, UsageLogEntry};
use crate::providers::Provider;
use crate::storage::UsageLog;
use crate::utils::error::{AppError, AppResult};
use crate::utils::logging::{create_request_log_summary, truncate_content};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

/// Retry configuration
#[derive(Debug, Clone)]
pub struct RetryConfig {
    /// Maximum rate-limit retries after the first attempt
    pub max_retries: u32,
    /// Give up once waiting would push the call past this
    pub max_elapsed: Duration,
    /// First backoff step when the provider gives no wait hint
    pub initial_backoff: Duration,
    /// Backoff ceiling
    pub max_backoff: Duration,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 8,
            max_elapsed: Duration::from_secs(600),
            initial_backoff: Duration::from_secs(1),
            max_backoff: Duration::from_secs(64),
        }
    }
}

/// Caller-side details echoed into the usage log
#[derive(Debug, Clone, Default)]
pub struct UsageContext {
    pub interaction_number: u32,
    pub user_input: String,
    pub user_prompt: String,
    pub agent_used: String,
    pub agent_description: String,
}

/// Client wrapper with rotation and retry functionality
#[derive(Clone)]
pub struct ResilientClient {
    provider: Arc<dyn Provider>,
    keys: Arc<KeyPool>,
    usage: UsageLog,
    retry_config: RetryConfig,
}

impl ResilientClient {
    pub fn new(provider: Arc<dyn Provider>, keys: Arc<KeyPool>, usage: UsageLog) -> Self {
        Self {
            provider,
            keys,
            usage,
            retry_config: RetryConfig::default(),
        }
    }

    /// Client wired from application configuration
    pub fn from_config(provider: Arc<dyn Provider>, config: &AppConfig) -> Self {
        let keys = KeyPool::new(config.api_keys.clone());
        let usage = UsageLog::new(config.storage.usage_path());
        Self::new(provider, Arc::new(keys), usage).with_retry_config(config.retry.to_retry_config())
    }

    pub fn with_retry_config(mut self, retry_config: RetryConfig) -> Self {
        self.retry_config = retry_config;
        self
    }

    pub fn keys(&self) -> &KeyPool {
        &self.keys
    }

    pub fn usage_log(&self) -> &UsageLog {
        &self.usage
    }

    pub fn retry_config(&self) -> &RetryConfig {
        &self.retry_config
    }

    /// Ask the model once, retrying through rate limits
    pub async fn complete(
        &self,
        request: &CompletionRequest,
        action: ActionKind,
        context: &UsageContext,
    ) -> AppResult<String> {
        self.complete_cancellable(request, action, context, &CancellationToken::new())
            .await
    }

    /// Like [`complete`](Self::complete) but a 5xx-class failure yields an empty string
    pub async fn complete_lenient(
        &self,
        request: &CompletionRequest,
        action: ActionKind,
        context: &UsageContext,
    ) -> AppResult<String> {
        empty_on_transient(self.complete(request, action, context).await)
    }

    /// Ask the model once; `cancel` aborts an in-flight request or a backoff wait
    pub async fn complete_cancellable(
        &self,
        request: &CompletionRequest,
        action: ActionKind,
        context: &UsageContext,
        cancel: &CancellationToken,
    ) -> AppResult<String> {
        if self.keys.is_empty(action) {
            error!("No credentials configured for action '{}'", action);
            return Err(AppError::NoCredentials(action));
        }

        let chat_request = request.to_chat_request();
        if let Ok(summary) = serde_json::to_string(&create_request_log_summary(&chat_request)) {
            debug!("Completion request for '{}': {}", action, summary);
        }

        let started = Instant::now();
        let mut backoff = Backoff::new(self.retry_config.initial_backoff, self.retry_config.max_backoff);
        let mut attempt: u32 = 0;

        loop {
            attempt += 1;
            let api_key = self.keys.next_key(action)?;
            debug!("Attempt {} for '{}' via {}", attempt, action, self.provider.name());

            let result = tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    info!("Completion for '{}' cancelled during request", action);
                    return Err(AppError::Cancelled);
                }
                result = self.provider.chat_complete(&chat_request, &api_key) => result,
            };

            let provider_error = match result {
                Ok(response) => {
                    let content = response.first_content();
                    self.record(action, context, response.total_tokens(), started, &content);
                    debug!(
                        "Completion for '{}' succeeded after {} attempt(s): {}",
                        action,
                        attempt,
                        truncate_content(&content, 200)
                    );
                    return Ok(content);
                }
                Err(e) => e,
            };

            match classify(&provider_error) {
                FailureKind::RateLimit { retry_after } => {
                    if attempt > self.retry_config.max_retries {
                        return Err(self.exhausted(action, context, started, attempt, provider_error.to_string()));
                    }

                    let delay = match retry_after {
                        Some(hint) => hint,
                        None => backoff.next_delay(),
                    };
                    let over_budget = started
                        .elapsed()
                        .checked_add(delay)
                        .map_or(true, |total| total > self.retry_config.max_elapsed);
                    if over_budget {
                        return Err(self.exhausted(action, context, started, attempt, provider_error.to_string()));
                    }

                    warn!(
                        "Rate limit hit for '{}' (attempt {}), waiting {:.1}s before retrying with the next credential",
                        action,
                        attempt,
                        delay.as_secs_f64()
                    );

                    tokio::select! {
                        biased;
                        _ = cancel.cancelled() => {
                            info!("Completion for '{}' cancelled during backoff", action);
                            return Err(AppError::Cancelled);
                        }
                        _ = tokio::time::sleep(delay) => {}
                    }
                }
                FailureKind::ServerError => {
                    error!("Provider unavailable for '{}', not retrying: {}", action, provider_error);
                    self.record(action, context, 0, started, "");
                    return Err(AppError::TransientService(provider_error.to_string()));
                }
                FailureKind::Unclassified => {
                    error!("Completion for '{}' failed: {}", action, provider_error);
                    self.record(action, context, 0, started, "");
                    return Err(AppError::Unclassified(provider_error.to_string()));
                }
            }
        }
    }

    fn exhausted(
        &self,
        action: ActionKind,
        context: &UsageContext,
        started: Instant,
        attempts: u32,
        last_error: String,
    ) -> AppError {
        error!("Giving up on '{}' after {} rate-limited attempts", action, attempts);
        self.record(action, context, 0, started, "");
        AppError::RetryExhausted { attempts, last_error }
    }

    /// Persist one usage entry; a storage failure must not lose the model's answer
    fn record(&self, action: ActionKind, context: &UsageContext, tokens_used: u32, started: Instant, response: &str) {
        let entry = UsageLogEntry {
            action,
            interaction_number: context.interaction_number,
            tokens_used,
            time_taken: started.elapsed().as_secs_f64(),
            user_input: context.user_input.clone(),
            user_prompt: context.user_prompt.clone(),
            api_response: response.to_string(),
            agent_used: context.agent_used.clone(),
            agent_description: context.agent_description.clone(),
            timestamp: Some(chrono::Utc::now()),
        };

        if let Err(e) = self.usage.append(entry) {
            warn!("Failed to write usage log {:?}: {}", self.usage.path(), e);
        }
    }
}

/// Map a transient service failure to an empty answer, leaving every other outcome untouched
pub fn empty_on_transient(result: AppResult<String>) -> AppResult<String> {
    match result {
        Err(AppError::TransientService(message)) => {
            warn!("Returning empty answer after service failure: {}", message);
            Ok(String::new())
        }
        other => other,
    }
}
