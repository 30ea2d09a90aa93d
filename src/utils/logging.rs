//! Logging utilities
//!
//! Shared logging configuration and helper functions

use crate::config::LoggingConfig;
use crate::models::openai::ChatCompletionRequest;
use anyhow::{Context, Result};

/// Set to true to include full prompts in debug logs
/// Default is false to reduce log verbosity
pub const VERBOSE_REQUEST_LOGGING: bool = false;

/// Initialize the global tracing subscriber
pub fn init_logging(config: &LoggingConfig) -> Result<()> {
    let subscriber: Box<dyn tracing::Subscriber + Send + Sync> = if config.format == "json" {
        // JSON format logs (production environment)
        Box::new(tracing_subscriber::fmt()
            .with_env_filter(config.level.as_str())
            .json()
            .with_current_span(false)
            .with_span_list(false)
            .with_writer(std::io::stderr)
            .finish())
    } else {
        // Human readable format (development environment)
        Box::new(tracing_subscriber::fmt()
            .with_env_filter(config.level.as_str())
            .with_target(false)
            .with_thread_ids(false)
            .with_file(false)
            .with_line_number(false)
            .with_writer(std::io::stderr)
            .finish())
    };

    tracing::subscriber::set_global_default(subscriber)
        .context("Failed to set tracing subscriber")?;

    Ok(())
}

/// Truncate a string with a note about original length
pub fn truncate_content(s: &str, max_chars: usize) -> String {
    let total = s.chars().count();
    if total > max_chars {
        let head: String = s.chars().take(max_chars).collect();
        format!("{}... ({} chars truncated)", head, total - max_chars)
    } else {
        s.to_string()
    }
}

/// Create a filtered summary of a chat request for logging
/// Keeps original structure but truncates verbose content
pub fn create_request_log_summary(request: &ChatCompletionRequest) -> serde_json::Value {
    if VERBOSE_REQUEST_LOGGING {
        serde_json::to_value(request).unwrap_or(serde_json::json!({"error": "serialize failed"}))
    } else {
        let messages: Vec<serde_json::Value> = request.messages.iter()
            .map(|msg| {
                // System prompts are fixed boilerplate, truncate more aggressively
                let max_len = if msg.role == "system" { 100 } else { 200 };
                serde_json::json!({
                    "role": msg.role,
                    "content": msg.content.as_deref().map(|c| truncate_content(c, max_len)),
                })
            })
            .collect();

        serde_json::json!({
            "model": request.model,
            "max_tokens": request.max_tokens,
            "temperature": request.temperature,
            "messages": messages,
        })
    }
}
