//! Consultant Library
//!
//! Expert-persona consultant over OpenAI-compatible chat completions, with
//! per-action credential rotation, rate-limit backoff and usage telemetry

pub mod cli;
pub mod config;
pub mod models;
pub mod providers;
pub mod services;
pub mod storage;
pub mod utils;

// Re-export common types
pub use config::{AppConfig, Settings};
pub use models::{openai, ActionKind, CompletionRequest, ModelName};
pub use providers::{OpenAIProvider, Provider, ProviderError};
pub use services::{Consultant, KeyPool, ResilientClient};
pub use utils::error::{AppError, AppResult};
